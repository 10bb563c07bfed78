//! HTTP random-number server.
//!
//! Serves `GET /api/random` → `{rand, source, timestamp}` on top of the
//! entropy manager. The manager's blocking acquire-read-map sequence runs on
//! the tokio blocking pool, raced against a fixed deadline; a slow hardware
//! path yields 503 instead of a hung request. The abandoned worker keeps
//! running after a timeout and releases the manager lock whenever it
//! finishes — true cancellation of a blocking device read is not attempted.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::Serialize;

use micrand_core::RngManager;

/// Deadline for the whole acquire-read-map sequence.
const REQUEST_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct RandomResponse {
    rand: f64,
    source: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    source: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    source: &'static str,
}

async fn handle_random(
    State(rng): State<Arc<RngManager>>,
) -> Result<Json<RandomResponse>, (StatusCode, Json<ErrorResponse>)> {
    let worker = {
        let rng = Arc::clone(&rng);
        tokio::task::spawn_blocking(move || rng.random_with_source())
    };

    match tokio::time::timeout(REQUEST_DEADLINE, worker).await {
        Ok(Ok((rand, source))) => Ok(Json(RandomResponse {
            rand,
            source: source.as_str(),
            timestamp: iso8601_now(),
        })),
        Ok(Err(join_error)) => {
            log::error!("random-number worker failed: {join_error}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal_error",
                    message: "random number worker failed".to_string(),
                    source: rng.source_hint().as_str(),
                    timestamp: iso8601_now(),
                }),
            ))
        }
        Err(_) => {
            log::warn!(
                "request exceeded {}s deadline; worker left running",
                REQUEST_DEADLINE.as_secs()
            );
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "timeout",
                    message: format!(
                        "no random number within {}s",
                        REQUEST_DEADLINE.as_secs()
                    ),
                    source: rng.source_hint().as_str(),
                    timestamp: iso8601_now(),
                }),
            ))
        }
    }
}

async fn handle_health(State(rng): State<Arc<RngManager>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        source: rng.source_hint().as_str(),
    })
}

/// Build the axum router.
fn build_router(rng: Arc<RngManager>) -> Router {
    Router::new()
        .route("/api/random", get(handle_random))
        .route("/health", get(handle_health))
        .with_state(rng)
}

/// Run the HTTP random-number server.
pub async fn run_server(rng: Arc<RngManager>, host: &str, port: u16) {
    let app = build_router(rng);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

// ---------------------------------------------------------------------------
// Timestamp formatting
// ---------------------------------------------------------------------------

/// Current time as an ISO-8601 UTC string, e.g. `2026-08-25T14:30:00Z`.
fn iso8601_now() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format_iso8601(since_epoch)
}

fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Convert seconds since Unix epoch to (year, month, day, hour, minute,
/// second) UTC. No leap second handling.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let month_days: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 0u64;
    for (i, &md) in month_days.iter().enumerate() {
        if days < md {
            month = i as u64 + 1;
            break;
        }
        days -= md;
    }
    let day = days + 1;

    (year, month, day, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Timestamp formatting
    // -----------------------------------------------------------------------

    #[test]
    fn test_epoch_formats_correctly() {
        assert_eq!(format_iso8601(Duration::ZERO), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_known_timestamp() {
        // 2024-02-29T12:00:00Z, a leap day.
        assert_eq!(
            format_iso8601(Duration::from_secs(1_709_208_000)),
            "2024-02-29T12:00:00Z"
        );
    }

    #[test]
    fn test_year_rollover() {
        // 2023-12-31T23:59:59Z
        assert_eq!(
            format_iso8601(Duration::from_secs(1_704_067_199)),
            "2023-12-31T23:59:59Z"
        );
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap(2024));
        assert!(is_leap(2000));
        assert!(!is_leap(1900));
        assert!(!is_leap(2026));
    }

    // -----------------------------------------------------------------------
    // Wire shapes
    // -----------------------------------------------------------------------

    #[test]
    fn test_random_response_shape() {
        let response = RandomResponse {
            rand: 0.25,
            source: "microphone",
            timestamp: "2026-08-25T14:30:00Z".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["rand"], 0.25);
        assert_eq!(json["source"], "microphone");
        assert_eq!(json["timestamp"], "2026-08-25T14:30:00Z");
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "timeout",
            message: "no random number within 5s".to_string(),
            source: "fallback",
            timestamp: "2026-08-25T14:30:00Z".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "timeout");
        assert_eq!(json["source"], "fallback");
        assert!(json["message"].as_str().unwrap().contains("5s"));
    }
}
