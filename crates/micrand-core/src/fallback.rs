//! Deterministic fallback generator.
//!
//! When no usable capture device exists the service still has to answer, so
//! a non-cryptographic PRNG takes over. It is seeded once from the OS CSPRNG
//! and is statistically independent of the hardware path.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform [0, 1) generator backing fallback mode.
pub struct FallbackGenerator {
    rng: SmallRng,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_seed(os_seed()),
        }
    }

    /// Next uniform value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.rng.random()
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed material from the OS CSPRNG.
///
/// # Panics
/// Panics if the OS CSPRNG fails — this indicates a fatal platform issue.
fn os_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    getrandom::fill(&mut seed).expect("OS CSPRNG failed");
    seed
}
