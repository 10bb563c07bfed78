//! Signal variance validation for probe bursts.
//!
//! A device can open cleanly and still deliver nothing but silence — a muted
//! capture channel, a loopback with no signal, a broken driver reporting
//! zeros. Such a device would deterministically hash to the same value
//! forever, so it must never be trusted as an entropy source.

/// Decide whether a captured burst shows genuine signal variation.
///
/// Rejects the burst when:
/// - it is empty,
/// - every buffer is all-zero bytes (silence),
/// - fewer than 2 distinct buffer contents appear across the burst.
pub fn has_variance(bursts: &[Vec<u8>]) -> bool {
    if bursts.is_empty() {
        return false;
    }

    if bursts
        .iter()
        .all(|buf| buf.iter().all(|&byte| byte == 0))
    {
        return false;
    }

    let mut distinct: Vec<&[u8]> = Vec::with_capacity(bursts.len());
    for buf in bursts {
        if !distinct.contains(&buf.as_slice()) {
            distinct.push(buf);
        }
    }
    distinct.len() >= 2
}
