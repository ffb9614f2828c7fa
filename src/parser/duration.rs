//! Duration text parsing
//!
//! Devices report accumulated state time as colon-separated text. The number
//! of components decides their positional weight: three parts are
//! hours/minutes/seconds, two are minutes/seconds, one is bare seconds.

use super::LineError;

/// Parse `H:MM:SS`, `M:SS`, or `S` text into total seconds
///
/// # Errors
///
/// Returns [`LineError::BadDuration`] if any component is non-numeric, if
/// there are more than three components, or if the weighted total exceeds
/// `u64::MAX`.
pub fn parse_duration(text: &str) -> Result<u64, LineError> {
    let bad = || LineError::BadDuration {
        text: text.to_string(),
    };

    let parts: Vec<u64> = text
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad())?;

    // Checked weighting: a numeric-but-absurd component is still device
    // garbage and must fail the line, not the scan
    match parts.as_slice() {
        [h, m, s] => h
            .checked_mul(3600)
            .and_then(|hours| m.checked_mul(60).and_then(|mins| hours.checked_add(mins)))
            .and_then(|total| total.checked_add(*s))
            .ok_or_else(bad),
        [m, s] => m
            .checked_mul(60)
            .and_then(|mins| mins.checked_add(*s))
            .ok_or_else(bad),
        [s] => Ok(*s),
        _ => Err(bad()),
    }
}
