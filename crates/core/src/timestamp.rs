use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimestampError {
    #[error("expected \"M:SS.S\", got {0:?}")]
    MissingSeparator(String),

    #[error("minutes part of {0:?} is not a whole number")]
    InvalidMinutes(String),

    #[error("seconds part of {0:?} is not a number")]
    InvalidSeconds(String),

    #[error("{0:?} is outside the playable range")]
    OutOfRange(String),
}

/// Parse a `"M:SS.S"` playback offset (e.g. `"1:23.5"`) into seconds.
///
/// Seconds above 59 are accepted as-is (`"0:75"` is 75.0); only the arithmetic is
/// checked, not the clock layout.
pub fn parse_timestamp(timestamp: &str) -> Result<f64, TimestampError> {
    let (minutes, seconds) = timestamp
        .split_once(':')
        .ok_or_else(|| TimestampError::MissingSeparator(timestamp.to_string()))?;

    let minutes: u32 = minutes
        .trim()
        .parse()
        .map_err(|_| TimestampError::InvalidMinutes(timestamp.to_string()))?;
    let seconds: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| TimestampError::InvalidSeconds(timestamp.to_string()))?;

    let total = f64::from(minutes) * 60.0 + seconds;
    if !total.is_finite() || seconds < 0.0 {
        return Err(TimestampError::OutOfRange(timestamp.to_string()));
    }

    Ok(total)
}
