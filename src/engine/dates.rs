// ==========================================
// Plant operations - date parsing helpers
// ==========================================
// Accepted inputs: YYYY-MM-DD, YYYY-MM-DDTHH:MM[:SS[.f]], optional
// trailing Z or UTC offset (dropped after conversion to UTC).
// ==========================================

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::engine::error::{EngineError, EngineResult};

/// Parse a date or date-time; dates map to midnight
pub fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Parse the date part of a date or date-time
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_date_time(value).map(|dt| dt.date())
}

/// Fractional hours as a duration, rounded to the second
///
/// # Returns
/// - Err(InvalidInput) for negative, non-finite or out-of-range hours
pub fn duration_from_hours(hours: f64) -> EngineResult<Duration> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "duration must be a non-negative number of hours, got {}",
            hours
        )));
    }
    // float -> int casts saturate, try_seconds rejects the saturated value
    Duration::try_seconds((hours * 3600.0).round() as i64).ok_or_else(|| {
        EngineError::InvalidInput(format!("duration of {} hours is out of range", hours))
    })
}

/// `start + duration` without overflow
pub fn add_duration(start: NaiveDateTime, duration: Duration) -> EngineResult<NaiveDateTime> {
    start.checked_add_signed(duration).ok_or_else(|| {
        EngineError::InvalidInput(format!(
            "{} plus {}s is outside the supported date range",
            start,
            duration.num_seconds()
        ))
    })
}
