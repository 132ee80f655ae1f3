use crate::error::{AnalysisError, AnalysisResult};
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static PERIOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([mhd])$").expect("period regex is valid"));

/// Parse a time period of the form `nX`, where `n` is an integer and `X` is one of
/// `m` (minutes), `h` (hours) or `d` (days).
pub fn parse_period(period: &str) -> AnalysisResult<Duration> {
    let invalid = || AnalysisError::InvalidPeriod(period.to_string());

    let caps = PERIOD_REGEX.captures(period).ok_or_else(invalid)?;
    let interval: i64 = caps[1].parse().map_err(|_| invalid())?;

    let duration = match &caps[2] {
        "m" => Duration::try_minutes(interval),
        "h" => Duration::try_hours(interval),
        _ => Duration::try_days(interval),
    };
    duration.ok_or_else(invalid)
}
