//! Human-readable activation periods.
//!
//! Accepts a bare number of seconds (`"90"`) or a sequence of
//! number/unit pairs (`"90s"`, `"2m"`, `"1h30m"`, `"1h 30m"`,
//! `"2 minutes"`). Anything else, and any period that sums to zero, is
//! rejected.

use std::time::Duration;

use oniondoor_core::constants::DEFAULT_ACTIVATION_SECONDS;

/// Where an activation period came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSource {
    /// Parsed from operator input.
    Parsed,

    /// Input missing or invalid; the default period applies.
    Default,
}

impl PeriodSource {
    /// Operator-facing feedback.
    pub fn message(self) -> &'static str {
        match self {
            Self::Parsed => "Door activated!",
            Self::Default => "Invalid time period provided",
        }
    }
}

/// Parse a period string into a positive duration.
pub fn parse_period(input: &str) -> Option<Duration> {
    let input = input.trim();

    if let Ok(seconds) = input.parse::<u64>() {
        return (seconds > 0).then(|| Duration::from_secs(seconds));
    }

    let mut total: u64 = 0;
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let (value, tail) = split_leading(rest, |c| c.is_ascii_digit());
        let value: u64 = value.parse().ok()?;

        let (unit, tail) = split_leading(tail.trim_start(), |c| c.is_ascii_alphabetic());
        let scaled = value.checked_mul(unit_seconds(unit)?)?;
        total = total.checked_add(scaled)?;

        rest = tail;
    }

    (total > 0).then(|| Duration::from_secs(total))
}

/// Period for an activation request, falling back to two minutes.
pub fn activation_period(input: Option<&str>) -> (Duration, PeriodSource) {
    match input.and_then(parse_period) {
        Some(period) => (period, PeriodSource::Parsed),
        None => (
            Duration::from_secs(DEFAULT_ACTIVATION_SECONDS),
            PeriodSource::Default,
        ),
    }
}

fn split_leading(s: &str, keep: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !keep(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn unit_seconds(unit: &str) -> Option<u64> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => return None,
    };
    Some(seconds)
}
