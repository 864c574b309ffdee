//! Human readable duration parsing
//!
//! Accepted shapes, all yielding seconds:
//! - colon: `1:30`, `1:30:15`, `100:00`
//! - natural: `1h30m`, `1h 30m 15s`, `90m`, `1.5h`
//! - decimal hours: `1.5`, `1,25`, `2`

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("Empty duration")]
    Empty,

    #[error("Invalid duration: {0}")]
    Invalid(String),

    #[error("Negative values not supported: {0}")]
    Negative(String),
}

/// Parse a duration string into seconds
pub fn parse_duration(input: &str) -> Result<i64, DurationError> {
    let value = input.trim();
    if value.is_empty() {
        return Err(DurationError::Empty);
    }
    if value.starts_with('-') {
        return Err(DurationError::Negative(value.to_string()));
    }

    let invalid = || DurationError::Invalid(value.to_string());

    if value.contains(':') {
        return parse_colon(value).ok_or_else(invalid);
    }
    if value.chars().any(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's')) {
        return parse_natural(value).ok_or_else(invalid);
    }
    parse_decimal_hours(value).ok_or_else(invalid)
}

fn parse_colon(value: &str) -> Option<i64> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        numbers.push(part.parse::<i64>().ok()?);
    }
    let hours = numbers[0];
    let minutes = numbers[1];
    let seconds = numbers.get(2).copied().unwrap_or(0);
    if minutes > 59 || seconds > 59 {
        return None;
    }
    hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)
}

fn parse_natural(value: &str) -> Option<i64> {
    let mut total = 0.0_f64;
    let mut number = String::new();
    let mut seen_unit = false;

    for c in value.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            ',' => number.push('.'),
            ' ' => {}
            _ => {
                let factor = match c.to_ascii_lowercase() {
                    'h' => 3600.0,
                    'm' => 60.0,
                    's' => 1.0,
                    _ => return None,
                };
                if number.is_empty() {
                    return None;
                }
                total += number.parse::<f64>().ok()? * factor;
                number.clear();
                seen_unit = true;
            }
        }
    }

    if !number.is_empty() || !seen_unit {
        return None;
    }
    whole_seconds(total)
}

fn parse_decimal_hours(value: &str) -> Option<i64> {
    let normalized = value.replace(',', ".");
    if !normalized.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let hours = normalized.parse::<f64>().ok()?;
    whole_seconds(hours * 3600.0)
}

/// Rounded seconds, `None` when they do not fit an `i64`
fn whole_seconds(seconds: f64) -> Option<i64> {
    let rounded = seconds.round();
    (rounded.is_finite() && rounded >= 0.0 && rounded < i64::MAX as f64).then_some(rounded as i64)
}

/// Format seconds as `H:MM`
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!("{}{}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_format() {
        assert_eq!(parse_duration("1:30"), Ok(5400));
        assert_eq!(parse_duration("01:30:15"), Ok(5415));
        assert_eq!(parse_duration("100:00"), Ok(360_000));
        assert!(parse_duration("1:75").is_err());
        assert!(parse_duration("1:2:3:4").is_err());
    }

    #[test]
    fn test_natural_format() {
        assert_eq!(parse_duration("1h30m"), Ok(5400));
        assert_eq!(parse_duration("1h 30m 15s"), Ok(5415));
        assert_eq!(parse_duration("90m"), Ok(5400));
        assert_eq!(parse_duration("1.5h"), Ok(5400));
        assert_eq!(parse_duration("2H"), Ok(7200));
        assert!(parse_duration("1x").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("1h30").is_err());
    }

    #[test]
    fn test_decimal_hours() {
        assert_eq!(parse_duration("1.5"), Ok(5400));
        assert_eq!(parse_duration("1,25"), Ok(4500));
        assert_eq!(parse_duration("2"), Ok(7200));
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        assert!(matches!(
            parse_duration("9999999999999999:00"),
            Err(DurationError::Invalid(_))
        ));
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(DurationError::Invalid(_))
        ));
        assert!(matches!(
            parse_duration("1e300"),
            Err(DurationError::Invalid(_))
        ));
        let huge = "9".repeat(400);
        assert!(matches!(parse_duration(&huge), Err(DurationError::Invalid(_))));
    }

    #[test]
    fn test_rejects_negative_and_empty() {
        assert_eq!(
            parse_duration("-1:00"),
            Err(DurationError::Negative("-1:00".to_string()))
        );
        assert_eq!(parse_duration("  "), Err(DurationError::Empty));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5400), "1:30");
        assert_eq!(format_duration(28800), "8:00");
        assert_eq!(format_duration(59), "0:00");
    }
}
