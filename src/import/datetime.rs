//! Date and time parsing in a user's timezone

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Parse an IANA timezone name
pub fn timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("Invalid date: {}", value))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("Invalid time: {}", value))
}

/// Parse a timestamp; values without offset are local to `tz`
///
/// A bare date means midnight.
pub fn parse_datetime(value: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(naive) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return localize(naive, tz);
    }
    match parse_date(value) {
        Ok(date) => localize(date.and_time(NaiveTime::MIN), tz),
        Err(_) => Err(format!("Invalid date: {}", value)),
    }
}

/// `date` at `time` in `tz`
pub fn at(date: NaiveDate, time: NaiveTime, tz: Tz) -> Result<DateTime<Utc>, String> {
    localize(date.and_time(time), tz)
}

/// Midnight of a `YYYY-MM-DD` date in `tz`
pub fn parse_day(value: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date: {}", value.trim()))?;
    localize(date.and_time(NaiveTime::MIN), tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, String> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Invalid local time {} in {}", naive, tz))
}

/// Fix an end that lies before its begin
///
/// With a known duration the end becomes begin plus duration, otherwise the
/// record is assumed to run over midnight and one day is added to the end.
/// `None` when the corrected end is out of range.
pub fn roll_over(
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    duration: Option<i64>,
    tz: Tz,
) -> Option<DateTime<Utc>> {
    if end >= begin {
        return Some(end);
    }
    match duration.filter(|d| *d > 0) {
        Some(seconds) => begin.checked_add_signed(TimeDelta::try_seconds(seconds)?),
        None => end
            .with_timezone(&tz)
            .checked_add_days(Days::new(1))
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| end.checked_add_days(Days::new(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        parse_datetime(s, Tz::UTC).unwrap()
    }

    #[test]
    fn test_local_time_is_converted() {
        let berlin = timezone("Europe/Berlin").unwrap();
        let begin = parse_datetime("2024-03-01 09:00", berlin).unwrap();
        assert_eq!(begin, utc("2024-03-01 08:00"));
        let begin = parse_datetime("2024-03-01T09:00:00+02:00", berlin).unwrap();
        assert_eq!(begin, utc("2024-03-01 07:00"));
    }

    #[test]
    fn test_vendor_formats() {
        assert_eq!(
            parse_datetime("03/01/2024 05:00:00 PM", Tz::UTC).unwrap(),
            utc("2024-03-01 17:00")
        );
        assert_eq!(
            parse_datetime("01.03.2024 17:00", Tz::UTC).unwrap(),
            utc("2024-03-01 17:00")
        );
        assert!(parse_datetime("yesterday", Tz::UTC).is_err());
    }

    #[test]
    fn test_rollover_adds_a_day() {
        let begin = utc("2024-01-01 23:00");
        let end = utc("2024-01-01 01:00");
        assert_eq!(roll_over(begin, end, None, Tz::UTC), Some(utc("2024-01-02 01:00")));
        assert_eq!(roll_over(begin, end, Some(0), Tz::UTC), Some(utc("2024-01-02 01:00")));
    }

    #[test]
    fn test_rollover_prefers_duration() {
        let begin = utc("2024-01-01 23:00");
        let end = utc("2024-01-01 01:00");
        assert_eq!(
            roll_over(begin, end, Some(7200), Tz::UTC),
            Some(utc("2024-01-02 01:00"))
        );
        assert_eq!(
            roll_over(begin, end, Some(3600), Tz::UTC),
            Some(utc("2024-01-02 00:00"))
        );
        let later = utc("2024-01-02 03:00");
        assert_eq!(roll_over(begin, later, Some(3600), Tz::UTC), Some(later));
    }

    #[test]
    fn test_rollover_out_of_range() {
        let begin = utc("2024-01-01 23:00");
        let end = utc("2024-01-01 01:00");
        assert_eq!(roll_over(begin, end, Some(i64::MAX), Tz::UTC), None);
        assert_eq!(roll_over(begin, end, Some(99_999_999_999_999), Tz::UTC), None);
    }

    #[test]
    fn test_parse_day_is_midnight_in_zone() {
        let berlin = timezone("Europe/Berlin").unwrap();
        assert_eq!(
            parse_day("2024-06-30", berlin).unwrap(),
            utc("2024-06-29 22:00")
        );
        assert!(parse_day("30.06.2024", berlin).is_err());
    }

    #[test]
    fn test_time_parsing() {
        assert_eq!(
            parse_time("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time("5:00 PM").unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap()
        );
    }
}
