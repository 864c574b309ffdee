//! Timesheet record

use chrono::{DateTime, Utc};

use super::MetaFields;

#[derive(Debug, Clone, PartialEq)]
pub struct Timesheet {
    pub id: Option<i64>,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Timezone the record was entered in
    pub timezone: String,
    /// Seconds, may differ from `end - begin`
    pub duration: i64,
    /// Break in seconds
    pub break_duration: i64,
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub description: Option<String>,
    pub rate: f64,
    pub hourly_rate: Option<f64>,
    pub fixed_rate: Option<f64>,
    pub internal_rate: Option<f64>,
    pub billable: bool,
    pub exported: bool,
    /// Tag ids
    pub tags: Vec<i64>,
    pub meta: MetaFields,
}

impl Timesheet {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>, duration: i64) -> Self {
        Self {
            id: None,
            begin,
            end,
            timezone: "UTC".to_string(),
            duration,
            break_duration: 0,
            user_id: None,
            project_id: None,
            activity_id: None,
            description: None,
            rate: 0.0,
            hourly_rate: None,
            fixed_rate: None,
            internal_rate: None,
            billable: true,
            exported: false,
            tags: Vec::new(),
            meta: MetaFields::new(),
        }
    }

    /// Derive `rate` from the fixed or hourly rate, fixed wins
    pub fn calculate_rate(&mut self) {
        if let Some(fixed) = self.fixed_rate {
            self.rate = fixed;
        } else if let Some(hourly) = self.hourly_rate {
            self.rate = calculate_rate(hourly, self.duration);
        }
    }
}

/// Hourly rate applied to `duration` seconds, rounded to cents
pub fn calculate_rate(hourly_rate: f64, duration: i64) -> f64 {
    let rate = hourly_rate * duration as f64 / 3600.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rate_from_hourly_rate() {
        assert_eq!(calculate_rate(60.0, 5400), 90.0);
        assert_eq!(calculate_rate(100.0, 1000), 27.78);
    }

    #[test]
    fn test_fixed_rate_wins() {
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let mut record = Timesheet::new(begin, begin + chrono::Duration::hours(2), 7200);
        record.hourly_rate = Some(50.0);
        record.calculate_rate();
        assert_eq!(record.rate, 100.0);

        record.fixed_rate = Some(30.0);
        record.calculate_rate();
        assert_eq!(record.rate, 30.0);
    }
}
