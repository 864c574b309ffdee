//! Entity validation
//!
//! Every entity reports its constraint violations as a list instead of
//! failing on the first one, so an import row can show all of them at once.
//! Some checks only make sense for interactive time tracking; their codes
//! are listed in [`SKIP_VALIDATION_CODES`] and ignored by the importers.

use chrono::Duration;
use chrono_tz::Tz;

use crate::entities::{Activity, Budget, Customer, Project, Team, Timesheet, User};

/// Stable violation codes
pub mod codes {
    pub const NAME_REQUIRED: &str = "name_required";
    pub const NAME_TOO_LONG: &str = "name_too_long";
    pub const INVALID_COUNTRY: &str = "invalid_country";
    pub const INVALID_CURRENCY: &str = "invalid_currency";
    pub const INVALID_TIMEZONE: &str = "invalid_timezone";
    pub const INVALID_EMAIL: &str = "invalid_email";
    pub const INVALID_COLOR: &str = "invalid_color";
    pub const INVALID_BUDGET: &str = "invalid_budget";
    pub const TOO_LONG: &str = "too_long";
    pub const END_BEFORE_BEGIN: &str = "end_before_begin";
    pub const NEGATIVE_DURATION: &str = "negative_duration";
    pub const INVALID_BREAK: &str = "invalid_break";
    pub const MISSING_TEAMLEAD: &str = "missing_teamlead";
    pub const ACTIVITY_MISMATCH: &str = "activity_project_mismatch";

    pub const ZERO_DURATION: &str = "zero_duration";
    pub const LONG_RUNNING: &str = "long_running";
    pub const ACTIVITY_DISABLED: &str = "activity_disabled";
    pub const PROJECT_DISABLED: &str = "project_disabled";
    pub const CUSTOMER_DISABLED: &str = "customer_disabled";
}

/// Codes ignored when importing historical data
pub const SKIP_VALIDATION_CODES: &[&str] = &[
    codes::ZERO_DURATION,
    codes::LONG_RUNNING,
    codes::ACTIVITY_DISABLED,
    codes::PROJECT_DISABLED,
    codes::CUSTOMER_DISABLED,
];

/// Records longer than this are flagged as long running
pub const LONG_RUNNING_SECONDS: i64 = 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: &'static str,
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(code: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub trait Validate {
    fn violations(&self) -> Vec<Violation>;

    /// Violations without the ones whose code is in `ignore`
    fn violations_ignoring(&self, ignore: &[&str]) -> Vec<Violation> {
        self.violations()
            .into_iter()
            .filter(|v| !ignore.contains(&v.code))
            .collect()
    }

    /// Violation messages relevant for imports
    fn import_errors(&self) -> Vec<String> {
        self.violations_ignoring(SKIP_VALIDATION_CODES)
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

fn check_name(out: &mut Vec<Violation>, name: &str, max: usize) {
    if name.trim().is_empty() {
        out.push(Violation::new(codes::NAME_REQUIRED, "name", "This value should not be blank."));
    } else if name.chars().count() > max {
        out.push(Violation::new(
            codes::NAME_TOO_LONG,
            "name",
            format!("This value is too long. It should have {} characters or less.", max),
        ));
    }
}

fn check_length(out: &mut Vec<Violation>, field: &'static str, value: Option<&str>, max: usize) {
    if value.is_some_and(|v| v.chars().count() > max) {
        out.push(Violation::new(
            codes::TOO_LONG,
            field,
            format!("This value is too long. It should have {} characters or less.", max),
        ));
    }
}

fn check_timezone(out: &mut Vec<Violation>, field: &'static str, value: &str) {
    if value.parse::<Tz>().is_err() {
        out.push(Violation::new(
            codes::INVALID_TIMEZONE,
            field,
            format!("Unknown timezone \"{}\".", value),
        ));
    }
}

fn check_email(out: &mut Vec<Violation>, field: &'static str, value: Option<&str>) {
    if let Some(email) = value.filter(|e| !e.is_empty()) {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid || email.contains(char::is_whitespace) {
            out.push(Violation::new(
                codes::INVALID_EMAIL,
                field,
                "This value is not a valid email address.",
            ));
        }
    }
}

fn check_color(out: &mut Vec<Violation>, value: Option<&str>) {
    if let Some(color) = value {
        let valid = color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            out.push(Violation::new(
                codes::INVALID_COLOR,
                "color",
                "The given value is not a valid hexadecimal color.",
            ));
        }
    }
}

fn check_budget(out: &mut Vec<Violation>, budget: &Budget) {
    if budget.money < 0.0 || budget.time < 0 {
        out.push(Violation::new(
            codes::INVALID_BUDGET,
            "budget",
            "This value should be greater than or equal to 0.",
        ));
    }
    if budget.kind.as_deref().is_some_and(|k| k != Budget::MONTHLY) {
        out.push(Violation::new(
            codes::INVALID_BUDGET,
            "budgetType",
            "The selected choice is invalid.",
        ));
    }
}

fn is_upper_code(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_uppercase())
}

impl Validate for Customer {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        check_name(&mut out, &self.name, Customer::MAX_NAME_LEN);
        if !is_upper_code(&self.country, 2) {
            out.push(Violation::new(
                codes::INVALID_COUNTRY,
                "country",
                "This value is not a valid country.",
            ));
        }
        if !is_upper_code(&self.currency, 3) {
            out.push(Violation::new(
                codes::INVALID_CURRENCY,
                "currency",
                "This value is not a valid currency.",
            ));
        }
        check_timezone(&mut out, "timezone", &self.timezone);
        check_email(&mut out, "email", self.email.as_deref());
        check_color(&mut out, self.color.as_deref());
        check_length(&mut out, "number", self.number.as_deref(), 50);
        check_budget(&mut out, &self.budget);
        out
    }
}

impl Validate for Project {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        check_name(&mut out, &self.name, Project::MAX_NAME_LEN);
        check_length(
            &mut out,
            "orderNumber",
            self.order_number.as_deref(),
            Project::MAX_ORDER_NUMBER_LEN,
        );
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                out.push(Violation::new(
                    codes::END_BEFORE_BEGIN,
                    "end",
                    "End date must not be earlier then start date.",
                ));
            }
        }
        check_color(&mut out, self.color.as_deref());
        check_budget(&mut out, &self.budget);
        out
    }
}

impl Validate for Activity {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        check_name(&mut out, &self.name, Activity::MAX_NAME_LEN);
        check_color(&mut out, self.color.as_deref());
        check_budget(&mut out, &self.budget);
        out
    }
}

impl Validate for User {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.username.trim().is_empty() {
            out.push(Violation::new(
                codes::NAME_REQUIRED,
                "username",
                "This value should not be blank.",
            ));
        }
        check_length(&mut out, "username", Some(&self.username), User::MAX_USERNAME_LEN);
        if self.email.is_empty() {
            out.push(Violation::new(
                codes::INVALID_EMAIL,
                "email",
                "This value should not be blank.",
            ));
        }
        check_email(&mut out, "email", Some(&self.email));
        check_length(
            &mut out,
            "accountNumber",
            self.account_number.as_deref(),
            User::MAX_ACCOUNT_NUMBER_LEN,
        );
        if let Some(timezone) = self.timezone() {
            check_timezone(&mut out, "timezone", timezone);
        }
        out
    }
}

impl Validate for Team {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        check_name(&mut out, &self.name, Team::MAX_NAME_LEN);
        if !self.has_teamleads() {
            out.push(Violation::new(
                codes::MISSING_TEAMLEAD,
                "members",
                "At least one team leader must be assigned to the team.",
            ));
        }
        out
    }
}

/// A timesheet record together with the entities it points to
pub struct TimesheetCheck<'a> {
    pub timesheet: &'a Timesheet,
    pub customer: Option<&'a Customer>,
    pub project: Option<&'a Project>,
    pub activity: Option<&'a Activity>,
}

impl<'a> TimesheetCheck<'a> {
    pub fn new(timesheet: &'a Timesheet) -> Self {
        Self {
            timesheet,
            customer: None,
            project: None,
            activity: None,
        }
    }
}

impl Validate for TimesheetCheck<'_> {
    fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        let record = self.timesheet;

        if record.end < record.begin {
            out.push(Violation::new(
                codes::END_BEFORE_BEGIN,
                "end",
                "End date must not be earlier then start date.",
            ));
        }
        if record.duration < 0 {
            out.push(Violation::new(
                codes::NEGATIVE_DURATION,
                "duration",
                "Duration cannot be negative.",
            ));
        } else if record.duration == 0 {
            out.push(Violation::new(
                codes::ZERO_DURATION,
                "duration",
                "Duration cannot be zero.",
            ));
        } else if record.duration > LONG_RUNNING_SECONDS
            || record.end - record.begin > Duration::seconds(LONG_RUNNING_SECONDS)
        {
            out.push(Violation::new(
                codes::LONG_RUNNING,
                "duration",
                "Maximum duration of 24 hours exceeded.",
            ));
        }
        let gross = (record.end - record.begin).num_seconds().max(0);
        if record.break_duration < 0 || record.break_duration > gross {
            out.push(Violation::new(
                codes::INVALID_BREAK,
                "break",
                "The break cannot be longer than the duration.",
            ));
        }
        if let (Some(activity), Some(project)) = (self.activity, self.project) {
            if activity.project_id.is_some() && activity.project_id != project.id {
                out.push(Violation::new(
                    codes::ACTIVITY_MISMATCH,
                    "activity",
                    "Activity does not belong to the selected project.",
                ));
            }
        }
        if self.activity.is_some_and(|a| !a.visible) {
            out.push(Violation::new(
                codes::ACTIVITY_DISABLED,
                "activity",
                "Cannot start a disabled activity.",
            ));
        }
        if self.project.is_some_and(|p| !p.visible) {
            out.push(Violation::new(
                codes::PROJECT_DISABLED,
                "project",
                "Cannot start a disabled project.",
            ));
        }
        if self.customer.is_some_and(|c| !c.visible) {
            out.push(Violation::new(
                codes::CUSTOMER_DISABLED,
                "customer",
                "Cannot start a disabled customer.",
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CustomerDefaults;
    use chrono::{TimeZone, Utc};

    fn codes_of(violations: &[Violation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.code).collect()
    }

    #[test]
    fn test_customer_defaults_are_valid() {
        let customer = Customer::new("ACME", &CustomerDefaults::default());
        assert!(customer.violations().is_empty());
    }

    #[test]
    fn test_customer_name_limits() {
        let defaults = CustomerDefaults::default();
        let customer = Customer::new("x".repeat(151), &defaults);
        assert_eq!(codes_of(&customer.violations()), vec![codes::NAME_TOO_LONG]);

        let customer = Customer::new("   ", &defaults);
        assert_eq!(codes_of(&customer.violations()), vec![codes::NAME_REQUIRED]);
    }

    #[test]
    fn test_customer_codes_and_timezone() {
        let mut customer = Customer::new("ACME", &CustomerDefaults::default());
        customer.country = "de".to_string();
        customer.currency = "EURO".to_string();
        customer.timezone = "Mars/Olympus".to_string();
        customer.color = Some("red".to_string());
        customer.email = Some("not-an-email".to_string());
        assert_eq!(
            codes_of(&customer.violations()),
            vec![
                codes::INVALID_COUNTRY,
                codes::INVALID_CURRENCY,
                codes::INVALID_TIMEZONE,
                codes::INVALID_EMAIL,
                codes::INVALID_COLOR,
            ]
        );
    }

    #[test]
    fn test_project_dates_and_order_number() {
        let mut project = Project::new("Website", None);
        project.start = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        project.end = Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        project.order_number = Some("9".repeat(51));
        assert_eq!(
            codes_of(&project.violations()),
            vec![codes::TOO_LONG, codes::END_BEFORE_BEGIN]
        );
    }

    #[test]
    fn test_team_requires_teamlead() {
        let mut team = Team::new("Ops");
        team.add_user(1);
        assert_eq!(codes_of(&team.violations()), vec![codes::MISSING_TEAMLEAD]);
        team.add_teamlead(1);
        assert!(team.violations().is_empty());
    }

    #[test]
    fn test_zero_duration_is_skipped_for_imports() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let record = Timesheet::new(at, at, 0);
        let check = TimesheetCheck::new(&record);
        assert_eq!(codes_of(&check.violations()), vec![codes::ZERO_DURATION]);
        assert!(check.import_errors().is_empty());
    }

    #[test]
    fn test_end_before_begin_is_reported() {
        let begin = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let record = Timesheet::new(begin, end, 3600);
        let errors = TimesheetCheck::new(&record).import_errors();
        assert!(errors
            .iter()
            .any(|e| e.starts_with("end: End date must not be earlier")));
    }

    #[test]
    fn test_activity_of_other_project_is_rejected() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let record = Timesheet::new(at, at + Duration::hours(1), 3600);
        let mut project = Project::new("Website", Some(1));
        project.id = Some(3);
        let mut activity = Activity::new("Design", Some(4));
        activity.id = Some(9);
        let check = TimesheetCheck {
            project: Some(&project),
            activity: Some(&activity),
            ..TimesheetCheck::new(&record)
        };
        assert_eq!(codes_of(&check.violations()), vec![codes::ACTIVITY_MISMATCH]);

        activity.project_id = None;
        let check = TimesheetCheck {
            project: Some(&project),
            activity: Some(&activity),
            ..TimesheetCheck::new(&record)
        };
        assert!(check.violations().is_empty());
    }

    #[test]
    fn test_disabled_project_is_ignored_on_import() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let record = Timesheet::new(at, at + Duration::hours(1), 3600);
        let mut project = Project::new("Old", Some(1));
        project.visible = false;
        let check = TimesheetCheck {
            project: Some(&project),
            ..TimesheetCheck::new(&record)
        };
        assert_eq!(codes_of(&check.violations()), vec![codes::PROJECT_DISABLED]);
        assert!(check.import_errors().is_empty());
    }
}
