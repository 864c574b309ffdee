//! Settings of a legacy import

use chrono_tz::Tz;

use crate::core::config::DEFAULT_BATCH_SIZE;

/// Which caches survive from one instance to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Customers with the same legacy id are imported once
    pub customers: bool,
    /// Projects with the same legacy id are imported once
    pub projects: bool,
    /// Users with the same username and email are imported once
    pub users: bool,
    /// Teams with the same name are imported once
    pub teams: bool,
}

#[derive(Debug, Clone)]
pub struct LegacyOptions {
    /// Password of every imported user
    pub password: String,
    /// Table prefixes, one per instance, imported in this order
    pub prefixes: Vec<String>,
    pub country: String,
    pub currency: String,
    /// Default timezone of imported users and customers
    pub timezone: String,
    /// Default language of imported users
    pub language: String,
    /// Ignore project assignments and create every activity globally
    pub global_activities: bool,
    pub fix_utf8: bool,
    /// Domain for made-up addresses of users without email
    pub fix_email: Option<String>,
    pub fix_timesheet: bool,
    pub skip_error_rates: bool,
    pub merge: MergeOptions,
    /// Create one team per instance, named after its prefix
    pub instance_team: bool,
    pub alias_as_account_number: bool,
    pub meta_comment: Option<String>,
    pub meta_location: Option<String>,
    pub meta_tracking_number: Option<String>,
    pub skip_teams: bool,
    pub skip_team_customers: bool,
    pub skip_team_projects: bool,
    pub skip_team_activities: bool,
    /// Seed the caches with records of earlier runs
    pub check_already_imported: bool,
    /// Timesheet records between two flushes
    pub batch_size: usize,
}

impl Default for LegacyOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            prefixes: vec!["kimai_".to_string()],
            country: "DE".to_string(),
            currency: "EUR".to_string(),
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            global_activities: false,
            fix_utf8: false,
            fix_email: None,
            fix_timesheet: false,
            skip_error_rates: false,
            merge: MergeOptions::default(),
            instance_team: false,
            alias_as_account_number: false,
            meta_comment: None,
            meta_location: None,
            meta_tracking_number: None,
            skip_teams: false,
            skip_team_customers: false,
            skip_team_projects: false,
            skip_team_activities: false,
            check_already_imported: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LegacyOptions {
    /// Problems that make the options unusable
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.password.trim().chars().count() < 8 {
            problems.push(
                "Password length is not sufficient, at least 8 character are required".to_string(),
            );
        }
        if self.country.trim().chars().count() != 2 {
            problems.push("Country code needs to be exactly 2 character".to_string());
        }
        if self.currency.trim().chars().count() != 3 {
            problems.push("Currency code needs to be exactly 3 character".to_string());
        }
        if self.prefixes.is_empty() {
            problems.push("At least one table prefix is required".to_string());
        }
        if self.timezone.parse::<Tz>().is_err() {
            problems.push(format!("Unknown timezone: {}", self.timezone));
        }
        if let Some(domain) = &self.fix_email {
            if domain.trim().is_empty() || domain.contains('@') {
                problems.push(format!("Invalid domain for fixing emails: {}", domain));
            }
        }
        if self.batch_size == 0 {
            problems.push("Batch size must be at least 1".to_string());
        }
        problems
    }
}
