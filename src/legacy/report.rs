//! Outcome of a legacy import

use serde::Serialize;
use std::time::Duration;

/// Records written for one instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegacyCounts {
    pub users: usize,
    pub customers: usize,
    pub projects: usize,
    pub activities: usize,
    pub rates: usize,
    pub teams: usize,
    pub timesheets: usize,
    /// Disabled users created for timesheets of unknown users
    pub placeholder_users: usize,
    /// Project activities created while importing timesheets
    pub timesheet_activities: usize,
}

impl LegacyCounts {
    pub fn total(&self) -> usize {
        self.users
            + self.customers
            + self.projects
            + self.activities
            + self.rates
            + self.teams
            + self.timesheets
            + self.placeholder_users
            + self.timesheet_activities
    }

    /// Label and count of every kind, in import order
    pub fn lines(&self) -> [(&'static str, usize); 9] {
        [
            ("users", self.users),
            ("customers", self.customers),
            ("projects", self.projects),
            ("activities", self.activities),
            ("rates", self.rates),
            ("teams", self.teams),
            ("timesheets", self.timesheets),
            ("placeholder users", self.placeholder_users),
            ("timesheet activities", self.timesheet_activities),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstanceReport {
    /// Table prefix of the instance
    pub prefix: String,
    pub counts: LegacyCounts,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Timesheet records that could not be imported
    pub failed_timesheets: usize,
    /// Legacy ids of records whose activity belongs to another project
    pub mismatched_timesheets: Vec<i64>,
}

impl InstanceReport {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    pub(super) fn warn(&mut self, message: String) {
        tracing::debug!(prefix = %self.prefix, "{}", message);
        self.warnings.push(message);
    }

    pub(super) fn error(&mut self, message: String) {
        tracing::debug!(prefix = %self.prefix, "{}", message);
        self.errors.push(message);
    }

    /// A timesheet record was skipped
    pub(super) fn fail(&mut self, message: String) {
        self.failed_timesheets += 1;
        self.error(message);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LegacyReport {
    pub instances: Vec<InstanceReport>,
    pub runtime: Duration,
}

impl LegacyReport {
    /// Records written across all instances
    pub fn imported(&self) -> usize {
        self.instances.iter().map(|i| i.counts.total()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.instances.iter().any(|i| !i.errors.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut first = InstanceReport::new("kimai_");
        first.counts.users = 2;
        first.counts.timesheets = 10;
        let mut second = InstanceReport::new("other_");
        second.counts.customers = 1;
        second.fail("Cannot import running timesheet record, skipping: 4".to_string());

        let report = LegacyReport {
            instances: vec![first, second],
            runtime: Duration::from_secs(1),
        };
        assert_eq!(report.imported(), 13);
        assert!(report.has_errors());
        assert_eq!(report.instances[1].failed_timesheets, 1);
    }
}
