//! Destination entities written by the importers
//!
//! These mirror the records of the time-tracking application. Ids are
//! assigned by the [`Store`](crate::core::store::Store) on first save, so
//! an entity with `id == None` has never been persisted (always the case
//! during a dry run).

pub mod activity;
pub mod customer;
pub mod project;
pub mod rate;
pub mod tag;
pub mod team;
pub mod timesheet;
pub mod user;

use std::collections::BTreeMap;

pub use activity::Activity;
pub use customer::{Customer, CustomerDefaults};
pub use project::Project;
pub use rate::{Rate, RateScope};
pub use tag::Tag;
pub use team::{Team, TeamMember};
pub use timesheet::Timesheet;
pub use user::{Role, User};

/// Named extension values ("meta fields") attached to an entity
pub type MetaFields = BTreeMap<String, String>;

/// Meta field (or user preference) holding the id a record had in the legacy source
pub const IMPORTED_ID: &str = "_imported_id";

/// Meta field holding the table prefix of the legacy instance a record came from
pub const IMPORTED_FROM: &str = "_imported_from";

/// Money and time budget shared by customers, projects and activities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budget {
    pub money: f64,
    /// Time budget in seconds
    pub time: i64,
    /// `None` for a lifetime budget, `Some("month")` for a monthly one
    pub kind: Option<String>,
}

impl Budget {
    pub const MONTHLY: &'static str = "month";

    pub fn is_empty(&self) -> bool {
        self.money == 0.0 && self.time == 0 && self.kind.is_none()
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("Grüße", 3), "Grü");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_empty_budget() {
        assert!(Budget::default().is_empty());
        let budget = Budget {
            money: 10.0,
            ..Budget::default()
        };
        assert!(!budget.is_empty());
    }
}
