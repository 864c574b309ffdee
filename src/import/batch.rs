//! Import results: per-row outcomes and summary status lines

use serde::Serialize;

use crate::core::StoreError;

/// Where a row got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    #[default]
    Pending,
    Validated,
    Resolved,
    Mapped,
    Persisted,
    /// Mapped but not written (dry run)
    Skipped,
    Failed,
}

/// Why a row was not imported
///
/// `Invalid` is recorded on the row and the batch continues; `Store`
/// means the destination failed and the whole run stops.
#[derive(Debug)]
pub enum RowFailure {
    Invalid(Vec<String>),
    Store(StoreError),
}

impl RowFailure {
    pub fn invalid(message: impl Into<String>) -> Self {
        RowFailure::Invalid(vec![message.into()])
    }
}

impl From<StoreError> for RowFailure {
    fn from(e: StoreError) -> Self {
        RowFailure::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    /// 1-based position in the input
    pub number: usize,
    /// Values lined up with [`ImportData::header`]
    pub values: Vec<String>,
    pub errors: Vec<String>,
    pub state: RowState,
}

impl ImportRow {
    pub fn new(number: usize, values: Vec<String>) -> Self {
        Self {
            number,
            values,
            errors: Vec::new(),
            state: RowState::Pending,
        }
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn fail(&mut self, errors: Vec<String>) {
        self.errors.extend(errors);
        self.state = RowState::Failed;
    }
}

/// Number of entities per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub customers: usize,
    pub projects: usize,
    pub activities: usize,
    pub tags: usize,
    pub users: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.customers + self.projects + self.activities + self.tags + self.users
    }

    /// `"{verb} N customers"` etc. for every non-zero kind
    pub fn status_lines(&self, verb: &str) -> Vec<String> {
        [
            (self.customers, "customers"),
            (self.projects, "projects"),
            (self.activities, "activities"),
            (self.tags, "tags"),
            (self.users, "users"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, kind)| format!("{} {} {}", verb, count, kind))
        .collect()
    }
}

/// The outcome of one import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub status: Vec<String>,
    pub dry_run: bool,
    pub created: EntityCounts,
    pub updated: EntityCounts,
}

impl ImportData {
    pub fn new(title: impl Into<String>, header: Vec<String>, dry_run: bool) -> Self {
        Self {
            title: title.into(),
            header,
            rows: Vec::new(),
            status: Vec::new(),
            dry_run,
            created: EntityCounts::default(),
            updated: EntityCounts::default(),
        }
    }

    pub fn add_row(&mut self, row: ImportRow) {
        self.rows.push(row);
    }

    pub fn count_rows(&self) -> usize {
        self.rows.len()
    }

    /// Rows with at least one error
    pub fn count_errors(&self) -> usize {
        self.rows.iter().filter(|row| row.has_error()).count()
    }

    /// Fill the status lines from the counters
    pub fn summarize(&mut self) {
        let (create, update) = if self.dry_run {
            ("create", "update")
        } else {
            ("created", "updated")
        };

        let mut status = Vec::new();
        if self.count_rows() > 0 {
            status.push(format!("processed {} rows", self.count_rows()));
        }
        if self.count_errors() > 0 {
            status.push(format!("failed {} rows", self.count_errors()));
        }
        status.extend(self.created.status_lines(create));
        status.extend(self.updated.status_lines(update));
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let mut data = ImportData::new("time_tracking", vec!["User".to_string()], false);
        let mut ok = ImportRow::new(1, vec!["alice".to_string()]);
        ok.state = RowState::Persisted;
        let mut bad = ImportRow::new(2, vec![String::new()]);
        bad.fail(vec![
            "Empty or missing field: User".to_string(),
            "Empty or missing field: Project".to_string(),
        ]);
        data.add_row(ok);
        data.add_row(bad);
        data.created.customers = 1;
        data.created.tags = 2;
        data.summarize();

        assert_eq!(
            data.status,
            vec![
                "processed 2 rows",
                "failed 1 rows",
                "created 1 customers",
                "created 2 tags",
            ]
        );
    }

    #[test]
    fn test_dry_run_wording() {
        let mut data = ImportData::new("customers", Vec::new(), true);
        data.add_row(ImportRow::new(1, Vec::new()));
        data.updated.customers = 1;
        data.summarize();
        assert_eq!(data.status, vec!["processed 1 rows", "update 1 customers"]);
    }
}
