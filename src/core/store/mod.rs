//! Destination store
//!
//! The importers only talk to the [`Store`] trait: natural-key lookups,
//! saves that assign ids, and a flush boundary for batched writes.
//! [`SqliteStore`] is the implementation used by the CLI.

mod queries;
mod schema;
mod writes;

use miette::Diagnostic;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::{Activity, Customer, Project, Rate, Tag, Team, Timesheet, User};

/// Current schema version; a store with another version is refused
const SCHEMA_VERSION: i32 = 1;

/// Tables reported by [`SqliteStore::counts`]
const COUNTED_TABLES: &[&str] = &[
    "customers",
    "projects",
    "activities",
    "users",
    "tags",
    "timesheets",
    "teams",
    "rates",
];

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("Database error: {0}")]
    #[diagnostic(code(tsi::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot open store at {path}: {message}")]
    #[diagnostic(code(tsi::store::open))]
    Open { path: PathBuf, message: String },

    #[error("Store schema version {found} is not supported (expected {expected})")]
    #[diagnostic(
        code(tsi::store::schema),
        help("Import into a new workspace created with this version of tsi")
    )]
    SchemaMismatch { found: i32, expected: i32 },

    #[error("Cannot save {kind} \"{name}\": {reason}")]
    #[diagnostic(code(tsi::store::constraint))]
    Constraint {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

/// Kinds of entity that carry a legacy import id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportedKind {
    Customer,
    Project,
    Activity,
    User,
}

/// A saved entity that came from a legacy instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportedRecord {
    /// Id in the legacy source
    pub imported_id: i64,
    /// Id in this store
    pub id: i64,
    /// Customer of a project, project of an activity
    pub parent_id: Option<i64>,
}

/// Persistence collaborator of the importers
pub trait Store {
    fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError>;

    fn find_project(&self, name: &str, customer_id: i64) -> Result<Option<Project>, StoreError>;

    /// `project_id == None` looks for a global activity
    fn find_activity(
        &self,
        name: &str,
        project_id: Option<i64>,
    ) -> Result<Option<Activity>, StoreError>;

    fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    fn find_user_by_alias(&self, alias: &str) -> Result<Option<User>, StoreError>;

    fn find_tag(&self, name: &str) -> Result<Option<Tag>, StoreError>;

    /// Entities imported from the legacy instance `instance`
    fn imported(
        &self,
        kind: ImportedKind,
        instance: &str,
    ) -> Result<Vec<ImportedRecord>, StoreError>;

    fn save_customer(&mut self, customer: &mut Customer) -> Result<(), StoreError>;

    fn save_project(&mut self, project: &mut Project) -> Result<(), StoreError>;

    fn save_activity(&mut self, activity: &mut Activity) -> Result<(), StoreError>;

    fn save_user(&mut self, user: &mut User) -> Result<(), StoreError>;

    fn save_tag(&mut self, tag: &mut Tag) -> Result<(), StoreError>;

    fn save_timesheet(&mut self, timesheet: &mut Timesheet) -> Result<(), StoreError>;

    fn save_team(&mut self, team: &mut Team) -> Result<(), StoreError>;

    fn save_rate(&mut self, rate: &mut Rate) -> Result<(), StoreError>;

    /// Group following writes until [`Store::flush`]
    fn begin_batch(&mut self) -> Result<(), StoreError>;

    /// Make all writes since [`Store::begin_batch`] durable
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// The destination store backed by SQLite
pub struct SqliteStore {
    conn: Connection,
    writes: usize,
}

impl SqliteStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut store = Self { conn, writes: 0 };
        store.init_schema()?;
        Ok(store)
    }

    /// Number of save calls since the store was opened
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Row counts per entity table
    pub fn counts(&self) -> Result<Vec<(&'static str, i64)>, StoreError> {
        COUNTED_TABLES
            .iter()
            .map(|table| {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", table),
                    [],
                    |row| row.get(0),
                )?;
                Ok((*table, count))
            })
            .collect()
    }
}

#[cfg(test)]
impl SqliteStore {
    pub(crate) fn query_i64(&self, sql: &str) -> Result<i64, StoreError> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    pub(crate) fn query_text(&self, sql: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}

impl Store for SqliteStore {
    fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, StoreError> {
        self.customer_where("name = ?1", name)
    }

    fn find_project(&self, name: &str, customer_id: i64) -> Result<Option<Project>, StoreError> {
        self.project_by_name(name, customer_id)
    }

    fn find_activity(
        &self,
        name: &str,
        project_id: Option<i64>,
    ) -> Result<Option<Activity>, StoreError> {
        self.activity_by_name(name, project_id)
    }

    fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.user_where("id = CAST(?1 AS INTEGER)", &id.to_string())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.user_where("email = ?1 COLLATE NOCASE", email)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.user_where("username = ?1", username)
    }

    fn find_user_by_alias(&self, alias: &str) -> Result<Option<User>, StoreError> {
        self.user_where("alias = ?1", alias)
    }

    fn find_tag(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        self.tag_by_name(name)
    }

    fn imported(
        &self,
        kind: ImportedKind,
        instance: &str,
    ) -> Result<Vec<ImportedRecord>, StoreError> {
        self.imported_records(kind, instance)
    }

    fn save_customer(&mut self, customer: &mut Customer) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_customer(customer)
    }

    fn save_project(&mut self, project: &mut Project) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_project(project)
    }

    fn save_activity(&mut self, activity: &mut Activity) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_activity(activity)
    }

    fn save_user(&mut self, user: &mut User) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_user(user)
    }

    fn save_tag(&mut self, tag: &mut Tag) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_tag(tag)
    }

    fn save_timesheet(&mut self, timesheet: &mut Timesheet) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_timesheet(timesheet)
    }

    fn save_team(&mut self, team: &mut Team) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_team(team)
    }

    fn save_rate(&mut self, rate: &mut Rate) -> Result<(), StoreError> {
        self.writes += 1;
        self.write_rate(rate)
    }

    fn begin_batch(&mut self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CustomerDefaults, RateScope, IMPORTED_FROM, IMPORTED_ID};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn store_with_customer(name: &str) -> (SqliteStore, Customer) {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut customer = Customer::new(name, &CustomerDefaults::default());
        store.save_customer(&mut customer).unwrap();
        (store, customer)
    }

    #[test]
    fn test_save_assigns_id_and_find_roundtrips() {
        let (store, mut customer) = store_with_customer("ACME");
        assert!(customer.id.is_some());

        customer.meta.insert("crm".to_string(), "42".to_string());
        let mut store = store;
        store.save_customer(&mut customer).unwrap();

        let found = store.find_customer_by_name("ACME").unwrap().unwrap();
        assert_eq!(found, customer);
        assert!(store.find_customer_by_name("acme").unwrap().is_none());
    }

    #[test]
    fn test_activity_scope_lookup() {
        let (mut store, customer) = store_with_customer("ACME");
        let mut project = Project::new("Website", customer.id);
        store.save_project(&mut project).unwrap();

        let mut global = Activity::new("Meeting", None);
        let mut scoped = Activity::new("Meeting", project.id);
        store.save_activity(&mut global).unwrap();
        store.save_activity(&mut scoped).unwrap();

        let found_global = store.find_activity("Meeting", None).unwrap().unwrap();
        let found_scoped = store.find_activity("Meeting", project.id).unwrap().unwrap();
        assert_eq!(found_global.id, global.id);
        assert_eq!(found_scoped.id, scoped.id);
        assert_ne!(found_global.id, found_scoped.id);
    }

    #[test]
    fn test_user_lookups() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut user = User::new("alice", "Alice@Example.com");
        user.alias = Some("Alice A.".to_string());
        user.set_preference("timezone", "Europe/Berlin");
        store.save_user(&mut user).unwrap();

        let by_email = store.find_user_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.timezone(), Some("Europe/Berlin"));
        assert!(store.find_user_by_username("alice").unwrap().is_some());
        assert!(store.find_user_by_alias("Alice A.").unwrap().is_some());
        assert!(store.find_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_timesheet_requires_saved_references() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let begin = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut record = Timesheet::new(begin, begin, 0);
        let result = store.save_timesheet(&mut record);
        assert!(matches!(result, Err(StoreError::Constraint { .. })));
    }

    #[test]
    fn test_imported_records_are_scoped_by_instance() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for (instance, legacy_id) in [("kimai_", "7"), ("other_", "7")] {
            let mut customer = Customer::new(
                format!("{}customer", instance),
                &CustomerDefaults::default(),
            );
            customer.meta.insert(IMPORTED_ID.to_string(), legacy_id.to_string());
            customer.meta.insert(IMPORTED_FROM.to_string(), instance.to_string());
            store.save_customer(&mut customer).unwrap();
        }

        let records = store.imported(ImportedKind::Customer, "kimai_").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].imported_id, 7);
    }

    #[test]
    fn test_rates_and_counts() {
        let (mut store, customer) = store_with_customer("ACME");
        let mut project = Project::new("Website", customer.id);
        store.save_project(&mut project).unwrap();
        let mut rate = Rate::fixed(RateScope::Project(project.id.unwrap()), 250.0);
        store.save_rate(&mut rate).unwrap();

        let counts = store.counts().unwrap();
        assert!(counts.contains(&("customers", 1)));
        assert!(counts.contains(&("projects", 1)));
        assert!(counts.contains(&("rates", 1)));
        assert_eq!(store.writes(), 3);
    }

    #[test]
    fn test_batch_is_committed_on_flush() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("store.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.begin_batch().unwrap();
            let mut tag = Tag::new("billable");
            store.save_tag(&mut tag).unwrap();
            store.flush().unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.find_tag("billable").unwrap().is_some());
    }
}
