//! Read-only access to a legacy database

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::cmp::Ordering;
use std::path::Path;

use super::model::{
    Fields, FromSource, GroupLink, GroupMember, OldGroup, OldPreference, OldTimesheet,
    ProjectActivity, Snapshot,
};
use super::LegacyError;

/// Oldest supported legacy release
pub const MIN_VERSION: &str = "1.0.1";
/// Oldest supported legacy database revision
pub const MIN_REVISION: &str = "1388";

/// Tables every instance must have, without prefix
pub const REQUIRED_TABLES: &[&str] = &[
    "preferences",
    "users",
    "customers",
    "projects",
    "activities",
    "projects_activities",
    "timeSheet",
    "fixedRates",
    "rates",
    "groups",
    "groups_customers",
    "groups_projects",
    "groups_users",
    "groups_activities",
];

/// A legacy database, never written to
pub struct LegacySource {
    conn: Connection,
}

impl LegacySource {
    pub fn open(path: &Path) -> Result<Self, LegacyError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LegacyError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Refuse instances that are too old or incomplete
    pub fn check(&self, prefix: &str) -> Result<(), LegacyError> {
        let configuration = table(prefix, "configuration");
        self.conn
            .prepare(&format!("SELECT 1 FROM {}", configuration))
            .and_then(|mut stmt| stmt.exists([]))
            .map_err(|_| LegacyError::ConfigurationUnreadable {
                prefix: prefix.to_string(),
            })?;

        let version = self.setting(prefix, "version")?.unwrap_or_else(|| "0.0".into());
        if compare_versions(MIN_VERSION, &version) == Ordering::Greater {
            return Err(LegacyError::VersionTooOld {
                required: MIN_VERSION,
                found: version,
            });
        }

        let revision = self.setting(prefix, "revision")?.unwrap_or_else(|| "0".into());
        if compare_versions(MIN_REVISION, &revision) == Ordering::Greater {
            return Err(LegacyError::RevisionTooOld {
                required: MIN_REVISION,
                found: revision,
            });
        }

        let existing = self.table_names()?;
        let required: Vec<String> = REQUIRED_TABLES
            .iter()
            .map(|name| format!("{}{}", prefix, name))
            .collect();
        let complete = required
            .iter()
            .all(|name| existing.iter().any(|e| e.eq_ignore_ascii_case(name)));
        if !complete {
            return Err(LegacyError::MissingTables {
                tables: required.join(", "),
            });
        }
        Ok(())
    }

    fn setting(&self, prefix: &str, option: &str) -> Result<Option<String>, LegacyError> {
        let sql = format!(
            "SELECT value FROM {} WHERE \"option\" = ?1",
            table(prefix, "configuration")
        );
        self.conn
            .query_row(&sql, params![option], |row| Fields(row).text("value"))
            .optional()
            .map(Option::flatten)
            .map_err(|e| LegacyError::fetch("configuration", e))
    }

    fn table_names(&self) -> Result<Vec<String>, LegacyError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .map_err(|e| LegacyError::fetch("sqlite_master", e))?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
            .map_err(|e| LegacyError::fetch("sqlite_master", e))?;
        Ok(names)
    }

    /// All rows of `{prefix}{name}`, read with `read`
    fn fetch_with<T>(
        &self,
        prefix: &str,
        name: &'static str,
        read: impl Fn(&Fields<'_, '_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, LegacyError> {
        let sql = format!("SELECT * FROM {}", table(prefix, name));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| LegacyError::fetch(name, e))?;
        let rows = stmt
            .query_map([], |row| read(&Fields(row)))
            .and_then(|rows| rows.collect::<Result<Vec<T>, _>>())
            .map_err(|e| LegacyError::fetch(name, e))?;
        Ok(rows)
    }

    pub fn fetch<T: FromSource>(&self, prefix: &str, name: &'static str) -> Result<Vec<T>, LegacyError> {
        self.fetch_with(prefix, name, T::from_source)
    }

    /// Users, customers, projects, activities and rates of one instance
    pub fn snapshot(&self, prefix: &str) -> Result<Snapshot, LegacyError> {
        Ok(Snapshot {
            users: self.fetch(prefix, "users")?,
            customers: self.fetch(prefix, "customers")?,
            projects: self.fetch(prefix, "projects")?,
            activities: self.fetch(prefix, "activities")?,
            fixed_rates: self.fetch(prefix, "fixedRates")?,
            rates: self.fetch(prefix, "rates")?,
        })
    }

    pub fn preferences(&self, prefix: &str, user_id: i64) -> Result<Vec<OldPreference>, LegacyError> {
        let sql = format!(
            "SELECT * FROM {} WHERE userID = ?1",
            table(prefix, "preferences")
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| LegacyError::fetch("preferences", e))?;
        let rows = stmt
            .query_map(params![user_id], |row| OldPreference::from_source(&Fields(row)))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| LegacyError::fetch("preferences", e))?;
        Ok(rows)
    }

    pub fn project_activities(&self, prefix: &str) -> Result<Vec<ProjectActivity>, LegacyError> {
        self.fetch(prefix, "projects_activities")
    }

    pub fn groups(&self, prefix: &str) -> Result<Vec<OldGroup>, LegacyError> {
        self.fetch(prefix, "groups")
    }

    pub fn group_members(&self, prefix: &str) -> Result<Vec<GroupMember>, LegacyError> {
        self.fetch(prefix, "groups_users")
    }

    /// `name` is one of `groups_customers`, `groups_projects`, `groups_activities`
    pub fn group_links(
        &self,
        prefix: &str,
        name: &'static str,
        column: &'static str,
    ) -> Result<Vec<GroupLink>, LegacyError> {
        self.fetch_with(prefix, name, GroupLink::reader(column))
    }

    pub fn count_timesheets(&self, prefix: &str) -> Result<i64, LegacyError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(prefix, "timeSheet"));
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| LegacyError::fetch("timeSheet", e))
    }

    /// Feed every timesheet record to `visit` in id order
    ///
    /// Records are streamed; `visit` may stop the walk by returning an error.
    pub fn each_timesheet(
        &self,
        prefix: &str,
        mut visit: impl FnMut(OldTimesheet) -> Result<(), LegacyError>,
    ) -> Result<(), LegacyError> {
        let sql = format!(
            "SELECT * FROM {} ORDER BY timeEntryID",
            table(prefix, "timeSheet")
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| LegacyError::fetch("timeSheet", e))?;
        let mut rows = stmt.query([]).map_err(|e| LegacyError::fetch("timeSheet", e))?;
        while let Some(row) = rows.next().map_err(|e| LegacyError::fetch("timeSheet", e))? {
            let record = OldTimesheet::from_source(&Fields(row))
                .map_err(|e| LegacyError::fetch("timeSheet", e))?;
            visit(record)?;
        }
        Ok(())
    }
}

/// Quoted name of a prefixed table
fn table(prefix: &str, name: &str) -> String {
    format!("\"{}{}\"", prefix.replace('"', "\"\""), name)
}

/// Compare dotted version strings numerically, missing parts count as 0
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parts = |v: &str| -> Vec<u64> {
        v.trim()
            .split(['.', '-', '_', '+'])
            .map(|part| {
                part.chars()
                    .take_while(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .unwrap_or(0)
            })
            .collect()
    };
    let (a, b) = (parts(a), parts(b));
    for i in 0..a.len().max(b.len()) {
        let ordering = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
