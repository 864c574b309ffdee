//! Import of complete legacy installations
//!
//! A legacy database holds one or more instances, told apart by their
//! table prefix. Every instance is checked up front, then imported in
//! order: users, customers, projects (with rates), activities, teams and
//! finally the streamed timesheet records. Caches map legacy ids to the
//! ids of the destination store and can be shared between instances
//! through [`MergeOptions`].

mod fixes;
mod importer;
pub mod model;
mod options;
mod report;
pub mod source;
mod teams;
mod validate;

use miette::Diagnostic;
use std::time::Instant;
use thiserror::Error;

use crate::core::{Store, StoreError};

use importer::LegacyImporter;

pub use options::{LegacyOptions, MergeOptions};
pub use report::{InstanceReport, LegacyCounts, LegacyReport};
pub use source::LegacySource;

#[derive(Debug, Error, Diagnostic)]
pub enum LegacyError {
    #[error("Invalid import options: {}", problems.join("; "))]
    #[diagnostic(code(tsi::legacy::options))]
    InvalidOptions { problems: Vec<String> },

    #[error("Cannot open legacy database {path}: {message}")]
    #[diagnostic(code(tsi::legacy::open))]
    Open { path: String, message: String },

    #[error("Cannot read from table \"{prefix}configuration\", make sure that your prefix \"{prefix}\" is correct.")]
    #[diagnostic(code(tsi::legacy::prefix), help("Pass the table prefix with --prefix"))]
    ConfigurationUnreadable { prefix: String },

    #[error("Import can only performed from an up-to-date legacy installation. Update at least to version {required}, found {found}.")]
    #[diagnostic(code(tsi::legacy::version))]
    VersionTooOld { required: &'static str, found: String },

    #[error("Import can only performed from an up-to-date legacy installation. Update at least to database revision {required}, found {found}.")]
    #[diagnostic(code(tsi::legacy::revision))]
    RevisionTooOld { required: &'static str, found: String },

    #[error("Import cannot be started, missing tables. Required are: {tables}")]
    #[diagnostic(code(tsi::legacy::tables))]
    MissingTables { tables: String },

    #[error("Cannot read table {table}: {source}")]
    #[diagnostic(code(tsi::legacy::fetch))]
    Fetch {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Data validation of instance \"{prefix}\" failed:\n{}", messages.join("\n"))]
    #[diagnostic(
        code(tsi::legacy::validation),
        help("Fix the data in the legacy database or try --fix-email and --skip-error-rates")
    )]
    Validation { prefix: String, messages: Vec<String> },

    #[error("Failed to validate {kind} \"{name}\": {}", messages.join("; "))]
    #[diagnostic(code(tsi::legacy::invalid))]
    Invalid {
        kind: &'static str,
        name: String,
        messages: Vec<String>,
    },

    #[error("Could not create activity \"{name}\" (ID {activity}), unknown project with ID {project}")]
    #[diagnostic(code(tsi::legacy::unknown_project))]
    UnknownProject {
        project: i64,
        activity: i64,
        name: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl LegacyError {
    pub(crate) fn fetch(table: &'static str, source: rusqlite::Error) -> Self {
        Self::Fetch { table, source }
    }
}

/// Import every instance named in `options.prefixes` from `source` into `store`
///
/// All instances are checked before the first record is written. Store
/// failures abort the run; problems with single records end up in the
/// report.
pub fn import(
    source: &LegacySource,
    store: &mut dyn Store,
    options: &LegacyOptions,
) -> Result<LegacyReport, LegacyError> {
    let problems = options.problems();
    if !problems.is_empty() {
        return Err(LegacyError::InvalidOptions { problems });
    }
    for prefix in &options.prefixes {
        source.check(prefix)?;
    }

    let started = Instant::now();
    let mut importer = LegacyImporter::new(source, store, options);
    let mut instances = Vec::with_capacity(options.prefixes.len());
    for prefix in &options.prefixes {
        let report = importer.import_instance(prefix)?;
        tracing::info!(
            prefix = %prefix,
            imported = report.counts.total(),
            errors = report.errors.len(),
            "instance imported"
        );
        instances.push(report);
    }

    Ok(LegacyReport {
        instances,
        runtime: started.elapsed(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqliteStore;
    use crate::entities::user::preference;
    use crate::entities::Role;
    use rusqlite::Connection;

    fn options() -> LegacyOptions {
        LegacyOptions {
            password: "changeme123".to_string(),
            ..LegacyOptions::default()
        }
    }

    fn source(prefixes: &[&str]) -> LegacySource {
        let conn = Connection::open_in_memory().unwrap();
        for prefix in prefixes {
            fixture::instance(&conn, prefix);
        }
        LegacySource::from_connection(conn)
    }

    #[test]
    fn test_import_instance() {
        let source = source(&["kimai_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let report = import(&source, &mut store, &options()).unwrap();

        let instance = &report.instances[0];
        assert_eq!(
            instance.counts,
            LegacyCounts {
                users: 2,
                customers: 1,
                projects: 2,
                activities: 2,
                rates: 2,
                teams: 1,
                timesheets: 3,
                placeholder_users: 1,
                timesheet_activities: 1,
            }
        );
        assert_eq!(instance.failed_timesheets, 3);
        assert!(instance
            .errors
            .contains(&"Cannot import running timesheet record, skipping: 2".to_string()));
        assert!(instance.errors.contains(
            &"Could not create timesheet record, missing project with ID: 9".to_string()
        ));
        assert!(instance.errors.contains(
            &"Could not import timesheet record, missing activity with ID: 5/1/1".to_string()
        ));
        assert!(instance
            .warnings
            .contains(&"Skipping team \"Trash\" because it is trashed.".to_string()));
        assert!(instance
            .warnings
            .contains(&"Didn't import team: Empty because it has no users.".to_string()));

        assert_eq!(store.query_i64("SELECT COUNT(*) FROM users").unwrap(), 3);
        assert_eq!(store.query_i64("SELECT COUNT(*) FROM activities").unwrap(), 3);
        assert_eq!(
            store
                .query_i64("SELECT COUNT(*) FROM users WHERE enabled = 0")
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .query_i64("SELECT SUM(duration) FROM timesheets")
                .unwrap(),
            3600 + 1800 + 3600
        );
        assert_eq!(
            store
                .query_i64("SELECT visible FROM projects WHERE name = 'Intranet'")
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_user_preferences_and_teams() {
        let source = source(&["kimai_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&source, &mut store, &options()).unwrap();

        let alice = store.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(alice.preference(preference::LANGUAGE), Some("de"));
        assert_eq!(alice.timezone(), Some("Europe/Berlin"));
        assert_eq!(alice.alias.as_deref(), Some("Alice A."));
        assert!(alice.roles.contains(&Role::SuperAdmin));
        assert!(alice.verify_password("changeme123"));

        let bob = store.find_user_by_username("bob").unwrap().unwrap();
        assert_eq!(bob.timezone(), Some("UTC"));
        assert_eq!(bob.preference(preference::HOURLY_RATE), Some("60"));

        assert_eq!(
            store
                .query_text(
                    "SELECT u.username FROM team_members m JOIN users u ON u.id = m.user_id \
                     WHERE m.teamlead = 1 ORDER BY u.username"
                )
                .unwrap(),
            vec!["alice", "bob"]
        );
        assert_eq!(
            store.query_i64("SELECT COUNT(*) FROM team_activities").unwrap(),
            1
        );
    }

    #[test]
    fn test_timesheet_meta_fields() {
        let source = source(&["kimai_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let options = LegacyOptions {
            meta_comment: Some("comment".to_string()),
            meta_location: Some("location".to_string()),
            ..options()
        };
        import(&source, &mut store, &options).unwrap();

        assert_eq!(
            store
                .query_text("SELECT value FROM timesheet_meta ORDER BY name, value")
                .unwrap(),
            vec!["Call with client", "Wireframes", "Office"]
        );
        assert_eq!(
            store
                .query_i64("SELECT COUNT(*) FROM timesheets WHERE description IS NULL")
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_reimport_uses_existing_records() {
        let source = source(&["kimai_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        import(&source, &mut store, &options()).unwrap();

        let options = LegacyOptions {
            check_already_imported: true,
            skip_teams: true,
            ..options()
        };
        let report = import(&source, &mut store, &options).unwrap();
        let counts = report.instances[0].counts;
        assert_eq!(counts.users, 0);
        assert_eq!(counts.customers, 0);
        assert_eq!(counts.activities, 0);
        assert_eq!(counts.placeholder_users, 0);
        assert_eq!(counts.timesheet_activities, 0);
        assert_eq!(counts.timesheets, 3);
        assert_eq!(store.query_i64("SELECT COUNT(*) FROM users").unwrap(), 3);
    }

    #[test]
    fn test_merged_users_across_instances() {
        let source = source(&["kimai_", "second_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let options = LegacyOptions {
            prefixes: vec!["kimai_".to_string(), "second_".to_string()],
            merge: MergeOptions {
                users: true,
                ..MergeOptions::default()
            },
            instance_team: true,
            ..options()
        };
        let report = import(&source, &mut store, &options).unwrap();

        assert_eq!(report.instances.len(), 2);
        assert_eq!(report.instances[1].counts.users, 0);
        assert_eq!(report.instances[1].counts.customers, 1);
        assert_eq!(store.query_i64("SELECT COUNT(*) FROM users").unwrap(), 4);
        assert_eq!(
            store
                .query_text("SELECT name FROM teams ORDER BY id")
                .unwrap(),
            vec!["Devs", "kimai_", "Devs", "second_"]
        );
    }

    #[test]
    fn test_checks_run_before_writing() {
        let source = source(&["kimai_"]);
        let mut store = SqliteStore::open_in_memory().unwrap();
        let options = LegacyOptions {
            prefixes: vec!["kimai_".to_string(), "other_".to_string()],
            ..options()
        };
        let err = import(&source, &mut store, &options).unwrap_err();
        assert!(matches!(err, LegacyError::ConfigurationUnreadable { ref prefix } if prefix == "other_"));
        assert_eq!(store.writes(), 0);

        let err = import(&source, &mut store, &LegacyOptions::default()).unwrap_err();
        assert!(matches!(err, LegacyError::InvalidOptions { .. }));
    }

    #[test]
    fn test_old_version_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        fixture::instance(&conn, "kimai_");
        conn.execute(
            "UPDATE kimai_configuration SET value = '0.9.3' WHERE \"option\" = 'version'",
            [],
        )
        .unwrap();
        let source = LegacySource::from_connection(conn);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = import(&source, &mut store, &options()).unwrap_err();
        assert!(matches!(err, LegacyError::VersionTooOld { .. }));
    }

    #[test]
    fn test_invalid_data_stops_the_instance() {
        let conn = Connection::open_in_memory().unwrap();
        fixture::instance(&conn, "kimai_");
        conn.execute("UPDATE kimai_users SET mail = '' WHERE userID = 2", [])
            .unwrap();
        let source = LegacySource::from_connection(conn);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = import(&source, &mut store, &options()).unwrap_err();
        match err {
            LegacyError::Validation { messages, .. } => {
                assert_eq!(messages, vec!["User \"bob\" with ID 2 has no email"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let options = LegacyOptions {
            fix_email: Some("example.org".to_string()),
            ..options()
        };
        let report = import(&source, &mut store, &options).unwrap();
        assert_eq!(report.instances[0].counts.users, 2);
        assert!(store
            .find_user_by_email("bob_import@example.org")
            .unwrap()
            .is_some());
    }
}
