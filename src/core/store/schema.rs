//! Destination store schema

use rusqlite::{params, OptionalExtension};

use super::{SqliteStore, StoreError, SCHEMA_VERSION};

impl SqliteStore {
    /// Create tables on a fresh database and check the version of an existing one
    pub(super) fn init_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                number TEXT,
                comment TEXT,
                company TEXT,
                vat_id TEXT,
                contact TEXT,
                address TEXT,
                country TEXT NOT NULL,
                currency TEXT NOT NULL,
                timezone TEXT NOT NULL,
                phone TEXT,
                fax TEXT,
                mobile TEXT,
                email TEXT,
                homepage TEXT,
                color TEXT,
                visible INTEGER NOT NULL DEFAULT 1,
                budget REAL NOT NULL DEFAULT 0,
                time_budget INTEGER NOT NULL DEFAULT 0,
                budget_type TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(name);

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                name TEXT NOT NULL,
                comment TEXT,
                order_number TEXT,
                order_date TEXT,
                start_date TEXT,
                end_date TEXT,
                color TEXT,
                visible INTEGER NOT NULL DEFAULT 1,
                budget REAL NOT NULL DEFAULT 0,
                time_budget INTEGER NOT NULL DEFAULT 0,
                budget_type TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name, customer_id);

            -- Activities without project are global
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER REFERENCES projects(id),
                name TEXT NOT NULL,
                comment TEXT,
                color TEXT,
                visible INTEGER NOT NULL DEFAULT 1,
                budget REAL NOT NULL DEFAULT 0,
                time_budget INTEGER NOT NULL DEFAULT 0,
                budget_type TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_activities_name ON activities(name, project_id);

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                alias TEXT,
                account_number TEXT,
                enabled INTEGER NOT NULL DEFAULT 1,
                roles TEXT NOT NULL,
                password TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_users_alias ON users(alias);

            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (user_id, name)
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS timesheets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                project_id INTEGER NOT NULL REFERENCES projects(id),
                activity_id INTEGER NOT NULL REFERENCES activities(id),
                begin_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                timezone TEXT NOT NULL,
                duration INTEGER NOT NULL,
                break_seconds INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                rate REAL NOT NULL DEFAULT 0,
                hourly_rate REAL,
                fixed_rate REAL,
                internal_rate REAL,
                billable INTEGER NOT NULL DEFAULT 1,
                exported INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_timesheets_user ON timesheets(user_id);

            CREATE TABLE IF NOT EXISTS timesheet_tags (
                timesheet_id INTEGER NOT NULL REFERENCES timesheets(id),
                tag_id INTEGER NOT NULL REFERENCES tags(id),
                PRIMARY KEY (timesheet_id, tag_id)
            );

            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_members (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                user_id INTEGER NOT NULL REFERENCES users(id),
                teamlead INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (team_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS team_customers (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                PRIMARY KEY (team_id, customer_id)
            );

            CREATE TABLE IF NOT EXISTS team_projects (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                project_id INTEGER NOT NULL REFERENCES projects(id),
                PRIMARY KEY (team_id, project_id)
            );

            CREATE TABLE IF NOT EXISTS team_activities (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                activity_id INTEGER NOT NULL REFERENCES activities(id),
                PRIMARY KEY (team_id, activity_id)
            );

            -- Project rates have no activity, activity rates no project
            CREATE TABLE IF NOT EXISTS rates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER REFERENCES projects(id),
                activity_id INTEGER REFERENCES activities(id),
                user_id INTEGER REFERENCES users(id),
                rate REAL NOT NULL,
                fixed INTEGER NOT NULL DEFAULT 0
            );

            -- Meta fields
            CREATE TABLE IF NOT EXISTS customer_meta (
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                name TEXT NOT NULL,
                value TEXT,
                PRIMARY KEY (customer_id, name)
            );

            CREATE TABLE IF NOT EXISTS project_meta (
                project_id INTEGER NOT NULL REFERENCES projects(id),
                name TEXT NOT NULL,
                value TEXT,
                PRIMARY KEY (project_id, name)
            );

            CREATE TABLE IF NOT EXISTS activity_meta (
                activity_id INTEGER NOT NULL REFERENCES activities(id),
                name TEXT NOT NULL,
                value TEXT,
                PRIMARY KEY (activity_id, name)
            );

            CREATE TABLE IF NOT EXISTS timesheet_meta (
                timesheet_id INTEGER NOT NULL REFERENCES timesheets(id),
                name TEXT NOT NULL,
                value TEXT,
                PRIMARY KEY (timesheet_id, name)
            );
            "#,
        )?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match version {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
                Ok(())
            }
            Some(found) if found == SCHEMA_VERSION => Ok(()),
            Some(found) => Err(StoreError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            }),
        }
    }
}
