//! Read queries of the SQLite store

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

use super::{ImportedKind, ImportedRecord, SqliteStore, StoreError};
use crate::entities::{
    Activity, Budget, Customer, MetaFields, Project, Role, Tag, User, IMPORTED_FROM, IMPORTED_ID,
};

const CUSTOMER_COLUMNS: &str = "id, name, number, comment, company, vat_id, contact, address, \
     country, currency, timezone, phone, fax, mobile, email, homepage, color, visible, \
     budget, time_budget, budget_type";

const PROJECT_COLUMNS: &str = "id, customer_id, name, comment, order_number, order_date, \
     start_date, end_date, color, visible, budget, time_budget, budget_type";

const ACTIVITY_COLUMNS: &str =
    "id, project_id, name, comment, color, visible, budget, time_budget, budget_type";

const USER_COLUMNS: &str = "id, username, email, alias, account_number, enabled, roles, password";

impl SqliteStore {
    pub(super) fn customer_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<Customer>, StoreError> {
        let sql = format!(
            "SELECT {} FROM customers WHERE {} ORDER BY id LIMIT 1",
            CUSTOMER_COLUMNS, condition
        );
        let customer = self
            .conn
            .query_row(&sql, params![value], customer_from_row)
            .optional()?;
        match customer {
            Some(mut customer) => {
                customer.meta = self.load_meta("customer_meta", "customer_id", customer.id)?;
                Ok(Some(customer))
            }
            None => Ok(None),
        }
    }

    pub(super) fn project_by_name(
        &self,
        name: &str,
        customer_id: i64,
    ) -> Result<Option<Project>, StoreError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE name = ?1 AND customer_id = ?2 ORDER BY id LIMIT 1",
            PROJECT_COLUMNS
        );
        let project = self
            .conn
            .query_row(&sql, params![name, customer_id], project_from_row)
            .optional()?;
        match project {
            Some(mut project) => {
                project.meta = self.load_meta("project_meta", "project_id", project.id)?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    pub(super) fn activity_by_name(
        &self,
        name: &str,
        project_id: Option<i64>,
    ) -> Result<Option<Activity>, StoreError> {
        let sql = format!(
            "SELECT {} FROM activities WHERE name = ?1 AND project_id IS ?2 ORDER BY id LIMIT 1",
            ACTIVITY_COLUMNS
        );
        let activity = self
            .conn
            .query_row(&sql, params![name, project_id], activity_from_row)
            .optional()?;
        match activity {
            Some(mut activity) => {
                activity.meta = self.load_meta("activity_meta", "activity_id", activity.id)?;
                Ok(Some(activity))
            }
            None => Ok(None),
        }
    }

    pub(super) fn user_where(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY id LIMIT 1",
            USER_COLUMNS, condition
        );
        let user = self
            .conn
            .query_row(&sql, params![value], user_from_row)
            .optional()?;
        match user {
            Some(mut user) => {
                user.preferences = self.load_preferences(user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub(super) fn tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, name FROM tags WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Tag {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(tag)
    }

    pub(super) fn imported_records(
        &self,
        kind: ImportedKind,
        instance: &str,
    ) -> Result<Vec<ImportedRecord>, StoreError> {
        let sql = match kind {
            ImportedKind::Customer => {
                "SELECT m.value, e.id, NULL FROM customers e
                 JOIN customer_meta m ON m.customer_id = e.id AND m.name = ?1
                 JOIN customer_meta f ON f.customer_id = e.id AND f.name = ?2 AND f.value = ?3"
            }
            ImportedKind::Project => {
                "SELECT m.value, e.id, e.customer_id FROM projects e
                 JOIN project_meta m ON m.project_id = e.id AND m.name = ?1
                 JOIN project_meta f ON f.project_id = e.id AND f.name = ?2 AND f.value = ?3"
            }
            ImportedKind::Activity => {
                "SELECT m.value, e.id, e.project_id FROM activities e
                 JOIN activity_meta m ON m.activity_id = e.id AND m.name = ?1
                 JOIN activity_meta f ON f.activity_id = e.id AND f.name = ?2 AND f.value = ?3"
            }
            ImportedKind::User => {
                "SELECT m.value, e.id, NULL FROM users e
                 JOIN user_preferences m ON m.user_id = e.id AND m.name = ?1
                 JOIN user_preferences f ON f.user_id = e.id AND f.name = ?2 AND f.value = ?3"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![IMPORTED_ID, IMPORTED_FROM, instance], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Values that are not numeric were not written by the legacy importer
        Ok(rows
            .into_iter()
            .filter_map(|(value, id, parent_id)| {
                let imported_id = value?.trim().parse::<i64>().ok()?;
                Some(ImportedRecord {
                    imported_id,
                    id,
                    parent_id,
                })
            })
            .collect())
    }

    fn load_meta(
        &self,
        table: &str,
        owner_column: &str,
        owner: Option<i64>,
    ) -> Result<MetaFields, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name, value FROM {} WHERE {} = ?1",
            table, owner_column
        ))?;
        let meta = stmt
            .query_map(params![owner], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or_default()))
            .collect();
        Ok(meta)
    }

    fn load_preferences(&self, user: Option<i64>) -> Result<BTreeMap<String, String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM user_preferences WHERE user_id = ?1")?;
        let preferences = stmt
            .query_map(params![user], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<BTreeMap<String, String>, _>>()?;
        Ok(preferences)
    }
}

fn customer_from_row(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        number: row.get(2)?,
        comment: row.get(3)?,
        company: row.get(4)?,
        vat_id: row.get(5)?,
        contact: row.get(6)?,
        address: row.get(7)?,
        country: row.get(8)?,
        currency: row.get(9)?,
        timezone: row.get(10)?,
        phone: row.get(11)?,
        fax: row.get(12)?,
        mobile: row.get(13)?,
        email: row.get(14)?,
        homepage: row.get(15)?,
        color: row.get(16)?,
        visible: row.get(17)?,
        budget: Budget {
            money: row.get(18)?,
            time: row.get(19)?,
            kind: row.get(20)?,
        },
        meta: MetaFields::new(),
    })
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: Some(row.get(0)?),
        customer_id: row.get(1)?,
        name: row.get(2)?,
        comment: row.get(3)?,
        order_number: row.get(4)?,
        order_date: datetime_column(row, 5)?,
        start: datetime_column(row, 6)?,
        end: datetime_column(row, 7)?,
        color: row.get(8)?,
        visible: row.get(9)?,
        budget: Budget {
            money: row.get(10)?,
            time: row.get(11)?,
            kind: row.get(12)?,
        },
        meta: MetaFields::new(),
    })
}

fn activity_from_row(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: Some(row.get(0)?),
        project_id: row.get(1)?,
        name: row.get(2)?,
        comment: row.get(3)?,
        color: row.get(4)?,
        visible: row.get(5)?,
        budget: Budget {
            money: row.get(6)?,
            time: row.get(7)?,
            kind: row.get(8)?,
        },
        meta: MetaFields::new(),
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let roles: String = row.get(6)?;
    let roles = roles
        .split(',')
        .filter(|r| !r.is_empty())
        .map(|r| {
            r.parse::<Role>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into())
            })
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(User {
        id: Some(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        alias: row.get(3)?,
        account_number: row.get(4)?,
        enabled: row.get(5)?,
        roles,
        password: row.get(7)?,
        preferences: BTreeMap::new(),
    })
}

fn datetime_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}
