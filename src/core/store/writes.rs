//! Inserts and updates of the SQLite store

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use super::{SqliteStore, StoreError};
use crate::entities::{
    Activity, Customer, MetaFields, Project, Rate, RateScope, Tag, Team, Timesheet, User,
};

fn datetime_value(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl SqliteStore {
    pub(super) fn write_customer(&mut self, c: &mut Customer) -> Result<(), StoreError> {
        let sql = match c.id {
            None => {
                "INSERT INTO customers (name, number, comment, company, vat_id, contact,
                    address, country, currency, timezone, phone, fax, mobile, email,
                    homepage, color, visible, budget, time_budget, budget_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19, ?20)"
            }
            Some(_) => {
                "UPDATE customers SET name = ?1, number = ?2, comment = ?3, company = ?4,
                    vat_id = ?5, contact = ?6, address = ?7, country = ?8, currency = ?9,
                    timezone = ?10, phone = ?11, fax = ?12, mobile = ?13, email = ?14,
                    homepage = ?15, color = ?16, visible = ?17, budget = ?18,
                    time_budget = ?19, budget_type = ?20
                 WHERE id = ?21"
            }
        };
        let mut stmt = self.conn.prepare(sql)?;
        let values = params![
            c.name,
            c.number,
            c.comment,
            c.company,
            c.vat_id,
            c.contact,
            c.address,
            c.country,
            c.currency,
            c.timezone,
            c.phone,
            c.fax,
            c.mobile,
            c.email,
            c.homepage,
            c.color,
            c.visible,
            c.budget.money,
            c.budget.time,
            c.budget.kind,
        ];
        for (index, value) in values.iter().enumerate() {
            stmt.raw_bind_parameter(index + 1, value)?;
        }
        if let Some(id) = c.id {
            stmt.raw_bind_parameter(values.len() + 1, id)?;
        }
        stmt.raw_execute()?;
        drop(stmt);

        if c.id.is_none() {
            c.id = Some(self.conn.last_insert_rowid());
        }
        self.replace_meta("customer_meta", "customer_id", c.id, &c.meta)
    }

    pub(super) fn write_project(&mut self, p: &mut Project) -> Result<(), StoreError> {
        let customer_id = p.customer_id.ok_or_else(|| StoreError::Constraint {
            kind: "project",
            name: p.name.clone(),
            reason: "the customer has not been saved".to_string(),
        })?;
        let order_date = datetime_value(p.order_date);
        let start = datetime_value(p.start);
        let end = datetime_value(p.end);

        match p.id {
            None => {
                self.conn.execute(
                    "INSERT INTO projects (customer_id, name, comment, order_number, order_date,
                        start_date, end_date, color, visible, budget, time_budget, budget_type)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        customer_id,
                        p.name,
                        p.comment,
                        p.order_number,
                        order_date,
                        start,
                        end,
                        p.color,
                        p.visible,
                        p.budget.money,
                        p.budget.time,
                        p.budget.kind,
                    ],
                )?;
                p.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE projects SET customer_id = ?1, name = ?2, comment = ?3,
                        order_number = ?4, order_date = ?5, start_date = ?6, end_date = ?7,
                        color = ?8, visible = ?9, budget = ?10, time_budget = ?11,
                        budget_type = ?12
                     WHERE id = ?13",
                    params![
                        customer_id,
                        p.name,
                        p.comment,
                        p.order_number,
                        order_date,
                        start,
                        end,
                        p.color,
                        p.visible,
                        p.budget.money,
                        p.budget.time,
                        p.budget.kind,
                        id,
                    ],
                )?;
            }
        }
        self.replace_meta("project_meta", "project_id", p.id, &p.meta)
    }

    pub(super) fn write_activity(&mut self, a: &mut Activity) -> Result<(), StoreError> {
        match a.id {
            None => {
                self.conn.execute(
                    "INSERT INTO activities (project_id, name, comment, color, visible, budget,
                        time_budget, budget_type)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        a.project_id,
                        a.name,
                        a.comment,
                        a.color,
                        a.visible,
                        a.budget.money,
                        a.budget.time,
                        a.budget.kind,
                    ],
                )?;
                a.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE activities SET project_id = ?1, name = ?2, comment = ?3, color = ?4,
                        visible = ?5, budget = ?6, time_budget = ?7, budget_type = ?8
                     WHERE id = ?9",
                    params![
                        a.project_id,
                        a.name,
                        a.comment,
                        a.color,
                        a.visible,
                        a.budget.money,
                        a.budget.time,
                        a.budget.kind,
                        id,
                    ],
                )?;
            }
        }
        self.replace_meta("activity_meta", "activity_id", a.id, &a.meta)
    }

    pub(super) fn write_user(&mut self, u: &mut User) -> Result<(), StoreError> {
        let roles = u
            .roles
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        match u.id {
            None => {
                self.conn.execute(
                    "INSERT INTO users (username, email, alias, account_number, enabled, roles,
                        password)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        u.username,
                        u.email,
                        u.alias,
                        u.account_number,
                        u.enabled,
                        roles,
                        u.password
                    ],
                )?;
                u.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE users SET username = ?1, email = ?2, alias = ?3, account_number = ?4,
                        enabled = ?5, roles = ?6, password = ?7
                     WHERE id = ?8",
                    params![
                        u.username,
                        u.email,
                        u.alias,
                        u.account_number,
                        u.enabled,
                        roles,
                        u.password,
                        id
                    ],
                )?;
            }
        }

        self.conn.execute(
            "DELETE FROM user_preferences WHERE user_id = ?1",
            params![u.id],
        )?;
        for (name, value) in &u.preferences {
            self.conn.execute(
                "INSERT INTO user_preferences (user_id, name, value) VALUES (?1, ?2, ?3)",
                params![u.id, name, value],
            )?;
        }
        Ok(())
    }

    pub(super) fn write_tag(&mut self, t: &mut Tag) -> Result<(), StoreError> {
        match t.id {
            None => {
                self.conn
                    .execute("INSERT INTO tags (name) VALUES (?1)", params![t.name])?;
                t.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE tags SET name = ?1 WHERE id = ?2",
                    params![t.name, id],
                )?;
            }
        }
        Ok(())
    }

    pub(super) fn write_timesheet(&mut self, t: &mut Timesheet) -> Result<(), StoreError> {
        let (user_id, project_id, activity_id) = match (t.user_id, t.project_id, t.activity_id)
        {
            (Some(user), Some(project), Some(activity)) => (user, project, activity),
            _ => {
                return Err(StoreError::Constraint {
                    kind: "timesheet",
                    name: t.begin.to_rfc3339(),
                    reason: "user, project and activity must be saved first".to_string(),
                })
            }
        };
        let begin = datetime_value(Some(t.begin));
        let end = datetime_value(Some(t.end));

        match t.id {
            None => {
                self.conn.execute(
                    "INSERT INTO timesheets (user_id, project_id, activity_id, begin_at, end_at,
                        timezone, duration, break_seconds, description, rate, hourly_rate,
                        fixed_rate, internal_rate, billable, exported)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        user_id,
                        project_id,
                        activity_id,
                        begin,
                        end,
                        t.timezone,
                        t.duration,
                        t.break_duration,
                        t.description,
                        t.rate,
                        t.hourly_rate,
                        t.fixed_rate,
                        t.internal_rate,
                        t.billable,
                        t.exported,
                    ],
                )?;
                t.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE timesheets SET user_id = ?1, project_id = ?2, activity_id = ?3,
                        begin_at = ?4, end_at = ?5, timezone = ?6, duration = ?7,
                        break_seconds = ?8, description = ?9, rate = ?10, hourly_rate = ?11,
                        fixed_rate = ?12, internal_rate = ?13, billable = ?14, exported = ?15
                     WHERE id = ?16",
                    params![
                        user_id,
                        project_id,
                        activity_id,
                        begin,
                        end,
                        t.timezone,
                        t.duration,
                        t.break_duration,
                        t.description,
                        t.rate,
                        t.hourly_rate,
                        t.fixed_rate,
                        t.internal_rate,
                        t.billable,
                        t.exported,
                        id,
                    ],
                )?;
            }
        }

        self.conn.execute(
            "DELETE FROM timesheet_tags WHERE timesheet_id = ?1",
            params![t.id],
        )?;
        for tag in &t.tags {
            self.conn.execute(
                "INSERT OR IGNORE INTO timesheet_tags (timesheet_id, tag_id) VALUES (?1, ?2)",
                params![t.id, tag],
            )?;
        }
        self.replace_meta("timesheet_meta", "timesheet_id", t.id, &t.meta)
    }

    pub(super) fn write_team(&mut self, team: &mut Team) -> Result<(), StoreError> {
        match team.id {
            None => {
                self.conn
                    .execute("INSERT INTO teams (name) VALUES (?1)", params![team.name])?;
                team.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE teams SET name = ?1 WHERE id = ?2",
                    params![team.name, id],
                )?;
            }
        }

        for table in [
            "team_members",
            "team_customers",
            "team_projects",
            "team_activities",
        ] {
            self.conn.execute(
                &format!("DELETE FROM {} WHERE team_id = ?1", table),
                params![team.id],
            )?;
        }
        for member in &team.members {
            self.conn.execute(
                "INSERT INTO team_members (team_id, user_id, teamlead) VALUES (?1, ?2, ?3)",
                params![team.id, member.user_id, member.teamlead],
            )?;
        }
        for (table, column, ids) in [
            ("team_customers", "customer_id", &team.customers),
            ("team_projects", "project_id", &team.projects),
            ("team_activities", "activity_id", &team.activities),
        ] {
            for id in ids {
                self.conn.execute(
                    &format!("INSERT INTO {} (team_id, {}) VALUES (?1, ?2)", table, column),
                    params![team.id, id],
                )?;
            }
        }
        Ok(())
    }

    pub(super) fn write_rate(&mut self, rate: &mut Rate) -> Result<(), StoreError> {
        let (project_id, activity_id) = match rate.scope {
            RateScope::Project(id) => (Some(id), None),
            RateScope::Activity(id) => (None, Some(id)),
        };
        match rate.id {
            None => {
                self.conn.execute(
                    "INSERT INTO rates (project_id, activity_id, user_id, rate, fixed)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![project_id, activity_id, rate.user_id, rate.rate, rate.fixed],
                )?;
                rate.id = Some(self.conn.last_insert_rowid());
            }
            Some(id) => {
                self.conn.execute(
                    "UPDATE rates SET project_id = ?1, activity_id = ?2, user_id = ?3,
                        rate = ?4, fixed = ?5
                     WHERE id = ?6",
                    params![project_id, activity_id, rate.user_id, rate.rate, rate.fixed, id],
                )?;
            }
        }
        Ok(())
    }

    fn replace_meta(
        &mut self,
        table: &str,
        owner_column: &str,
        owner: Option<i64>,
        meta: &MetaFields,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", table, owner_column),
            params![owner],
        )?;
        for (name, value) in meta {
            self.conn.execute(
                &format!(
                    "INSERT INTO {} ({}, name, value) VALUES (?1, ?2, ?3)",
                    table, owner_column
                ),
                params![owner, name, value],
            )?;
        }
        Ok(())
    }
}
