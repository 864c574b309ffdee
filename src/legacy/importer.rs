//! Copies one legacy instance after the other into the destination store

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use ulid::Ulid;

use crate::core::store::ImportedKind;
use crate::core::validation::TimesheetCheck;
use crate::core::{Store, Validate};
use crate::entities::user::preference;
use crate::entities::{
    truncate_chars, Activity, Customer, CustomerDefaults, MetaFields, Project, Rate, RateScope,
    Role, Team, Timesheet, User, IMPORTED_FROM, IMPORTED_ID,
};

use super::fixes;
use super::model::{OldActivity, OldCustomer, OldProject, OldTimesheet, OldUser, Snapshot};
use super::report::InstanceReport;
use super::source::LegacySource;
use super::validate::pre_validate;
use super::{LegacyError, LegacyOptions};

/// Legacy preference names and the preferences they become
const PREFERENCES: &[(&str, &str)] = &[
    ("ui.lang", preference::LANGUAGE),
    ("timezone", preference::TIMEZONE),
];

#[derive(Debug, Clone)]
pub(super) struct CachedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub timezone: Option<String>,
}

impl CachedUser {
    fn of(user: &User, id: i64) -> Self {
        Self {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            timezone: user.timezone().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CachedProject {
    pub id: i64,
    pub customer_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CachedActivity {
    pub id: i64,
    pub project: Option<CachedProject>,
}

/// Legacy ids mapped to records of the destination store
///
/// Users and teams are kept in lists with per-instance id maps, so records
/// merged across instances keep one entry. Everything else is keyed by
/// legacy id.
#[derive(Debug, Default)]
pub(super) struct Caches {
    pub users: Vec<CachedUser>,
    pub user_ids: HashMap<i64, usize>,
    pub customers: HashMap<i64, i64>,
    pub projects: HashMap<i64, CachedProject>,
    /// Keyed by legacy activity id and legacy project id (`None` = global)
    pub activities: HashMap<(i64, Option<i64>), CachedActivity>,
    pub old_activities: HashMap<i64, OldActivity>,
    pub teams: Vec<Team>,
    pub team_ids: HashMap<i64, usize>,
}

impl Caches {
    /// Forget what must not leak into the next instance
    fn start_instance(&mut self, options: &LegacyOptions) {
        self.user_ids.clear();
        self.team_ids.clear();
        self.old_activities.clear();
        self.activities.clear();
        if !options.merge.users {
            self.users.clear();
        }
        if !options.merge.customers {
            self.customers.clear();
        }
        if !options.merge.projects {
            self.projects.clear();
        }
        if !options.merge.teams {
            self.teams.clear();
        }
    }

    pub fn user(&self, legacy_id: i64) -> Option<&CachedUser> {
        self.user_ids
            .get(&legacy_id)
            .and_then(|index| self.users.get(*index))
    }

    fn insert_user(&mut self, legacy_id: i64, user: CachedUser) {
        let index = match self.users.iter().position(|u| u.id == user.id) {
            Some(index) => {
                self.users[index] = user;
                index
            }
            None => {
                self.users.push(user);
                self.users.len() - 1
            }
        };
        self.user_ids.insert(legacy_id, index);
    }

    pub fn activity(&self, legacy_id: i64, legacy_project: i64) -> Option<CachedActivity> {
        self.activities
            .get(&(legacy_id, Some(legacy_project)))
            .or_else(|| self.activities.get(&(legacy_id, None)))
            .copied()
    }
}

pub struct LegacyImporter<'a> {
    pub(super) source: &'a LegacySource,
    pub(super) store: &'a mut dyn Store,
    pub(super) options: &'a LegacyOptions,
    pub(super) cache: Caches,
}

impl<'a> LegacyImporter<'a> {
    pub fn new(source: &'a LegacySource, store: &'a mut dyn Store, options: &'a LegacyOptions) -> Self {
        Self {
            source,
            store,
            options,
            cache: Caches::default(),
        }
    }

    /// Import everything of the instance with table prefix `prefix`
    pub fn import_instance(&mut self, prefix: &str) -> Result<InstanceReport, LegacyError> {
        tracing::info!(prefix, "importing legacy instance");
        self.cache.start_instance(self.options);
        let mut report = InstanceReport::new(prefix);

        let mut snapshot = self.source.snapshot(prefix)?;
        if let Some(domain) = &self.options.fix_email {
            let fixed = fixes::fix_emails(&mut snapshot, domain);
            if fixed > 0 {
                report.warn(format!("Fixed {} empty email addresses", fixed));
            }
        }
        if self.options.fix_utf8 {
            fixes::fix_encoding(&mut snapshot);
        }

        let messages = pre_validate(&snapshot, self.options);
        if !messages.is_empty() {
            return Err(LegacyError::Validation {
                prefix: prefix.to_string(),
                messages,
            });
        }

        if self.options.check_already_imported {
            self.reload(prefix)?;
        }

        self.import_users(prefix, &snapshot, &mut report)?;
        self.import_customers(prefix, &snapshot.customers, &mut report)?;
        self.import_projects(prefix, &snapshot, &mut report)?;
        self.import_activities(prefix, &snapshot, &mut report)?;
        if !self.options.skip_teams {
            self.import_teams(prefix, &mut report)?;
        }
        if self.options.instance_team && !snapshot.users.is_empty() {
            self.create_instance_team(prefix, &snapshot, &mut report)?;
        }
        self.import_timesheets(prefix, &snapshot, &mut report)?;

        Ok(report)
    }

    /// Refill the caches from records this instance already wrote
    pub(super) fn reload(&mut self, prefix: &str) -> Result<(), LegacyError> {
        for record in self.store.imported(ImportedKind::Customer, prefix)? {
            self.cache.customers.insert(record.imported_id, record.id);
        }

        let mut legacy_project_ids = HashMap::new();
        for record in self.store.imported(ImportedKind::Project, prefix)? {
            let project = CachedProject {
                id: record.id,
                customer_id: record.parent_id.unwrap_or_default(),
            };
            self.cache.projects.insert(record.imported_id, project);
            legacy_project_ids.insert(record.id, record.imported_id);
        }

        for record in self.store.imported(ImportedKind::Activity, prefix)? {
            let legacy_project = record
                .parent_id
                .and_then(|id| legacy_project_ids.get(&id).copied());
            if record.parent_id.is_some() && legacy_project.is_none() {
                continue;
            }
            let project = legacy_project.and_then(|id| self.cache.projects.get(&id).copied());
            self.cache.activities.insert(
                (record.imported_id, legacy_project),
                CachedActivity {
                    id: record.id,
                    project,
                },
            );
        }

        for record in self.store.imported(ImportedKind::User, prefix)? {
            if let Some(user) = self.store.find_user(record.id)? {
                self.cache
                    .insert_user(record.imported_id, CachedUser::of(&user, record.id));
            }
        }
        Ok(())
    }

    /// `name`, or a random placeholder when it is empty
    fn name_or_placeholder(name: &str, kind: &str, report: &mut InstanceReport) -> String {
        if !name.trim().is_empty() {
            return name.to_string();
        }
        let placeholder = Ulid::new().to_string().to_lowercase();
        report.warn(format!(
            "Found empty {} name, setting it to: {}",
            kind, placeholder
        ));
        placeholder
    }

    pub(super) fn check(entity: &impl Validate, kind: &'static str, name: &str) -> Result<(), LegacyError> {
        let messages = entity.import_errors();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(LegacyError::Invalid {
                kind,
                name: name.to_string(),
                messages,
            })
        }
    }

    // ------------------------------------------------------------------
    // users
    // ------------------------------------------------------------------

    /// Whether `old` is already cached, possibly under another instance
    fn is_known_user(&mut self, old: &OldUser) -> bool {
        if self.cache.user_ids.contains_key(&old.id) {
            return true;
        }

        let old_email = old.mail.as_deref().unwrap_or_default().to_lowercase();
        let old_name = old.name.to_lowercase();
        for (index, cached) in self.cache.users.iter().enumerate() {
            let same_email = cached.email.to_lowercase() == old_email;
            let same_name = cached.username.to_lowercase() == old_name;
            match (same_email, same_name) {
                (true, true) => {
                    self.cache.user_ids.insert(old.id, index);
                    return true;
                }
                (true, false) => tracing::warn!(
                    "Found problematic user combination. Email matches, but username does not. \
                     Cached user: ID {}, {}, {}. New user: ID {}, {}, {}.",
                    cached.id, cached.email, cached.username, old.id, old_email, old_name
                ),
                (false, true) => tracing::warn!(
                    "Found problematic user combination. Username matches, but email does not. \
                     Cached user: ID {}, {}, {}. New user: ID {}, {}, {}.",
                    cached.id, cached.email, cached.username, old.id, old_email, old_name
                ),
                (false, false) => {}
            }
        }
        false
    }

    fn import_users(
        &mut self,
        prefix: &str,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        for old in &snapshot.users {
            if self.is_known_user(old) {
                continue;
            }

            let mut user = User::new(old.name.clone(), old.mail.clone().unwrap_or_default());
            user.set_plain_password(&self.options.password);
            user.enabled = old.active && !old.trash && !old.ban;
            user.roles = vec![if old.global_role_id == Some(1) {
                Role::SuperAdmin
            } else {
                Role::User
            }];
            user.set_preference(IMPORTED_ID, old.id.to_string());
            user.set_preference(IMPORTED_FROM, prefix);

            if let Some(alias) = old.alias.as_deref().filter(|a| !a.is_empty()) {
                if self.options.alias_as_account_number {
                    user.account_number =
                        Some(truncate_chars(alias, User::MAX_ACCOUNT_NUMBER_LEN));
                } else {
                    user.alias = Some(alias.to_string());
                }
            }

            for pref in self.source.preferences(prefix, old.id)? {
                let Some((_, name)) = PREFERENCES.iter().find(|(key, _)| *key == pref.option)
                else {
                    continue;
                };
                let Some(value) = pref.value.filter(|v| !v.trim().is_empty()) else {
                    continue;
                };
                if *name == preference::TIMEZONE && value.parse::<chrono_tz::Tz>().is_err() {
                    report.warn(format!(
                        "Ignoring unknown timezone \"{}\" of user \"{}\"",
                        value, old.name
                    ));
                    continue;
                }
                user.set_preference(name, value);
            }
            if user.preference(preference::LANGUAGE).is_none() {
                user.set_preference(preference::LANGUAGE, self.options.language.as_str());
            }
            if user.timezone().is_none() {
                user.set_preference(preference::TIMEZONE, self.options.timezone.as_str());
            }
            for rate in snapshot.rates.iter().filter(|r| r.is_user_default(old.id)) {
                user.set_preference(preference::HOURLY_RATE, rate.rate.to_string());
            }

            Self::check(&user, "user", &user.username)?;
            self.store.save_user(&mut user)?;
            let id = user.id.unwrap_or_default();
            tracing::debug!(user = %user.username, id, "created user");
            self.cache.insert_user(old.id, CachedUser::of(&user, id));
            report.counts.users += 1;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // customers, projects, activities
    // ------------------------------------------------------------------

    fn import_customers(
        &mut self,
        prefix: &str,
        customers: &[OldCustomer],
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        for old in customers {
            if self.cache.customers.contains_key(&old.id) {
                continue;
            }

            let name = Self::name_or_placeholder(&old.name, "customer", report);
            let defaults = CustomerDefaults {
                country: self.options.country.trim().to_uppercase(),
                currency: self.options.currency.trim().to_uppercase(),
                timezone: non_empty(&old.timezone).unwrap_or_else(|| self.options.timezone.clone()),
            };
            let mut customer = Customer::new(name, &defaults);
            customer.comment = non_empty(&old.comment);
            customer.company = non_empty(&old.company);
            customer.contact = non_empty(&old.contact);
            customer.phone = non_empty(&old.phone);
            customer.fax = non_empty(&old.fax);
            customer.mobile = non_empty(&old.mobile);
            customer.email = non_empty(&old.mail);
            customer.homepage = non_empty(&old.homepage);
            customer.address = address(old);
            customer.visible = old.visible && !old.trash;
            tag(prefix, &mut customer.meta, old.id);

            Self::check(&customer, "customer", &customer.name)?;
            self.store.save_customer(&mut customer)?;
            let id = customer.id.unwrap_or_default();
            tracing::debug!(customer = %customer.name, id, "created customer");
            self.cache.customers.insert(old.id, id);
            report.counts.customers += 1;
        }
        Ok(())
    }

    fn import_projects(
        &mut self,
        prefix: &str,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        for old in &snapshot.projects {
            if self.cache.projects.contains_key(&old.id) {
                continue;
            }
            let Some(customer_id) = self.cache.customers.get(&old.customer_id).copied() else {
                report.error(format!(
                    "Found project with unknown customer. Project ID: \"{}\", Name: \"{}\", Customer ID: \"{}\"",
                    old.id, old.name, old.customer_id
                ));
                continue;
            };

            let project_id = self.create_project(prefix, old, customer_id, report)?;
            for rate in snapshot.fixed_rates.iter().filter(|r| r.is_for_project(old.id)) {
                let mut rate = Rate::fixed(RateScope::Project(project_id), rate.rate);
                self.store.save_rate(&mut rate)?;
                report.counts.rates += 1;
            }
            for rate in snapshot.rates.iter().filter(|r| r.is_for_project(old.id)) {
                let Some(user_id) = self.rate_user(rate.user_id, report) else {
                    continue;
                };
                let mut rate = Rate::hourly(RateScope::Project(project_id), rate.rate, user_id);
                self.store.save_rate(&mut rate)?;
                report.counts.rates += 1;
            }

            self.cache.projects.insert(
                old.id,
                CachedProject {
                    id: project_id,
                    customer_id,
                },
            );
        }
        Ok(())
    }

    fn create_project(
        &mut self,
        prefix: &str,
        old: &OldProject,
        customer_id: i64,
        report: &mut InstanceReport,
    ) -> Result<i64, LegacyError> {
        let name = Self::name_or_placeholder(&old.name, "project", report);
        let mut project = Project::new(name, Some(customer_id));
        project.comment = non_empty(&old.comment);
        project.visible = old.visible && !old.trash;
        project.budget.money = old.budget;
        tag(prefix, &mut project.meta, old.id);

        Self::check(&project, "project", &project.name)?;
        self.store.save_project(&mut project)?;
        report.counts.projects += 1;
        tracing::debug!(project = %project.name, customer_id, "created project");
        Ok(project.id.unwrap_or_default())
    }

    /// User of an hourly rate: `Some(None)` for everyone, `None` to skip the rate
    fn rate_user(&self, legacy_user: Option<i64>, report: &mut InstanceReport) -> Option<Option<i64>> {
        match legacy_user {
            None => Some(None),
            Some(legacy_id) => match self.cache.user(legacy_id) {
                Some(user) => Some(Some(user.id)),
                None => {
                    report.warn(format!("Skipped rate for unknown user with ID {}", legacy_id));
                    None
                }
            },
        }
    }

    fn import_activities(
        &mut self,
        prefix: &str,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        let mut assigned: HashMap<i64, Vec<i64>> = HashMap::new();
        if !self.options.global_activities {
            for link in self.source.project_activities(prefix)? {
                assigned
                    .entry(link.activity_id)
                    .or_default()
                    .push(link.project_id);
            }
        }

        for old in &snapshot.activities {
            self.cache.old_activities.insert(old.id, old.clone());
        }

        for old in snapshot.activities.iter().filter(|a| !assigned.contains_key(&a.id)) {
            self.create_activity(prefix, old, None, snapshot, report)?;
        }
        for old in &snapshot.activities {
            for project in assigned.get(&old.id).into_iter().flatten() {
                self.create_activity(prefix, old, Some(*project), snapshot, report)?;
            }
        }
        Ok(())
    }

    /// The activity `old` of legacy project `legacy_project`, created on first use
    ///
    /// The flag is true when the activity was created by this call.
    pub(super) fn create_activity(
        &mut self,
        prefix: &str,
        old: &OldActivity,
        legacy_project: Option<i64>,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(CachedActivity, bool), LegacyError> {
        if let Some(cached) = self.cache.activities.get(&(old.id, legacy_project)) {
            return Ok((*cached, false));
        }

        let name = Self::name_or_placeholder(&old.name, "activity", report);
        let project = match legacy_project {
            None => None,
            Some(legacy_id) => match self.cache.projects.get(&legacy_id) {
                Some(project) => Some(*project),
                None => {
                    return Err(LegacyError::UnknownProject {
                        project: legacy_id,
                        activity: old.id,
                        name,
                    })
                }
            },
        };

        let mut activity = Activity::new(name, project.map(|p| p.id));
        activity.comment = non_empty(&old.comment);
        activity.visible = old.visible && !old.trash;
        activity.budget.money = old.budget;
        tag(prefix, &mut activity.meta, old.id);

        Self::check(&activity, "activity", &activity.name)?;
        self.store.save_activity(&mut activity)?;
        let cached = CachedActivity {
            id: activity.id.unwrap_or_default(),
            project,
        };
        self.cache.activities.insert((old.id, legacy_project), cached);
        report.counts.activities += 1;
        tracing::debug!(activity = %activity.name, ?legacy_project, "created activity");

        let scope = RateScope::Activity(cached.id);
        for rate in snapshot
            .fixed_rates
            .iter()
            .filter(|r| r.is_for_activity(old.id, legacy_project))
        {
            let mut rate = Rate::fixed(scope, rate.rate);
            self.store.save_rate(&mut rate)?;
            report.counts.rates += 1;
        }
        for rate in snapshot
            .rates
            .iter()
            .filter(|r| r.is_for_activity(old.id, legacy_project))
        {
            let Some(user_id) = self.rate_user(rate.user_id, report) else {
                continue;
            };
            let mut rate = Rate::hourly(scope, rate.rate, user_id);
            self.store.save_rate(&mut rate)?;
            report.counts.rates += 1;
        }

        Ok((cached, true))
    }

    // ------------------------------------------------------------------
    // timesheets
    // ------------------------------------------------------------------

    fn import_timesheets(
        &mut self,
        prefix: &str,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        let total = self.source.count_timesheets(prefix)?;
        tracing::info!(prefix, total, "importing timesheet records");

        self.store.flush()?;
        self.reload(prefix)?;
        self.store.begin_batch()?;

        let source = self.source;
        source.each_timesheet(prefix, |record| {
            self.import_timesheet(prefix, record, snapshot, report)
        })?;

        self.store.flush()?;
        self.reload(prefix)?;

        if !report.mismatched_timesheets.is_empty() {
            let ids: Vec<String> = report
                .mismatched_timesheets
                .iter()
                .map(ToString::to_string)
                .collect();
            report.error(format!(
                "Found invalid mapped project - activity combinations in these old timesheet records: {}",
                ids.join(",")
            ));
        }
        if report.failed_timesheets > 0 {
            report.error(format!(
                "Failed importing {} timesheet records",
                report.failed_timesheets
            ));
        }
        Ok(())
    }

    fn import_timesheet(
        &mut self,
        prefix: &str,
        mut record: OldTimesheet,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        if self.options.fix_utf8 {
            fixes::fix_timesheet_encoding(&mut record);
        }
        if self.options.fix_timesheet {
            fixes::fix_timesheet(&mut record);
        }

        let Some(end) = record.end else {
            report.fail(format!(
                "Cannot import running timesheet record, skipping: {}",
                record.id
            ));
            return Ok(());
        };
        let Some(project) = self.cache.projects.get(&record.project_id).copied() else {
            report.fail(format!(
                "Could not create timesheet record, missing project with ID: {}",
                record.project_id
            ));
            return Ok(());
        };

        let activity = match self.cache.activity(record.activity_id, record.project_id) {
            Some(activity) => activity,
            None => match self.cache.old_activities.get(&record.activity_id).cloned() {
                Some(old) => {
                    let (activity, created) =
                        self.create_activity(prefix, &old, Some(record.project_id), snapshot, report)?;
                    if created {
                        report.counts.activities -= 1;
                        report.counts.timesheet_activities += 1;
                    }
                    activity
                }
                None => {
                    report.fail(format!(
                        "Could not import timesheet record, missing activity with ID: {}/{}/{}",
                        record.activity_id, record.project_id, project.customer_id
                    ));
                    return Ok(());
                }
            },
        };

        let user = match self.cache.user(record.user_id).cloned() {
            Some(user) => user,
            None => match self.placeholder_user(prefix, &record, report)? {
                Some(user) => user,
                None => return Ok(()),
            },
        };

        if activity.project.is_some_and(|p| p.id != project.id) {
            report.mismatched_timesheets.push(record.id);
            return Ok(());
        }

        let (Some(begin), Some(end_at)) = (timestamp(record.start), timestamp(end)) else {
            report.fail(format!(
                "Invalid start or end of timesheet record, skipping: {}",
                record.id
            ));
            return Ok(());
        };

        let mut timesheet = Timesheet::new(begin, end_at, end - record.start);
        timesheet.fixed_rate = record.fixed_rate.filter(|r| *r > 0.0);
        timesheet.hourly_rate = record.rate.filter(|r| *r > 0.0);
        timesheet.calculate_rate();
        timesheet.user_id = Some(user.id);
        timesheet.project_id = Some(project.id);
        timesheet.activity_id = Some(activity.id);
        timesheet.exported = record.cleared;
        timesheet.timezone = user
            .timezone
            .clone()
            .unwrap_or_else(|| self.options.timezone.clone());
        timesheet.description = record.description.clone().or_else(|| record.comment.clone());

        if let Some(name) = &self.options.meta_comment {
            timesheet.description = record.description.clone();
            if let Some(comment) = non_empty(&record.comment) {
                timesheet.meta.insert(name.clone(), comment);
            }
        }
        if let Some(name) = &self.options.meta_location {
            if let Some(location) = non_empty(&record.location) {
                timesheet.meta.insert(name.clone(), location);
            }
        }
        if let Some(name) = &self.options.meta_tracking_number {
            if let Some(number) = non_empty(&record.tracking_number) {
                timesheet.meta.insert(name.clone(), number);
            }
        }

        let errors = TimesheetCheck::new(&timesheet).import_errors();
        if !errors.is_empty() {
            report.fail(format!(
                "Failed to validate timesheet record: {} - skipping! {}",
                record.id,
                errors.join("; ")
            ));
            return Ok(());
        }

        self.store.save_timesheet(&mut timesheet)?;
        report.counts.timesheets += 1;
        if report.counts.timesheets % self.options.batch_size == 0 {
            tracing::debug!(imported = report.counts.timesheets, "flushing timesheet batch");
            self.store.flush()?;
            self.reload(prefix)?;
            self.store.begin_batch()?;
        }
        Ok(())
    }

    /// A disabled stand-in for the unknown user of `record`
    fn placeholder_user(
        &mut self,
        prefix: &str,
        record: &OldTimesheet,
        report: &mut InstanceReport,
    ) -> Result<Option<CachedUser>, LegacyError> {
        let username = Ulid::new().to_string().to_lowercase();
        let mut user = User::new(username.clone(), format!("{}@example.com", username));
        user.alias = Some(format!("Import: {}", username));
        user.enabled = false;
        user.roles = vec![Role::User];
        user.set_preference(preference::TIMEZONE, self.options.timezone.as_str());
        user.set_preference(IMPORTED_ID, record.user_id.to_string());
        user.set_preference(IMPORTED_FROM, prefix);

        if !user.import_errors().is_empty() {
            report.fail(format!(
                "Found timesheet record for unknown user and failed to create user, skipping timesheet: {}",
                record.id
            ));
            return Ok(None);
        }

        self.store.save_user(&mut user)?;
        let cached = CachedUser::of(&user, user.id.unwrap_or_default());
        report.warn(format!(
            "Created deactivated user {} for unknown user with ID {}",
            username, record.user_id
        ));
        report.counts.placeholder_users += 1;
        self.cache.insert_user(record.user_id, cached.clone());
        Ok(Some(cached))
    }
}

/// Remember where a record came from
fn tag(prefix: &str, meta: &mut MetaFields, legacy_id: i64) {
    meta.insert(IMPORTED_ID.to_string(), legacy_id.to_string());
    meta.insert(IMPORTED_FROM.to_string(), prefix.to_string());
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn address(old: &OldCustomer) -> Option<String> {
    let street = old.street.as_deref().unwrap_or_default().trim();
    let zip = old.zipcode.as_deref().unwrap_or_default().trim();
    let city = old.city.as_deref().unwrap_or_default().trim();
    if street.is_empty() && zip.is_empty() && city.is_empty() {
        return None;
    }
    Some(format!("{}\n{} {}", street, zip, city).trim().to_string())
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
