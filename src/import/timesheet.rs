//! Timesheet import pipeline shared by the generic and vendor formats

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::core::validation::{TimesheetCheck, Validate};
use crate::core::values::{is_integer, is_numeric, parse_number};
use crate::core::{parse_duration, Store};
use crate::entities::Timesheet;

use super::batch::{ImportData, ImportRow, RowFailure, RowState};
use super::cache::{ResolutionCache, Scope, UserQuery};
use super::datetime::{self, at, parse_date, parse_datetime, parse_time, roll_over};
use super::format::{Requirement, TimesheetFormat};
use super::parser::ParsedInput;
use super::record::{CanonicalRecord, DurationValue, Field, TimeShape};
use super::{ImportError, ImportOptions};

const EMPTY: &str = "Empty or missing field: ";
const ENCODING: &str = "Invalid encoding, requires UTF-8: ";
const NEGATIVE: &str = "Negative values not supported: ";
const NUMERIC: &str = "Invalid numeric value: ";

/// Import all rows of `input` as timesheet records
pub fn import(
    format: &TimesheetFormat,
    input: &ParsedInput,
    store: &mut dyn Store,
    options: &ImportOptions,
) -> Result<ImportData, ImportError> {
    let shape = format.shape(&input.header);
    let mut data = ImportData::new(
        format.title,
        format.display_header(&input.header),
        options.dry_run,
    );
    let mut run = TimesheetRun {
        format,
        options,
        cache: ResolutionCache::new(options.dry_run, options.customer_defaults.clone()),
    };

    for (index, raw) in input.rows.iter().enumerate() {
        let record = format.record(raw, shape);
        let values = format.display_values(raw, &record, &input.header);
        let mut row = ImportRow::new(index + 1, values);

        match run.import_row(store, &record, &mut row.state) {
            Ok(()) => {}
            Err(RowFailure::Invalid(errors)) => row.fail(errors),
            Err(RowFailure::Store(e)) => return Err(e.into()),
        }
        data.add_row(row);
    }

    data.created = run.cache.created;
    data.summarize();
    tracing::debug!(rows = data.count_rows(), failed = data.count_errors(), "timesheet import done");
    Ok(data)
}

struct TimesheetRun<'a> {
    format: &'a TimesheetFormat,
    options: &'a ImportOptions,
    cache: ResolutionCache,
}

impl TimesheetRun<'_> {
    fn import_row(
        &mut self,
        store: &mut dyn Store,
        record: &CanonicalRecord,
        state: &mut RowState,
    ) -> Result<(), RowFailure> {
        let errors = self.check(record);
        if !errors.is_empty() {
            return Err(RowFailure::Invalid(errors));
        }
        *state = RowState::Validated;

        let scope_global = match record.activity_type.as_deref().map(str::to_lowercase) {
            Some(kind) => kind == "global",
            None => self.options.global_activities,
        };

        // checked for presence above
        let identifier = record.user.as_deref().unwrap_or_default();
        let query = UserQuery {
            identifier,
            email: record.email.as_deref(),
            alias: record.alias.as_deref(),
            match_alias: self.format.match_user_alias,
            timezone: self.options.timezone.name(),
            language: &self.options.language,
        };
        let user = self.cache.resolve_user(store, &query)?;
        let customer = self
            .cache
            .resolve_customer(store, record.customer.as_deref().unwrap_or_default())?;
        let project = self
            .cache
            .resolve_project(store, record.project.as_deref().unwrap_or_default(), customer)?;
        let scope = if scope_global {
            Scope::Global
        } else {
            Scope::Project(project)
        };
        let activity = self
            .cache
            .resolve_activity(store, record.activity.as_deref().unwrap_or_default(), scope)?;
        *state = RowState::Resolved;

        let tz = self
            .cache
            .user(user)
            .timezone()
            .and_then(datetime::timezone)
            .unwrap_or(self.options.timezone);

        let duration = match &record.duration {
            Some(value) => Some(seconds(value, Field::Duration)?),
            None => None,
        };
        let break_duration = match &record.break_duration {
            Some(value) => seconds(value, Field::Break)?,
            None => 0,
        };
        let (begin, end) = times(record, duration, tz).map_err(RowFailure::invalid)?;
        let duration = duration.unwrap_or((end - begin).num_seconds() - break_duration);

        let mut timesheet = Timesheet::new(begin, end, duration);
        timesheet.timezone = tz.name().to_string();
        timesheet.break_duration = break_duration;
        timesheet.user_id = self.cache.user(user).id;
        timesheet.project_id = self.cache.project(project).id;
        timesheet.activity_id = self.cache.activity(activity).id;
        timesheet.description = record.description.clone();
        timesheet.billable = record.billable.unwrap_or(true);
        timesheet.exported = record.exported.unwrap_or(false);
        timesheet.hourly_rate = record.hourly_rate.as_deref().and_then(parse_number);
        timesheet.fixed_rate = record.fixed_rate.as_deref().and_then(parse_number);
        timesheet.internal_rate = record.internal_rate.as_deref().and_then(parse_number);
        match record.rate.as_deref().and_then(parse_number) {
            Some(rate) => timesheet.rate = rate,
            None => timesheet.calculate_rate(),
        }
        timesheet.meta = record.meta.clone();

        if let Some(tags) = record.tags.as_deref() {
            for name in tags.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let tag = self.cache.resolve_tag(store, name)?;
                if let Some(id) = self.cache.tag(tag).id {
                    timesheet.tags.push(id);
                }
            }
        }

        let check = TimesheetCheck {
            timesheet: &timesheet,
            customer: Some(self.cache.customer(customer)),
            project: Some(self.cache.project(project)),
            activity: Some(self.cache.activity(activity)),
        };
        let errors = check.import_errors();
        if !errors.is_empty() {
            return Err(RowFailure::Invalid(errors));
        }
        *state = RowState::Mapped;

        if self.options.dry_run {
            *state = RowState::Skipped;
        } else {
            store.save_timesheet(&mut timesheet)?;
            *state = RowState::Persisted;
        }
        Ok(())
    }

    /// Field level checks before anything is resolved
    fn check(&self, record: &CanonicalRecord) -> Vec<String> {
        let mut errors = Vec::new();
        let mut empty = |field: Field, value: &Option<String>| {
            if value.as_deref().map_or(true, str::is_empty) {
                errors.push(format!("{}{}", EMPTY, field.name()));
                true
            } else {
                false
            }
        };

        empty(Field::User, &record.user);
        if self.requires(Field::Email) {
            empty(Field::Email, &record.email);
        }
        empty(Field::Customer, &record.customer);
        let no_project = empty(Field::Project, &record.project);
        let no_activity = empty(Field::Activity, &record.activity);

        match record.shape {
            TimeShape::Range => {
                empty(Field::Begin, &record.begin);
                empty(Field::End, &record.end);
            }
            TimeShape::Date => {
                empty(Field::Date, &record.date);
                if (record.from.is_none() || record.to.is_none()) && record.duration.is_none() {
                    errors.push(format!("{}{}", EMPTY, Field::Duration.name()));
                }
            }
        }

        if !no_project && record.is_malformed(Field::Project) {
            errors.push(format!("{}{}", ENCODING, Field::Project.name()));
        }
        if !no_activity && record.is_malformed(Field::Activity) {
            errors.push(format!("{}{}", ENCODING, Field::Activity.name()));
        }
        if record.is_malformed(Field::Description) {
            errors.push(format!("{}{}", ENCODING, Field::Description.name()));
        }

        if record.duration.as_ref().is_some_and(DurationValue::is_negative) {
            errors.push(format!("{}{}", NEGATIVE, Field::Duration.name()));
        }
        if record.break_duration.as_ref().is_some_and(DurationValue::is_negative) {
            errors.push(format!("{}{}", NEGATIVE, Field::Break.name()));
        }

        for (field, value) in [
            (Field::Rate, &record.rate),
            (Field::HourlyRate, &record.hourly_rate),
            (Field::FixedRate, &record.fixed_rate),
            (Field::InternalRate, &record.internal_rate),
        ] {
            if value.as_deref().is_some_and(|v| !is_numeric(v)) {
                errors.push(format!("{}{}", NUMERIC, field.name()));
            }
        }

        if let Some(kind) = record.activity_type.as_deref() {
            if !matches!(kind.to_lowercase().as_str(), "project" | "global") {
                errors.push(format!(
                    "Invalid activity type \"{}\" given, allowed values are: project, global",
                    kind
                ));
            }
        }

        errors
    }

    fn requires(&self, wanted: Field) -> bool {
        self.format
            .required
            .iter()
            .any(|r| matches!(r, Requirement::Field(f) if *f == wanted))
    }
}

/// Seconds of a duration value; digit-only text counts as seconds
fn seconds(value: &DurationValue, field: Field) -> Result<i64, RowFailure> {
    match value {
        DurationValue::Seconds(s) => Ok(*s),
        DurationValue::Text(text) if is_integer(text) => text
            .parse::<i64>()
            .map_err(|_| RowFailure::invalid(format!("{}{}", NUMERIC, field.name()))),
        DurationValue::Text(text) => {
            parse_duration(text).map_err(|e| RowFailure::invalid(format!("{}: {}", field.name(), e)))
        }
    }
}

/// Begin and end of a record in `tz`
fn times(
    record: &CanonicalRecord,
    duration: Option<i64>,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), String> {
    let out_of_range = || format!("Invalid duration: {}", duration.unwrap_or(0));
    let length = TimeDelta::try_seconds(duration.unwrap_or(0)).ok_or_else(out_of_range)?;

    if record.shape == TimeShape::Range {
        let begin = parse_datetime(record.begin.as_deref().unwrap_or_default(), tz)?;
        let end = parse_datetime(record.end.as_deref().unwrap_or_default(), tz)?;
        let end = roll_over(begin, end, duration, tz).ok_or_else(out_of_range)?;
        return Ok((begin, end));
    }

    let date = parse_date(record.date.as_deref().unwrap_or_default())?;
    let from = record.from.as_deref().map(parse_time).transpose()?;
    let to = record.to.as_deref().map(parse_time).transpose()?;

    match (from, to) {
        (None, None) => {
            let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
            let begin = at(date, noon, tz)?;
            let end = begin.checked_add_signed(length).ok_or_else(out_of_range)?;
            Ok((begin, end))
        }
        (None, Some(to)) => {
            let end = at(date, to, tz)?;
            let begin = end.checked_sub_signed(length).ok_or_else(out_of_range)?;
            Ok((begin, end))
        }
        (Some(from), None) => {
            let begin = at(date, from, tz)?;
            let end = begin.checked_add_signed(length).ok_or_else(out_of_range)?;
            Ok((begin, end))
        }
        (Some(from), Some(to)) => {
            let begin = at(date, from, tz)?;
            let end = at(date, to, tz)?;
            let end = roll_over(begin, end, duration, tz).ok_or_else(out_of_range)?;
            Ok((begin, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqliteStore;
    use crate::import::format::ImporterKind;
    use crate::import::parser::{parse, InputFormat, ParseOptions};

    fn csv(input: &str) -> ParsedInput {
        csv_bytes(input.as_bytes())
    }

    fn csv_bytes(input: &[u8]) -> ParsedInput {
        let options = ParseOptions {
            format: InputFormat::Csv,
            delimiter: b',',
            max_rows: 100,
        };
        parse(input, &options).unwrap()
    }

    fn generic() -> &'static TimesheetFormat {
        ImporterKind::Timesheet.timesheet_format().unwrap()
    }

    fn run(input: &str, store: &mut SqliteStore, options: &ImportOptions) -> ImportData {
        import(generic(), &csv(input), store, options).unwrap()
    }

    const HEADER: &str = "User,Email,Project,Customer,Activity,Begin,End,Duration\n";

    #[test]
    fn test_single_row_creates_everything() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!(
            "{}alice,alice@x.com,ProjA,CustA,Dev,2024-03-01 09:00,2024-03-01 17:00,\n",
            HEADER
        );
        let data = run(&input, &mut store, &ImportOptions::default());

        assert_eq!(data.count_errors(), 0, "{:?}", data.rows[0].errors);
        assert_eq!(data.rows[0].state, RowState::Persisted);
        assert!(data.status.contains(&"created 1 customers".to_string()));
        assert!(data.status.contains(&"created 1 projects".to_string()));
        assert!(data.status.contains(&"created 1 activities".to_string()));
        assert!(data.status.contains(&"created 1 users".to_string()));

        assert_eq!(store.query_i64("SELECT duration FROM timesheets").unwrap(), 28800);
    }

    #[test]
    fn test_dry_run_matches_real_run() {
        let input = format!(
            "{}alice,alice@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 17:00,\n\
             alice,alice@x.com,P,C,Dev,2024-03-02 09:00,2024-03-02 10:00,-60\n\
             bob,bob@x.com,P,C,Review,2024-03-02 09:00,2024-03-02 10:00,3600\n",
            HEADER
        );

        let mut dry_store = SqliteStore::open_in_memory().unwrap();
        let dry = run(
            &input,
            &mut dry_store,
            &ImportOptions {
                dry_run: true,
                ..ImportOptions::default()
            },
        );
        let mut real_store = SqliteStore::open_in_memory().unwrap();
        let real = run(&input, &mut real_store, &ImportOptions::default());

        assert_eq!(dry_store.writes(), 0);
        assert!(real_store.writes() > 0);
        assert_eq!(dry.created, real.created);
        let errors = |data: &ImportData| -> Vec<Vec<String>> {
            data.rows.iter().map(|r| r.errors.clone()).collect()
        };
        assert_eq!(errors(&dry), errors(&real));
        assert_eq!(dry.rows[0].state, RowState::Skipped);
        assert!(dry.status.contains(&"create 1 customers".to_string()));
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!(
            "{}alice,alice@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 17:00,-1:00\n",
            HEADER
        );
        let data = run(&input, &mut store, &ImportOptions::default());
        assert_eq!(
            data.rows[0].errors,
            vec!["Negative values not supported: Duration"]
        );
        assert_eq!(data.rows[0].state, RowState::Failed);
        assert_eq!(data.created.total(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_midnight_rollover() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!(
            "{}alice,alice@x.com,P,C,Dev,2024-01-01 23:00,2024-01-01 01:00,\n\
             alice,alice@x.com,P,C,Dev,2024-01-01 23:00,2024-01-01 01:00,7200\n",
            HEADER
        );
        let data = run(&input, &mut store, &ImportOptions::default());
        assert_eq!(data.count_errors(), 0, "{:?}", data.rows);
        assert_eq!(
            store.query_text("SELECT end_at FROM timesheets ORDER BY id").unwrap(),
            vec!["2024-01-02T01:00:00Z", "2024-01-02T01:00:00Z"]
        );
    }

    #[test]
    fn test_oversized_durations_fail_the_row_only() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!(
            "{}alice,alice@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 17:00,99999999999999999\n\
             alice,alice@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 17:00,9999999999999999:00\n\
             alice,alice@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 17:00,1:00\n",
            HEADER
        );
        let data = run(&input, &mut store, &ImportOptions::default());

        assert_eq!(
            data.rows[0].errors,
            vec!["Invalid duration: 99999999999999999"]
        );
        assert_eq!(
            data.rows[1].errors,
            vec!["Duration: Invalid duration: 9999999999999999:00"]
        );
        assert!(data.rows[2].errors.is_empty(), "{:?}", data.rows[2].errors);
        assert_eq!(data.rows[2].state, RowState::Persisted);
        assert_eq!(store.query_i64("SELECT COUNT(*) FROM timesheets").unwrap(), 1);
    }

    #[test]
    fn test_duration_past_the_calendar_fails_the_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "Date,Duration,User,Email,Customer,Project,Activity\n\
                     2024-03-01,99999999999999,alice,alice@x.com,C,P,Dev\n\
                     2024-03-01,2h,alice,alice@x.com,C,P,Dev\n";
        let data = run(input, &mut store, &ImportOptions::default());

        assert_eq!(data.rows[0].errors, vec!["Invalid duration: 99999999999999"]);
        assert_eq!(data.rows[0].state, RowState::Failed);
        assert!(data.rows[1].errors.is_empty(), "{:?}", data.rows[1].errors);
        assert_eq!(
            store.query_text("SELECT end_at FROM timesheets").unwrap(),
            vec!["2024-03-01T14:00:00Z"]
        );
    }

    #[test]
    fn test_invalid_utf8_in_text_fields() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut input = b"User,Email,Project,Customer,Activity,Begin,End,Description\n".to_vec();
        input.extend_from_slice(b"alice,alice@x.com,Caf\xE9,C,Dev,2024-03-01 09:00,2024-03-01 10:00,Caf\xE9\n");
        input.extend_from_slice(b"alice,alice@x.com,P,C,R\xE9view,2024-03-01 09:00,2024-03-01 10:00,ok\n");
        let data = import(generic(), &csv_bytes(&input), &mut store, &ImportOptions::default()).unwrap();

        assert_eq!(
            data.rows[0].errors,
            vec![
                "Invalid encoding, requires UTF-8: Project",
                "Invalid encoding, requires UTF-8: Description",
            ]
        );
        assert_eq!(
            data.rows[1].errors,
            vec!["Invalid encoding, requires UTF-8: Activity"]
        );
        assert_eq!(data.created.total(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_date_with_end_time_counts_back() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "Date,From,To,Duration,User,Email,Customer,Project,Activity\n\
                     2024-03-01,,17:00,5400,alice,alice@x.com,C,P,Dev\n";
        let data = run(input, &mut store, &ImportOptions::default());

        assert!(data.rows[0].errors.is_empty(), "{:?}", data.rows[0].errors);
        assert_eq!(
            store.query_text("SELECT begin_at FROM timesheets").unwrap(),
            vec!["2024-03-01T15:30:00Z"]
        );
        assert_eq!(
            store.query_text("SELECT end_at FROM timesheets").unwrap(),
            vec!["2024-03-01T17:00:00Z"]
        );
    }

    #[test]
    fn test_date_with_times_over_midnight() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "Date,From,To,Duration,User,Email,Customer,Project,Activity\n\
                     2024-03-01,22:00,02:00,,alice,alice@x.com,C,P,Dev\n";
        let data = run(input, &mut store, &ImportOptions::default());

        assert!(data.rows[0].errors.is_empty(), "{:?}", data.rows[0].errors);
        assert_eq!(
            store.query_text("SELECT end_at FROM timesheets").unwrap(),
            vec!["2024-03-02T02:00:00Z"]
        );
        assert_eq!(store.query_i64("SELECT duration FROM timesheets").unwrap(), 14400);
    }

    #[test]
    fn test_missing_fields_are_collected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!("{},,,C,,2024-01-01 09:00,,\n", HEADER);
        let data = run(&input, &mut store, &ImportOptions::default());
        assert_eq!(
            data.rows[0].errors,
            vec![
                "Empty or missing field: User",
                "Empty or missing field: Project",
                "Empty or missing field: Activity",
                "Empty or missing field: End",
            ]
        );
        assert!(data.status.contains(&"failed 1 rows".to_string()));
    }

    #[test]
    fn test_unknown_user_without_email() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "User,Project,Customer,Activity,Begin,End\n\
                     ghost,P,C,Dev,2024-01-01 09:00,2024-01-01 10:00\n";
        let data = run(input, &mut store, &ImportOptions::default());
        assert_eq!(data.rows[0].errors, vec!["Unknown user ghost"]);
    }

    #[test]
    fn test_date_shape_with_rates_tags_and_meta() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "Date,From,To,Duration,User,Email,Customer,Project,Activity,HourlyRate,Tags,meta.ticket\n\
                     2024-03-01,9,,5400,alice,alice@x.com,C,P,Dev,60,\"a, b,,a\",T-1\n\
                     2024-03-01,,,1h,alice,alice@x.com,C,P,Dev,abc,,\n";
        let data = run(input, &mut store, &ImportOptions::default());

        assert!(data.rows[0].errors.is_empty(), "{:?}", data.rows[0].errors);
        assert_eq!(data.rows[1].errors, vec!["Invalid numeric value: HourlyRate"]);
        assert_eq!(data.created.tags, 2);
        assert_eq!(
            store.query_text("SELECT begin_at FROM timesheets").unwrap(),
            vec!["2024-03-01T09:00:00Z"]
        );
        assert_eq!(store.query_i64("SELECT CAST(rate * 100 AS INTEGER) FROM timesheets").unwrap(), 9000);
        assert_eq!(
            store.query_i64("SELECT COUNT(*) FROM timesheet_tags").unwrap(),
            2
        );
        assert_eq!(
            store.query_text("SELECT value FROM timesheet_meta WHERE name = 'ticket'").unwrap(),
            vec!["T-1"]
        );
    }

    #[test]
    fn test_activity_type_column_overrides_scope() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = "User,Email,Customer,Project,Activity,ActivityType,Begin,End\n\
                     alice,a@x.com,C,P1,Meeting,global,2024-03-01 09:00,2024-03-01 10:00\n\
                     alice,a@x.com,C,P1,Meeting,project,2024-03-01 10:00,2024-03-01 11:00\n\
                     alice,a@x.com,C,P1,Meeting,other,2024-03-01 11:00,2024-03-01 12:00\n";
        let data = run(input, &mut store, &ImportOptions::default());
        assert_eq!(data.created.activities, 2);
        assert_eq!(
            data.rows[2].errors,
            vec!["Invalid activity type \"other\" given, allowed values are: project, global"]
        );
        assert_eq!(
            store.query_i64("SELECT COUNT(*) FROM activities WHERE project_id IS NULL").unwrap(),
            1
        );
    }

    #[test]
    fn test_project_activities_when_global_disabled() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = format!(
            "{}alice,a@x.com,P1,C,Dev,2024-03-01 09:00,2024-03-01 10:00,\n\
             alice,a@x.com,P2,C,Dev,2024-03-01 10:00,2024-03-01 11:00,\n",
            HEADER
        );
        let options = ImportOptions {
            global_activities: false,
            ..ImportOptions::default()
        };
        let data = run(&input, &mut store, &options);
        assert_eq!(data.created.projects, 2);
        assert_eq!(data.created.activities, 2);
    }

    #[test]
    fn test_user_timezone_is_applied() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let options = ImportOptions {
            timezone: "Europe/Berlin".parse().unwrap(),
            ..ImportOptions::default()
        };
        let input = format!(
            "{}alice,a@x.com,P,C,Dev,2024-03-01 09:00,2024-03-01 10:00,\n",
            HEADER
        );
        run(&input, &mut store, &options);
        assert_eq!(
            store.query_text("SELECT begin_at FROM timesheets").unwrap(),
            vec!["2024-03-01T08:00:00Z"]
        );
        assert_eq!(
            store.query_text("SELECT timezone FROM timesheets").unwrap(),
            vec!["Europe/Berlin"]
        );
    }

    #[test]
    fn test_toggl_export() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let format = ImporterKind::Toggl.timesheet_format().unwrap();
        let input = csv(
            "User,Email,Client,Project,Task,Description,Billable,Start date,Start time,End date,End time,Duration,Tags,Amount (USD)\n\
             Alice,alice@example.com,,Website,,Landing page,No,2024-03-01,09:00:00,2024-03-01,10:30:00,01:30:00,,120.00\n",
        );
        let data = import(format, &input, &mut store, &ImportOptions::default()).unwrap();

        assert!(data.rows[0].errors.is_empty(), "{:?}", data.rows[0].errors);
        assert_eq!(data.header[0], "Customer");
        assert_eq!(data.rows[0].values[0], "Importer");
        assert_eq!(store.query_i64("SELECT duration FROM timesheets").unwrap(), 5400);
        assert_eq!(store.query_i64("SELECT billable FROM timesheets").unwrap(), 0);
        assert_eq!(
            store.query_text("SELECT name FROM customers").unwrap(),
            vec!["Importer"]
        );
    }
}
