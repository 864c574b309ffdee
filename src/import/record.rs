//! Canonical timesheet record produced by every timesheet format

use std::collections::BTreeSet;

use crate::core::values::convert_boolean;
use crate::entities::MetaFields;

use super::parser::RawValue;

/// Canonical fields a timesheet column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    User,
    Email,
    Alias,
    Customer,
    Project,
    Activity,
    ActivityType,
    Date,
    From,
    To,
    Begin,
    End,
    BeginDate,
    BeginTime,
    EndDate,
    EndTime,
    Duration,
    Break,
    Description,
    Rate,
    HourlyRate,
    FixedRate,
    InternalRate,
    Tags,
    Billable,
    Exported,
}

impl Field {
    /// Canonical column name
    pub fn name(&self) -> &'static str {
        match self {
            Field::User => "User",
            Field::Email => "Email",
            Field::Alias => "Alias",
            Field::Customer => "Customer",
            Field::Project => "Project",
            Field::Activity => "Activity",
            Field::ActivityType => "ActivityType",
            Field::Date => "Date",
            Field::From => "From",
            Field::To => "To",
            Field::Begin => "Begin",
            Field::End => "End",
            Field::BeginDate => "Start date",
            Field::BeginTime => "Start time",
            Field::EndDate => "End date",
            Field::EndTime => "End time",
            Field::Duration => "Duration",
            Field::Break => "Break",
            Field::Description => "Description",
            Field::Rate => "Rate",
            Field::HourlyRate => "HourlyRate",
            Field::FixedRate => "FixedRate",
            Field::InternalRate => "InternalRate",
            Field::Tags => "Tags",
            Field::Billable => "Billable",
            Field::Exported => "Exported",
        }
    }
}

/// A duration as found in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationValue {
    /// Integer input, always seconds
    Seconds(i64),
    /// Anything else, resolved by the mapper
    Text(String),
}

impl DurationValue {
    pub fn is_negative(&self) -> bool {
        match self {
            DurationValue::Seconds(s) => *s < 0,
            DurationValue::Text(t) => t.starts_with('-'),
        }
    }

    fn display(&self) -> String {
        match self {
            DurationValue::Seconds(s) => s.to_string(),
            DurationValue::Text(t) => t.clone(),
        }
    }
}

/// How a format expresses begin and end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeShape {
    /// Full timestamps in Begin and End
    #[default]
    Range,
    /// A Date plus optional From and To times
    Date,
}

/// Typed view of one timesheet row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRecord {
    pub shape: TimeShape,
    pub user: Option<String>,
    pub email: Option<String>,
    pub alias: Option<String>,
    pub customer: Option<String>,
    pub project: Option<String>,
    pub activity: Option<String>,
    pub activity_type: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub duration: Option<DurationValue>,
    pub break_duration: Option<DurationValue>,
    pub description: Option<String>,
    pub rate: Option<String>,
    pub hourly_rate: Option<String>,
    pub fixed_rate: Option<String>,
    pub internal_rate: Option<String>,
    pub tags: Option<String>,
    pub billable: Option<bool>,
    pub exported: Option<bool>,
    pub meta: MetaFields,
    /// Fields whose input bytes were not valid UTF-8
    pub malformed: BTreeSet<Field>,
    assigned: BTreeSet<Field>,
    begin_date: Option<String>,
    begin_time: Option<String>,
    end_date: Option<String>,
    end_time: Option<String>,
}

impl CanonicalRecord {
    pub fn new(shape: TimeShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Set `field` from a raw value
    ///
    /// Blank values leave the field untouched, so defaults survive empty
    /// vendor columns. The first non-blank value for a field wins.
    pub fn set(&mut self, field: Field, value: &RawValue) {
        if value.is_blank() || !self.assigned.insert(field) {
            return;
        }
        if value.is_malformed() {
            self.malformed.insert(field);
        }

        match field {
            Field::Duration => self.duration = duration_value(value),
            Field::Break => self.break_duration = duration_value(value),
            Field::Billable => self.billable = Some(boolean_value(value)),
            Field::Exported => self.exported = Some(boolean_value(value)),
            _ => {
                let text = value.display().trim().to_string();
                if let Some(slot) = self.text_slot(field) {
                    *slot = Some(text);
                }
            }
        }
    }

    /// Set `field` unconditionally, used for format defaults
    pub fn set_default(&mut self, field: Field, value: &str) {
        match field {
            Field::Billable => self.billable = Some(convert_boolean(value)),
            Field::Exported => self.exported = Some(convert_boolean(value)),
            Field::Duration => self.duration = Some(DurationValue::Text(value.to_string())),
            Field::Break => {
                self.break_duration = Some(DurationValue::Text(value.to_string()))
            }
            _ => {
                if let Some(slot) = self.text_slot(field) {
                    *slot = Some(value.to_string());
                }
            }
        }
    }

    pub fn set_meta(&mut self, name: &str, value: &RawValue) {
        self.meta.insert(name.to_string(), value.display());
    }

    /// Join split date and time columns into Begin and End
    pub fn combine_parts(&mut self) {
        if self.begin.is_none() {
            self.begin = join_parts(self.begin_date.take(), self.begin_time.take());
        }
        if self.end.is_none() {
            self.end = join_parts(self.end_date.take(), self.end_time.take());
        }
    }

    pub fn is_malformed(&self, field: Field) -> bool {
        self.malformed.contains(&field)
    }

    /// Display value of `field`
    pub fn display(&self, field: Field) -> String {
        match field {
            Field::Duration => self
                .duration
                .as_ref()
                .map(DurationValue::display)
                .unwrap_or_default(),
            Field::Break => self
                .break_duration
                .as_ref()
                .map(DurationValue::display)
                .unwrap_or_default(),
            Field::Billable => self.billable.map(|b| b.to_string()).unwrap_or_default(),
            Field::Exported => self.exported.map(|b| b.to_string()).unwrap_or_default(),
            _ => self.text(field).unwrap_or_default().to_string(),
        }
    }

    fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::User => &self.user,
            Field::Email => &self.email,
            Field::Alias => &self.alias,
            Field::Customer => &self.customer,
            Field::Project => &self.project,
            Field::Activity => &self.activity,
            Field::ActivityType => &self.activity_type,
            Field::Date => &self.date,
            Field::From => &self.from,
            Field::To => &self.to,
            Field::Begin => &self.begin,
            Field::End => &self.end,
            Field::BeginDate => &self.begin_date,
            Field::BeginTime => &self.begin_time,
            Field::EndDate => &self.end_date,
            Field::EndTime => &self.end_time,
            Field::Description => &self.description,
            Field::Rate => &self.rate,
            Field::HourlyRate => &self.hourly_rate,
            Field::FixedRate => &self.fixed_rate,
            Field::InternalRate => &self.internal_rate,
            Field::Tags => &self.tags,
            Field::Duration | Field::Break | Field::Billable | Field::Exported => return None,
        };
        value.as_deref()
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        Some(match field {
            Field::User => &mut self.user,
            Field::Email => &mut self.email,
            Field::Alias => &mut self.alias,
            Field::Customer => &mut self.customer,
            Field::Project => &mut self.project,
            Field::Activity => &mut self.activity,
            Field::ActivityType => &mut self.activity_type,
            Field::Date => &mut self.date,
            Field::From => &mut self.from,
            Field::To => &mut self.to,
            Field::Begin => &mut self.begin,
            Field::End => &mut self.end,
            Field::BeginDate => &mut self.begin_date,
            Field::BeginTime => &mut self.begin_time,
            Field::EndDate => &mut self.end_date,
            Field::EndTime => &mut self.end_time,
            Field::Description => &mut self.description,
            Field::Rate => &mut self.rate,
            Field::HourlyRate => &mut self.hourly_rate,
            Field::FixedRate => &mut self.fixed_rate,
            Field::InternalRate => &mut self.internal_rate,
            Field::Tags => &mut self.tags,
            Field::Duration | Field::Break | Field::Billable | Field::Exported => return None,
        })
    }
}

/// Integers are seconds, text is parsed later; JSON floats and booleans
/// are not durations and leave the field unset
fn duration_value(value: &RawValue) -> Option<DurationValue> {
    match value {
        RawValue::Int(seconds) => Some(DurationValue::Seconds(*seconds)),
        RawValue::Text(text) | RawValue::Malformed(text) => {
            Some(DurationValue::Text(text.trim().to_string()))
        }
        RawValue::Null | RawValue::Bool(_) | RawValue::Float(_) => None,
    }
}

fn boolean_value(value: &RawValue) -> bool {
    match value {
        RawValue::Bool(b) => *b,
        RawValue::Int(i) => *i != 0,
        other => convert_boolean(&other.display()),
    }
}

fn join_parts(date: Option<String>, time: Option<String>) -> Option<String> {
    match (date, time) {
        (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
        (Some(date), None) => Some(date),
        (None, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> RawValue {
        RawValue::Text(value.to_string())
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set_default(Field::Customer, "Importer");
        record.set(Field::Customer, &text("  "));
        assert_eq!(record.customer.as_deref(), Some("Importer"));
        record.set(Field::Customer, &text("ACME"));
        record.set(Field::Customer, &text("Other"));
        assert_eq!(record.customer.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_duration_and_boolean_coercion() {
        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set(Field::Duration, &RawValue::Int(-5));
        record.set(Field::Billable, &text("Yes"));
        record.set(Field::Exported, &RawValue::Int(0));
        assert_eq!(record.duration, Some(DurationValue::Seconds(-5)));
        assert!(record.duration.as_ref().is_some_and(DurationValue::is_negative));
        assert_eq!(record.billable, Some(true));
        assert_eq!(record.exported, Some(false));
    }

    #[test]
    fn test_json_float_duration_is_ignored() {
        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set(Field::Duration, &RawValue::Float(1.5));
        record.set(Field::Break, &RawValue::Bool(true));
        assert_eq!(record.duration, None);
        assert_eq!(record.break_duration, None);

        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set(Field::Duration, &text(" 1.5 "));
        assert_eq!(record.duration, Some(DurationValue::Text("1.5".to_string())));
    }

    #[test]
    fn test_date_and_time_parts_are_joined() {
        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set(Field::BeginDate, &text("2024-03-01"));
        record.set(Field::BeginTime, &text("09:00:00"));
        record.set(Field::EndDate, &text("2024-03-01"));
        record.set(Field::EndTime, &text("17:00:00"));
        record.combine_parts();
        assert_eq!(record.begin.as_deref(), Some("2024-03-01 09:00:00"));
        assert_eq!(record.end.as_deref(), Some("2024-03-01 17:00:00"));
    }

    #[test]
    fn test_malformed_fields_are_tracked() {
        let mut record = CanonicalRecord::new(TimeShape::Range);
        record.set(Field::Project, &RawValue::Malformed("Caf\u{FFFD}".to_string()));
        assert!(record.is_malformed(Field::Project));
        assert!(!record.is_malformed(Field::Activity));
    }
}
