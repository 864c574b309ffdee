//! Importer selection and timesheet format tables
//!
//! The generic timesheet format and the vendor exports (Toggl, Clockify)
//! share one pipeline. What differs between them is data: which columns
//! are required, how column names map to canonical fields, and which
//! defaults apply when a vendor has no such concept.

use serde::Serialize;

use super::parser::RawRow;
use super::record::{CanonicalRecord, Field, TimeShape};
use super::ImportError;

/// Prefix of columns that become meta fields
pub const META_PREFIX: &str = "meta.";

/// Customer, project and activity name used when a vendor export has none
pub const PLACEHOLDER_NAME: &str = "Importer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImporterKind {
    /// Generic timesheet CSV/JSON
    Timesheet,
    /// Toggl detailed report
    Toggl,
    /// Clockify detailed report
    Clockify,
    /// Customer list
    Customer,
    /// Project list
    Project,
    /// Grandtotal customer export
    Grandtotal,
}

impl ImporterKind {
    pub const ALL: [ImporterKind; 6] = [
        ImporterKind::Timesheet,
        ImporterKind::Toggl,
        ImporterKind::Clockify,
        ImporterKind::Customer,
        ImporterKind::Project,
        ImporterKind::Grandtotal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImporterKind::Timesheet => "timesheet",
            ImporterKind::Toggl => "toggl",
            ImporterKind::Clockify => "clockify",
            ImporterKind::Customer => "customer",
            ImporterKind::Project => "project",
            ImporterKind::Grandtotal => "grandtotal",
        }
    }

    /// Format table for the timesheet importers
    pub fn timesheet_format(&self) -> Option<&'static TimesheetFormat> {
        match self {
            ImporterKind::Timesheet => Some(&GENERIC),
            ImporterKind::Toggl => Some(&TOGGL),
            ImporterKind::Clockify => Some(&CLOCKIFY),
            _ => None,
        }
    }

    /// Whether this importer claims a file with `header`
    pub fn supports(&self, header: &[String]) -> bool {
        let has = |names: &[&str]| header_has(header, names);
        match self {
            ImporterKind::Customer => {
                has(&["name", "customer"]) && !has(&["project", "organization", "firma"])
            }
            ImporterKind::Project => {
                has(&["name", "project"])
                    && has(&["customer"])
                    && !has(&[
                        "exported", "duration", "user", "username", "begin", "date", "activity",
                    ])
            }
            ImporterKind::Grandtotal => has(&["organization", "firma"]),
            _ => self
                .timesheet_format()
                .is_some_and(|format| format.missing(header).is_empty()),
        }
    }

    /// Missing required columns, followed by columns the importer does not know
    pub fn check_header(&self, header: &[String]) -> Vec<String> {
        let mut columns = match self.timesheet_format() {
            Some(format) => format.missing(header),
            None => {
                let mut missing = Vec::new();
                let has = |names: &[&str]| header_has(header, names);
                match self {
                    ImporterKind::Customer => {
                        if !has(&["name", "customer"]) {
                            missing.push("Name".to_string());
                        }
                    }
                    ImporterKind::Project => {
                        if !has(&["name", "project"]) {
                            missing.push("Name".to_string());
                        }
                        if !has(&["customer"]) {
                            missing.push("Customer".to_string());
                        }
                    }
                    _ => {
                        if !has(&["organization", "firma"]) {
                            missing.push("Organization".to_string());
                        }
                    }
                }
                missing
            }
        };

        columns.extend(
            header
                .iter()
                .filter(|column| !self.knows_column(column))
                .map(|column| format!("{} (unexpected)", column)),
        );
        columns
    }

    fn knows_column(&self, column: &str) -> bool {
        let lower = column.trim().to_lowercase();
        if lower.starts_with(META_PREFIX) {
            return *self != ImporterKind::Grandtotal;
        }
        match self {
            ImporterKind::Customer => CUSTOMER_COLUMNS.contains(&lower.as_str()),
            ImporterKind::Project => PROJECT_COLUMNS.contains(&lower.as_str()),
            ImporterKind::Grandtotal => GRANDTOTAL_COLUMNS.contains(&lower.as_str()),
            _ => self
                .timesheet_format()
                .is_some_and(|format| format.rule_for(&lower).is_some()),
        }
    }

    /// The single importer claiming `header`
    pub fn detect(header: &[String]) -> Result<ImporterKind, ImportError> {
        let candidates: Vec<ImporterKind> = Self::ALL
            .into_iter()
            .filter(|kind| kind.supports(header))
            .collect();

        match candidates.as_slice() {
            [kind] => Ok(*kind),
            [] => Err(ImportError::NoMatchingImporter {
                columns: header.join(", "),
            }),
            many => Err(ImportError::AmbiguousImporter {
                candidates: many
                    .iter()
                    .map(ImporterKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Header and example row for `tsi import --template`
    pub fn template(&self) -> (&'static [&'static str], &'static [&'static str]) {
        match self {
            ImporterKind::Timesheet => (
                &[
                    "User", "Email", "Customer", "Project", "Activity", "Begin", "End",
                    "Duration", "Description", "Tags", "HourlyRate", "Billable",
                ],
                &[
                    "alice",
                    "alice@example.com",
                    "ACME",
                    "Website",
                    "Development",
                    "2024-03-01 09:00",
                    "2024-03-01 17:00",
                    "",
                    "Landing page",
                    "frontend,design",
                    "80",
                    "yes",
                ],
            ),
            ImporterKind::Toggl => (
                &[
                    "User", "Email", "Client", "Project", "Task", "Description", "Billable",
                    "Start date", "Start time", "End date", "End time", "Duration", "Tags",
                    "Amount (USD)",
                ],
                &[
                    "Alice",
                    "alice@example.com",
                    "ACME",
                    "Website",
                    "Development",
                    "Landing page",
                    "Yes",
                    "2024-03-01",
                    "09:00:00",
                    "2024-03-01",
                    "17:00:00",
                    "08:00:00",
                    "frontend",
                    "640.00",
                ],
            ),
            ImporterKind::Clockify => (
                &[
                    "Project", "Client", "Description", "Task", "User", "Group", "Email",
                    "Tags", "Billable", "Start Date", "Start Time", "End Date", "End Time",
                    "Duration (h)", "Duration (decimal)", "Billable Rate (EUR)",
                    "Billable Amount (EUR)",
                ],
                &[
                    "Website",
                    "ACME",
                    "Landing page",
                    "Development",
                    "Alice",
                    "",
                    "alice@example.com",
                    "frontend",
                    "Yes",
                    "03/01/2024",
                    "09:00:00 AM",
                    "03/01/2024",
                    "05:00:00 PM",
                    "08:00:00",
                    "8.00",
                    "80.00",
                    "640.00",
                ],
            ),
            ImporterKind::Customer => (
                &[
                    "Name", "Company", "Account", "Email", "Country", "Currency", "Timezone",
                    "Visible", "Budget",
                ],
                &[
                    "ACME",
                    "ACME Inc.",
                    "C-100",
                    "office@acme.example",
                    "DE",
                    "EUR",
                    "Europe/Berlin",
                    "1",
                    "10000",
                ],
            ),
            ImporterKind::Project => (
                &[
                    "Project", "Customer", "Description", "OrderNumber", "OrderDate", "StartDate",
                    "EndDate", "Budget", "Visible",
                ],
                &[
                    "Website",
                    "ACME",
                    "Relaunch",
                    "PO-2024-17",
                    "2024-02-15",
                    "2024-03-01",
                    "2024-06-30",
                    "5000",
                    "1",
                ],
            ),
            ImporterKind::Grandtotal => (
                &[
                    "Organization", "Customer number", "E-Mail", "Country", "Title",
                    "First name", "Last name", "Street", "ZIP", "City", "Note",
                ],
                &[
                    "ACME",
                    "C-100",
                    "office@acme.example",
                    "DE",
                    "Dr.",
                    "Jane",
                    "Doe",
                    "Main Street 1",
                    "10115",
                    "Berlin",
                    "<p>Key account</p>",
                ],
            ),
        }
    }
}

impl std::fmt::Display for ImporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn header_has(header: &[String], names: &[&str]) -> bool {
    header
        .iter()
        .any(|column| names.iter().any(|name| column.trim().eq_ignore_ascii_case(name)))
}

/// Columns the customer importer maps
pub const CUSTOMER_COLUMNS: &[&str] = &[
    "name", "customer", "company", "email", "country", "account", "tax", "description",
    "address", "contact", "currency", "timezone", "phone", "mobile", "fax", "homepage", "color",
    "visible", "budget", "budgettype", "timebudget",
];

/// Columns the project importer maps
pub const PROJECT_COLUMNS: &[&str] = &[
    "name", "project", "customer", "description", "ordernumber", "orderdate", "startdate",
    "enddate", "color", "visible", "budget", "budgettype", "timebudget",
];

/// Columns of a Grandtotal export, English and German
pub const GRANDTOTAL_COLUMNS: &[&str] = &[
    "organization", "firma", "department", "abteilung", "salutation", "briefanrede", "state",
    "bundesland", "iban", "bic", "sepa mandate id", "sepa mandat", "e-mail", "country", "land",
    "customer number", "kundennummer", "tax-id", "umsatzsteuer", "note", "notiz", "title",
    "titel", "first name", "vorname", "middle name", "zweiter vorname", "last name", "nachname",
    "street", "straße", "zip", "plz", "city", "ort",
];

/// What a column maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Field(Field),
    /// Known column without a destination
    Ignore,
}

/// Lowercase column name, or a prefix when it ends with `*`
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub pattern: &'static str,
    pub target: Target,
}

impl ColumnRule {
    fn matches(&self, column: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => column.starts_with(prefix),
            None => column == self.pattern,
        }
    }
}

const fn field(pattern: &'static str, field: Field) -> ColumnRule {
    ColumnRule {
        pattern,
        target: Target::Field(field),
    }
}

const fn ignore(pattern: &'static str) -> ColumnRule {
    ColumnRule {
        pattern,
        target: Target::Ignore,
    }
}

/// A column requirement of a format
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// Some column mapping to this field
    Field(Field),
    /// Either Begin and End, or Date
    TimeRange,
}

/// A timesheet format described as data
#[derive(Debug)]
pub struct TimesheetFormat {
    pub kind: ImporterKind,
    /// Title shown above the import result
    pub title: &'static str,
    pub required: &'static [Requirement],
    pub columns: &'static [ColumnRule],
    /// Values applied before the row is read
    pub defaults: &'static [(Field, &'static str)],
    /// Fixed result header; the input header is used when empty
    pub display: &'static [Field],
    /// Look users up by display name as last resort
    pub match_user_alias: bool,
}

impl TimesheetFormat {
    fn rule_for(&self, lower_column: &str) -> Option<&ColumnRule> {
        self.columns.iter().find(|rule| rule.matches(lower_column))
    }

    fn has_field(&self, header: &[String], wanted: Field) -> bool {
        header.iter().any(|column| {
            let lower = column.trim().to_lowercase();
            self.rule_for(&lower)
                .is_some_and(|rule| rule.target == Target::Field(wanted))
        })
    }

    /// Names of unmet requirements
    pub fn missing(&self, header: &[String]) -> Vec<String> {
        let mut missing = Vec::new();
        for requirement in self.required {
            match requirement {
                Requirement::Field(wanted) => {
                    if !self.has_field(header, *wanted) {
                        missing.push(self.column_name(*wanted));
                    }
                }
                Requirement::TimeRange => {
                    let range = self.has_field(header, Field::Begin)
                        && self.has_field(header, Field::End);
                    if !range && !self.has_field(header, Field::Date) {
                        missing.push("Begin, End or Date".to_string());
                    }
                }
            }
        }
        missing
    }

    /// The column name this format expects for `wanted`
    fn column_name(&self, wanted: Field) -> String {
        self.columns
            .iter()
            .find(|rule| rule.target == Target::Field(wanted) && !rule.pattern.ends_with('*'))
            .map(|rule| title_case(rule.pattern))
            .unwrap_or_else(|| wanted.name().to_string())
    }

    /// How begin and end are expressed in files with `header`
    pub fn shape(&self, header: &[String]) -> TimeShape {
        let range = [Field::Begin, Field::End, Field::BeginDate, Field::EndDate]
            .into_iter()
            .any(|f| self.has_field(header, f));
        if !range && self.has_field(header, Field::Date) {
            TimeShape::Date
        } else {
            TimeShape::Range
        }
    }

    /// Result header for files with `header`
    pub fn display_header(&self, header: &[String]) -> Vec<String> {
        if self.display.is_empty() {
            header.to_vec()
        } else {
            self.display.iter().map(|f| f.name().to_string()).collect()
        }
    }

    /// Display values of a row, lined up with [`TimesheetFormat::display_header`]
    pub fn display_values(&self, raw: &RawRow, record: &CanonicalRecord, header: &[String]) -> Vec<String> {
        if self.display.is_empty() {
            raw.values_for(header)
        } else {
            self.display.iter().map(|f| record.display(*f)).collect()
        }
    }

    /// Build the canonical record of one row
    pub fn record(&self, raw: &RawRow, shape: TimeShape) -> CanonicalRecord {
        let mut record = CanonicalRecord::new(shape);
        for (target, value) in self.defaults {
            record.set_default(*target, value);
        }

        for (column, value) in &raw.fields {
            let lower = column.trim().to_lowercase();
            if let Some(rule) = self.rule_for(&lower) {
                if let Target::Field(target) = rule.target {
                    record.set(target, value);
                }
            } else if let Some(name) = lower.strip_prefix(META_PREFIX) {
                if self.display.is_empty() && !name.is_empty() {
                    record.set_meta(name, value);
                }
            }
        }

        record.combine_parts();
        if let Some(from) = record.from.take() {
            record.from = Some(pad_hour(&from));
        }
        if let Some(to) = record.to.take() {
            record.to = Some(pad_hour(&to));
        }
        record
    }
}

fn title_case(pattern: &str) -> String {
    let mut chars = pattern.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `9` becomes `09:00`, `14` becomes `14:00`
fn pad_hour(value: &str) -> String {
    match value.len() {
        1 => format!("0{}:00", value),
        2 => format!("{}:00", value),
        _ => value.to_string(),
    }
}

static GENERIC: TimesheetFormat = TimesheetFormat {
    kind: ImporterKind::Timesheet,
    title: "time_tracking",
    required: &[
        Requirement::Field(Field::User),
        Requirement::Field(Field::Project),
        Requirement::Field(Field::Activity),
        Requirement::Field(Field::Customer),
        Requirement::TimeRange,
    ],
    columns: &[
        field("user", Field::User),
        field("username", Field::User),
        field("name", Field::User),
        field("benutzer", Field::User),
        field("email", Field::Email),
        field("e-mail", Field::Email),
        field("alias", Field::Alias),
        field("customer", Field::Customer),
        field("kunde", Field::Customer),
        field("project", Field::Project),
        field("projekt", Field::Project),
        field("activity", Field::Activity),
        field("tätigkeit", Field::Activity),
        field("activitytype", Field::ActivityType),
        field("date", Field::Date),
        field("datum", Field::Date),
        field("from", Field::From),
        field("von", Field::From),
        field("to", Field::To),
        field("bis", Field::To),
        field("begin", Field::Begin),
        field("end", Field::End),
        field("duration", Field::Duration),
        field("dauer", Field::Duration),
        field("break", Field::Break),
        field("description", Field::Description),
        field("beschreibung", Field::Description),
        field("rate", Field::Rate),
        field("hourlyrate", Field::HourlyRate),
        field("fixedrate", Field::FixedRate),
        field("internalrate", Field::InternalRate),
        field("tags", Field::Tags),
        field("billable", Field::Billable),
        field("exported", Field::Exported),
    ],
    defaults: &[],
    display: &[],
    match_user_alias: false,
};

static TOGGL: TimesheetFormat = TimesheetFormat {
    kind: ImporterKind::Toggl,
    title: "Toggl",
    required: &[
        Requirement::Field(Field::User),
        Requirement::Field(Field::Email),
        Requirement::Field(Field::Customer),
        Requirement::Field(Field::Project),
        Requirement::Field(Field::Activity),
        Requirement::Field(Field::Description),
        Requirement::Field(Field::Billable),
        Requirement::Field(Field::BeginDate),
        Requirement::Field(Field::BeginTime),
        Requirement::Field(Field::EndDate),
        Requirement::Field(Field::EndTime),
        Requirement::Field(Field::Duration),
        Requirement::Field(Field::Tags),
    ],
    columns: &[
        field("user", Field::User),
        field("email", Field::Email),
        field("client", Field::Customer),
        field("project", Field::Project),
        field("task", Field::Activity),
        field("description", Field::Description),
        field("billable", Field::Billable),
        field("start date", Field::BeginDate),
        field("start time", Field::BeginTime),
        field("end date", Field::EndDate),
        field("end time", Field::EndTime),
        field("duration", Field::Duration),
        field("tags", Field::Tags),
        field("amount*", Field::Rate),
    ],
    defaults: &[
        (Field::Customer, PLACEHOLDER_NAME),
        (Field::Project, PLACEHOLDER_NAME),
        (Field::Activity, PLACEHOLDER_NAME),
        (Field::Billable, "true"),
    ],
    display: &[
        Field::Customer,
        Field::Project,
        Field::Activity,
        Field::Begin,
        Field::End,
        Field::Description,
        Field::User,
        Field::Email,
        Field::Tags,
        Field::Billable,
        Field::Rate,
        Field::Duration,
    ],
    match_user_alias: true,
};

static CLOCKIFY: TimesheetFormat = TimesheetFormat {
    kind: ImporterKind::Clockify,
    title: "Clockify",
    required: &[
        Requirement::Field(Field::Project),
        Requirement::Field(Field::Customer),
        Requirement::Field(Field::Description),
        Requirement::Field(Field::Activity),
        Requirement::Field(Field::User),
        Requirement::Field(Field::Email),
        Requirement::Field(Field::Tags),
        Requirement::Field(Field::Billable),
        Requirement::Field(Field::BeginDate),
        Requirement::Field(Field::BeginTime),
        Requirement::Field(Field::EndDate),
        Requirement::Field(Field::EndTime),
        Requirement::Field(Field::Duration),
    ],
    columns: &[
        field("project", Field::Project),
        field("client", Field::Customer),
        field("description", Field::Description),
        field("task", Field::Activity),
        field("user", Field::User),
        ignore("group"),
        field("email", Field::Email),
        field("tags", Field::Tags),
        field("billable", Field::Billable),
        field("start date", Field::BeginDate),
        field("start time", Field::BeginTime),
        field("end date", Field::EndDate),
        field("end time", Field::EndTime),
        field("duration (h)", Field::Duration),
        // rounded to two decimals, loses minutes
        ignore("duration (decimal)"),
        field("billable rate*", Field::HourlyRate),
        field("billable amount*", Field::Rate),
    ],
    defaults: &[(Field::Customer, PLACEHOLDER_NAME), (Field::Billable, "true")],
    display: &[
        Field::Begin,
        Field::End,
        Field::Customer,
        Field::Project,
        Field::Description,
        Field::Activity,
        Field::User,
        Field::Email,
        Field::Tags,
        Field::Billable,
        Field::Duration,
        Field::HourlyRate,
        Field::Rate,
    ],
    match_user_alias: true,
};
