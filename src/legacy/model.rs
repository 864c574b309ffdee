//! Rows of a legacy instance, as fetched from its tables
//!
//! Column types of legacy databases are unreliable (numbers stored as text
//! and the other way round), so every field goes through [`Fields`].

use rusqlite::types::ValueRef;
use rusqlite::Row;

/// Lenient typed access to the columns of one source row
///
/// A column that does not exist reads as `None`: not every legacy
/// installation has every optional column.
pub struct Fields<'r, 's>(pub &'r Row<'s>);

impl Fields<'_, '_> {
    fn value(&self, column: &str) -> rusqlite::Result<Option<ValueRef<'_>>> {
        match self.0.get_ref(column) {
            Ok(ValueRef::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::InvalidColumnName(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn text(&self, column: &str) -> rusqlite::Result<Option<String>> {
        Ok(self.value(column)?.map(|value| match value {
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
            ValueRef::Null => String::new(),
        }))
    }

    pub fn int(&self, column: &str) -> rusqlite::Result<Option<i64>> {
        Ok(self.value(column)?.and_then(|value| match value {
            ValueRef::Integer(i) => Some(i),
            ValueRef::Real(f) => Some(f as i64),
            ValueRef::Text(t) => std::str::from_utf8(t).ok()?.trim().parse().ok(),
            _ => None,
        }))
    }

    pub fn float(&self, column: &str) -> rusqlite::Result<Option<f64>> {
        Ok(self.value(column)?.and_then(|value| match value {
            ValueRef::Integer(i) => Some(i as f64),
            ValueRef::Real(f) => Some(f),
            ValueRef::Text(t) => std::str::from_utf8(t).ok()?.trim().parse().ok(),
            _ => None,
        }))
    }

    /// `1`/`0` style flag; missing and unparsable values are false
    pub fn flag(&self, column: &str) -> rusqlite::Result<bool> {
        Ok(self.int(column)?.is_some_and(|v| v != 0))
    }

    /// A required id column
    pub fn id(&self, column: &str) -> rusqlite::Result<i64> {
        self.int(column)?
            .ok_or_else(|| rusqlite::Error::InvalidColumnName(column.to_string()))
    }
}

/// Build a row type from a source row
pub trait FromSource: Sized {
    fn from_source(fields: &Fields) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldUser {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub mail: Option<String>,
    pub active: bool,
    pub trash: bool,
    pub ban: bool,
    pub global_role_id: Option<i64>,
}

impl FromSource for OldUser {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("userID")?,
            name: f.text("name")?.unwrap_or_default(),
            alias: f.text("alias")?,
            mail: f.text("mail")?,
            active: f.flag("active")?,
            trash: f.flag("trash")?,
            ban: f.flag("ban")?,
            global_role_id: f.int("globalRoleID")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldPreference {
    pub option: String,
    pub value: Option<String>,
}

impl FromSource for OldPreference {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            option: f.text("option")?.unwrap_or_default(),
            value: f.text("value")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldCustomer {
    pub id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub visible: bool,
    pub trash: bool,
    pub company: Option<String>,
    pub contact: Option<String>,
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub mobile: Option<String>,
    pub mail: Option<String>,
    pub homepage: Option<String>,
    pub timezone: Option<String>,
}

impl FromSource for OldCustomer {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("customerID")?,
            name: f.text("name")?.unwrap_or_default(),
            comment: f.text("comment")?,
            visible: f.flag("visible")?,
            trash: f.flag("trash")?,
            company: f.text("company")?,
            contact: f.text("contact")?,
            street: f.text("street")?,
            zipcode: f.text("zipcode")?,
            city: f.text("city")?,
            phone: f.text("phone")?,
            fax: f.text("fax")?,
            mobile: f.text("mobile")?,
            mail: f.text("mail")?,
            homepage: f.text("homepage")?,
            timezone: f.text("timezone")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldProject {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub visible: bool,
    pub trash: bool,
    pub budget: f64,
}

impl FromSource for OldProject {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("projectID")?,
            customer_id: f.int("customerID")?.unwrap_or_default(),
            name: f.text("name")?.unwrap_or_default(),
            comment: f.text("comment")?,
            visible: f.flag("visible")?,
            trash: f.flag("trash")?,
            budget: f.float("budget")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldActivity {
    pub id: i64,
    pub name: String,
    pub comment: Option<String>,
    pub visible: bool,
    pub trash: bool,
    pub budget: f64,
}

impl FromSource for OldActivity {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("activityID")?,
            name: f.text("name")?.unwrap_or_default(),
            comment: f.text("comment")?,
            visible: f.flag("visible")?,
            trash: f.flag("trash")?,
            budget: f.float("budget")?.unwrap_or_default(),
        })
    }
}

/// Row of `projects_activities`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectActivity {
    pub project_id: i64,
    pub activity_id: i64,
}

impl FromSource for ProjectActivity {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            project_id: f.id("projectID")?,
            activity_id: f.id("activityID")?,
        })
    }
}

/// Row of `rates` or `fixedRates`; `user_id` is always `None` for fixed rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OldRate {
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub rate: f64,
}

impl FromSource for OldRate {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: f.int("userID")?,
            project_id: f.int("projectID")?,
            activity_id: f.int("activityID")?,
            rate: f.float("rate")?.unwrap_or_default(),
        })
    }
}

impl OldRate {
    /// Default hourly rate of a user
    pub fn is_user_default(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id) && self.project_id.is_none() && self.activity_id.is_none()
    }

    pub fn is_for_project(&self, project_id: i64) -> bool {
        self.activity_id.is_none() && self.project_id == Some(project_id)
    }

    /// Rates of `activity_id` that are global or bound to `project_id`
    pub fn is_for_activity(&self, activity_id: i64, project_id: Option<i64>) -> bool {
        self.activity_id == Some(activity_id)
            && (self.project_id.is_none() || self.project_id == project_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldGroup {
    pub id: i64,
    pub name: String,
    pub trash: bool,
}

impl FromSource for OldGroup {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("groupID")?,
            name: f.text("name")?.unwrap_or_default(),
            trash: f.flag("trash")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMember {
    pub group_id: i64,
    pub user_id: i64,
    pub membership_role_id: Option<i64>,
}

impl FromSource for GroupMember {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            group_id: f.id("groupID")?,
            user_id: f.id("userID")?,
            membership_role_id: f.int("membershipRoleID")?,
        })
    }
}

/// Row of `groups_customers`, `groups_projects` or `groups_activities`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupLink {
    pub group_id: i64,
    pub target_id: i64,
}

impl GroupLink {
    pub fn reader(column: &'static str) -> impl Fn(&Fields<'_, '_>) -> rusqlite::Result<Self> {
        move |f| {
            Ok(Self {
                group_id: f.id("groupID")?,
                target_id: f.id(column)?,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OldTimesheet {
    pub id: i64,
    /// Unix timestamp
    pub start: i64,
    /// Unix timestamp; `None` or 0 for a running record
    pub end: Option<i64>,
    pub user_id: i64,
    pub project_id: i64,
    pub activity_id: i64,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub cleared: bool,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub rate: Option<f64>,
    pub fixed_rate: Option<f64>,
}

impl FromSource for OldTimesheet {
    fn from_source(f: &Fields) -> rusqlite::Result<Self> {
        Ok(Self {
            id: f.id("timeEntryID")?,
            start: f.int("start")?.unwrap_or_default(),
            end: f.int("end")?.filter(|end| *end != 0),
            user_id: f.int("userID")?.unwrap_or_default(),
            project_id: f.int("projectID")?.unwrap_or_default(),
            activity_id: f.int("activityID")?.unwrap_or_default(),
            description: f.text("description")?,
            comment: f.text("comment")?,
            cleared: f.flag("cleared")?,
            location: f.text("location")?,
            tracking_number: f.text("trackingNumber")?,
            rate: f.float("rate")?,
            fixed_rate: f.float("fixedRate")?,
        })
    }
}

/// Everything of one instance except timesheets, which are streamed
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<OldUser>,
    pub customers: Vec<OldCustomer>,
    pub projects: Vec<OldProject>,
    pub activities: Vec<OldActivity>,
    pub fixed_rates: Vec<OldRate>,
    pub rates: Vec<OldRate>,
}
