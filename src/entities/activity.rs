//! Activity entity

use super::{Budget, MetaFields};

/// An activity is global when it has no project
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: Option<i64>,
    pub name: String,
    pub project_id: Option<i64>,
    pub comment: Option<String>,
    pub color: Option<String>,
    pub visible: bool,
    pub budget: Budget,
    pub meta: MetaFields,
}

impl Activity {
    pub const MAX_NAME_LEN: usize = 150;

    pub fn new(name: impl Into<String>, project_id: Option<i64>) -> Self {
        Self {
            id: None,
            name: name.into(),
            project_id,
            comment: None,
            color: None,
            visible: true,
            budget: Budget::default(),
            meta: MetaFields::new(),
        }
    }
}
