//! Project entity

use chrono::{DateTime, Utc};

use super::{Budget, MetaFields};

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Option<i64>,
    pub name: String,
    /// Owning customer; always set before the project is saved
    pub customer_id: Option<i64>,
    pub comment: Option<String>,
    pub order_number: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub color: Option<String>,
    pub visible: bool,
    pub budget: Budget,
    pub meta: MetaFields,
}

impl Project {
    pub const MAX_NAME_LEN: usize = 150;
    pub const MAX_ORDER_NUMBER_LEN: usize = 50;

    pub fn new(name: impl Into<String>, customer_id: Option<i64>) -> Self {
        Self {
            id: None,
            name: name.into(),
            customer_id,
            comment: None,
            order_number: None,
            order_date: None,
            start: None,
            end: None,
            color: None,
            visible: true,
            budget: Budget::default(),
            meta: MetaFields::new(),
        }
    }
}
