//! Customer entity

use super::{Budget, MetaFields};

/// Values applied to customers that do not bring their own
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDefaults {
    pub country: String,
    pub currency: String,
    pub timezone: String,
}

impl Default for CustomerDefaults {
    fn default() -> Self {
        Self {
            country: "DE".to_string(),
            currency: "EUR".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Option<i64>,
    pub name: String,
    /// Account number
    pub number: Option<String>,
    pub comment: Option<String>,
    pub company: Option<String>,
    pub vat_id: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub country: String,
    pub currency: String,
    pub timezone: String,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub homepage: Option<String>,
    pub color: Option<String>,
    pub visible: bool,
    pub budget: Budget,
    pub meta: MetaFields,
}

impl Customer {
    pub const MAX_NAME_LEN: usize = 150;

    pub fn new(name: impl Into<String>, defaults: &CustomerDefaults) -> Self {
        Self {
            id: None,
            name: name.into(),
            number: None,
            comment: None,
            company: None,
            vat_id: None,
            contact: None,
            address: None,
            country: defaults.country.clone(),
            currency: defaults.currency.clone(),
            timezone: defaults.timezone.clone(),
            phone: None,
            fax: None,
            mobile: None,
            email: None,
            homepage: None,
            color: None,
            visible: true,
            budget: Budget::default(),
            meta: MetaFields::new(),
        }
    }
}
