//! Column access for the customer and project importers

use crate::core::values::{is_integer, parse_number};
use crate::entities::Budget;

use super::format::META_PREFIX;
use super::parser::RawRow;

/// A row as lowercase column names and trimmed values, blank values as `None`
pub struct Cells {
    cells: Vec<(String, Option<String>)>,
}

impl Cells {
    pub fn new(raw: &RawRow) -> Self {
        let cells = raw
            .fields
            .iter()
            .map(|(column, value)| {
                let text = value.display().trim().to_string();
                let value = if text.is_empty() { None } else { Some(text) };
                (column.trim().to_lowercase(), value)
            })
            .collect();
        Self { cells }
    }

    /// Value of the first column named like one of `names`
    pub fn first(&self, names: &[&str]) -> Option<&str> {
        self.cells
            .iter()
            .find(|(column, _)| names.contains(&column.as_str()))
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_deref()))
    }
}

/// Name of a `meta.*` column
pub fn meta_name(column: &str) -> Option<&str> {
    column
        .strip_prefix(META_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Apply a budget column; false when `column` is not a budget column
pub fn apply_budget(
    budget: &mut Budget,
    column: &str,
    value: Option<&str>,
    errors: &mut Vec<String>,
) -> bool {
    match column {
        "budget" => match value {
            None => budget.money = 0.0,
            Some(v) => match parse_number(v) {
                Some(money) => budget.money = money,
                None => errors.push(format!("Invalid numeric value: {}", column)),
            },
        },
        "timebudget" => match value {
            None => budget.time = 0,
            Some(v) if is_integer(v) => match v.parse() {
                Ok(seconds) => budget.time = seconds,
                Err(_) => errors.push(format!("Invalid numeric value: {}", column)),
            },
            Some(_) => errors.push(format!("Invalid numeric value: {}", column)),
        },
        "budgettype" => budget.kind = value.map(str::to_string),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::parser::RawValue;

    #[test]
    fn test_cells_are_normalised() {
        let raw = RawRow {
            fields: vec![
                (" Name ".to_string(), RawValue::Text(" ACME ".to_string())),
                ("Customer".to_string(), RawValue::Text("Other".to_string())),
                ("Email".to_string(), RawValue::Text("  ".to_string())),
            ],
        };
        let cells = Cells::new(&raw);
        assert_eq!(cells.first(&["name", "customer"]), Some("ACME"));
        assert_eq!(cells.first(&["email"]), None);
    }

    #[test]
    fn test_budget_columns() {
        let mut budget = Budget::default();
        let mut errors = Vec::new();
        assert!(apply_budget(&mut budget, "budget", Some("1500.5"), &mut errors));
        assert!(apply_budget(&mut budget, "timebudget", Some("3600"), &mut errors));
        assert!(apply_budget(&mut budget, "budgettype", Some("month"), &mut errors));
        assert!(!apply_budget(&mut budget, "color", Some("#fff"), &mut errors));
        assert!(errors.is_empty());
        assert_eq!(budget.money, 1500.5);
        assert_eq!(budget.time, 3600);

        apply_budget(&mut budget, "budget", Some("lots"), &mut errors);
        assert_eq!(errors, vec!["Invalid numeric value: budget"]);
    }

    #[test]
    fn test_meta_columns() {
        assert_eq!(meta_name("meta.crm"), Some("crm"));
        assert_eq!(meta_name("meta."), None);
        assert_eq!(meta_name("crm"), None);
    }
}
