//! Project list importer

use chrono::{DateTime, Utc};

use crate::core::values::convert_boolean;
use crate::core::Store;
use crate::entities::{truncate_chars, Customer, Project};

use super::batch::{ImportData, ImportRow, RowFailure, RowState};
use super::cache::{validated, ResolutionCache};
use super::columns::{apply_budget, meta_name, Cells};
use super::datetime::{parse_day, timezone};
use super::parser::ParsedInput;
use super::{ImportError, ImportOptions};

/// Create or update one project per row, creating missing customers
pub fn import(
    input: &ParsedInput,
    store: &mut dyn Store,
    options: &ImportOptions,
) -> Result<ImportData, ImportError> {
    let mut data = ImportData::new("projects", input.header.clone(), options.dry_run);
    let mut cache = ResolutionCache::new(options.dry_run, options.customer_defaults.clone());

    for (index, raw) in input.rows.iter().enumerate() {
        let mut row = ImportRow::new(index + 1, raw.values_for(&input.header));
        let cells = Cells::new(raw);

        match import_row(&cells, store, &mut cache, options, &mut data) {
            Ok(state) => row.state = state,
            Err(RowFailure::Invalid(errors)) => row.fail(errors),
            Err(RowFailure::Store(e)) => return Err(e.into()),
        }
        data.add_row(row);
    }

    data.created.customers = cache.created.customers;
    data.summarize();
    Ok(data)
}

fn import_row(
    cells: &Cells,
    store: &mut dyn Store,
    cache: &mut ResolutionCache,
    options: &ImportOptions,
    data: &mut ImportData,
) -> Result<RowState, RowFailure> {
    let Some(name) = cells.first(&["name", "project"]) else {
        return Err(RowFailure::invalid("Cannot use empty project name"));
    };
    let Some(customer_name) = cells.first(&["customer"]) else {
        return Err(RowFailure::invalid("Cannot use empty customer name"));
    };
    if cache.cached_customer(customer_name).is_none()
        && customer_name.chars().count() > Customer::MAX_NAME_LEN
    {
        return Err(RowFailure::invalid(
            "Invalid customer name, maximum 150 character allowed",
        ));
    }

    let customer = cache.resolve_customer(store, customer_name)?;
    if cache.cached_project(name, customer).is_some() {
        return Err(RowFailure::invalid(format!(
            "Project \"{}\" of customer \"{}\" appears more than once",
            name, customer_name
        )));
    }

    let customer_id = cache.customer(customer).id;
    let found = match customer_id {
        Some(id) => store.find_project(name, id)?,
        None => None,
    };
    let existing = found.is_some();
    let mut project = found.unwrap_or_else(|| Project::new(name, customer_id));

    let tz = timezone(&cache.customer(customer).timezone).unwrap_or(options.timezone);
    let mut errors = Vec::new();
    for (column, value) in cells.iter() {
        match column {
            "description" => project.comment = value.map(str::to_string),
            "ordernumber" => {
                project.order_number =
                    value.map(|v| truncate_chars(v, Project::MAX_ORDER_NUMBER_LEN))
            }
            "orderdate" => project.order_date = day(value, tz, &mut errors),
            "startdate" => project.start = day(value, tz, &mut errors),
            "enddate" => project.end = day(value, tz, &mut errors),
            "color" => project.color = value.map(str::to_string),
            "visible" => {
                if let Some(visible) = value {
                    project.visible = convert_boolean(visible);
                }
            }
            _ => {
                if apply_budget(&mut project.budget, column, value, &mut errors) {
                    continue;
                }
                if let Some(meta) = meta_name(column) {
                    project
                        .meta
                        .insert(meta.to_string(), value.unwrap_or_default().to_string());
                }
            }
        }
    }
    if !errors.is_empty() {
        return Err(RowFailure::Invalid(errors));
    }
    validated(&project)?;

    let state = if cache.is_dry_run() {
        RowState::Skipped
    } else {
        store.save_project(&mut project)?;
        RowState::Persisted
    };
    if existing {
        data.updated.projects += 1;
    } else {
        data.created.projects += 1;
    }
    cache.insert_project(project, customer);
    Ok(state)
}

fn day(value: Option<&str>, tz: chrono_tz::Tz, errors: &mut Vec<String>) -> Option<DateTime<Utc>> {
    let value = value?;
    match parse_day(value, tz) {
        Ok(date) => Some(date),
        Err(message) => {
            errors.push(message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CustomerDefaults;
    use crate::core::SqliteStore;
    use crate::import::parser::{parse, InputFormat, ParseOptions};

    fn csv(input: &str) -> ParsedInput {
        let options = ParseOptions {
            format: InputFormat::Csv,
            delimiter: b';',
            max_rows: 100,
        };
        parse(input.as_bytes(), &options).unwrap()
    }

    #[test]
    fn test_projects_create_missing_customers_once() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv(
            "Project;Customer;OrderNumber;StartDate;EndDate\n\
             Website;ACME;PO-1;2024-03-01;2024-06-30\n\
             Shop;ACME;;;\n",
        );
        let data = import(&input, &mut store, &ImportOptions::default()).unwrap();

        assert_eq!(data.count_errors(), 0, "{:?}", data.rows);
        assert_eq!(
            data.status,
            vec!["processed 2 rows", "created 1 customers", "created 2 projects"]
        );
        let customer = store.find_customer_by_name("ACME").unwrap().unwrap();
        let website = store
            .find_project("Website", customer.id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(website.order_number.as_deref(), Some("PO-1"));
        assert_eq!(
            website.start.map(|d| d.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_dates_use_customer_timezone() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut customer = Customer::new("ACME", &CustomerDefaults::default());
        customer.timezone = "Europe/Berlin".to_string();
        store.save_customer(&mut customer).unwrap();

        let input = csv("Name;Customer;OrderDate\nWebsite;ACME;2024-06-30\nShop;ACME;30.06.2024\n");
        let data = import(&input, &mut store, &ImportOptions::default()).unwrap();

        assert_eq!(data.created.customers, 0);
        assert_eq!(data.rows[1].errors, vec!["Invalid date: 30.06.2024"]);
        let website = store
            .find_project("Website", customer.id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(
            website.order_date.map(|d| d.to_rfc3339()),
            Some("2024-06-29T22:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_empty_names_and_duplicates() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv("Project;Customer\n;ACME\nWebsite;\nWebsite;ACME\nWebsite;ACME\n");
        let data = import(&input, &mut store, &ImportOptions::default()).unwrap();
        assert_eq!(data.rows[0].errors, vec!["Cannot use empty project name"]);
        assert_eq!(data.rows[1].errors, vec!["Cannot use empty customer name"]);
        assert!(data.rows[2].errors.is_empty());
        assert_eq!(
            data.rows[3].errors,
            vec!["Project \"Website\" of customer \"ACME\" appears more than once"]
        );
        assert_eq!(data.count_errors(), 3);
    }

    #[test]
    fn test_existing_project_is_updated() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut customer = Customer::new("ACME", &CustomerDefaults::default());
        store.save_customer(&mut customer).unwrap();
        let mut project = Project::new("Website", customer.id);
        store.save_project(&mut project).unwrap();

        let input = csv("Project;Customer;Budget;Visible\nWebsite;ACME;2500;no\n");
        let data = import(&input, &mut store, &ImportOptions::default()).unwrap();
        assert_eq!(data.status, vec!["processed 1 rows", "updated 1 projects"]);

        let found = store
            .find_project("Website", customer.id.unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(found.id, project.id);
        assert_eq!(found.budget.money, 2500.0);
        assert!(!found.visible);
    }
}
