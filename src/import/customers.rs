//! Customer list and Grandtotal customer export importers

use crate::core::values::{collapse_whitespace, convert_boolean, strip_tags};
use crate::core::Store;
use crate::entities::{truncate_chars, Customer};

use super::batch::{ImportData, ImportRow, RowFailure, RowState};
use super::cache::{validated, ResolutionCache};
use super::columns::{apply_budget, meta_name, Cells};
use super::parser::ParsedInput;
use super::{ImportError, ImportOptions};

/// Where customer rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSource {
    /// Plain customer list
    List,
    /// Grandtotal export, English or German headers
    Grandtotal,
}

impl CustomerSource {
    fn title(&self) -> &'static str {
        match self {
            CustomerSource::List => "customers",
            CustomerSource::Grandtotal => "Grandtotal",
        }
    }

    fn name_columns(&self) -> &'static [&'static str] {
        match self {
            CustomerSource::List => &["name", "customer"],
            CustomerSource::Grandtotal => &["organization", "firma"],
        }
    }

    fn apply(&self, customer: &mut Customer, cells: &Cells) -> Vec<String> {
        match self {
            CustomerSource::List => apply_list(customer, cells),
            CustomerSource::Grandtotal => {
                apply_grandtotal(customer, cells);
                Vec::new()
            }
        }
    }
}

/// Create or update one customer per row
pub fn import(
    source: CustomerSource,
    input: &ParsedInput,
    store: &mut dyn Store,
    options: &ImportOptions,
) -> Result<ImportData, ImportError> {
    let mut data = ImportData::new(source.title(), input.header.clone(), options.dry_run);
    let mut cache = ResolutionCache::new(options.dry_run, options.customer_defaults.clone());

    for (index, raw) in input.rows.iter().enumerate() {
        let mut row = ImportRow::new(index + 1, raw.values_for(&input.header));
        let cells = Cells::new(raw);

        match import_row(source, &cells, store, &mut cache, &mut data) {
            Ok(state) => row.state = state,
            Err(RowFailure::Invalid(errors)) => row.fail(errors),
            Err(RowFailure::Store(e)) => return Err(e.into()),
        }
        data.add_row(row);
    }

    data.summarize();
    Ok(data)
}

fn import_row(
    source: CustomerSource,
    cells: &Cells,
    store: &mut dyn Store,
    cache: &mut ResolutionCache,
    data: &mut ImportData,
) -> Result<RowState, RowFailure> {
    let name = match cells.first(source.name_columns()) {
        Some(name) => name,
        None => return Err(RowFailure::invalid("Missing customer name")),
    };
    if name.chars().count() > Customer::MAX_NAME_LEN {
        return Err(RowFailure::invalid(
            "Invalid customer name, maximum 150 character allowed",
        ));
    }
    if cache.cached_customer(name).is_some() {
        return Err(RowFailure::invalid(format!(
            "Customer \"{}\" appears more than once",
            name
        )));
    }

    let (mut customer, existing) = match store.find_customer_by_name(name)? {
        Some(found) => (found, true),
        None => (Customer::new(name, cache.defaults()), false),
    };

    let errors = source.apply(&mut customer, cells);
    if !errors.is_empty() {
        return Err(RowFailure::Invalid(errors));
    }
    validated(&customer)?;

    let state = if cache.is_dry_run() {
        RowState::Skipped
    } else {
        store.save_customer(&mut customer)?;
        RowState::Persisted
    };
    if existing {
        data.updated.customers += 1;
    } else {
        data.created.customers += 1;
    }
    tracing::debug!(customer = name, existing, "imported customer");
    cache.insert_customer(customer);
    Ok(state)
}

fn apply_list(customer: &mut Customer, cells: &Cells) -> Vec<String> {
    let mut errors = Vec::new();
    let text = |value: Option<&str>| value.map(str::to_string);

    for (column, value) in cells.iter() {
        match column {
            "company" => customer.company = text(value),
            "email" => customer.email = text(value),
            "country" => {
                if let Some(country) = value {
                    customer.country = country.to_uppercase();
                }
            }
            "account" => customer.number = text(value),
            "tax" => customer.vat_id = text(value),
            "description" => customer.comment = text(value),
            "address" => customer.address = text(value),
            "contact" => customer.contact = text(value),
            "currency" => {
                if let Some(currency) = value {
                    customer.currency = currency.to_uppercase();
                }
            }
            "timezone" => {
                if let Some(timezone) = value {
                    customer.timezone = timezone.to_string();
                }
            }
            "phone" => customer.phone = text(value),
            "mobile" => customer.mobile = text(value),
            "fax" => customer.fax = text(value),
            "homepage" => customer.homepage = text(value),
            "color" => customer.color = text(value),
            "visible" => {
                if let Some(visible) = value {
                    customer.visible = convert_boolean(visible);
                }
            }
            _ => {
                if apply_budget(&mut customer.budget, column, value, &mut errors) {
                    continue;
                }
                if let Some(name) = meta_name(column) {
                    customer
                        .meta
                        .insert(name.to_string(), value.unwrap_or_default().to_string());
                }
            }
        }
    }
    errors
}

fn apply_grandtotal(customer: &mut Customer, cells: &Cells) {
    let mut title = "";
    let mut first = "";
    let mut middle = "";
    let mut last = "";
    let mut street = "";
    let mut zip = "";
    let mut city = "";

    for (column, value) in cells.iter() {
        let text = value.map(str::to_string);
        match column {
            "e-mail" => customer.email = text,
            "country" | "land" => {
                if let Some(country) = value {
                    customer.country = country.to_uppercase();
                }
            }
            "customer number" | "kundennummer" => customer.number = text,
            "tax-id" | "umsatzsteuer" => customer.vat_id = text,
            "note" | "notiz" => customer.comment = value.map(strip_tags),
            "title" | "titel" => title = value.unwrap_or_default(),
            "first name" | "vorname" => first = value.unwrap_or_default(),
            "middle name" | "zweiter vorname" => middle = value.unwrap_or_default(),
            "last name" | "nachname" => last = value.unwrap_or_default(),
            "street" | "straße" => street = value.unwrap_or_default(),
            "zip" | "plz" => zip = value.unwrap_or_default(),
            "city" | "ort" => city = value.unwrap_or_default(),
            _ => {}
        }
    }

    if !(street.is_empty() && zip.is_empty() && city.is_empty()) {
        let address = format!("{}\n{} {}", street, zip, city);
        customer.address = Some(address.trim().to_string());
    }
    if !(title.is_empty() && first.is_empty() && middle.is_empty() && last.is_empty()) {
        let contact = collapse_whitespace(&format!("{} {} {} {}", title, first, middle, last));
        customer.contact = Some(truncate_chars(&contact, Customer::MAX_NAME_LEN));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqliteStore;
    use crate::entities::CustomerDefaults;
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
    fn test_customer_list_creates_and_maps() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv(
            "Name;Country;Currency;Account;Budget;meta.crm\n\
             ACME;at;usd;C-1;1000;42\n\
             Globex;;;;;\n",
        );
        let data = import(
            CustomerSource::List,
            &input,
            &mut store,
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(data.title, "customers");
        assert_eq!(data.count_errors(), 0, "{:?}", data.rows);
        assert_eq!(data.status, vec!["processed 2 rows", "created 2 customers"]);

        let acme = store.find_customer_by_name("ACME").unwrap().unwrap();
        assert_eq!(acme.country, "AT");
        assert_eq!(acme.currency, "USD");
        assert_eq!(acme.number.as_deref(), Some("C-1"));
        assert_eq!(acme.budget.money, 1000.0);
        assert_eq!(acme.meta.get("crm").map(String::as_str), Some("42"));

        let globex = store.find_customer_by_name("Globex").unwrap().unwrap();
        assert_eq!(globex.country, CustomerDefaults::default().country);
    }

    #[test]
    fn test_existing_customer_is_updated_and_duplicates_fail() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut existing = Customer::new("ACME", &CustomerDefaults::default());
        store.save_customer(&mut existing).unwrap();

        let input = csv("Customer;Company\nACME;ACME Inc.\nACME;Other\n");
        let data = import(
            CustomerSource::List,
            &input,
            &mut store,
            &ImportOptions::default(),
        )
        .unwrap();

        assert_eq!(data.updated.customers, 1);
        assert_eq!(data.created.customers, 0);
        assert_eq!(
            data.rows[1].errors,
            vec!["Customer \"ACME\" appears more than once"]
        );
        assert!(data.status.contains(&"updated 1 customers".to_string()));

        let acme = store.find_customer_by_name("ACME").unwrap().unwrap();
        assert_eq!(acme.id, existing.id);
        assert_eq!(acme.company.as_deref(), Some("ACME Inc."));
    }

    #[test]
    fn test_missing_and_long_names() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv(&format!("Name;Email\n;a@b.c\n{};\n", "x".repeat(151)));
        let data = import(
            CustomerSource::List,
            &input,
            &mut store,
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(data.rows[0].errors, vec!["Missing customer name"]);
        assert_eq!(
            data.rows[1].errors,
            vec!["Invalid customer name, maximum 150 character allowed"]
        );
    }

    #[test]
    fn test_validation_messages_become_row_errors() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv("Name;Currency;Timezone\nACME;EURO;Mars/Base\n");
        let data = import(
            CustomerSource::List,
            &input,
            &mut store,
            &ImportOptions::default(),
        )
        .unwrap();
        assert_eq!(
            data.rows[0].errors,
            vec![
                "currency: This value is not a valid currency.",
                "timezone: Unknown timezone \"Mars/Base\".",
            ]
        );
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_grandtotal_contact_and_address() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let input = csv(
            "Firma;Titel;Vorname;Nachname;Straße;PLZ;Ort;Notiz;Land\n\
             ACME;Dr.;Jane;Doe;Main Street 1;10115;Berlin;<p>Key <b>account</b></p>;de\n",
        );
        let data = import(
            CustomerSource::Grandtotal,
            &input,
            &mut store,
            &ImportOptions {
                dry_run: true,
                ..ImportOptions::default()
            },
        )
        .unwrap();
        assert_eq!(data.status, vec!["processed 1 rows", "create 1 customers"]);
        assert_eq!(data.rows[0].state, RowState::Skipped);
        assert_eq!(store.writes(), 0);

        let mut customer = Customer::new("ACME", &CustomerDefaults::default());
        apply_grandtotal(&mut customer, &Cells::new(&input.rows[0]));
        assert_eq!(customer.contact.as_deref(), Some("Dr. Jane Doe"));
        assert_eq!(customer.address.as_deref(), Some("Main Street 1\n10115 Berlin"));
        assert_eq!(customer.comment.as_deref(), Some("Key account"));
        assert_eq!(customer.country, "DE");
    }
}
