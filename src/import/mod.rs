//! Import engine: parse a file, pick an importer and map its rows
//!
//! ```text
//! bytes -> parser -> format/record -> timesheet | customers | projects -> ImportData
//!                                       (all resolving through cache)
//! ```

pub mod batch;
pub mod cache;
mod columns;
pub mod customers;
pub mod datetime;
mod error;
pub mod format;
pub mod parser;
pub mod projects;
pub mod record;
pub mod timesheet;

use std::path::Path;

use chrono_tz::Tz;

use crate::core::Store;
use crate::entities::CustomerDefaults;

pub use batch::{EntityCounts, ImportData, ImportRow, RowState};
pub use error::ImportError;
pub use format::ImporterKind;
pub use parser::{InputFormat, ParseOptions, ParsedInput};

/// Settings of one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Resolve and validate everything, persist nothing
    pub dry_run: bool,
    /// Create activities without a project unless a row says otherwise
    pub global_activities: bool,
    /// Timezone for users without one and for created users
    pub timezone: Tz,
    /// Language preference of created users
    pub language: String,
    pub customer_defaults: CustomerDefaults,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            global_activities: true,
            timezone: Tz::UTC,
            language: "en".to_string(),
            customer_defaults: CustomerDefaults::default(),
        }
    }
}

/// Read and parse an import file
///
/// The format comes from `format` or, when `None`, from the file extension.
pub fn load(
    path: &Path,
    format: Option<InputFormat>,
    delimiter: u8,
    max_rows: usize,
) -> Result<ParsedInput, ImportError> {
    let format = match format.or_else(|| InputFormat::from_path(path)) {
        Some(format) => format,
        None => {
            return Err(ImportError::UnsupportedFile(
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{} files", e))
                    .unwrap_or_else(|| "file without extension".to_string()),
            ))
        }
    };
    let bytes = std::fs::read(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let options = ParseOptions {
        format,
        delimiter,
        max_rows,
    };
    parser::parse(&bytes, &options)
}

/// The importer for `header`, either the requested one or the detected one
pub fn select(
    requested: Option<ImporterKind>,
    header: &[String],
) -> Result<ImporterKind, ImportError> {
    match requested {
        Some(kind) if kind.supports(header) => Ok(kind),
        Some(kind) => Err(ImportError::MissingColumns {
            importer: kind.as_str(),
            columns: kind.check_header(header),
        }),
        None => ImporterKind::detect(header),
    }
}

/// Run importer `kind` over all rows of `input`
pub fn run(
    kind: ImporterKind,
    input: &ParsedInput,
    store: &mut dyn Store,
    options: &ImportOptions,
) -> Result<ImportData, ImportError> {
    tracing::debug!(importer = %kind, rows = input.rows.len(), dry_run = options.dry_run, "import");
    match kind {
        ImporterKind::Customer => {
            customers::import(customers::CustomerSource::List, input, store, options)
        }
        ImporterKind::Grandtotal => {
            customers::import(customers::CustomerSource::Grandtotal, input, store, options)
        }
        ImporterKind::Project => projects::import(input, store, options),
        ImporterKind::Timesheet | ImporterKind::Toggl | ImporterKind::Clockify => {
            match kind.timesheet_format() {
                Some(format) => timesheet::import(format, input, store, options),
                None => Err(ImportError::NoMatchingImporter {
                    columns: input.header.join(", "),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqliteStore;
    use tempfile::tempdir;

    #[test]
    fn test_end_to_end_csv() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("timesheets.csv");
        std::fs::write(
            &path,
            "User,Email,Project,Customer,Activity,Begin,End,Duration\n\
             alice,alice@x.com,ProjA,CustA,Dev,2024-03-01 09:00,2024-03-01 17:00,\n",
        )
        .unwrap();

        let input = load(&path, None, b',', 1000).unwrap();
        let kind = select(None, &input.header).unwrap();
        assert_eq!(kind, ImporterKind::Timesheet);

        let mut store = SqliteStore::open_in_memory().unwrap();
        let data = run(kind, &input, &mut store, &ImportOptions::default()).unwrap();
        assert_eq!(data.count_errors(), 0);
        for line in ["created 1 customers", "created 1 projects", "created 1 activities"] {
            assert!(data.status.contains(&line.to_string()), "{:?}", data.status);
        }
        assert_eq!(store.query_i64("SELECT duration FROM timesheets").unwrap(), 28800);
    }

    #[test]
    fn test_wrong_delimiter_is_fatal() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("timesheets.csv");
        std::fs::write(&path, "User,Email,Project\nalice,a@x.com,P\n").unwrap();
        let err = load(&path, None, b';', 1000).unwrap_err();
        assert!(matches!(err, ImportError::DelimiterMismatch { other: ',' }));
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("export.xlsx");
        std::fs::write(&path, "x").unwrap();
        let err = load(&path, None, b';', 1000).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFile(_)));
        assert!(load(&path, Some(InputFormat::Csv), b';', 1000).is_err());
    }

    #[test]
    fn test_requested_importer_must_fit() {
        let header: Vec<String> = ["Name", "Email"].iter().map(|s| s.to_string()).collect();
        let err = select(Some(ImporterKind::Project), &header).unwrap_err();
        match err {
            ImportError::MissingColumns { importer, columns } => {
                assert_eq!(importer, "project");
                assert_eq!(columns, vec!["Customer", "Email (unexpected)"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            select(Some(ImporterKind::Customer), &header).unwrap(),
            ImporterKind::Customer
        );
    }
}
