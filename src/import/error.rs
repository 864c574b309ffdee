//! Batch-fatal import errors

use miette::Diagnostic;
use thiserror::Error;

use crate::core::StoreError;

/// Failures that abort a whole import run
///
/// Problems with single rows never end up here; they are attached to the
/// row they belong to and the run continues.
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("Unsupported file given: empty")]
    #[diagnostic(code(tsi::import::empty))]
    EmptyInput,

    #[error("Maximum of {max} rows allowed per import, found {found}")]
    #[diagnostic(
        code(tsi::import::row_limit),
        help("Split the file or raise `max_rows` in .tsi/config.yaml")
    )]
    RowLimitExceeded { max: usize, found: usize },

    #[error("Unsupported file given: wrong delimiter?")]
    #[diagnostic(
        code(tsi::import::delimiter),
        help("The header contains '{other}', try --delimiter '{other}'")
    )]
    DelimiterMismatch { other: char },

    #[error("Unsupported file given: {0}")]
    #[diagnostic(
        code(tsi::import::unsupported_file),
        help("Use a .csv or .json file or pass --format")
    )]
    UnsupportedFile(String),

    #[error("Cannot parse {format} input: {message}")]
    #[diagnostic(code(tsi::import::malformed))]
    Malformed {
        format: &'static str,
        message: String,
    },

    #[error("Could not find matching importer for columns: {columns}")]
    #[diagnostic(
        code(tsi::import::no_importer),
        help("Pass --importer to see which columns are missing")
    )]
    NoMatchingImporter { columns: String },

    #[error("Columns match more than one importer: {candidates}")]
    #[diagnostic(code(tsi::import::ambiguous), help("Pass --importer to pick one"))]
    AmbiguousImporter { candidates: String },

    #[error("Invalid file given, missing and/or invalid columns: {}", columns.join(", "))]
    #[diagnostic(
        code(tsi::import::missing_columns),
        help("Run `tsi import --template {importer}` for an example file")
    )]
    MissingColumns {
        importer: &'static str,
        columns: Vec<String>,
    },

    #[error("Cannot read {path}: {message}")]
    #[diagnostic(code(tsi::import::io))]
    Io { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}
