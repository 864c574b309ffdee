//! Row parser: CSV or JSON bytes to an ordered list of flat records

use std::borrow::Cow;
use std::path::Path;

use serde::Serialize;

use super::ImportError;

/// A single cell as read from the input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Text that was not valid UTF-8, decoded lossily
    Malformed(String),
}

impl RawValue {
    /// String form of the value, `None` for null
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            RawValue::Int(i) => Some(Cow::Owned(i.to_string())),
            RawValue::Float(f) => Some(Cow::Owned(f.to_string())),
            RawValue::Text(s) | RawValue::Malformed(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Null or a string that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) | RawValue::Malformed(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, RawValue::Malformed(_))
    }

    /// Value for tables and reports
    pub fn display(&self) -> String {
        self.as_text().map(Cow::into_owned).unwrap_or_default()
    }
}

/// One input row, fields in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawRow {
    pub fields: Vec<(String, RawValue)>,
}

impl RawRow {
    /// First field whose name equals `name`, ignoring case
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Display values lined up with `header`
    pub fn values_for(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|column| self.get(column).map(RawValue::display).unwrap_or_default())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Guess the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(InputFormat::Csv),
            "json" => Some(InputFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub format: InputFormat,
    /// CSV delimiter, `;` or `,`
    pub delimiter: u8,
    /// Hard ceiling on data rows
    pub max_rows: usize,
}

/// Header plus rows, in source order
#[derive(Debug, Clone, Default)]
pub struct ParsedInput {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedInput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse an import payload
pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<ParsedInput, ImportError> {
    let bytes = strip_bom(bytes);
    match options.format {
        InputFormat::Csv => parse_csv(bytes, options),
        InputFormat::Json => parse_json(bytes, options),
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// The delimiter a user most likely meant instead of `delimiter`
fn opposite_delimiter(delimiter: u8) -> u8 {
    if delimiter == b',' {
        b';'
    } else {
        b','
    }
}

fn decode(bytes: &[u8]) -> RawValue {
    match std::str::from_utf8(bytes) {
        Ok(text) => RawValue::Text(text.to_string()),
        Err(_) => RawValue::Malformed(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn parse_csv(bytes: &[u8], options: &ParseOptions) -> Result<ParsedInput, ImportError> {
    let malformed = |e: csv::Error| ImportError::Malformed {
        format: "csv",
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = reader
        .byte_headers()
        .map_err(malformed)?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    if header.iter().all(String::is_empty) {
        return Err(ImportError::EmptyInput);
    }

    let other = opposite_delimiter(options.delimiter);
    if header.len() == 1 && header[0].as_bytes().contains(&other) {
        return Err(ImportError::DelimiterMismatch {
            other: other as char,
        });
    }

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(malformed)?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(RawRow {
            fields: header
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    let value = record.get(i).map(decode).unwrap_or(RawValue::Null);
                    (column.clone(), value)
                })
                .collect(),
        });
    }

    finish(header, rows, options)
}

fn parse_json(bytes: &[u8], options: &ParseOptions) -> Result<ParsedInput, ImportError> {
    let document: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| ImportError::Malformed {
            format: "json",
            message: e.to_string(),
        })?;

    let items = match document {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Err(ImportError::EmptyInput),
        _ => {
            return Err(ImportError::Malformed {
                format: "json",
                message: "expected an array of objects".to_string(),
            })
        }
    };

    if items.len() > options.max_rows {
        return Err(ImportError::RowLimitExceeded {
            max: options.max_rows,
            found: items.len(),
        });
    }

    let mut header = Vec::new();
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(object) = item else {
            return Err(ImportError::Malformed {
                format: "json",
                message: format!("element {} is not an object", index),
            });
        };
        if index == 0 {
            header = object.keys().cloned().collect();
        }
        rows.push(RawRow {
            fields: object
                .into_iter()
                .map(|(key, value)| (key, json_value(value)))
                .collect(),
        });
    }

    finish(header, rows, options)
}

fn json_value(value: serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Null => RawValue::Null,
        serde_json::Value::Bool(b) => RawValue::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Null),
        },
        serde_json::Value::String(s) => RawValue::Text(s),
        other => RawValue::Text(other.to_string()),
    }
}

fn finish(
    header: Vec<String>,
    rows: Vec<RawRow>,
    options: &ParseOptions,
) -> Result<ParsedInput, ImportError> {
    if rows.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    if rows.len() > options.max_rows {
        return Err(ImportError::RowLimitExceeded {
            max: options.max_rows,
            found: rows.len(),
        });
    }
    Ok(ParsedInput { header, rows })
}
