//! Coercion of loosely typed input values

/// `true`, `yes`, `on` and `1` (any case, surrounding whitespace ignored)
/// are true; everything else is false
pub fn convert_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

/// Parse a plain decimal number such as `12`, `-3.5` or `1e3`
///
/// Hex, `inf`, `nan` and decimal commas are rejected.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty()
        || !value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn is_numeric(value: &str) -> bool {
    parse_number(value).is_some()
}

/// True for an optionally signed run of ASCII digits
pub fn is_integer(value: &str) -> bool {
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Remove HTML tags, keeping the text between them
pub fn strip_tags(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Collapse runs of whitespace into a single space and trim the ends
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
