// validator.rs
//
// Turns untyped caller input into SQL literals, one attribute at a time.
// STRING/TEXT literals are quoted but NOT escaped; callers that accept
// untrusted text must sanitise it before it reaches a model.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::libs::error::{Error, Result};
use crate::libs::schema::{DataType, EntitySchema};

/// Attribute name to SQL-literal text, in the order the input listed them.
/// Every key is an attribute of the schema it was validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedInput {
    entries: Vec<(String, String)>,
}

impl ValidatedInput {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, literal)| literal.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, l)| (n.as_str(), l.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, name: &str, literal: String) {
        self.entries.push((name.to_string(), literal));
    }
}

/// Validate `input` against `schema`.
///
/// Unknown attributes and `null` values are skipped. Date-typed values that
/// do not parse are dropped rather than rejected; every other type mismatch
/// aborts with [`Error::Validation`].
pub fn validate(schema: &EntitySchema, input: &Map<String, Value>) -> Result<ValidatedInput> {
    let mut validated = ValidatedInput::default();

    for (name, value) in input {
        let Some(attribute) = schema.attribute(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        match &attribute.data_type {
            DataType::Boolean => match loose_number(value) {
                Some(n) if n == 0.0 || n == 1.0 => {
                    validated.push(name, if n == 1.0 { "1" } else { "0" }.to_string())
                }
                _ => return Err(Error::validation(name.as_str())),
            },
            DataType::Integer => match numeric_literal(value) {
                Some(literal) => validated.push(name, literal),
                None => return Err(Error::validation(name.as_str())),
            },
            DataType::Date | DataType::DateTime | DataType::Timestamp => {
                if let Value::String(text) = value {
                    if parses_as_date(text) {
                        validated.push(name, format!("'{text}'"));
                    }
                }
            }
            DataType::String | DataType::Text => {
                validated.push(name, format!("'{}'", plain_text(value)));
            }
            DataType::Custom(_) => return Err(Error::validation(name.as_str())),
        }
    }

    Ok(validated)
}

/// Numeric reading of a primitive the way JavaScript's `Number()` does it.
/// Non-finite results and compound values yield `None`.
pub fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => string_to_number(s),
        _ => None,
    }
}

fn radix_prefix(trimmed: &str) -> Option<u32> {
    match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    }
}

fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    if let Some(radix) = radix_prefix(trimmed) {
        return u64::from_str_radix(&trimmed[2..], radix)
            .ok()
            .map(|n| n as f64);
    }

    // f64::from_str also takes "inf"/"nan", which Number() does not.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

// Decimal text is inlined as written (trimmed) so wide integers keep every
// digit; only the empty and prefixed-radix forms are rewritten.
fn numeric_literal(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            string_to_number(trimmed)?;
            if trimmed.is_empty() {
                return Some("0".to_string());
            }
            match radix_prefix(trimmed) {
                Some(radix) => u64::from_str_radix(&trimmed[2..], radix)
                    .ok()
                    .map(|n| n.to_string()),
                None => Some(trimmed.to_string()),
            }
        }
        _ => None,
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%A %B %d %Y %H:%M:%S",
];

// %B and %A also take the three-letter abbreviations when parsing.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%A %B %d %Y",
    "%A, %B %d, %Y",
];

pub fn parses_as_date(text: &str) -> bool {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
        || DATE_TIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(text, f).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(text, f).is_ok())
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
