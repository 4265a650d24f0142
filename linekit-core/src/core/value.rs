use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Field name to value mapping used for record fields, line-item rows and
/// request payloads.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A scalar value stored in a record field or a line-item cell.
///
/// Serialized untagged, so request payloads read naturally:
/// `{"sku": "B", "qty": 5, "taxable": true}`. A JSON `null` is [`FieldValue::Null`],
/// which clears the field when written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    /// Stored as `f64`, so integers beyond 2^53 lose precision.
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// `true` for null and for an empty text value. Numbers and booleans
    /// always count as set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Boolean(_) | Self::Number(_) => false,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value; text is parsed after trimming.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_number(s),
            Self::Boolean(_) | Self::Null => None,
        }
    }

    /// Boolean view of the value; text accepts the host checkbox encoding
    /// `"T"`/`"F"` as well as `"true"`/`"false"`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Text(s) => parse_checkbox(s),
            Self::Number(_) | Self::Null => None,
        }
    }

    /// Orders two values of compatible types. Text compared against a number is
    /// parsed as a number; other mixed pairs are unordered.
    #[must_use]
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Number(_), _) | (_, Self::Number(_)) => {
                self.as_number()?.partial_cmp(&other.as_number()?)
            }
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

fn parse_checkbox(text: &str) -> Option<bool> {
    match text {
        "T" | "true" => Some(true),
        "F" | "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// How a stored cell value is compared with a requested match value.
///
/// The host stores most line-item values as text, so a request that matches
/// `{"line": 3}` against a stored `"3"` only succeeds under [`MatchMode::Coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Values must have the same type and be equal.
    #[default]
    Exact,
    /// Same-typed values compare exactly. Text against a number compares the
    /// parsed number; text against a boolean compares the checkbox encoding.
    /// Numbers never equal booleans.
    Coerce,
}

impl MatchMode {
    /// Whether a stored cell satisfies the requested value. An empty cell
    /// (`None`) never matches, and neither does a null on either side.
    #[must_use]
    pub fn matches(self, stored: Option<&FieldValue>, wanted: &FieldValue) -> bool {
        let Some(stored) = stored else {
            return false;
        };
        if stored.is_null() || wanted.is_null() {
            return false;
        }
        if stored == wanted {
            return true;
        }
        if self == MatchMode::Exact {
            return false;
        }
        match (stored, wanted) {
            (FieldValue::Text(text), FieldValue::Number(n))
            | (FieldValue::Number(n), FieldValue::Text(text)) => {
                parse_number(text) == Some(*n)
            }
            (FieldValue::Text(text), FieldValue::Boolean(b))
            | (FieldValue::Boolean(b), FieldValue::Text(text)) => {
                parse_checkbox(text) == Some(*b)
            }
            _ => false,
        }
    }
}
