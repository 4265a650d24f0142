//! Declarative change-sets for one sublist, and for a whole record.

use crate::{FieldMap, FieldValue, LinekitError, Result};
use serde::{Deserialize, Serialize};

/// Adds one row. Without `index` the row is appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub data: FieldMap,
}

/// Writes `data` to one existing row, addressed by `index` or by `match`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default, rename = "match")]
    pub match_field: Option<String>,
    #[serde(default)]
    pub data: FieldMap,
}

/// Removes one existing row, addressed by `index` or by `match`.
/// `data` only supplies the match value; it is never written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExciseRequest {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default, rename = "match")]
    pub match_field: Option<String>,
    #[serde(default)]
    pub data: FieldMap,
}

/// Creations, updates and excisions for the sublist called `name`.
///
/// # Examples
///
/// ```rust
/// use linekit_core::SublistChanges;
///
/// let changes = SublistChanges::from_json(
///     r#"{"name": "item", "update": [{"match": "sku", "data": {"sku": "B", "qty": 5}}]}"#,
/// ).unwrap();
/// assert_eq!(changes.name, "item");
/// assert!(changes.create.is_empty());
/// assert_eq!(changes.update.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SublistChanges {
    pub name: String,
    #[serde(default)]
    pub create: Vec<CreateRequest>,
    #[serde(default)]
    pub update: Vec<UpdateRequest>,
    #[serde(default)]
    pub excise: Vec<ExciseRequest>,
}

/// Top-level literal fields plus any number of sublist change-sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordChanges {
    #[serde(default)]
    pub literals: FieldMap,
    #[serde(default)]
    pub sublists: Vec<SublistChanges>,
}

/// How an update or excision names its row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowTarget<'a> {
    Index(usize),
    Match { field: &'a str, value: &'a FieldValue },
}

impl SublistChanges {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Parses a change-set from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::Json`] if `json` is not a valid change-set.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.excise.is_empty()
    }

    /// Checks every request without touching the host.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::MalformedChangeSet`] naming the first bad request.
    pub fn validate(&self) -> Result<()> {
        for (n, request) in self.create.iter().enumerate() {
            if request.index == Some(0) {
                return Err(malformed(&self.name, "create", n, "positions start at 1"));
            }
        }
        for (n, request) in self.update.iter().enumerate() {
            resolve_target(request.index, request.match_field.as_deref(), &request.data)
                .map_err(|reason| malformed(&self.name, "update", n, reason))?;
        }
        for (n, request) in self.excise.iter().enumerate() {
            resolve_target(request.index, request.match_field.as_deref(), &request.data)
                .map_err(|reason| malformed(&self.name, "excise", n, reason))?;
        }
        Ok(())
    }
}

impl UpdateRequest {
    /// The row this request names, `None` when it is malformed.
    #[must_use]
    pub fn target(&self) -> Option<RowTarget<'_>> {
        resolve_target(self.index, self.match_field.as_deref(), &self.data).ok()
    }
}

impl ExciseRequest {
    /// The row this request names, `None` when it is malformed.
    #[must_use]
    pub fn target(&self) -> Option<RowTarget<'_>> {
        resolve_target(self.index, self.match_field.as_deref(), &self.data).ok()
    }
}

/// An explicit index wins over `match`.
fn resolve_target<'a>(
    index: Option<usize>,
    match_field: Option<&'a str>,
    data: &'a FieldMap,
) -> std::result::Result<RowTarget<'a>, &'static str> {
    match (index, match_field) {
        (Some(0), _) => Err("positions start at 1"),
        (Some(position), _) => Ok(RowTarget::Index(position)),
        (None, Some(field)) => data
            .get(field)
            .map(|value| RowTarget::Match { field, value })
            .ok_or("match field has no value in data"),
        (None, None) => Err("neither index nor match supplied"),
    }
}

fn malformed(sublist: &str, kind: &str, n: usize, reason: &str) -> LinekitError {
    LinekitError::MalformedChangeSet(format!("{sublist} {kind} #{n}: {reason}"))
}
