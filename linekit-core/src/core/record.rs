//! Detached in-memory record with scalar fields and named sublists.

use crate::{FieldMap, FieldValue, LinekitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A host record as handed out by [`SqliteHost`](crate::SqliteHost).
///
/// Records follow a load, mutate, submit workflow: every mutation here only
/// touches the in-memory copy until the record is submitted. Line-item
/// positions are 1-based; a sublist that has never been written reads as empty.
///
/// # Examples
///
/// ```rust
/// use linekit_core::{FieldValue, Record};
///
/// let mut order = Record::new("salesorder");
/// order.insert_line_item("item", 1).unwrap();
/// order.set_line_item_value("item", 1, "sku", FieldValue::from("A")).unwrap();
/// assert_eq!(order.line_item_count("item"), 1);
/// assert_eq!(order.line_item_value("item", 1, "sku").unwrap(), Some(&FieldValue::from("A")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_type: String,
    /// `None` until the record is first submitted.
    pub id: Option<String>,
    pub fields: FieldMap,
    pub sublists: BTreeMap<String, Vec<FieldMap>>,
}

impl Record {
    /// Creates an empty, unsaved record of `record_type`.
    pub fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            id: None,
            fields: FieldMap::new(),
            sublists: BTreeMap::new(),
        }
    }

    pub fn field_value(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Writes a top-level field; [`FieldValue::Null`] clears it.
    pub fn set_field_value(&mut self, field: &str, value: FieldValue) {
        if value.is_null() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field.to_string(), value);
        }
    }

    pub fn line_item_count(&self, sublist: &str) -> usize {
        self.sublists.get(sublist).map_or(0, Vec::len)
    }

    /// Reads one cell. An existing row without the field reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::InvalidPosition`] if `position` is outside `1..=count`.
    pub fn line_item_value(
        &self,
        sublist: &str,
        position: usize,
        field: &str,
    ) -> Result<Option<&FieldValue>> {
        let row = self.row_index(sublist, position)?;
        Ok(self.sublists[sublist][row].get(field))
    }

    /// Writes one cell; [`FieldValue::Null`] clears it.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::InvalidPosition`] if `position` is outside `1..=count`.
    pub fn set_line_item_value(
        &mut self,
        sublist: &str,
        position: usize,
        field: &str,
        value: FieldValue,
    ) -> Result<()> {
        let row = self.row_index(sublist, position)?;
        if let Some(rows) = self.sublists.get_mut(sublist) {
            if value.is_null() {
                rows[row].remove(field);
            } else {
                rows[row].insert(field.to_string(), value);
            }
        }
        Ok(())
    }

    /// Inserts an empty row at `position`; rows at and after it shift down.
    /// `count + 1` appends.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::InvalidPosition`] if `position` is outside `1..=count + 1`.
    pub fn insert_line_item(&mut self, sublist: &str, position: usize) -> Result<()> {
        let count = self.line_item_count(sublist);
        if position == 0 || position > count + 1 {
            return Err(LinekitError::InvalidPosition {
                sublist: sublist.to_string(),
                position,
                count,
            });
        }
        self.sublists
            .entry(sublist.to_string())
            .or_default()
            .insert(position - 1, FieldMap::new());
        Ok(())
    }

    /// Removes the row at `position`; later rows shift up.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::InvalidPosition`] if `position` is outside `1..=count`.
    pub fn remove_line_item(&mut self, sublist: &str, position: usize) -> Result<()> {
        let row = self.row_index(sublist, position)?;
        if let Some(rows) = self.sublists.get_mut(sublist) {
            rows.remove(row);
        }
        Ok(())
    }

    fn row_index(&self, sublist: &str, position: usize) -> Result<usize> {
        let count = self.line_item_count(sublist);
        if position == 0 || position > count {
            return Err(LinekitError::InvalidPosition {
                sublist: sublist.to_string(),
                position,
                count,
            });
        }
        Ok(position - 1)
    }
}
