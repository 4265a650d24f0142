//! Facades over the host record platform.
//!
//! The core never talks to the host directly. It consumes these traits, which
//! a host binding implements and which tests replace with doubles. All calls
//! are synchronous; any error a host returns is propagated unchanged.

use crate::{FieldMap, FieldValue, Result, SearchColumn, SearchFilter, SearchResult};
use serde::{Deserialize, Serialize};

/// Line-item primitives for one record's sublists.
///
/// Positions are 1-based and always passed as `(sublist, position, field)`.
/// Row counts must be read live: inserts and removals shift later rows.
pub trait RowAccessor {
    /// The host's record handle.
    type Record;

    fn row_count(&self, record: &Self::Record, sublist: &str) -> Result<usize>;

    /// Reads one cell; `None` when the cell holds no value.
    fn read_cell(
        &self,
        record: &Self::Record,
        sublist: &str,
        position: usize,
        field: &str,
    ) -> Result<Option<FieldValue>>;

    fn write_cell(
        &self,
        record: &mut Self::Record,
        sublist: &str,
        position: usize,
        field: &str,
        value: &FieldValue,
    ) -> Result<()>;

    /// Inserts an empty row; rows at and after `position` shift down.
    fn insert_row(&self, record: &mut Self::Record, sublist: &str, position: usize) -> Result<()>;

    /// Removes a row; rows after `position` shift up.
    fn remove_row(&self, record: &mut Self::Record, sublist: &str, position: usize) -> Result<()>;
}

/// Flags passed through to the host when a record is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitOptions {
    /// Let the host populate dependent fields before saving.
    pub do_sourcing: bool,
    /// Save even when mandatory fields are empty.
    pub ignore_mandatory: bool,
}

/// Record-level pass-through calls.
pub trait RecordApi: RowAccessor {
    /// Returns a new, unsaved record.
    fn create_record(&self, record_type: &str) -> Result<Self::Record>;

    fn load_record(&self, record_type: &str, id: &str) -> Result<Self::Record>;

    /// Deletes a stored record and returns its id.
    fn delete_record(&self, record_type: &str, id: &str) -> Result<String>;

    /// Creates an unsaved record of `result_type` from a stored source record,
    /// then applies `values` to its top-level fields.
    fn transform_record(
        &self,
        source_type: &str,
        id: &str,
        result_type: &str,
        values: &FieldMap,
    ) -> Result<Self::Record>;

    /// Persists `record` and returns its id.
    fn submit_record(&self, record: &mut Self::Record, options: SubmitOptions) -> Result<String>;

    fn set_field_value(
        &self,
        record: &mut Self::Record,
        field: &str,
        value: &FieldValue,
    ) -> Result<()>;

    /// The record's id, `None` while unsaved.
    fn record_id(&self, record: &Self::Record) -> Option<String>;
}

/// Search pass-through.
pub trait SearchApi {
    /// Runs a search over `record_type`. With `saved_search_id`, the stored
    /// search's filters and columns are extended by the supplied ones.
    fn search_records(
        &self,
        record_type: &str,
        saved_search_id: Option<&str>,
        filters: &[SearchFilter],
        columns: &[SearchColumn],
    ) -> Result<Vec<SearchResult>>;
}
