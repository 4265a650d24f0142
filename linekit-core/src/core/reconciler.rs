//! Sublist batch reconciliation: applies a [`SublistChanges`] to one record.
//!
//! A pass runs in three phases, never interleaved: every creation in list
//! order, then every update, then every excision. Creations land first so that
//! later phases see the final row count; excisions run last so that the rows
//! they shift cannot invalidate an update in the same pass.
//!
//! There is no rollback. An error aborts the rest of the pass and leaves every
//! earlier write in place; the caller decides whether a partially applied
//! change-set is acceptable.

use crate::core::changeset::RowTarget;
use crate::{
    CreateRequest, ExciseRequest, FieldMap, FieldValue, LinekitError, MatchMode, Result,
    RowAccessor, SublistChanges, UpdateRequest,
};
use serde::Serialize;

/// Positions touched by one pass, in execution order.
///
/// Positions are as resolved at the moment of each operation; earlier inserts
/// and removals in the same phase may have shifted the rows since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub sublist: String,
    pub created: Vec<usize>,
    pub updated: Vec<usize>,
    pub excised: Vec<usize>,
}

/// Single-shot executor for one sublist change-set.
///
/// The record stays exclusively borrowed until [`execute`](Self::execute)
/// returns, which consumes the reconciler.
pub struct SublistReconciler<'r, A: RowAccessor> {
    accessor: &'r A,
    record: &'r mut A::Record,
    sublist: String,
    changes: SublistChanges,
    match_mode: MatchMode,
}

impl<'r, A: RowAccessor> SublistReconciler<'r, A> {
    pub fn new(accessor: &'r A, record: &'r mut A::Record, changes: SublistChanges) -> Self {
        Self {
            accessor,
            record,
            sublist: changes.name.clone(),
            changes,
            match_mode: MatchMode::default(),
        }
    }

    #[must_use]
    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Validates the whole change-set, then runs creations, updates and
    /// excisions in that order.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::MalformedChangeSet`] before any host call when a
    /// request names no row, [`LinekitError::RowMatchFailed`] when a match scan
    /// finds nothing, and any host error unchanged.
    pub fn execute(mut self) -> Result<ReconcileSummary> {
        let changes = std::mem::take(&mut self.changes);
        changes.validate()?;

        let result = self.run(&changes);
        match &result {
            Ok(summary) => log::info!(
                "Reconciled sublist '{}': {} created, {} updated, {} excised",
                self.sublist,
                summary.created.len(),
                summary.updated.len(),
                summary.excised.len()
            ),
            Err(e) => log::warn!("Reconciliation of sublist '{}' aborted: {e}", self.sublist),
        }
        result
    }

    fn run(&mut self, changes: &SublistChanges) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary {
            sublist: self.sublist.clone(),
            ..ReconcileSummary::default()
        };
        for request in &changes.create {
            summary.created.push(self.create_line_item(request)?);
        }
        for request in &changes.update {
            summary.updated.push(self.update_line_item(request)?);
        }
        for request in &changes.excise {
            summary.excised.push(self.excise_line_item(request)?);
        }
        Ok(summary)
    }

    fn create_line_item(&mut self, request: &CreateRequest) -> Result<usize> {
        let position = match request.index {
            Some(position) => position,
            None => self.accessor.row_count(&*self.record, &self.sublist)? + 1,
        };
        self.accessor.insert_row(self.record, &self.sublist, position)?;
        self.update_line_item_fields(position, &request.data)?;
        log::debug!("Created line {position} on '{}'", self.sublist);
        Ok(position)
    }

    fn update_line_item(&mut self, request: &UpdateRequest) -> Result<usize> {
        let target = request.target().ok_or_else(|| self.untargeted("update"))?;
        let position = self.resolve(target)?;
        self.update_line_item_fields(position, &request.data)?;
        log::debug!("Updated line {position} on '{}'", self.sublist);
        Ok(position)
    }

    fn excise_line_item(&mut self, request: &ExciseRequest) -> Result<usize> {
        let target = request.target().ok_or_else(|| self.untargeted("excise"))?;
        let position = self.resolve(target)?;
        self.accessor.remove_row(self.record, &self.sublist, position)?;
        log::debug!("Excised line {position} on '{}'", self.sublist);
        Ok(position)
    }

    fn update_line_item_fields(&mut self, position: usize, data: &FieldMap) -> Result<()> {
        for (field, value) in data {
            self.accessor
                .write_cell(self.record, &self.sublist, position, field, value)?;
        }
        Ok(())
    }

    fn resolve(&self, target: RowTarget<'_>) -> Result<usize> {
        match target {
            RowTarget::Index(position) => Ok(position),
            RowTarget::Match { field, value } => self.match_line_item_by_field(field, value),
        }
    }

    /// First row, in ascending position order, whose `field` equals `value`.
    fn match_line_item_by_field(&self, field: &str, value: &FieldValue) -> Result<usize> {
        let count = self.accessor.row_count(&*self.record, &self.sublist)?;
        for position in 1..=count {
            let cell = self.accessor.read_cell(&*self.record, &self.sublist, position, field)?;
            if self.match_mode.matches(cell.as_ref(), value) {
                return Ok(position);
            }
        }
        Err(LinekitError::RowMatchFailed {
            sublist: self.sublist.clone(),
            field: field.to_string(),
        })
    }

    fn untargeted(&self, kind: &str) -> LinekitError {
        LinekitError::MalformedChangeSet(format!(
            "{} {kind}: neither index nor match supplied",
            self.sublist
        ))
    }
}
