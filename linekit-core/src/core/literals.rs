//! Writes flat field data onto a record's top-level (non-sublist) fields.

use crate::{FieldMap, RecordApi, Result};

/// Writes every entry of `field_data` to `record` exactly once.
///
/// # Errors
///
/// Stops at, and returns, the first error the host raises; fields written
/// before it keep their new values.
pub fn update_literals<H: RecordApi>(
    host: &H,
    record: &mut H::Record,
    field_data: &FieldMap,
) -> Result<()> {
    for (field, value) in field_data {
        host.set_field_value(record, field, value)?;
    }
    log::debug!("Updated {} literal field(s)", field_data.len());
    Ok(())
}
