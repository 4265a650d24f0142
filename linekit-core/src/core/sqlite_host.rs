//! Record host backed by a local SQLite file.
//!
//! Records are stored whole (fields and sublists as JSON) and handed out as
//! detached [`Record`] values; sublist edits happen in memory and reach the
//! database on [`RecordApi::submit_record`].

use crate::{
    project_rows, FieldMap, FieldValue, LinekitError, Record, RecordApi, Result, RowAccessor,
    SearchApi, SearchColumn, SearchFilter, SearchResult, Settings, Storage, SubmitOptions,
};
use rusqlite::OptionalExtension;
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Field that [`RecordApi::transform_record`] sets to the source record's id.
pub const CREATED_FROM_FIELD: &str = "createdfrom";

/// SQLite-backed implementation of every host facade.
pub struct SqliteHost {
    storage: Storage,
    mandatory_fields: BTreeMap<String, Vec<String>>,
    sourcing_defaults: BTreeMap<String, FieldMap>,
}

impl SqliteHost {
    /// Creates a new record store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::Database`] for any SQLite failure.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_storage(Storage::create(path)?))
    }

    /// Opens an existing record store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::Host`] if the file is not a record store, or
    /// [`LinekitError::Database`] for any SQLite failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_storage(Storage::open(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::with_storage(Storage::in_memory()?))
    }

    fn with_storage(storage: Storage) -> Self {
        Self {
            storage,
            mandatory_fields: BTreeMap::new(),
            sourcing_defaults: BTreeMap::new(),
        }
    }

    /// Takes mandatory-field and sourcing rules from `settings`.
    #[must_use]
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.mandatory_fields = settings.mandatory_fields.clone();
        self.sourcing_defaults = settings.sourcing_defaults.clone();
        self
    }

    /// Stores (or replaces) a saved search under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::Database`] or [`LinekitError::Json`] on failure.
    pub fn save_search(
        &self,
        id: &str,
        record_type: &str,
        filters: &[SearchFilter],
        columns: &[SearchColumn],
    ) -> Result<()> {
        self.storage.connection().execute(
            "INSERT OR REPLACE INTO saved_searches (id, record_type, filters_json, columns_json)
             VALUES (?, ?, ?, ?)",
            rusqlite::params![
                id,
                record_type,
                serde_json::to_string(filters)?,
                serde_json::to_string(columns)?,
            ],
        )?;
        Ok(())
    }

    fn load_saved_search(&self, id: &str) -> Result<(Vec<SearchFilter>, Vec<SearchColumn>)> {
        let stored: Option<(String, String)> = self
            .storage
            .connection()
            .query_row(
                "SELECT filters_json, columns_json FROM saved_searches WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (filters_json, columns_json) =
            stored.ok_or_else(|| LinekitError::SavedSearchNotFound(id.to_string()))?;
        Ok((serde_json::from_str(&filters_json)?, serde_json::from_str(&columns_json)?))
    }

    /// Fills configured defaults into fields the record does not have yet.
    fn apply_sourcing(&self, record: &mut Record) {
        if let Some(defaults) = self.sourcing_defaults.get(&record.record_type) {
            for (field, value) in defaults.iter().filter(|(_, v)| !v.is_null()) {
                record.fields.entry(field.clone()).or_insert_with(|| value.clone());
            }
        }
    }

    fn validate_mandatory(&self, record: &Record) -> Result<()> {
        let Some(required) = self.mandatory_fields.get(&record.record_type) else {
            return Ok(());
        };
        for field in required {
            if record.field_value(field).map_or(true, FieldValue::is_empty) {
                return Err(LinekitError::ValidationFailed(format!(
                    "{} is mandatory on {}",
                    field, record.record_type
                )));
            }
        }
        Ok(())
    }
}

impl RowAccessor for SqliteHost {
    type Record = Record;

    fn row_count(&self, record: &Record, sublist: &str) -> Result<usize> {
        Ok(record.line_item_count(sublist))
    }

    fn read_cell(
        &self,
        record: &Record,
        sublist: &str,
        position: usize,
        field: &str,
    ) -> Result<Option<FieldValue>> {
        Ok(record.line_item_value(sublist, position, field)?.cloned())
    }

    fn write_cell(
        &self,
        record: &mut Record,
        sublist: &str,
        position: usize,
        field: &str,
        value: &FieldValue,
    ) -> Result<()> {
        record.set_line_item_value(sublist, position, field, value.clone())
    }

    fn insert_row(&self, record: &mut Record, sublist: &str, position: usize) -> Result<()> {
        record.insert_line_item(sublist, position)
    }

    fn remove_row(&self, record: &mut Record, sublist: &str, position: usize) -> Result<()> {
        record.remove_line_item(sublist, position)
    }
}

impl RecordApi for SqliteHost {
    fn create_record(&self, record_type: &str) -> Result<Record> {
        Ok(Record::new(record_type))
    }

    fn load_record(&self, record_type: &str, id: &str) -> Result<Record> {
        let stored: Option<(String, String)> = self
            .storage
            .connection()
            .query_row(
                "SELECT fields_json, sublists_json FROM records WHERE id = ? AND record_type = ?",
                [id, record_type],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (fields_json, sublists_json) = stored.ok_or_else(|| LinekitError::RecordNotFound {
            record_type: record_type.to_string(),
            id: id.to_string(),
        })?;
        Ok(Record {
            record_type: record_type.to_string(),
            id: Some(id.to_string()),
            fields: serde_json::from_str(&fields_json)?,
            sublists: serde_json::from_str(&sublists_json)?,
        })
    }

    fn delete_record(&self, record_type: &str, id: &str) -> Result<String> {
        let deleted = self.storage.connection().execute(
            "DELETE FROM records WHERE id = ? AND record_type = ?",
            [id, record_type],
        )?;
        if deleted == 0 {
            return Err(LinekitError::RecordNotFound {
                record_type: record_type.to_string(),
                id: id.to_string(),
            });
        }
        log::info!("Deleted {record_type} {id}");
        Ok(id.to_string())
    }

    fn transform_record(
        &self,
        source_type: &str,
        id: &str,
        result_type: &str,
        values: &FieldMap,
    ) -> Result<Record> {
        let source = self.load_record(source_type, id)?;
        let mut record = Record::new(result_type);
        record.fields = source.fields;
        record.sublists = source.sublists;
        record.set_field_value(CREATED_FROM_FIELD, FieldValue::Text(id.to_string()));
        for (field, value) in values {
            record.set_field_value(field, value.clone());
        }
        Ok(record)
    }

    fn submit_record(&self, record: &mut Record, options: SubmitOptions) -> Result<String> {
        if options.do_sourcing {
            self.apply_sourcing(record);
        }
        if !options.ignore_mandatory {
            self.validate_mandatory(record)?;
        }

        let id = record.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = chrono::Utc::now().timestamp();
        self.storage.connection().execute(
            "INSERT INTO records
                (id, record_type, fields_json, sublists_json, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                fields_json = excluded.fields_json,
                sublists_json = excluded.sublists_json,
                modified_at = excluded.modified_at",
            rusqlite::params![
                id,
                record.record_type,
                serde_json::to_string(&record.fields)?,
                serde_json::to_string(&record.sublists)?,
                now,
                now,
            ],
        )?;
        record.id = Some(id.clone());
        log::info!("Submitted {} {id}", record.record_type);
        Ok(id)
    }

    fn set_field_value(&self, record: &mut Record, field: &str, value: &FieldValue) -> Result<()> {
        record.set_field_value(field, value.clone());
        Ok(())
    }

    fn record_id(&self, record: &Record) -> Option<String> {
        record.id.clone()
    }
}

impl SearchApi for SqliteHost {
    fn search_records(
        &self,
        record_type: &str,
        saved_search_id: Option<&str>,
        filters: &[SearchFilter],
        columns: &[SearchColumn],
    ) -> Result<Vec<SearchResult>> {
        let (mut all_filters, mut all_columns) = match saved_search_id {
            Some(id) => self.load_saved_search(id)?,
            None => (Vec::new(), Vec::new()),
        };
        all_filters.extend_from_slice(filters);
        all_columns.extend_from_slice(columns);

        let mut stmt = self
            .storage
            .connection()
            .prepare("SELECT id, fields_json FROM records WHERE record_type = ? ORDER BY rowid")?;
        let stored = stmt
            .query_map([record_type], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut matched = Vec::new();
        'records: for (id, fields_json) in stored {
            let fields: FieldMap = serde_json::from_str(&fields_json)?;
            for filter in &all_filters {
                if !filter.matches(&id, &fields)? {
                    continue 'records;
                }
            }
            matched.push((id, fields));
        }
        project_rows(record_type, &all_columns, &matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        search_column, search_filter, ErrorKind, SearchOperator, SearchSummary, SublistChanges,
        SublistReconciler,
    };
    use tempfile::NamedTempFile;

    fn order(host: &SqliteHost, entity: &str, total: f64) -> String {
        let mut record = host.create_record("salesorder").unwrap();
        record.set_field_value("entity", entity.into());
        record.set_field_value("total", total.into());
        host.submit_record(&mut record, SubmitOptions::default()).unwrap()
    }

    #[test]
    fn test_submit_assigns_id_and_load_round_trips() {
        let host = SqliteHost::in_memory().unwrap();
        let mut record = host.create_record("salesorder").unwrap();
        assert!(host.record_id(&record).is_none());
        record.set_field_value("entity", "Acme".into());
        record.insert_line_item("item", 1).unwrap();
        record.set_line_item_value("item", 1, "sku", "A".into()).unwrap();

        let id = host.submit_record(&mut record, SubmitOptions::default()).unwrap();

        assert_eq!(host.record_id(&record), Some(id.clone()));
        let loaded = host.load_record("salesorder", &id).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_resubmit_keeps_id() {
        let host = SqliteHost::in_memory().unwrap();
        let id = order(&host, "Acme", 10.0);
        let mut record = host.load_record("salesorder", &id).unwrap();
        record.set_field_value("memo", "rush".into());

        assert_eq!(host.submit_record(&mut record, SubmitOptions::default()).unwrap(), id);
        let loaded = host.load_record("salesorder", &id).unwrap();
        assert_eq!(loaded.field_value("memo"), Some(&FieldValue::from("rush")));
    }

    #[test]
    fn test_load_unknown_or_wrong_type_is_not_found() {
        let host = SqliteHost::in_memory().unwrap();
        let id = order(&host, "Acme", 10.0);
        assert!(matches!(
            host.load_record("salesorder", "missing"),
            Err(LinekitError::RecordNotFound { .. })
        ));
        assert!(host.load_record("invoice", &id).is_err());
    }

    #[test]
    fn test_delete_returns_id_once() {
        let host = SqliteHost::in_memory().unwrap();
        let id = order(&host, "Acme", 10.0);
        assert_eq!(host.delete_record("salesorder", &id).unwrap(), id);
        assert!(host.load_record("salesorder", &id).is_err());
        assert_eq!(
            host.delete_record("salesorder", &id).unwrap_err().kind(),
            ErrorKind::HostAccessor
        );
    }

    #[test]
    fn test_mandatory_fields_and_sourcing() {
        let mut settings = Settings::default();
        settings
            .mandatory_fields
            .insert("salesorder".into(), vec!["entity".into(), "currency".into()]);
        let mut defaults = FieldMap::new();
        defaults.insert("currency".into(), "USD".into());
        defaults.insert("entity".into(), "Default Co".into());
        settings.sourcing_defaults.insert("salesorder".into(), defaults);
        let host = SqliteHost::in_memory().unwrap().with_settings(&settings);

        let mut record = host.create_record("salesorder").unwrap();
        record.set_field_value("entity", "Acme".into());
        let err = host.submit_record(&mut record, SubmitOptions::default()).unwrap_err();
        assert!(matches!(err, LinekitError::ValidationFailed(_)));
        assert!(record.id.is_none());

        let ignore = SubmitOptions {
            do_sourcing: false,
            ignore_mandatory: true,
        };
        let mut unchecked = record.clone();
        assert!(host.submit_record(&mut unchecked, ignore).is_ok());

        let sourcing = SubmitOptions {
            do_sourcing: true,
            ignore_mandatory: false,
        };
        host.submit_record(&mut record, sourcing).unwrap();
        assert_eq!(record.field_value("currency"), Some(&FieldValue::from("USD")));
        assert_eq!(record.field_value("entity"), Some(&FieldValue::from("Acme")));
    }

    #[test]
    fn test_transform_copies_source_and_applies_values() {
        let host = SqliteHost::in_memory().unwrap();
        let mut source = host.create_record("salesorder").unwrap();
        source.set_field_value("entity", "Acme".into());
        source.insert_line_item("item", 1).unwrap();
        source.set_line_item_value("item", 1, "sku", "A".into()).unwrap();
        let id = host.submit_record(&mut source, SubmitOptions::default()).unwrap();

        let mut values = FieldMap::new();
        values.insert("memo".into(), "billed".into());
        let invoice = host.transform_record("salesorder", &id, "invoice", &values).unwrap();

        assert_eq!(invoice.record_type, "invoice");
        assert!(invoice.id.is_none());
        assert_eq!(invoice.field_value("entity"), Some(&FieldValue::from("Acme")));
        assert_eq!(invoice.field_value(CREATED_FROM_FIELD), Some(&FieldValue::Text(id)));
        assert_eq!(invoice.field_value("memo"), Some(&FieldValue::from("billed")));
        assert_eq!(invoice.line_item_count("item"), 1);
    }

    #[test]
    fn test_search_filters_and_columns() {
        let host = SqliteHost::in_memory().unwrap();
        order(&host, "Acme", 10.0);
        let big = order(&host, "Globex", 250.0);
        order(&host, "Acme", 40.0);

        let filters = [search_filter(
            "total",
            SearchOperator::GreaterThan,
            Some(100.0.into()),
            None,
        )];
        let columns = [search_column("entity", None, None)];
        let results = host.search_records("salesorder", None, &filters, &columns).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_deref(), Some(big.as_str()));
        assert_eq!(results[0].values["entity"], FieldValue::from("Globex"));
        assert!(host.search_records("invoice", None, &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_saved_search_is_extended_by_supplied_filters() {
        let host = SqliteHost::in_memory().unwrap();
        order(&host, "Acme", 10.0);
        order(&host, "Acme", 40.0);
        order(&host, "Globex", 250.0);
        host.save_search(
            "acme_orders",
            "salesorder",
            &[search_filter("entity", SearchOperator::Is, Some("Acme".into()), None)],
            &[
                search_column("entity", None, Some(SearchSummary::Group)),
                search_column("total", None, Some(SearchSummary::Sum)),
            ],
        )
        .unwrap();

        let all = host.search_records("salesorder", Some("acme_orders"), &[], &[]).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].values["sum(total)"], FieldValue::Number(50.0));

        let narrowed = host
            .search_records(
                "salesorder",
                Some("acme_orders"),
                &[search_filter("total", SearchOperator::LessThan, Some(20.0.into()), None)],
                &[],
            )
            .unwrap();
        assert_eq!(narrowed[0].values["sum(total)"], FieldValue::Number(10.0));

        assert!(matches!(
            host.search_records("salesorder", Some("nope"), &[], &[]),
            Err(LinekitError::SavedSearchNotFound(_))
        ));
    }

    #[test]
    fn test_reconciled_sublist_persists_across_reopen() {
        let temp = NamedTempFile::new().unwrap();
        let id = {
            let host = SqliteHost::create(temp.path()).unwrap();
            let mut record = host.create_record("salesorder").unwrap();
            let changes = SublistChanges::from_json(
                r#"{"name": "item", "create": [{"data": {"sku": "A"}}, {"data": {"sku": "B"}}]}"#,
            )
            .unwrap();
            SublistReconciler::new(&host, &mut record, changes).execute().unwrap();
            host.submit_record(&mut record, SubmitOptions::default()).unwrap()
        };

        let host = SqliteHost::open(temp.path()).unwrap();
        let record = host.load_record("salesorder", &id).unwrap();
        assert_eq!(record.line_item_count("item"), 2);
        assert_eq!(
            host.read_cell(&record, "item", 2, "sku").unwrap(),
            Some(FieldValue::from("B"))
        );
    }
}
