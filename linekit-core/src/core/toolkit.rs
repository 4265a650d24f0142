//! One-call helpers over an injected host.

use crate::{
    update_literals, FieldMap, FieldValue, RecordApi, RecordChanges, ReconcileSummary, Result,
    RowAccessor, SearchApi, SearchColumn, SearchFilter, SearchResult, Settings, SublistChanges,
    SublistReconciler, SubmitOptions,
};

/// Bundles a host with the [`Settings`] that steer matching and submits.
///
/// Every method is a thin pass-through except [`process_sublist`](Self::process_sublist)
/// and [`apply_changes`](Self::apply_changes), which drive the reconciler.
pub struct Toolkit<H> {
    host: H,
    settings: Settings,
}

impl<H> Toolkit<H> {
    pub fn new(host: H, settings: Settings) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl<H: RowAccessor> Toolkit<H> {
    pub fn line_item_count(&self, record: &H::Record, sublist: &str) -> Result<usize> {
        self.host.row_count(record, sublist)
    }

    pub fn line_item_value(
        &self,
        record: &H::Record,
        sublist: &str,
        position: usize,
        field: &str,
    ) -> Result<Option<FieldValue>> {
        self.host.read_cell(record, sublist, position, field)
    }

    pub fn set_line_item_value(
        &self,
        record: &mut H::Record,
        sublist: &str,
        position: usize,
        field: &str,
        value: &FieldValue,
    ) -> Result<()> {
        self.host.write_cell(record, sublist, position, field, value)
    }

    pub fn insert_line_item(
        &self,
        record: &mut H::Record,
        sublist: &str,
        position: usize,
    ) -> Result<()> {
        self.host.insert_row(record, sublist, position)
    }

    pub fn remove_line_item(
        &self,
        record: &mut H::Record,
        sublist: &str,
        position: usize,
    ) -> Result<()> {
        self.host.remove_row(record, sublist, position)
    }

    /// Runs one sublist change-set with the configured match mode.
    ///
    /// # Errors
    ///
    /// See [`SublistReconciler::execute`].
    pub fn process_sublist(
        &self,
        record: &mut H::Record,
        changes: SublistChanges,
    ) -> Result<ReconcileSummary> {
        SublistReconciler::new(&self.host, record, changes)
            .with_match_mode(self.settings.match_mode)
            .execute()
    }
}

impl<H: RecordApi> Toolkit<H> {
    pub fn create_record(&self, record_type: &str) -> Result<H::Record> {
        self.host.create_record(record_type)
    }

    pub fn load_record(&self, record_type: &str, id: &str) -> Result<H::Record> {
        self.host.load_record(record_type, id)
    }

    pub fn delete_record(&self, record_type: &str, id: &str) -> Result<String> {
        self.host.delete_record(record_type, id)
    }

    pub fn transform_record(
        &self,
        source_type: &str,
        id: &str,
        result_type: &str,
        values: &FieldMap,
    ) -> Result<H::Record> {
        self.host.transform_record(source_type, id, result_type, values)
    }

    /// Submits with the options from [`Settings::submit`].
    pub fn submit_record(&self, record: &mut H::Record) -> Result<String> {
        self.host.submit_record(record, self.settings.submit)
    }

    pub fn submit_record_with(
        &self,
        record: &mut H::Record,
        options: SubmitOptions,
    ) -> Result<String> {
        self.host.submit_record(record, options)
    }

    pub fn set_field_value(
        &self,
        record: &mut H::Record,
        field: &str,
        value: &FieldValue,
    ) -> Result<()> {
        self.host.set_field_value(record, field, value)
    }

    pub fn record_id(&self, record: &H::Record) -> Option<String> {
        self.host.record_id(record)
    }

    pub fn update_literals(&self, record: &mut H::Record, field_data: &FieldMap) -> Result<()> {
        update_literals(&self.host, record, field_data)
    }

    /// Writes the literal fields, then runs each sublist change-set in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure; nothing already applied is undone.
    pub fn apply_changes(
        &self,
        record: &mut H::Record,
        changes: RecordChanges,
    ) -> Result<Vec<ReconcileSummary>> {
        self.update_literals(record, &changes.literals)?;
        let mut summaries = Vec::with_capacity(changes.sublists.len());
        for sublist in changes.sublists {
            summaries.push(self.process_sublist(record, sublist)?);
        }
        Ok(summaries)
    }
}

impl<H: SearchApi> Toolkit<H> {
    pub fn search_records(
        &self,
        record_type: &str,
        saved_search_id: Option<&str>,
        filters: &[SearchFilter],
        columns: &[SearchColumn],
    ) -> Result<Vec<SearchResult>> {
        self.host.search_records(record_type, saved_search_id, filters, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reply_from_result, search_column, search_filter, ErrorKind, MatchMode, SearchOperator,
        SqliteHost,
    };
    use serde_json::json;

    fn toolkit(settings: Settings) -> Toolkit<SqliteHost> {
        Toolkit::new(SqliteHost::in_memory().unwrap(), settings)
    }

    fn stored_order(kit: &Toolkit<SqliteHost>) -> String {
        let mut record = kit.create_record("salesorder").unwrap();
        kit.set_field_value(&mut record, "entity", &"Acme".into()).unwrap();
        for (position, sku) in ["A", "B"].iter().enumerate() {
            kit.insert_line_item(&mut record, "item", position + 1).unwrap();
            kit.set_line_item_value(&mut record, "item", position + 1, "sku", &(*sku).into())
                .unwrap();
        }
        kit.submit_record(&mut record).unwrap()
    }

    #[test]
    fn test_apply_changes_then_submit() {
        let kit = toolkit(Settings::default());
        let id = stored_order(&kit);
        let mut record = kit.load_record("salesorder", &id).unwrap();

        let changes: RecordChanges = serde_json::from_value(json!({
            "literals": {"memo": "rush"},
            "sublists": [{
                "name": "item",
                "create": [{"data": {"sku": "C", "qty": 1}}],
                "update": [{"match": "sku", "data": {"sku": "B", "qty": 5}}],
                "excise": [{"index": 1}]
            }]
        }))
        .unwrap();

        let summaries = kit.apply_changes(&mut record, changes).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].created, vec![3]);
        assert_eq!(summaries[0].updated, vec![2]);
        assert_eq!(summaries[0].excised, vec![1]);

        kit.submit_record(&mut record).unwrap();
        let reloaded = kit.load_record("salesorder", &id).unwrap();
        assert_eq!(reloaded.field_value("memo"), Some(&FieldValue::from("rush")));
        assert_eq!(kit.line_item_count(&reloaded, "item").unwrap(), 2);
        assert_eq!(
            kit.line_item_value(&reloaded, "item", 1, "qty").unwrap(),
            Some(FieldValue::Number(5.0))
        );
        assert_eq!(
            kit.line_item_value(&reloaded, "item", 2, "sku").unwrap(),
            Some(FieldValue::from("C"))
        );
    }

    #[test]
    fn test_null_literal_clears_field_through_submit() {
        let kit = toolkit(Settings::default());
        let id = stored_order(&kit);
        let mut record = kit.load_record("salesorder", &id).unwrap();

        let changes: RecordChanges =
            serde_json::from_value(json!({"literals": {"entity": null}})).unwrap();
        kit.apply_changes(&mut record, changes).unwrap();
        kit.submit_record(&mut record).unwrap();

        let reloaded = kit.load_record("salesorder", &id).unwrap();
        assert_eq!(reloaded.field_value("entity"), None);
        assert_eq!(kit.line_item_count(&reloaded, "item").unwrap(), 2);
    }

    #[test]
    fn test_process_sublist_uses_configured_match_mode() {
        let settings = Settings {
            match_mode: MatchMode::Coerce,
            ..Settings::default()
        };
        let kit = toolkit(settings);
        let mut record = kit.create_record("salesorder").unwrap();
        kit.insert_line_item(&mut record, "item", 1).unwrap();
        kit.set_line_item_value(&mut record, "item", 1, "line", &"1".into()).unwrap();

        let changes = SublistChanges::from_json(
            r#"{"name": "item", "excise": [{"match": "line", "data": {"line": 1}}]}"#,
        )
        .unwrap();
        kit.process_sublist(&mut record, changes).unwrap();
        assert_eq!(kit.line_item_count(&record, "item").unwrap(), 0);
    }

    #[test]
    fn test_failed_change_set_reports_through_reply() {
        let kit = toolkit(Settings::default());
        let id = stored_order(&kit);
        let mut record = kit.load_record("salesorder", &id).unwrap();
        let changes = SublistChanges::from_json(
            r#"{"name": "item", "update": [{"match": "sku", "data": {"sku": "Z"}}]}"#,
        )
        .unwrap();

        let outcome = kit.process_sublist(&mut record, changes);
        assert_eq!(outcome.as_ref().unwrap_err().kind(), ErrorKind::RowMatchFailed);

        let reply = reply_from_result(json!({"id": id}), outcome);
        assert!(!reply.success);
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["result"], json!(null));
        assert!(value["exception"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Unable to find matching line item"));
    }

    #[test]
    fn test_delete_transform_and_search_pass_through() {
        let kit = toolkit(Settings::default());
        let id = stored_order(&kit);

        let mut invoice = kit
            .transform_record("salesorder", &id, "invoice", &FieldMap::new())
            .unwrap();
        let invoice_id = kit
            .submit_record_with(&mut invoice, SubmitOptions::default())
            .unwrap();
        assert_eq!(kit.record_id(&invoice), Some(invoice_id.clone()));

        let hits = kit
            .search_records(
                "invoice",
                None,
                &[search_filter("createdfrom", SearchOperator::Is, Some(id.clone().into()), None)],
                &[search_column("entity", None, None)],
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].values["entity"], FieldValue::from("Acme"));

        assert_eq!(kit.delete_record("salesorder", &id).unwrap(), id);
        assert!(kit.load_record("salesorder", &id).is_err());
    }
}
