//! Search filter and column factories, and their evaluation over stored rows.

use crate::{FieldMap, FieldValue, LinekitError, MatchMode, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Pseudo-field that addresses a record's id in filters and columns.
pub const INTERNAL_ID_FIELD: &str = "internalid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchOperator {
    Is,
    IsNot,
    Contains,
    StartsWith,
    GreaterThan,
    LessThan,
    Between,
    IsEmpty,
    IsNotEmpty,
}

/// One search criterion on a field, optionally through a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub field: String,
    #[serde(default)]
    pub join: Option<String>,
    pub operator: SearchOperator,
    #[serde(default)]
    pub value1: Option<FieldValue>,
    #[serde(default)]
    pub value2: Option<FieldValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSummary {
    Group,
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

/// A value to return from a search, optionally summarized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchColumn {
    pub name: String,
    #[serde(default)]
    pub join: Option<String>,
    #[serde(default)]
    pub summary: Option<SearchSummary>,
}

/// One row of search output, keyed by [`SearchColumn::label`].
///
/// Summarized searches return one row per group with no `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: Option<String>,
    pub record_type: String,
    pub values: BTreeMap<String, FieldValue>,
}

/// Builds a filter. Use [`SearchFilter::with_join`] to filter through a join.
pub fn search_filter(
    field: &str,
    operator: SearchOperator,
    value1: Option<FieldValue>,
    value2: Option<FieldValue>,
) -> SearchFilter {
    SearchFilter {
        field: field.to_string(),
        join: None,
        operator,
        value1,
        value2,
    }
}

pub fn search_column(
    name: &str,
    join: Option<&str>,
    summary: Option<SearchSummary>,
) -> SearchColumn {
    SearchColumn {
        name: name.to_string(),
        join: join.map(str::to_string),
        summary,
    }
}

impl SearchFilter {
    #[must_use]
    pub fn with_join(mut self, join: &str) -> Self {
        self.join = Some(join.to_string());
        self
    }

    /// Evaluates the filter against one stored record.
    ///
    /// # Errors
    ///
    /// Returns [`LinekitError::UnsupportedSearch`] for joins and for operators
    /// missing a required operand.
    pub fn matches(&self, id: &str, fields: &FieldMap) -> Result<bool> {
        if let Some(join) = &self.join {
            return Err(LinekitError::UnsupportedSearch(format!(
                "join '{join}' on filter '{}'",
                self.field
            )));
        }
        let value = lookup(id, fields, &self.field);
        let matched = match self.operator {
            SearchOperator::Is => MatchMode::Coerce.matches(value.as_ref(), self.operand1()?),
            SearchOperator::IsNot => !MatchMode::Coerce.matches(value.as_ref(), self.operand1()?),
            SearchOperator::Contains => text_of(&value).contains(&self.operand_text()?),
            SearchOperator::StartsWith => text_of(&value).starts_with(&self.operand_text()?),
            SearchOperator::GreaterThan => {
                ordering(&value, self.operand1()?) == Some(Ordering::Greater)
            }
            SearchOperator::LessThan => ordering(&value, self.operand1()?) == Some(Ordering::Less),
            SearchOperator::Between => {
                let low = ordering(&value, self.operand1()?);
                let high = ordering(&value, self.operand2()?);
                matches!(low, Some(Ordering::Greater | Ordering::Equal))
                    && matches!(high, Some(Ordering::Less | Ordering::Equal))
            }
            SearchOperator::IsEmpty => value.as_ref().map_or(true, FieldValue::is_empty),
            SearchOperator::IsNotEmpty => !value.as_ref().map_or(true, FieldValue::is_empty),
        };
        Ok(matched)
    }

    fn operand1(&self) -> Result<&FieldValue> {
        self.value1.as_ref().ok_or_else(|| self.missing_operand("value1"))
    }

    /// Lowercased text of the first operand for substring operators.
    fn operand_text(&self) -> Result<String> {
        Ok(self.operand1()?.to_string().to_lowercase())
    }

    fn operand2(&self) -> Result<&FieldValue> {
        self.value2.as_ref().ok_or_else(|| self.missing_operand("value2"))
    }

    fn missing_operand(&self, which: &str) -> LinekitError {
        LinekitError::UnsupportedSearch(format!(
            "operator {:?} on '{}' needs {which}",
            self.operator, self.field
        ))
    }
}

impl SearchColumn {
    /// Key under which this column's value appears in a [`SearchResult`].
    #[must_use]
    pub fn label(&self) -> String {
        match self.summary {
            None | Some(SearchSummary::Group) => self.name.clone(),
            Some(summary) => format!("{}({})", summary_name(summary), self.name),
        }
    }
}

/// Projects matched rows through `columns`, aggregating when any column has a
/// summary. Matched rows are `(id, fields)` pairs in storage order.
///
/// # Errors
///
/// Returns [`LinekitError::UnsupportedSearch`] for joined columns and for plain
/// columns mixed into a summarized search.
pub fn project_rows(
    record_type: &str,
    columns: &[SearchColumn],
    rows: &[(String, FieldMap)],
) -> Result<Vec<SearchResult>> {
    if let Some(column) = columns.iter().find(|c| c.join.is_some()) {
        return Err(LinekitError::UnsupportedSearch(format!("join on column '{}'", column.name)));
    }

    if columns.iter().all(|c| c.summary.is_none()) {
        return Ok(rows
            .iter()
            .map(|(id, fields)| SearchResult {
                id: Some(id.clone()),
                record_type: record_type.to_string(),
                values: columns
                    .iter()
                    .filter_map(|c| lookup(id, fields, &c.name).map(|v| (c.label(), v)))
                    .collect(),
            })
            .collect());
    }

    if let Some(column) = columns.iter().find(|c| c.summary.is_none()) {
        return Err(LinekitError::UnsupportedSearch(format!(
            "column '{}' needs a summary in a summarized search",
            column.name
        )));
    }

    let group_columns: Vec<&SearchColumn> = columns
        .iter()
        .filter(|c| c.summary == Some(SearchSummary::Group))
        .collect();

    // Groups keep first-seen order; values are not hashable.
    let mut groups: Vec<(Vec<Option<FieldValue>>, Vec<&(String, FieldMap)>)> = Vec::new();
    for row in rows {
        let key: Vec<Option<FieldValue>> = group_columns
            .iter()
            .map(|c| lookup(&row.0, &row.1, &c.name))
            .collect();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(row),
            None => groups.push((key, vec![row])),
        }
    }

    let results = groups
        .into_iter()
        .map(|(_, members)| {
            let mut values = BTreeMap::new();
            for column in columns {
                let cells: Vec<FieldValue> = members
                    .iter()
                    .filter_map(|(id, fields)| lookup(id, fields, &column.name))
                    .collect();
                if let Some(value) = column.summary.and_then(|s| aggregate(s, &cells)) {
                    values.insert(column.label(), value);
                }
            }
            SearchResult {
                id: None,
                record_type: record_type.to_string(),
                values,
            }
        })
        .collect();
    Ok(results)
}

fn aggregate(summary: SearchSummary, cells: &[FieldValue]) -> Option<FieldValue> {
    let numbers = || cells.iter().filter_map(FieldValue::as_number);
    match summary {
        SearchSummary::Group => cells.first().cloned(),
        SearchSummary::Count => Some(FieldValue::Number(cells.len() as f64)),
        SearchSummary::Sum => Some(FieldValue::Number(numbers().sum())),
        SearchSummary::Avg => {
            let count = numbers().count();
            (count > 0).then(|| FieldValue::Number(numbers().sum::<f64>() / count as f64))
        }
        SearchSummary::Min => extreme(cells, Ordering::Less),
        SearchSummary::Max => extreme(cells, Ordering::Greater),
    }
}

fn extreme(cells: &[FieldValue], wanted: Ordering) -> Option<FieldValue> {
    let mut best: Option<&FieldValue> = None;
    for cell in cells {
        best = match best {
            Some(current) if cell.compare(current) != Some(wanted) => Some(current),
            _ => Some(cell),
        };
    }
    best.cloned()
}

fn summary_name(summary: SearchSummary) -> &'static str {
    match summary {
        SearchSummary::Group => "group",
        SearchSummary::Count => "count",
        SearchSummary::Sum => "sum",
        SearchSummary::Min => "min",
        SearchSummary::Max => "max",
        SearchSummary::Avg => "avg",
    }
}

fn lookup(id: &str, fields: &FieldMap, field: &str) -> Option<FieldValue> {
    if field == INTERNAL_ID_FIELD {
        return Some(FieldValue::Text(id.to_string()));
    }
    fields.get(field).cloned()
}

fn text_of(value: &Option<FieldValue>) -> String {
    value.as_ref().map(|v| v.to_string().to_lowercase()).unwrap_or_default()
}

fn ordering(value: &Option<FieldValue>, operand: &FieldValue) -> Option<Ordering> {
    value.as_ref()?.compare(operand)
}
