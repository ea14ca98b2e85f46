//! Destination rate lookup built from the carrier's rate sheet.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::entities::{RateRecord, RawRow, RowDiagnostic, RowIssue};

const BASE_PRICE_FIELD: &str = "base unit price";
const EXCESS_PRICE_FIELD: &str = "excess unit price";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("rate payload must be a list of rows, found {0}")]
    NotACollection(&'static str),
}

type DestinationKey = (String, String, String);

/// Read-only rate table. A reload builds a new table rather than mutating this one.
#[derive(Clone, Debug, Default)]
pub struct RateTable {
    records: Vec<RateRecord>,
    index: HashMap<DestinationKey, usize>,
    diagnostics: Vec<RowDiagnostic>,
}

impl RateTable {
    /// Builds a table from a JSON payload.
    ///
    /// The payload must be an array of row objects (a `{"data": [...]}` envelope
    /// is unwrapped). Individual rows that fail validation are dropped and
    /// recorded in [`RateTable::diagnostics`].
    pub fn load(payload: &Value) -> Result<Self, LoadError> {
        let entries = match payload {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get("data") {
                Some(Value::Array(entries)) => entries,
                _ => return Err(LoadError::NotACollection("object")),
            },
            other => return Err(LoadError::NotACollection(json_kind(other))),
        };

        let mut table = Self::default();
        for (row, entry) in entries.iter().enumerate() {
            match RawRow::deserialize(entry) {
                Ok(raw) => table.push(row, raw),
                Err(err) => table.reject(row, RowIssue::Malformed(err.to_string())),
            }
        }
        table.log_summary();
        Ok(table)
    }

    /// Typed fixture entry point; rows are validated like `load` does.
    #[cfg(test)]
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let mut table = Self::default();
        for (row, raw) in rows.into_iter().enumerate() {
            table.push(row, raw);
        }
        table.log_summary();
        table
    }

    /// Distinct region names, sorted.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct sub-regions of `region`, sorted. Empty for an unknown or blank region.
    pub fn sub_regions(&self, region: &str) -> Vec<String> {
        if region.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|record| record.region == region)
            .map(|record| record.sub_region.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Localities of a region/sub-region pair in sheet order.
    pub fn localities(&self, region: &str, sub_region: &str) -> Vec<String> {
        if region.is_empty() || sub_region.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|record| record.region == region && record.sub_region == sub_region)
            .map(|record| record.locality.clone())
            .collect()
    }

    pub fn resolve(&self, region: &str, sub_region: &str, locality: &str) -> Option<&RateRecord> {
        if region.is_empty() || sub_region.is_empty() || locality.is_empty() {
            return None;
        }
        let key = (
            region.to_string(),
            sub_region.to_string(),
            locality.to_string(),
        );
        self.index.get(&key).map(|&position| &self.records[position])
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[RowDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, row: usize, raw: RawRow) {
        let record = match validate(raw) {
            Ok(record) => record,
            Err(issue) => return self.reject(row, issue),
        };

        let key = (
            record.region.clone(),
            record.sub_region.clone(),
            record.locality.clone(),
        );
        if self.index.contains_key(&key) {
            let label = format!("{} / {} / {}", key.0, key.1, key.2);
            return self.reject(row, RowIssue::Duplicate(label));
        }

        self.index.insert(key, self.records.len());
        self.records.push(record);
    }

    fn reject(&mut self, row: usize, issue: RowIssue) {
        warn!(row, %issue, "dropping rate row");
        self.diagnostics.push(RowDiagnostic { row, issue });
    }

    fn log_summary(&self) {
        info!(
            records = self.records.len(),
            dropped = self.diagnostics.len(),
            "rate table loaded"
        );
    }
}

fn validate(raw: RawRow) -> Result<RateRecord, RowIssue> {
    let region = required_name(raw.region, "region")?;
    let sub_region = required_name(raw.sub_region, "sub-region")?;
    let locality = required_name(raw.locality, "locality")?;
    let base_unit_price = parse_price(raw.base_unit_price.as_ref(), BASE_PRICE_FIELD)?;
    let excess_unit_price = parse_price(raw.excess_unit_price.as_ref(), EXCESS_PRICE_FIELD)?;

    Ok(RateRecord {
        region,
        sub_region,
        locality,
        base_unit_price,
        excess_unit_price,
    })
}

fn required_name(value: Option<String>, field: &'static str) -> Result<String, RowIssue> {
    value
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or(RowIssue::MissingField(field))
}

fn parse_price(value: Option<&Value>, field: &'static str) -> Result<f64, RowIssue> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(RowIssue::MissingPrice(field)),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(RowIssue::MissingPrice(field))
        }
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
        Some(price) if price.is_finite() => Err(RowIssue::NegativePrice {
            field,
            value: price,
        }),
        _ => Err(RowIssue::NonNumericPrice {
            field,
            value: value.map(Value::to_string).unwrap_or_default(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
