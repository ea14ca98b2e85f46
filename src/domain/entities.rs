use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the carrier's rate sheet, as emitted by the spreadsheet export.
///
/// Column headers follow the carrier's sheet; camelCase aliases are accepted
/// for hand-written fixtures. Nothing is validated here, see
/// [`RateTable::load`](super::rate_table::RateTable::load).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(
        rename = "Departamento",
        alias = "region",
        default,
        deserialize_with = "lenient_string"
    )]
    pub region: Option<String>,
    #[serde(
        rename = "Provincia",
        alias = "subRegion",
        default,
        deserialize_with = "lenient_string"
    )]
    pub sub_region: Option<String>,
    #[serde(
        rename = "Distrito",
        alias = "locality",
        default,
        deserialize_with = "lenient_string"
    )]
    pub locality: Option<String>,
    /// Price for the first kilo, tax inclusive. Kept raw: cells may be numbers or text.
    #[serde(
        rename = "Precio por envío de caja de 1 kilo (inc IGV)",
        alias = "baseUnitPrice",
        default
    )]
    pub base_unit_price: Option<serde_json::Value>,
    /// Price per whole kilo above the first, tax inclusive.
    #[serde(
        rename = "PRECIO KILO EXCESO INC IGV",
        alias = "excessUnitPrice",
        default
    )]
    pub excess_unit_price: Option<serde_json::Value>,
}

impl RawRow {
    #[cfg(test)]
    pub fn new(
        region: &str,
        sub_region: &str,
        locality: &str,
        base_unit_price: f64,
        excess_unit_price: f64,
    ) -> Self {
        Self {
            region: Some(region.to_string()),
            sub_region: Some(sub_region.to_string()),
            locality: Some(locality.to_string()),
            base_unit_price: Some(serde_json::json!(base_unit_price)),
            excess_unit_price: Some(serde_json::json!(excess_unit_price)),
        }
    }
}

/// A validated destination rate. Immutable once the table is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub region: String,
    pub sub_region: String,
    pub locality: String,
    pub base_unit_price: f64,
    pub excess_unit_price: f64,
}

/// Why a raw row did not make it into the table.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RowIssue {
    #[error("row is not an object: {0}")]
    Malformed(String),
    #[error("missing {0}")]
    MissingField(&'static str),
    #[error("missing {0}")]
    MissingPrice(&'static str),
    #[error("{field} is not numeric ({value})")]
    NonNumericPrice { field: &'static str, value: String },
    #[error("{field} is negative ({value})")]
    NegativePrice { field: &'static str, value: f64 },
    #[error("duplicate destination {0}")]
    Duplicate(String),
}

/// A dropped row, indexed by its position in the source payload.
#[derive(Clone, Debug, PartialEq)]
pub struct RowDiagnostic {
    pub row: usize,
    pub issue: RowIssue,
}

/// How the raw billable weight is turned into chargeable weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingPolicy {
    /// Below half a kilo rounds down, half a kilo or more rounds up.
    #[default]
    HalfKg,
    /// Fractional weight is billed as-is.
    Exact,
}

impl RoundingPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            RoundingPolicy::HalfKg => "Nearest kg (half up)",
            RoundingPolicy::Exact => "Exact weight",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuoteInput {
    pub physical_weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub declared_value: f64,
}

impl QuoteInput {
    pub fn new(physical_weight_kg: f64) -> Self {
        Self {
            physical_weight_kg,
            ..Self::default()
        }
    }

    pub fn with_dimensions(mut self, length_cm: f64, width_cm: f64, height_cm: f64) -> Self {
        self.length_cm = length_cm;
        self.width_cm = width_cm;
        self.height_cm = height_cm;
        self
    }

    pub fn with_declared_value(mut self, declared_value: f64) -> Self {
        self.declared_value = declared_value;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuoteResult {
    pub volumetric_weight_kg: f64,
    pub chargeable_weight_kg: f64,
    /// First-kilo charge.
    pub base_charge: f64,
    /// Charge for the weight above the first kilo.
    pub excess_charge: f64,
    /// `base_charge + excess_charge`
    pub shipping_cost: f64,
    pub insurance_cost: f64,
    pub total_cost: f64,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn raw_row_reads_sheet_headers() {
        let row: RawRow = serde_json::from_value(json!({
            "Departamento": " LIMA ",
            "Provincia": "LIMA",
            "Distrito": "MIRAFLORES",
            "Precio por envío de caja de 1 kilo (inc IGV)": 10,
            "PRECIO KILO EXCESO INC IGV": "4.5"
        }))
        .unwrap();

        assert_eq!(row.region.as_deref(), Some(" LIMA "));
        assert_eq!(row.locality.as_deref(), Some("MIRAFLORES"));
        assert_eq!(row.base_unit_price, Some(json!(10)));
        assert_eq!(row.excess_unit_price, Some(json!("4.5")));
    }

    #[test]
    fn raw_row_accepts_camel_case_aliases_and_numeric_names() {
        let row: RawRow = serde_json::from_value(json!({
            "region": "CUSCO",
            "subRegion": 101,
            "locality": null,
            "baseUnitPrice": 12.5
        }))
        .unwrap();

        assert_eq!(row.region.as_deref(), Some("CUSCO"));
        assert_eq!(row.sub_region.as_deref(), Some("101"));
        assert_eq!(row.locality, None);
        assert_eq!(row.excess_unit_price, None);
    }

    #[test]
    fn quote_input_builder_defaults_to_zero() {
        let input = QuoteInput::new(2.0).with_declared_value(300.0);
        assert_eq!(input.length_cm, 0.0);
        assert_eq!(input.height_cm, 0.0);
        assert_eq!(input.declared_value, 300.0);
    }
}
