use std::{sync::Arc, time::SystemTime};

use serde::{Deserialize, Serialize};

use super::{
    entities::{QuoteInput, QuoteResult, RoundingPolicy},
    quote::QuoteEngine,
    rate_table::RateTable,
    selection::LocationSelection,
};

/// Where rates come from when nothing else is configured: the spreadsheet endpoint.
pub const DEFAULT_RATE_SOURCE: &str = "http://localhost:3000/api/readExcel";

/// User-tunable settings, persisted between sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    pub rounding: RoundingPolicy,
    /// URL of the rate endpoint or path to a JSON export of the sheet.
    pub rate_source: String,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            rounding: RoundingPolicy::default(),
            rate_source: DEFAULT_RATE_SOURCE.to_string(),
        }
    }
}

/// Raw text of the quote inputs as typed by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteForm {
    pub weight: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub declared_value: String,
}

impl Default for QuoteForm {
    fn default() -> Self {
        Self {
            weight: "1".to_string(),
            length: String::new(),
            width: String::new(),
            height: String::new(),
            declared_value: String::new(),
        }
    }
}

impl QuoteForm {
    /// `None` until the weight parses; blank or unparsable optional fields count as zero.
    pub fn to_input(&self) -> Option<QuoteInput> {
        let weight = parse_number(&self.weight)?;
        Some(
            QuoteInput::new(weight)
                .with_dimensions(
                    parse_number(&self.length).unwrap_or_default(),
                    parse_number(&self.width).unwrap_or_default(),
                    parse_number(&self.height).unwrap_or_default(),
                )
                .with_declared_value(parse_number(&self.declared_value).unwrap_or_default()),
        )
    }
}

/// Accepts a decimal comma, as typed on Spanish keyboards.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Clone, Debug, PartialEq)]
pub struct RatesStatus {
    /// Where the table was loaded from.
    pub origin: String,
    pub fetched_at: SystemTime,
    /// Served from the local snapshot rather than the source.
    pub from_snapshot: bool,
    /// Snapshot used because the source could not be reached.
    pub stale: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub rates: Option<Arc<RateTable>>,
    pub rates_status: Option<RatesStatus>,
    pub selection: LocationSelection,
    pub form: QuoteForm,
    pub settings: QuoteSettings,
}

impl AppState {
    /// Swaps in a freshly loaded table, dropping selection levels it no longer has.
    pub fn install_rates(&mut self, table: RateTable, status: RatesStatus) {
        self.selection.retain_valid(&table);
        self.rates = Some(Arc::new(table));
        self.rates_status = Some(status);
    }

    pub fn engine(&self) -> QuoteEngine {
        QuoteEngine::new(self.settings.rounding)
    }

    pub fn quote(&self) -> Option<QuoteResult> {
        let table = self.rates.as_deref()?;
        let input = self.form.to_input()?;
        self.engine().compute(self.selection.resolve(table), &input)
    }

    pub fn apply_persisted(&mut self, persisted: PersistedState) {
        self.settings = persisted.settings;
        self.selection = persisted.selection;
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            settings: self.settings.clone(),
            selection: self.selection.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub settings: QuoteSettings,
    #[serde(default)]
    pub selection: LocationSelection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RawRow;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn loaded_state() -> AppState {
        let mut state = AppState::default();
        state.install_rates(
            RateTable::from_rows(vec![RawRow::new("LIMA", "LIMA", "SURCO", 10.0, 4.0)]),
            RatesStatus {
                origin: "fixture".to_string(),
                fetched_at: SystemTime::now(),
                from_snapshot: false,
                stale: false,
            },
        );
        state
    }

    #[rstest]
    #[case("2.5", Some(2.5))]
    #[case(" 2,5 ", Some(2.5))]
    #[case("", None)]
    #[case("abc", None)]
    #[case("inf", None)]
    fn parse_number_cases(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_number(raw), expected);
    }

    #[test]
    fn form_defaults_optional_fields_to_zero() {
        let form = QuoteForm {
            weight: "3".to_string(),
            length: "x".to_string(),
            declared_value: "250".to_string(),
            ..QuoteForm::default()
        };
        assert_eq!(
            form.to_input(),
            Some(QuoteInput::new(3.0).with_declared_value(250.0))
        );
    }

    #[test]
    fn form_without_weight_has_no_input() {
        let form = QuoteForm {
            weight: String::new(),
            ..QuoteForm::default()
        };
        assert_eq!(form.to_input(), None);
    }

    #[test]
    fn quote_waits_for_full_selection() {
        let mut state = loaded_state();
        state.form.weight = "3".to_string();
        assert_eq!(state.quote(), None);

        state.selection.set_region("LIMA");
        state.selection.set_sub_region("LIMA");
        state.selection.set_locality("SURCO");
        let quote = state.quote().unwrap();
        assert_eq!(quote.shipping_cost, 18.0);
    }

    #[test]
    fn quote_follows_rounding_setting() {
        let mut state = loaded_state();
        state.selection.set_region("LIMA");
        state.selection.set_sub_region("LIMA");
        state.selection.set_locality("SURCO");
        state.form.weight = "2.25".to_string();

        assert_eq!(state.quote().unwrap().chargeable_weight_kg, 2.0);
        state.settings.rounding = RoundingPolicy::Exact;
        assert_eq!(state.quote().unwrap().chargeable_weight_kg, 2.25);
    }

    #[test]
    fn persisted_state_round_trips_settings_and_selection() {
        let mut state = loaded_state();
        state.settings.rounding = RoundingPolicy::Exact;
        state.selection.set_region("LIMA");

        let mut restored = AppState::default();
        restored.apply_persisted(state.to_persisted());
        assert_eq!(restored.settings, state.settings);
        assert_eq!(restored.selection, state.selection);
    }

    #[test]
    fn persisted_state_tolerates_missing_fields() {
        let persisted: PersistedState = serde_json::from_str("{}").unwrap();
        assert_eq!(persisted.settings.rate_source, DEFAULT_RATE_SOURCE);
        assert_eq!(persisted.settings.rounding, RoundingPolicy::HalfKg);
    }
}
