//! Rate lookup and quote pricing live here.

pub mod app_state;
pub mod entities;
pub mod quote;
pub mod rate_table;
pub mod selection;

pub use app_state::{AppState, PersistedState, RatesStatus, DEFAULT_RATE_SOURCE};
pub use entities::{QuoteInput, QuoteResult, RateRecord, RoundingPolicy};
pub use quote::{chargeable_weight, insurance_cost, shipping_cost, volumetric_weight};
pub use rate_table::{LoadError, RateTable};
