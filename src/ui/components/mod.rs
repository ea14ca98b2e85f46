pub mod kpi_card;
pub mod location_select;
pub mod toast;
