use serde::{Deserialize, Serialize};

use super::{entities::RateRecord, rate_table::RateTable};

/// Department / province / district picked in the quote form.
///
/// Changing a level clears every level below it; the option lists are always
/// re-queried from the current [`RateTable`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelection {
    pub region: Option<String>,
    pub sub_region: Option<String>,
    pub locality: Option<String>,
}

impl LocationSelection {
    pub fn set_region(&mut self, region: impl Into<String>) {
        self.region = non_blank(region.into());
        self.sub_region = None;
        self.locality = None;
    }

    pub fn set_sub_region(&mut self, sub_region: impl Into<String>) {
        self.sub_region = self.region.as_ref().and(non_blank(sub_region.into()));
        self.locality = None;
    }

    pub fn set_locality(&mut self, locality: impl Into<String>) {
        self.locality = self.sub_region.as_ref().and(non_blank(locality.into()));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_complete(&self) -> bool {
        self.region.is_some() && self.sub_region.is_some() && self.locality.is_some()
    }

    pub fn region_options(&self, table: &RateTable) -> Vec<String> {
        table.regions()
    }

    pub fn sub_region_options(&self, table: &RateTable) -> Vec<String> {
        match &self.region {
            Some(region) => table.sub_regions(region),
            None => Vec::new(),
        }
    }

    pub fn locality_options(&self, table: &RateTable) -> Vec<String> {
        match (&self.region, &self.sub_region) {
            (Some(region), Some(sub_region)) => table.localities(region, sub_region),
            _ => Vec::new(),
        }
    }

    pub fn resolve<'t>(&self, table: &'t RateTable) -> Option<&'t RateRecord> {
        table.resolve(
            self.region.as_deref()?,
            self.sub_region.as_deref()?,
            self.locality.as_deref()?,
        )
    }

    /// Drops levels that no longer exist after a rate reload.
    pub fn retain_valid(&mut self, table: &RateTable) {
        let region_known = self
            .region
            .as_ref()
            .is_some_and(|region| table.regions().contains(region));
        if !region_known {
            self.clear();
            return;
        }

        let sub_region_known = self
            .sub_region
            .as_ref()
            .is_some_and(|sub_region| self.sub_region_options(table).contains(sub_region));
        if !sub_region_known {
            self.sub_region = None;
            self.locality = None;
            return;
        }

        let locality_known = self
            .locality
            .as_ref()
            .is_some_and(|locality| self.locality_options(table).contains(locality));
        if !locality_known {
            self.locality = None;
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RawRow;
    use pretty_assertions::assert_eq;

    fn table() -> RateTable {
        RateTable::from_rows(vec![
            RawRow::new("LIMA", "LIMA", "SURCO", 9.5, 2.0),
            RawRow::new("LIMA", "HUAURA", "HUACHO", 14.0, 3.5),
            RawRow::new("CUSCO", "CUSCO", "WANCHAQ", 20.0, 5.0),
        ])
    }

    fn full_selection() -> LocationSelection {
        let mut selection = LocationSelection::default();
        selection.set_region("LIMA");
        selection.set_sub_region("LIMA");
        selection.set_locality("SURCO");
        selection
    }

    #[test]
    fn complete_selection_resolves() {
        let table = table();
        let selection = full_selection();
        assert!(selection.is_complete());
        assert_eq!(selection.resolve(&table).unwrap().base_unit_price, 9.5);
    }

    #[test]
    fn changing_region_clears_lower_levels() {
        let mut selection = full_selection();
        selection.set_region("CUSCO");
        assert_eq!(
            selection,
            LocationSelection {
                region: Some("CUSCO".to_string()),
                sub_region: None,
                locality: None,
            }
        );
    }

    #[test]
    fn changing_sub_region_clears_locality() {
        let table = table();
        let mut selection = full_selection();
        selection.set_sub_region("HUAURA");
        assert_eq!(selection.locality, None);
        assert_eq!(selection.locality_options(&table), vec!["HUACHO"]);
        assert_eq!(selection.resolve(&table), None);
    }

    #[test]
    fn lower_levels_need_a_parent() {
        let mut selection = LocationSelection::default();
        selection.set_sub_region("LIMA");
        selection.set_locality("SURCO");
        assert_eq!(selection, LocationSelection::default());
    }

    #[test]
    fn blank_choice_resets_level() {
        let mut selection = full_selection();
        selection.set_region("");
        assert_eq!(selection, LocationSelection::default());
    }

    #[test]
    fn options_follow_selection() {
        let table = table();
        let mut selection = LocationSelection::default();
        assert_eq!(selection.region_options(&table), vec!["CUSCO", "LIMA"]);
        assert!(selection.sub_region_options(&table).is_empty());

        selection.set_region("LIMA");
        assert_eq!(selection.sub_region_options(&table), vec!["HUAURA", "LIMA"]);
        assert!(selection.locality_options(&table).is_empty());
    }

    #[test]
    fn retain_valid_trims_unknown_levels() {
        let reloaded = RateTable::from_rows(vec![RawRow::new("LIMA", "LIMA", "LINCE", 9.5, 2.0)]);

        let mut selection = full_selection();
        selection.retain_valid(&reloaded);
        assert_eq!(selection.region.as_deref(), Some("LIMA"));
        assert_eq!(selection.sub_region.as_deref(), Some("LIMA"));
        assert_eq!(selection.locality, None);

        let mut gone = full_selection();
        gone.retain_valid(&RateTable::default());
        assert_eq!(gone, LocationSelection::default());
    }
}
