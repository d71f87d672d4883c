use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::records::BucketedRecord;

/// Category that collects every tag no other category claims
pub const OTHER_AREAS: &str = "Other Areas";

/// Suffix of the synthetic tag meaning "every floor of this building"
pub const ALL_FLOORS_SUFFIX: &str = " All floors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaMatcher {
    /// Any tag starting with the building name, e.g. "MCML Level 2"
    Prefix(String),
    /// A fixed site name, e.g. "UBC Farm"
    Exact(String),
}

impl AreaMatcher {
    pub fn matches(&self, area: &str) -> bool {
        match self {
            AreaMatcher::Prefix(prefix) => area.starts_with(prefix.as_str()),
            AreaMatcher::Exact(name) => area == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingCategory {
    pub name: String,
    pub matcher: AreaMatcher,
}

impl BuildingCategory {
    pub fn prefix(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: AreaMatcher::Prefix(name.to_string()),
        }
    }

    pub fn exact(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: AreaMatcher::Exact(name.to_string()),
        }
    }
}

/// The buildings and sites occupancy is reported against, in display order,
/// plus the per-floor capacity from the safety plan.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingCatalog {
    pub categories: Vec<BuildingCategory>,
    pub floor_capacity: Vec<(String, Option<u32>)>,
}

impl Default for BuildingCatalog {
    fn default() -> Self {
        Self {
            categories: vec![
                BuildingCategory::prefix("FNH"),
                BuildingCategory::prefix("MCML"),
                BuildingCategory::exact("UBC Farm"),
                BuildingCategory::exact("Totem Field"),
                BuildingCategory::exact("Horticulture Greenhouse"),
                BuildingCategory::exact("South Campus Greenhouse"),
            ],
            floor_capacity: vec![
                ("MCML Basement".to_string(), Some(3)),
                ("MCML Level 1".to_string(), Some(57)),
                ("MCML Level 2".to_string(), Some(22)),
                ("MCML Level 3".to_string(), Some(34)),
                ("FNH Basement".to_string(), None),
                ("FNH Level 1".to_string(), Some(29)),
                ("FNH Level 2".to_string(), Some(42)),
                ("FNH Level 3".to_string(), Some(38)),
                ("UBC Farm".to_string(), None),
                ("Totem Field".to_string(), None),
                ("Horticulture Greenhouse".to_string(), None),
                ("South Campus Greenhouse".to_string(), None),
            ],
        }
    }
}

impl BuildingCatalog {
    /// A tally with every category (and "Other Areas") at zero
    pub fn empty_tally(&self) -> BuildingTally {
        let mut counts: Vec<(String, usize)> =
            self.categories.iter().map(|c| (c.name.clone(), 0)).collect();
        counts.push((OTHER_AREAS.to_string(), 0));
        BuildingTally { counts }
    }

    /// Count records per building category.
    ///
    /// Each category is incremented at most once per record no matter how
    /// many of its tags match. A record spanning several buildings counts
    /// once in each. "Other Areas" counts records with at least one tag that
    /// no category claims; a record without tags counts nowhere.
    pub fn tally<'a, I>(&self, records: I) -> BuildingTally
    where
        I: IntoIterator<Item = &'a BucketedRecord>,
    {
        let mut tally = self.empty_tally();
        let other_slot = self.categories.len();

        for record in records {
            for (slot, category) in self.categories.iter().enumerate() {
                if record.areas.iter().any(|area| category.matcher.matches(area)) {
                    tally.counts[slot].1 += 1;
                }
            }

            let unclaimed = record
                .areas
                .iter()
                .any(|area| !self.categories.iter().any(|c| c.matcher.matches(area)));
            if unclaimed {
                tally.counts[other_slot].1 += 1;
            }
        }

        tally
    }

    pub fn max_occupancy(&self) -> BTreeMap<String, Option<u32>> {
        self.floor_capacity.iter().cloned().collect()
    }
}

/// Per-building counts in catalog order, "Other Areas" last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingTally {
    counts: Vec<(String, usize)>,
}

impl BuildingTally {
    pub fn get(&self, name: &str) -> usize {
        self.counts
            .iter()
            .find(|(building, _)| building == name)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for BuildingTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, count) in &self.counts {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// One increment per tag per record; tags are not deduplicated within a record
pub fn build_check_in_by_area(records: &[BucketedRecord]) -> BTreeMap<String, usize> {
    let mut by_area = BTreeMap::new();
    for record in records {
        for area in &record.areas {
            *by_area.entry(area.clone()).or_insert(0) += 1;
        }
    }
    fold_all_floors(&mut by_area);
    by_area
}

/// Fold each "<Building> All floors" tag into the building's own tags.
///
/// The aggregate count is added to every tag starting with the building name
/// and the aggregate tag itself is removed.
pub fn fold_all_floors(by_area: &mut BTreeMap<String, usize>) {
    let aggregates: Vec<String> = by_area
        .keys()
        .filter(|tag| tag.len() > ALL_FLOORS_SUFFIX.len() && tag.ends_with(ALL_FLOORS_SUFFIX))
        .cloned()
        .collect();

    for aggregate in aggregates {
        let Some(floor_count) = by_area.remove(&aggregate) else {
            continue;
        };
        let building = &aggregate[..aggregate.len() - ALL_FLOORS_SUFFIX.len()];
        for (area, count) in by_area.iter_mut() {
            if area.starts_with(building) {
                *count += floor_count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bucketed(areas: &[&str]) -> BucketedRecord {
        BucketedRecord {
            first_name: None,
            last_name: None,
            time: "2021-01-10T09:00".to_string(),
            areas: areas.iter().map(|a| a.to_string()).collect(),
            comments: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn empty_records_give_all_zero_tally() {
        let catalog = BuildingCatalog::default();
        let tally = catalog.tally(&[]);
        assert_eq!(tally.total(), 0);
        assert_eq!(tally.get(OTHER_AREAS), 0);
        assert_eq!(tally.iter().count(), 7);
    }

    #[test]
    fn record_spanning_buildings_counts_once_in_each() {
        let catalog = BuildingCatalog::default();
        let records = vec![bucketed(&["MCML Level 2", "FNH Level 1"])];
        let tally = catalog.tally(&records);
        assert_eq!(tally.get("MCML"), 1);
        assert_eq!(tally.get("FNH"), 1);
        assert_eq!(tally.get(OTHER_AREAS), 0);
    }

    #[test]
    fn several_floors_of_one_building_count_once() {
        let catalog = BuildingCatalog::default();
        let records = vec![bucketed(&["MCML Level 1", "MCML Level 2", "MCML Basement"])];
        assert_eq!(catalog.tally(&records).get("MCML"), 1);
    }

    #[test]
    fn unknown_tag_counts_as_other_areas() {
        let catalog = BuildingCatalog::default();
        let records = vec![
            bucketed(&["UBC Farm", "Forestry Sciences Centre"]),
            bucketed(&["Totem Field"]),
            bucketed(&[]),
        ];
        let tally = catalog.tally(&records);
        assert_eq!(tally.get("UBC Farm"), 1);
        assert_eq!(tally.get("Totem Field"), 1);
        assert_eq!(tally.get(OTHER_AREAS), 1);
    }

    #[test]
    fn tally_serializes_in_catalog_order() {
        let catalog = BuildingCatalog::default();
        let json = serde_json::to_string(&catalog.tally(&[bucketed(&["FNH Level 3"])])).unwrap();
        assert_eq!(
            json,
            r#"{"FNH":1,"MCML":0,"UBC Farm":0,"Totem Field":0,"Horticulture Greenhouse":0,"South Campus Greenhouse":0,"Other Areas":0}"#
        );
    }

    #[test]
    fn area_tally_does_not_dedupe_within_record() {
        let records = vec![bucketed(&["UBC Farm", "UBC Farm"]), bucketed(&["UBC Farm"])];
        assert_eq!(build_check_in_by_area(&records)["UBC Farm"], 3);
    }

    #[test]
    fn all_floors_folds_into_building_tags() {
        let records = vec![
            bucketed(&["MCML Level 1"]),
            bucketed(&["MCML Level 2", "FNH Level 1"]),
            bucketed(&["MCML All floors"]),
            bucketed(&["MCML All floors"]),
        ];
        let by_area = build_check_in_by_area(&records);
        assert_eq!(by_area.get("MCML All floors"), None);
        assert_eq!(by_area["MCML Level 1"], 3);
        assert_eq!(by_area["MCML Level 2"], 3);
        assert_eq!(by_area["FNH Level 1"], 1);
    }

    #[test]
    fn fold_adds_exactly_the_aggregate_to_each_prefixed_tag() {
        let mut by_area: BTreeMap<String, usize> = [
            ("FNH All floors", 4),
            ("FNH Level 1", 2),
            ("FNH Basement", 0),
            ("MCML Level 3", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        fold_all_floors(&mut by_area);

        assert_eq!(by_area.len(), 3);
        assert_eq!(by_area["FNH Level 1"], 6);
        assert_eq!(by_area["FNH Basement"], 4);
        assert_eq!(by_area["MCML Level 3"], 5);
    }
}
