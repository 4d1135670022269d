use std::fmt;

use serde::{Deserialize, Serialize};

/// Sub-region name used for display when a row carries no sub-region.
pub const ALL_REGIONS_LABEL: &str = "All";

/// A sub-region column value. Rows without a sub-region are nation-wide
/// aggregates and carry `All`.
///
/// On the wire this is an optional string: `null` is `All`, anything else is
/// a named region, so a region literally called "All" stays distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum RegionSelector {
    #[default]
    All,
    Named(String),
}

impl RegionSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }

    pub fn label(&self) -> &str {
        self.name().unwrap_or(ALL_REGIONS_LABEL)
    }
}

impl From<Option<String>> for RegionSelector {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() => Self::Named(name),
            _ => Self::All,
        }
    }
}

impl From<RegionSelector> for Option<String> {
    fn from(value: RegionSelector) -> Self {
        match value {
            RegionSelector::All => None,
            RegionSelector::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nation(pub String);

impl Nation {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    RetailAndRecreation,
    GroceryAndPharmacy,
    Parks,
    TransitStations,
    Workplaces,
    Residential,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::RetailAndRecreation,
        Metric::GroceryAndPharmacy,
        Metric::Parks,
        Metric::TransitStations,
        Metric::Workplaces,
        Metric::Residential,
    ];

    /// Header of the source CSV column holding this metric.
    pub fn column(self) -> &'static str {
        match self {
            Metric::RetailAndRecreation => "retail_and_recreation_percent_change_from_baseline",
            Metric::GroceryAndPharmacy => "grocery_and_pharmacy_percent_change_from_baseline",
            Metric::Parks => "parks_percent_change_from_baseline",
            Metric::TransitStations => "transit_stations_percent_change_from_baseline",
            Metric::Workplaces => "workplaces_percent_change_from_baseline",
            Metric::Residential => "residential_percent_change_from_baseline",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::RetailAndRecreation => "Retail & Recreation",
            Metric::GroceryAndPharmacy => "Grocery & Pharmacy",
            Metric::Parks => "Parks",
            Metric::TransitStations => "Transit Stations",
            Metric::Workplaces => "Workplaces",
            Metric::Residential => "Residential",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Current state of the dashboard controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub region_1: RegionSelector,
    pub region_2: RegionSelector,
    pub rolling_average: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            region_1: RegionSelector::All,
            region_2: RegionSelector::All,
            rolling_average: true,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
