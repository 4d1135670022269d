use std::{collections::HashMap, io, path::Path};

use serde::Deserialize;
use shared::domain::{Nation, RegionSelector};
use tracing::warn;

use crate::error::DatasetError;

#[derive(Debug, Deserialize)]
struct MappingRow {
    sub_region_1: String,
    #[serde(rename = "Nation")]
    nation: String,
}

/// Lookup from a sub_region_1 name to the nation it belongs to.
#[derive(Debug, Clone, Default)]
pub struct RegionMapping {
    nations: HashMap<String, Nation>,
}

impl RegionMapping {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let unavailable = |source: csv::Error| DatasetError::MappingUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(|error| unavailable(error.into()))?;
        Self::from_reader(io::BufReader::new(file)).map_err(unavailable)
    }

    pub fn from_reader<R: io::Read>(source: R) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_reader(source);
        let mut mapping = Self::default();
        for result in reader.deserialize::<MappingRow>() {
            let row = result?;
            mapping.insert(row.sub_region_1, row.nation);
        }
        Ok(mapping)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut mapping = Self::default();
        for (region, nation) in pairs {
            mapping.insert(region.into(), nation.into());
        }
        mapping
    }

    // First entry wins so the join never multiplies observation rows.
    fn insert(&mut self, region: String, nation: String) {
        let region = region.trim().to_string();
        let nation = nation.trim().to_string();
        if region.is_empty() || nation.is_empty() {
            return;
        }
        if let Some(existing) = self.nations.get(&region) {
            warn!(%region, kept = %existing, ignored = %nation, "duplicate region mapping entry");
            return;
        }
        self.nations.insert(region, Nation(nation));
    }

    pub fn nation_for(&self, region: &RegionSelector) -> Option<&Nation> {
        region.name().and_then(|name| self.nations.get(name))
    }

    pub fn len(&self) -> usize {
        self.nations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nations.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/mapping_tests.rs"]
mod tests;
