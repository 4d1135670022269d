use std::time::Instant;

use chrono::NaiveDate;
use shared::domain::{Metric, Nation, RegionSelector};
use tracing::{info, warn};

pub mod error;
pub mod loader;
pub mod mapping;
mod normalize;

pub use error::{DatasetError, ParseError};
pub use loader::{load, LoaderConfig, RawTable};
pub use mapping::RegionMapping;
pub use normalize::normalize;

/// The six percent-change-from-baseline readings of one row, indexed by
/// [`Metric::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues([Option<f64>; 6]);

impl MetricValues {
    pub fn new(values: [Option<f64>; 6]) -> Self {
        Self(values)
    }

    pub fn uniform(value: f64) -> Self {
        Self([Some(value); 6])
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }
}

/// A mobility row as read from disk, before sub-region normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country_code: String,
    pub country: Option<String>,
    pub sub_region_1: Option<String>,
    pub sub_region_2: Option<String>,
    pub date: NaiveDate,
    pub metrics: MetricValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub country_code: String,
    pub country: Option<String>,
    pub sub_region_1: RegionSelector,
    pub sub_region_2: RegionSelector,
    pub nation: Option<Nation>,
    pub date: NaiveDate,
    pub metrics: MetricValues,
}

impl JoinedRow {
    pub fn matches(&self, region_1: &RegionSelector, region_2: &RegionSelector) -> bool {
        &self.sub_region_1 == region_1 && &self.sub_region_2 == region_2
    }
}

/// Observation rows with sub-regions filled and nations attached, in source
/// row order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedTable {
    rows: Vec<JoinedRow>,
}

impl JoinedTable {
    pub fn new(rows: Vec<JoinedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct named sub_region_1 values that found no nation, in first-seen order.
    pub fn unmapped_regions(&self) -> Vec<&str> {
        let mut unmapped: Vec<&str> = Vec::new();
        for row in &self.rows {
            if row.nation.is_some() {
                continue;
            }
            if let Some(name) = row.sub_region_1.name() {
                if !unmapped.contains(&name) {
                    unmapped.push(name);
                }
            }
        }
        unmapped
    }
}

/// Loads the observations and the region mapping, then joins them.
pub async fn build_table(config: &LoaderConfig, refresh: bool) -> Result<JoinedTable, DatasetError> {
    let observations = load(config, refresh).await?;

    let started = Instant::now();
    let mapping_path = config.mapping_path.clone();
    let mapping = tokio::task::spawn_blocking(move || RegionMapping::load(&mapping_path)).await??;
    let table = normalize(observations, &mapping);
    info!(
        rows = table.len(),
        mapping_entries = mapping.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "joined region mapping"
    );

    let unmapped = table.unmapped_regions();
    if !unmapped.is_empty() {
        warn!(
            count = unmapped.len(),
            regions = ?unmapped,
            "sub-regions without a nation mapping"
        );
    }

    Ok(table)
}
