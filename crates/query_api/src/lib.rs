use std::{collections::HashSet, hash::Hash};

use dataset::{JoinedRow, JoinedTable};
use shared::{
    domain::{Metric, Nation, RegionSelector, Selection},
    protocol::{RegionOption, Series, SeriesPoint, SeriesResponse},
};
use tracing::debug;

pub mod smoothing;

use smoothing::{trailing_mean, ROLLING_WINDOW};

/// Everything the dashboard queries read, built once at startup.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub table: JoinedTable,
    pub country_name: String,
}

impl DashboardContext {
    pub fn new(table: JoinedTable, country_name: impl Into<String>) -> Self {
        Self {
            table,
            country_name: country_name.into(),
        }
    }
}

// Keeps the first occurrence of each value.
fn distinct<T: Eq + Hash + Copy>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).collect()
}

/// Options for the first dropdown, in order of first appearance.
pub fn region_1_options(ctx: &DashboardContext) -> Vec<RegionOption> {
    distinct(ctx.table.rows().iter().map(|row| &row.sub_region_1))
        .into_iter()
        .cloned()
        .map(RegionOption::from)
        .collect()
}

/// Options for the second dropdown: the sub_region_2 values that occur under
/// `region_1`.
pub fn region_2_options(ctx: &DashboardContext, region_1: &RegionSelector) -> Vec<RegionOption> {
    distinct(
        ctx.table
            .rows()
            .iter()
            .filter(|row| &row.sub_region_1 == region_1)
            .map(|row| &row.sub_region_2),
    )
    .into_iter()
    .cloned()
    .map(RegionOption::from)
    .collect()
}

pub fn nation_options(ctx: &DashboardContext) -> Vec<Nation> {
    distinct(ctx.table.rows().iter().filter_map(|row| row.nation.as_ref()))
        .into_iter()
        .cloned()
        .collect()
}

pub fn title_for(ctx: &DashboardContext, region_1: &RegionSelector) -> String {
    let place = match region_1 {
        RegionSelector::All => ctx.country_name.as_str(),
        RegionSelector::Named(name) => name.as_str(),
    };
    format!("Google Movement Data for {place}")
}

/// Builds the six chart series for `selection`.
///
/// Rows are used in table order; the table is expected to be chronological
/// within each region. A selection with no rows yields six empty series.
pub fn query(ctx: &DashboardContext, selection: &Selection) -> SeriesResponse {
    let rows: Vec<&JoinedRow> = ctx
        .table
        .rows()
        .iter()
        .filter(|row| row.matches(&selection.region_1, &selection.region_2))
        .collect();
    debug!(
        region_1 = %selection.region_1,
        region_2 = %selection.region_2,
        rolling_average = selection.rolling_average,
        rows = rows.len(),
        "series query"
    );

    let series = Metric::ALL
        .into_iter()
        .map(|metric| metric_series(&rows, metric, selection.rolling_average))
        .collect();

    SeriesResponse {
        title: title_for(ctx, &selection.region_1),
        series,
    }
}

fn metric_series(rows: &[&JoinedRow], metric: Metric, rolling_average: bool) -> Series {
    let raw: Vec<Option<f64>> = rows.iter().map(|row| row.metrics.get(metric)).collect();
    let values = if rolling_average {
        trailing_mean(&raw, ROLLING_WINDOW)
    } else {
        raw
    };

    Series {
        metric,
        name: metric.label().to_string(),
        points: rows
            .iter()
            .zip(values)
            .map(|(row, value)| SeriesPoint {
                date: row.date,
                value,
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
