use crate::{JoinedRow, JoinedTable, Observation, RegionMapping};

/// Fills missing sub-regions with `All` and left-joins `mapping` on
/// sub_region_1. Every observation yields exactly one row, in input order.
///
/// The fill happens while converting to [`shared::domain::RegionSelector`],
/// so no missing sub-region can survive the join.
pub fn normalize(observations: Vec<Observation>, mapping: &RegionMapping) -> JoinedTable {
    let rows = observations
        .into_iter()
        .map(|observation| {
            let sub_region_1 = observation.sub_region_1.into();
            let nation = mapping.nation_for(&sub_region_1).cloned();
            JoinedRow {
                country_code: observation.country_code,
                country: observation.country,
                sub_region_1,
                sub_region_2: observation.sub_region_2.into(),
                nation,
                date: observation.date,
                metrics: observation.metrics,
            }
        })
        .collect();

    JoinedTable::new(rows)
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
