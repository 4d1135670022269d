/// Rows averaged by the dashboard's rolling-average toggle.
pub const ROLLING_WINDOW: usize = 7;

/// Trailing mean over `window` rows ending at each position.
///
/// Positions with fewer than `window` rows of history are `None`, as is any
/// window containing a missing value.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|end| {
            if end + 1 < window {
                return None;
            }
            let slice = &values[end + 1 - window..=end];
            let sum = slice.iter().copied().sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/smoothing_tests.rs"]
mod tests;
