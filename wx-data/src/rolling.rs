//! Forward-looking smoothing of forecast series.

use chrono::TimeDelta;
use wx_core::{Observation, Parameter};

/// For every row, the mean of `parameter` over `[row.timestamp,
/// row.timestamp + 1 day]`, skipping NULLs. The output is aligned with
/// `rows`; an entry is `None` when its window holds no values.
///
/// `rows` must be in chronological order, as returned by the store.
pub fn forward_daily_mean(rows: &[Observation], parameter: Parameter) -> Vec<Option<f64>> {
    forward_mean(rows, parameter, TimeDelta::days(1))
}

pub fn forward_mean(rows: &[Observation], parameter: Parameter, span: TimeDelta) -> Vec<Option<f64>> {
    rows.iter()
        .map(|row| {
            let from = rows.partition_point(|r| r.timestamp < row.timestamp);
            let until = rows.partition_point(|r| r.timestamp <= row.timestamp + span);
            mean(rows[from..until].iter().filter_map(|r| r.get(parameter)))
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
