//! Harvest forecast from a precomputed temperature grid.
//!
//! The grid maps (days to harvest, target weight in grams) to the mean
//! temperature under which a fruit reaches that weight in that many days.
//! A lookup runs the mapping backwards: given a mean temperature and a
//! target weight, find the day count whose grid temperature is nearest.

use crate::rolling;
use npyz::{DType, NpyFile, Order};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use wx_core::{Observation, Parameter, Result, WxError};

/// First day on the grid's day axis.
pub const FIRST_DAY: u32 = 200;
/// Last day on the grid's day axis.
pub const LAST_DAY: u32 = 600;
/// First weight (grams) on the grid's weight axis.
pub const FIRST_WEIGHT: u32 = 200;
/// Last weight (grams) on the grid's weight axis.
pub const LAST_WEIGHT: u32 = 500;

/// Immutable temperature grid, stored row-major as `[day][weight]` with
/// NaN marking empty cells.
#[derive(Debug, Clone)]
pub struct HarvestGrid {
    first_day: u32,
    first_weight: u32,
    days: usize,
    weights: usize,
    cells: Vec<f64>,
    min_temp: f64,
    max_temp: f64,
}

/// Which side of the grid's range the lookup temperature fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clamp {
    /// Colder than the grid resolves: harvest takes longer than shown.
    Low,
    Within,
    /// Warmer than the grid resolves: harvest comes sooner than shown.
    High,
}

impl Clamp {
    pub fn prefix(&self) -> &'static str {
        match self {
            Clamp::Low => ">",
            Clamp::Within => "",
            Clamp::High => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarvestEstimate {
    pub clamp: Clamp,
    pub days: u32,
}

impl fmt::Display for HarvestEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.clamp.prefix(), self.days)
    }
}

/// One point of the trailing estimate series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestPoint {
    pub timestamp: String,
    pub mean_temp: Option<f64>,
    pub estimate: Option<HarvestEstimate>,
}

impl HarvestGrid {
    /// Build a grid from row-major cells. Fails when the cell count does
    /// not match the axes or no cell holds a value.
    pub fn new(
        first_day: u32,
        first_weight: u32,
        days: usize,
        weights: usize,
        cells: Vec<f64>,
    ) -> Result<Self> {
        if days.checked_mul(weights) != Some(cells.len()) {
            return Err(WxError::Grid(format!(
                "expected {}x{} cells, got {}",
                days,
                weights,
                cells.len()
            )));
        }
        let (min_temp, max_temp) = cells
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        if min_temp > max_temp {
            return Err(WxError::Grid("grid holds no values".to_string()));
        }
        Ok(HarvestGrid {
            first_day,
            first_weight,
            days,
            weights,
            cells,
            min_temp,
            max_temp,
        })
    }

    /// Parse a NumPy `.npy` file holding the standard grid: shape
    /// `(401, 301)`, C order, little-endian `f8` or `f4`.
    pub fn from_npy(bytes: &[u8]) -> Result<Self> {
        let (shape, cells) = read_npy(bytes)?;
        let expected = [
            (LAST_DAY - FIRST_DAY + 1) as u64,
            (LAST_WEIGHT - FIRST_WEIGHT + 1) as u64,
        ];
        if shape != expected {
            return Err(WxError::Grid(format!(
                "unexpected grid shape {:?}, want {:?}",
                shape, expected
            )));
        }
        HarvestGrid::new(
            FIRST_DAY,
            FIRST_WEIGHT,
            expected[0] as usize,
            expected[1] as usize,
            cells,
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let grid = HarvestGrid::from_npy(&bytes)?;
        log::info!(
            "harvest grid loaded from {}: {:.1}..{:.1} degC",
            path.as_ref().display(),
            grid.min_temp,
            grid.max_temp
        );
        Ok(grid)
    }

    pub fn min_temp(&self) -> f64 {
        self.min_temp
    }

    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    pub fn weight_axis(&self) -> std::ops::RangeInclusive<u32> {
        self.first_weight..=self.first_weight + self.weights as u32 - 1
    }

    /// Grid temperature at (`day`, `weight`), `None` off the axes or for
    /// an empty cell.
    pub fn temperature(&self, day: u32, weight: u32) -> Option<f64> {
        let d = self.day_index(day)?;
        let w = self.weight_index(weight)?;
        let v = self.cells[d * self.weights + w];
        (!v.is_nan()).then_some(v)
    }

    /// Day count whose grid temperature in the `target_weight` column is
    /// nearest to `mean_temp`, after clamping `mean_temp` into the grid's
    /// range. Ties go to the fewest days. `None` when the weight is off
    /// the axis, its column is empty, or `mean_temp` is NaN.
    pub fn estimate(&self, mean_temp: f64, target_weight: u32) -> Option<HarvestEstimate> {
        if mean_temp.is_nan() {
            return None;
        }
        let (clamp, temp) = if mean_temp < self.min_temp {
            (Clamp::Low, self.min_temp)
        } else if mean_temp > self.max_temp {
            (Clamp::High, self.max_temp)
        } else {
            (Clamp::Within, mean_temp)
        };
        let w = self.weight_index(target_weight)?;

        let mut best: Option<(usize, f64)> = None;
        for d in 0..self.days {
            let v = self.cells[d * self.weights + w];
            if v.is_nan() {
                continue;
            }
            let diff = (v - temp).abs();
            if best.map_or(true, |(_, b)| diff < b) {
                best = Some((d, diff));
            }
        }
        best.map(|(d, _)| HarvestEstimate {
            clamp,
            days: self.first_day + d as u32,
        })
    }

    /// [`estimate`](Self::estimate) applied to each element.
    pub fn estimate_series(
        &self,
        mean_temps: &[Option<f64>],
        target_weight: u32,
    ) -> Vec<Option<HarvestEstimate>> {
        mean_temps
            .iter()
            .map(|t| t.and_then(|t| self.estimate(t, target_weight)))
            .collect()
    }

    /// Forward daily mean of outside temperature over `rows`, with an
    /// estimate per row.
    pub fn trailing_series(&self, rows: &[Observation], target_weight: u32) -> Vec<HarvestPoint> {
        let means = rolling::forward_daily_mean(rows, Parameter::OutsideTemp);
        let estimates = self.estimate_series(&means, target_weight);
        rows.iter()
            .zip(means)
            .zip(estimates)
            .map(|((row, mean_temp), estimate)| HarvestPoint {
                timestamp: row.timestamp_string(),
                mean_temp,
                estimate,
            })
            .collect()
    }

    fn day_index(&self, day: u32) -> Option<usize> {
        let i = day.checked_sub(self.first_day)? as usize;
        (i < self.days).then_some(i)
    }

    fn weight_index(&self, weight: u32) -> Option<usize> {
        let i = weight.checked_sub(self.first_weight)? as usize;
        (i < self.weights).then_some(i)
    }
}

/// Shape and cells of a C-order little-endian `f8` or `f4` array.
fn read_npy(bytes: &[u8]) -> Result<(Vec<u64>, Vec<f64>)> {
    let npy = NpyFile::new(bytes).map_err(grid_error)?;
    if matches!(npy.order(), Order::Fortran) {
        return Err(WxError::Grid("only C-order arrays are supported".to_string()));
    }
    let shape = npy.shape().to_vec();
    let descr = match npy.dtype() {
        DType::Plain(ty) => ty.to_string(),
        other => return Err(WxError::Grid(format!("unsupported dtype {:?}", other))),
    };
    let data = match descr.as_str() {
        "<f8" => npy.into_vec::<f64>().map_err(grid_error)?,
        "<f4" => npy
            .into_vec::<f32>()
            .map_err(grid_error)?
            .into_iter()
            .map(f64::from)
            .collect(),
        other => return Err(WxError::Grid(format!("unsupported dtype {}", other))),
    };
    Ok((shape, data))
}

fn grid_error(e: std::io::Error) -> WxError {
    WxError::Grid(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wx_utils::dates::parse_timestamp;

    /// 5 days (200..=204) x 2 weights (350, 351); the 351 column is empty.
    fn small_grid() -> HarvestGrid {
        let n = f64::NAN;
        #[rustfmt::skip]
        let cells = vec![
            20.6, n,
            18.0, n,
            16.0, n,
            14.0, n,
            12.6, n,
        ];
        HarvestGrid::new(200, 350, 5, 2, cells).unwrap()
    }

    fn npy(descr: &str, shape: (usize, usize), values: &[f64]) -> Vec<u8> {
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': ({}, {}), }}",
            descr, shape.0, shape.1
        );
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');
        let mut out = b"\x93NUMPY".to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for v in values {
            match descr {
                "<f4" => out.extend_from_slice(&(*v as f32).to_le_bytes()),
                _ => out.extend_from_slice(&v.to_le_bytes()),
            }
        }
        out
    }

    fn full_grid_values() -> Vec<f64> {
        // temperature falls linearly with days; weight 200 column empty
        let mut values = Vec::with_capacity(401 * 301);
        for d in 0..401 {
            for w in 0..301 {
                values.push(if w == 0 {
                    f64::NAN
                } else {
                    20.6 - 8.0 * d as f64 / 400.0
                });
            }
        }
        values
    }

    #[test]
    fn range_comes_from_data() {
        let grid = small_grid();
        assert_eq!(grid.min_temp(), 12.6);
        assert_eq!(grid.max_temp(), 20.6);
    }

    #[test]
    fn exact_match_has_no_prefix() {
        let est = small_grid().estimate(16.0, 350).unwrap();
        assert_eq!(est, HarvestEstimate { clamp: Clamp::Within, days: 202 });
        assert_eq!(est.to_string(), "202");
    }

    #[test]
    fn nearest_neighbor_without_interpolation() {
        let grid = small_grid();
        assert_eq!(grid.estimate(16.8, 350).unwrap().days, 202);
        assert_eq!(grid.estimate(17.2, 350).unwrap().days, 201);
        // equidistant from 18.0 and 16.0
        assert_eq!(grid.estimate(17.0, 350).unwrap().days, 201);
    }

    #[test]
    fn warm_side_is_clamped() {
        let est = small_grid().estimate(25.0, 350).unwrap();
        assert_eq!(est.clamp, Clamp::High);
        assert_eq!(est.to_string(), "<200");
    }

    #[test]
    fn cold_side_is_clamped() {
        let est = small_grid().estimate(3.0, 350).unwrap();
        assert_eq!(est.clamp, Clamp::Low);
        assert_eq!(est.to_string(), ">204");
    }

    #[test]
    fn unknown_or_empty_weight_is_absent() {
        let grid = small_grid();
        assert_eq!(grid.estimate(16.0, 351), None);
        assert_eq!(grid.estimate(16.0, 199), None);
        assert_eq!(grid.estimate(16.0, 900), None);
        assert_eq!(grid.estimate(f64::NAN, 350), None);
    }

    #[test]
    fn ties_go_to_fewest_days() {
        let grid = HarvestGrid::new(200, 300, 3, 1, vec![15.0, 17.0, 15.0]).unwrap();
        assert_eq!(grid.estimate(16.0, 300).unwrap().days, 200);
    }

    #[test]
    fn series_is_pointwise() {
        let grid = small_grid();
        let out = grid.estimate_series(&[Some(16.0), None, Some(30.0)], 350);
        assert_eq!(out[0].unwrap().days, 202);
        assert_eq!(out[1], None);
        assert_eq!(out[2].unwrap().clamp, Clamp::High);
    }

    #[test]
    fn trailing_series_uses_forward_mean() {
        let grid = small_grid();
        let rows = vec![
            Observation::new(parse_timestamp("2022-07-01 00:00:00").unwrap())
                .with(Parameter::OutsideTemp, Some(14.0)),
            Observation::new(parse_timestamp("2022-07-01 12:00:00").unwrap())
                .with(Parameter::OutsideTemp, Some(18.0)),
        ];
        let points = grid.trailing_series(&rows, 350);
        assert_eq!(points[0].mean_temp, Some(16.0));
        assert_eq!(points[0].estimate.unwrap().days, 202);
        assert_eq!(points[1].estimate.unwrap().days, 201);
    }

    #[test]
    fn mismatched_cells_are_rejected() {
        assert!(matches!(
            HarvestGrid::new(200, 200, 2, 2, vec![1.0; 3]),
            Err(WxError::Grid(_))
        ));
        assert!(matches!(
            HarvestGrid::new(200, 200, 1, 2, vec![f64::NAN; 2]),
            Err(WxError::Grid(_))
        ));
    }

    #[test]
    fn npy_f8_round_trip() {
        let grid = HarvestGrid::from_npy(&npy("<f8", (401, 301), &full_grid_values())).unwrap();
        assert!((grid.max_temp() - 20.6).abs() < 1e-9);
        assert!((grid.min_temp() - 12.6).abs() < 1e-9);
        assert_eq!(grid.temperature(200, 200), None);
        assert_eq!(grid.temperature(200, 500), Some(20.6));
        assert_eq!(grid.weight_axis(), 200..=500);
        assert_eq!(grid.estimate(25.0, 500).unwrap().to_string(), "<200");
        assert_eq!(grid.estimate(5.0, 500).unwrap().to_string(), ">600");
    }

    #[test]
    fn npy_f4_is_widened() {
        let grid = HarvestGrid::from_npy(&npy("<f4", (401, 301), &full_grid_values())).unwrap();
        assert!((grid.max_temp() - 20.6).abs() < 1e-5);
    }

    #[test]
    fn npy_rejects_wrong_shape_and_dtype() {
        let small = npy("<f8", (2, 2), &[1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(HarvestGrid::from_npy(&small), Err(WxError::Grid(_))));
        let ints = npy("<i8", (401, 301), &[]);
        assert!(matches!(HarvestGrid::from_npy(&ints), Err(WxError::Grid(_))));
        assert!(matches!(
            HarvestGrid::from_npy(b"not numpy"),
            Err(WxError::Grid(_))
        ));
    }

    #[test]
    fn npy_rejects_truncated_payload() {
        let bytes = npy("<f8", (401, 301), &[1.0; 10]);
        assert!(matches!(HarvestGrid::from_npy(&bytes), Err(WxError::Grid(_))));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.npy");
        std::fs::write(&path, npy("<f8", (401, 301), &full_grid_values())).unwrap();
        let grid = HarvestGrid::load(&path).unwrap();
        assert_eq!(grid.estimate(20.6, 350).unwrap().days, 200);
        assert!(matches!(
            HarvestGrid::load(dir.path().join("missing.npy")),
            Err(WxError::Io(_))
        ));
    }

    proptest! {
        #[test]
        fn estimate_is_idempotent(t in 0.0f64..30.0, w in 350u32..352) {
            let grid = small_grid();
            prop_assert_eq!(grid.estimate(t, w), grid.estimate(t, w));
        }

        #[test]
        fn colder_never_means_fewer_days(a in -20.0f64..30.0, b in -20.0f64..30.0) {
            let grid = small_grid();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let cold = grid.estimate(lo, 350).unwrap();
            let warm = grid.estimate(hi, 350).unwrap();
            prop_assert!(cold.days >= warm.days);
            if lo < grid.min_temp() {
                prop_assert_eq!(cold.clamp, Clamp::Low);
                prop_assert_eq!(cold.days, 204);
            }
            if hi > grid.max_temp() {
                prop_assert_eq!(warm.clamp, Clamp::High);
                prop_assert_eq!(warm.days, 200);
            }
        }

        #[test]
        fn below_range_temperatures_share_the_coldest_day(a in -20.0f64..12.6, b in -20.0f64..12.6) {
            let grid = small_grid();
            prop_assert_eq!(grid.estimate(a, 350), grid.estimate(b, 350));
        }
    }
}
