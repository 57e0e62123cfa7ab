//! Derived views over station observations.
//!
//! This crate turns raw rows into forms suitable for charting: rain
//! reduced per calendar bucket, wind samples binned into a compass rose,
//! forecast temperatures smoothed and mapped onto the harvest grid.

pub mod harvest;
pub mod rain;
pub mod rolling;
pub mod series;
pub mod wind;
