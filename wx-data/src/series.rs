//! Presentation of a single parameter over a window.
//!
//! Observed series are reshaped by [`prepare`]; forecast series are
//! charted as stored, projected through [`forecast_columns`].

use crate::rain;
use wx_core::{Observation, Parameter, Result};

/// Station altitude correction (56 m above sea level) from absolute to
/// relative pressure.
pub const RELATIVE_PRESSURE_OFFSET_HPA: f64 = 7.0;

/// Column to read from the store when charting `parameter`. Relative
/// pressure is derived from the absolute reading.
pub fn source_column(parameter: Parameter) -> Parameter {
    match parameter {
        Parameter::PressureRelative => Parameter::PressureAbsolute,
        p => p,
    }
}

/// Shape rows read through [`source_column`] for charting `parameter`:
/// rain columns are reduced to their calendar buckets, relative pressure
/// becomes absolute pressure plus [`RELATIVE_PRESSURE_OFFSET_HPA`],
/// everything else passes through.
pub fn prepare(rows: Vec<Observation>, parameter: Parameter) -> Result<Vec<Observation>> {
    if rain::Bucket::for_parameter(parameter).is_some() {
        return rain::aggregate(&rows, parameter);
    }
    let source = source_column(parameter);
    if source == parameter {
        return Ok(rows);
    }
    Ok(rows
        .into_iter()
        .map(|mut row| {
            let value = row
                .values
                .remove(&source)
                .flatten()
                .map(|v| v + RELATIVE_PRESSURE_OFFSET_HPA);
            row.values.insert(parameter, value);
            row
        })
        .collect())
}

/// Columns read when charting a forecast of `parameter`. Forecast rows
/// are charted raw; the hourly rain forecast carries its uncertainty band.
pub fn forecast_columns(parameter: Parameter) -> Vec<Parameter> {
    match parameter {
        Parameter::RainHour => vec![
            Parameter::RainHour,
            Parameter::RainHourMin,
            Parameter::RainHourMax,
        ],
        p => vec![p],
    }
}
