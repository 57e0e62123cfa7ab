//! Read-side commands: time log, latest values, series, wind rose and
//! harvest forecast.

use crate::Context;
use anyhow::{bail, Context as _};
use serde_json::{json, Value};
use wx_core::window::now_in;
use wx_core::{EndTime, Parameter, Period, Table, TimeWindow};
use wx_data::harvest::HarvestGrid;
use wx_data::{series, wind};

fn parameter(name: &str) -> anyhow::Result<Parameter> {
    name.parse::<Parameter>()
        .with_context(|| format!("expected one of: {}", known_parameters()))
}

fn known_parameters() -> String {
    Parameter::FORECAST
        .iter()
        .map(|p| p.column())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn time_log(ctx: &Context, recent: bool) -> anyhow::Result<Value> {
    Ok(json!(ctx.db.time_log(recent, ctx.tz)?))
}

/// The latest timestamp, or with `parameter` the latest value and unit.
pub fn latest(ctx: &Context, name: Option<&str>) -> anyhow::Result<Value> {
    let Some(name) = name else {
        let ts = ctx.db.latest_timestamp()?;
        return Ok(json!({
            "timestamp": ts.map(|t| wx_utils::dates::format_timestamp(&t)),
        }));
    };
    let p = parameter(name)?;
    Ok(json!({
        "parameter": p,
        "label": p.label(),
        "value": ctx.db.latest_value(p)?,
        "unit": p.unit(),
    }))
}

/// One parameter over a period, shaped for charting.
///
/// Observations use the window `[start of period, end]` and are reshaped
/// for display (rain buckets, relative pressure). Forecasts look the same
/// distance ahead of now, ignore `end` and come back as stored.
pub fn series(
    ctx: &Context,
    name: &str,
    period: &str,
    end: &str,
    forecast: bool,
) -> anyhow::Result<Value> {
    let p = parameter(name)?;
    let (window, rows) = if forecast {
        let window = TimeWindow::forecast(Period::from_token(period), now_in(ctx.tz));
        let rows = ctx
            .forecast_db
            .query_forecast(&series::forecast_columns(p), &window)?;
        (window, rows)
    } else {
        let window = TimeWindow::resolve_with_end(period, ctx.tz, &EndTime::from(end))?;
        let rows = ctx
            .db
            .select(Table::Weather, &[series::source_column(p)], &window)?;
        (window, series::prepare(rows, p)?)
    };
    Ok(json!({
        "parameter": p,
        "unit": p.unit(),
        "window": window,
        "points": rows,
    }))
}

pub fn wind_rose(ctx: &Context, period: &str) -> anyhow::Result<Value> {
    let window = TimeWindow::resolve(period, ctx.tz);
    let rows = ctx
        .db
        .query(&[Parameter::WindSpeed, Parameter::WindDirection], &window)?;
    Ok(json!({
        "window": window,
        "samples": rows.len(),
        "rows": wind::histogram_of(&rows),
    }))
}

/// Harvest horizons longer than a week are not forecast.
fn harvest_period(token: &str) -> Period {
    match Period::from_token(token) {
        p @ (Period::Day | Period::Days3 | Period::Week) => p,
        _ => Period::Week,
    }
}

/// Current estimate from the mean forecast temperature, plus the estimate
/// series over the rolling forecast.
pub fn harvest(ctx: &Context, weight: u32, period: &str) -> anyhow::Result<Value> {
    let Some(path) = &ctx.grid else {
        bail!("no harvest grid configured (--grid or WX_HARVEST_GRID)");
    };
    let grid = HarvestGrid::load(path)
        .with_context(|| format!("loading harvest grid {}", path.display()))?;
    if !grid.weight_axis().contains(&weight) {
        bail!(
            "target weight {} g is outside the grid ({:?} g)",
            weight,
            grid.weight_axis()
        );
    }

    let period = harvest_period(period);
    let window = TimeWindow::rolling(period, now_in(ctx.tz));
    let mean_temp = ctx
        .forecast_db
        .forecast_mean(Parameter::OutsideTemp, &window)?;
    let current = mean_temp.and_then(|t| grid.estimate(t, weight));
    let rows = ctx
        .forecast_db
        .query_forecast(&[Parameter::OutsideTemp], &window)?;

    Ok(json!({
        "weight": weight,
        "period": period.token(),
        "mean_temp": mean_temp,
        "current": current.map(|e| format!("{} - {} g", e, weight)),
        "estimate": current,
        "series": grid.trailing_series(&rows, weight),
    }))
}
