//! Time-windowed read queries against the weather and forecast tables.
//!
//! # Window bounds
//!
//! The lower bound is an ordinary inclusive text comparison. The upper
//! bound is inclusive *and* a prefix match: any stored timestamp that
//! starts with the end string is in range, so a row stored as
//! `2022-01-29 15:27:03.5` is returned for an end of `2022-01-29 15:27:03`.
//! Station clients rely on this, so it is kept, with both bounds bound as
//! parameters.

use crate::Database;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use rusqlite::{params, OptionalExtension};
use wx_core::window::now_in;
use wx_core::{Observation, Parameter, Period, Result, Table, TimeWindow, WxError};
use wx_utils::dates::{format_date, parse_timestamp};

const WINDOW_CLAUSE: &str =
    "timestamp >= ?1 AND (timestamp <= ?2 OR substr(timestamp, 1, length(?2)) = ?2)";

impl Database {
    // ───────────────────── Observation Queries ─────────────────────

    /// Rows of `weather` inside `window`, projected to `columns`, in
    /// chronological order.
    pub fn query(&self, columns: &[Parameter], window: &TimeWindow) -> Result<Vec<Observation>> {
        self.select(Table::Weather, columns, window)
    }

    /// Timestamp of the most recent observation, or `None` on an empty store.
    ///
    /// Unreadable stored timestamps are skipped with a warning, as in
    /// [`Database::select`].
    pub fn latest_timestamp(&self) -> Result<Option<NaiveDateTime>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT timestamp FROM weather ORDER BY timestamp DESC, rowid DESC")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let raw: String = row.get(0)?;
                match parse_timestamp(&raw) {
                    Some(ts) => return Ok(Some(ts)),
                    None => log::warn!("query: skipping unreadable timestamp {:?}", raw),
                }
            }
            Ok(None)
        })
    }

    /// Value of `parameter` in the most recent observation. `None` when the
    /// store is empty or the latest row has no value for it.
    pub fn latest_value(&self, parameter: Parameter) -> Result<Option<f64>> {
        ensure_allowed(Table::Weather, parameter)?;
        let sql = format!(
            "SELECT {} FROM weather ORDER BY timestamp DESC, rowid DESC LIMIT 1",
            parameter.column()
        );
        let value: Option<Option<f64>> =
            self.with_conn(|conn| conn.query_row(&sql, [], |row| row.get(0)).optional())?;
        Ok(value.flatten())
    }

    /// Stored timestamps, in insertion order.
    ///
    /// With `recent_only`, only rows whose timestamp starts with today's or
    /// yesterday's date (in `tz`) are returned.
    pub fn time_log(&self, recent_only: bool, tz: Tz) -> Result<Vec<String>> {
        if recent_only {
            self.recent_time_log(now_in(tz).date_naive())
        } else {
            let rows = self.with_conn(|conn| {
                let mut stmt = conn.prepare("SELECT timestamp FROM weather ORDER BY rowid")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(rows)
            })?;
            log::debug!("query: time_log returned {} records", rows.len());
            Ok(rows)
        }
    }

    /// Timestamps stored on `today` or the day before.
    pub fn recent_time_log(&self, today: NaiveDate) -> Result<Vec<String>> {
        let today_str = format_date(&today);
        let yesterday_str = format_date(&(today - TimeDelta::days(1)));
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp FROM weather
                 WHERE timestamp LIKE ?1 || '%' OR timestamp LIKE ?2 || '%'
                 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map(params![today_str, yesterday_str], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(rows)
        })?;
        log::debug!("query: recent_time_log returned {} records", rows.len());
        Ok(rows)
    }

    // ───────────────────── Forecast Queries ─────────────────────

    /// Rows of `forecast` inside `window`, projected to `columns`.
    pub fn query_forecast(
        &self,
        columns: &[Parameter],
        window: &TimeWindow,
    ) -> Result<Vec<Observation>> {
        self.select(Table::Forecast, columns, window)
    }

    /// Forecast rows for display next to a period of observations: the
    /// period's history plus the same length ahead of now.
    pub fn forecast_series(
        &self,
        columns: &[Parameter],
        period: Period,
        tz: Tz,
    ) -> Result<Vec<Observation>> {
        self.query_forecast(columns, &TimeWindow::forecast(period, now_in(tz)))
    }

    /// Forecast rows from now to now + period length + one day, the input
    /// of the forward daily smoothing.
    pub fn rolling_forecast(
        &self,
        columns: &[Parameter],
        period: Period,
        tz: Tz,
    ) -> Result<Vec<Observation>> {
        self.query_forecast(columns, &TimeWindow::rolling(period, now_in(tz)))
    }

    /// Arithmetic mean of a forecast parameter over `window`, ignoring
    /// NULLs. `None` when the window holds no values.
    pub fn forecast_mean(&self, parameter: Parameter, window: &TimeWindow) -> Result<Option<f64>> {
        ensure_allowed(Table::Forecast, parameter)?;
        let sql = format!(
            "SELECT AVG({}) FROM forecast WHERE {}",
            parameter.column(),
            WINDOW_CLAUSE
        );
        let (start, end) = (window.start_str(), window.end_str());
        let mean: Option<f64> =
            self.with_conn(|conn| conn.query_row(&sql, params![start, end], |row| row.get(0)))?;
        log::debug!("query: forecast_mean({}) over {} = {:?}", parameter, window, mean);
        Ok(mean)
    }

    // ───────────────────── Shared ─────────────────────

    /// Number of rows stored in `table`.
    pub fn row_count(&self, table: Table) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.with_conn(|conn| conn.query_row(&sql, [], |row| row.get(0)))?;
        Ok(count as usize)
    }

    /// Time-bounded projection shared by both tables.
    pub fn select(
        &self,
        table: Table,
        columns: &[Parameter],
        window: &TimeWindow,
    ) -> Result<Vec<Observation>> {
        for parameter in columns {
            ensure_allowed(table, *parameter)?;
        }
        let mut projection = vec!["timestamp"];
        projection.extend(columns.iter().map(|p| p.column()));
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY timestamp, rowid",
            projection.join(", "),
            table.name(),
            WINDOW_CLAUSE
        );
        let (start, end) = (window.start_str(), window.end_str());

        let raw_rows: Vec<(String, Vec<Option<f64>>)> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![start, end], |row| {
                    let values = (1..=columns.len())
                        .map(|i| row.get::<_, Option<f64>>(i))
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    Ok((row.get::<_, String>(0)?, values))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (raw_ts, values) in raw_rows {
            let Some(timestamp) = parse_timestamp(&raw_ts) else {
                log::warn!("query: skipping {} row with unreadable timestamp '{}'", table, raw_ts);
                continue;
            };
            let mut observation = Observation::new(timestamp);
            observation.values.extend(columns.iter().copied().zip(values));
            rows.push(observation);
        }
        log::debug!(
            "query: select from {} over {} returned {} records",
            table,
            window,
            rows.len()
        );
        Ok(rows)
    }
}

fn ensure_allowed(table: Table, parameter: Parameter) -> Result<()> {
    if table.allows(parameter) {
        Ok(())
    } else {
        Err(WxError::UnsupportedParameter {
            parameter: parameter.to_string(),
            operation: match table {
                Table::Weather => "the weather table",
                Table::Forecast => "the forecast table",
            },
        })
    }
}
