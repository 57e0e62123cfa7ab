//! Write paths: single posts from the ingestion boundary and bulk CSV loads.
//!
//! # CSV Format
//!
//! Headered, one column per parameter plus `timestamp`, e.g.
//!
//! ```text
//! timestamp,outtemp,winsp,windir
//! 2022-01-29 15:27:00,5.0,3.4,270
//! ```
//!
//! Columns outside the table's allow-list are ignored. Empty or
//! non-numeric cells are stored as NULL. Rows without a parsable
//! timestamp are skipped.

use crate::Database;
use rusqlite::types::Value as SqlValue;
use std::io::Read;
use wx_core::observation::TIMESTAMP_KEY;
use wx_core::{Observation, Parameter, Result, StationRecord, Table, WxError};
use wx_utils::dates::{format_timestamp, parse_timestamp};

impl Database {
    /// Append one station record to the `weather` table.
    ///
    /// Fields outside the allow-list are dropped before the insert.
    pub fn post(&self, record: &StationRecord) -> Result<()> {
        let observation = record.filter(Table::Weather)?;
        self.insert(Table::Weather, std::slice::from_ref(&observation))?;
        Ok(())
    }

    /// Append one forecast sample to the `forecast` table.
    pub fn post_forecast(&self, record: &StationRecord) -> Result<()> {
        let observation = record.filter(Table::Forecast)?;
        self.insert(Table::Forecast, std::slice::from_ref(&observation))?;
        Ok(())
    }

    /// Append rows to `table` in a single transaction.
    ///
    /// Values for parameters the table does not persist are dropped.
    /// Returns the number of rows written.
    pub fn insert(&self, table: Table, rows: &[Observation]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let count = self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for row in rows {
                let (sql, values) = insert_statement(table, row);
                tx.execute(&sql, rusqlite::params_from_iter(values))?;
            }
            tx.commit()?;
            Ok(rows.len())
        })?;
        log::info!("loader: inserted {} row(s) into {}", count, table);
        Ok(count)
    }

    /// Bulk-load a headered CSV into `table`. Returns the number of rows written.
    pub fn load_csv<R: Read>(&self, table: Table, reader: R) -> Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(csv_error)?.clone();
        let ts_index = headers
            .iter()
            .position(|h| h == TIMESTAMP_KEY)
            .ok_or_else(|| WxError::Csv("missing 'timestamp' column".to_string()))?;
        let columns: Vec<(usize, Parameter)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| match h.parse::<Parameter>() {
                Ok(p) if table.allows(p) => Some((i, p)),
                _ => None,
            })
            .collect();
        let ignored = headers.len().saturating_sub(columns.len() + 1);
        if ignored > 0 {
            log::warn!("loader: ignoring {} unknown column(s) for {}", ignored, table);
        }

        let mut rows = Vec::new();
        let mut skipped = 0u32;
        for result in rdr.records() {
            let record = result.map_err(csv_error)?;
            let timestamp = match record.get(ts_index).and_then(parse_timestamp) {
                Some(ts) => ts,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            let mut observation = Observation::new(timestamp);
            for (i, parameter) in &columns {
                let value = record
                    .get(*i)
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|v| v.is_finite());
                observation.values.insert(*parameter, value);
            }
            rows.push(observation);
        }
        if skipped > 0 {
            log::warn!("loader: skipped {} row(s) without a valid timestamp", skipped);
        }
        self.insert(table, &rows)
    }
}

/// Build an INSERT for the columns present in `row`. Column names come from
/// [`Parameter::column`] only; values are bound.
fn insert_statement(table: Table, row: &Observation) -> (String, Vec<SqlValue>) {
    let mut names = vec![TIMESTAMP_KEY];
    let mut values = vec![SqlValue::Text(format_timestamp(&row.timestamp))];
    for (parameter, value) in &row.values {
        if !table.allows(*parameter) {
            continue;
        }
        names.push(parameter.column());
        values.push(match value {
            Some(v) => SqlValue::Real(*v),
            None => SqlValue::Null,
        });
    }
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        names.join(", "),
        placeholders.join(", ")
    );
    (sql, values)
}

fn csv_error(e: csv::Error) -> WxError {
    WxError::Csv(e.to_string())
}
