//! Writing station data into the store.

use crate::Context;
use anyhow::Context as _;
use flate2::read::GzDecoder;
use log::info;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use wx_core::{StationRecord, Table};

fn table_for(forecast: bool) -> Table {
    if forecast {
        Table::Forecast
    } else {
        Table::Weather
    }
}

/// Store one JSON record.
pub fn ingest(ctx: &Context, record: &str, forecast: bool) -> anyhow::Result<Value> {
    let record = StationRecord::parse(record).context("parsing station record")?;
    let table = table_for(forecast);
    let row = record.filter(table)?;
    if forecast {
        ctx.forecast_db.post_forecast(&record)?;
    } else {
        ctx.db.post(&record)?;
    }
    info!("stored {} record at {}", table, row.timestamp_string());
    Ok(json!({
        "table": table,
        "timestamp": row.timestamp_string(),
        "values": row.values,
    }))
}

/// Bulk-load a CSV file; `.gz` files are decompressed on the fly.
pub fn import(ctx: &Context, path: &Path, forecast: bool) -> anyhow::Result<Value> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let table = table_for(forecast);
    let db = if forecast { &ctx.forecast_db } else { &ctx.db };
    let rows = db
        .load_csv(table, reader)
        .with_context(|| format!("importing {}", path.display()))?;
    info!("imported {} rows from {} into {}", rows, path.display(), table);
    Ok(json!({
        "table": table,
        "rows": rows,
        "total": db.row_count(table)?,
    }))
}
