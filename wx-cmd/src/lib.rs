//! Command implementations for the weather station CLI.
//!
//! Every command resolves its own time window and hands it to the store
//! explicitly, then prints a JSON document on stdout.

use anyhow::Context as _;
use chrono_tz::Tz;
use clap::Subcommand;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wx_db::Database;

pub mod ingest;
pub mod report;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store one station record given as a JSON object
    Ingest {
        /// The record, e.g. '{"timestamp": "2022-01-29 15:00:00", "outtemp": -2.5}'
        record: String,

        /// Store into the forecast table instead of the observations
        #[arg(long)]
        forecast: bool,
    },

    /// Bulk-load a headered CSV file (optionally gzip-compressed)
    Import {
        /// Path to the .csv or .csv.gz file
        path: PathBuf,

        /// Load into the forecast table instead of the observations
        #[arg(long)]
        forecast: bool,
    },

    /// List stored observation timestamps
    TimeLog {
        /// Only today and yesterday
        #[arg(long)]
        recent: bool,
    },

    /// Latest observation timestamp, or the latest value of a parameter
    Latest {
        /// Parameter column, e.g. outtemp
        parameter: Option<String>,
    },

    /// Chart-ready series of one parameter
    Series {
        /// Parameter column, e.g. outtemp or raind
        parameter: String,

        /// Period token: day, days3, week, month, quartile, halfyear, fullyear, thisyear
        #[arg(short, long, default_value = "day")]
        period: String,

        /// Window end: "now" or a timestamp literal (prefixes match)
        #[arg(short, long, default_value = "now")]
        end: String,

        /// Read from the forecast table
        #[arg(long)]
        forecast: bool,
    },

    /// Wind direction and speed frequencies
    WindRose {
        #[arg(short, long, default_value = "day")]
        period: String,
    },

    /// Days until a target fruit weight from forecast temperatures
    Harvest {
        /// Target weight in grams
        #[arg(short, long, default_value_t = 500)]
        weight: u32,

        /// Forecast horizon: day, days3 or week
        #[arg(short, long, default_value = "week")]
        period: String,
    },
}

/// What every command needs from the environment.
#[derive(Clone)]
pub struct Context {
    pub db: Database,
    pub forecast_db: Database,
    pub tz: Tz,
    pub grid: Option<PathBuf>,
}

impl Context {
    /// Open the stores. Without a separate forecast path both tables are
    /// served from the observation database.
    pub fn open(
        db: &Path,
        forecast_db: Option<&Path>,
        tz: Tz,
        timeout: Duration,
        grid: Option<PathBuf>,
    ) -> anyhow::Result<Context> {
        let weather = Database::open(db)
            .with_context(|| format!("opening {}", db.display()))?
            .with_timeout(timeout);
        let forecast = match forecast_db {
            Some(path) if path != db => Database::open(path)
                .with_context(|| format!("opening {}", path.display()))?
                .with_timeout(timeout),
            _ => weather.clone(),
        };
        Ok(Context {
            db: weather,
            forecast_db: forecast,
            tz,
            grid,
        })
    }
}

/// Run `command` and return its JSON output.
pub fn execute(command: Command, ctx: &Context) -> anyhow::Result<Value> {
    match command {
        Command::Ingest { record, forecast } => ingest::ingest(ctx, &record, forecast),
        Command::Import { path, forecast } => ingest::import(ctx, &path, forecast),
        Command::TimeLog { recent } => report::time_log(ctx, recent),
        Command::Latest { parameter } => report::latest(ctx, parameter.as_deref()),
        Command::Series {
            parameter,
            period,
            end,
            forecast,
        } => report::series(ctx, &parameter, &period, &end, forecast),
        Command::WindRose { period } => report::wind_rose(ctx, &period),
        Command::Harvest { weight, period } => report::harvest(ctx, weight, &period),
    }
}

pub fn run(command: Command, ctx: &Context) -> anyhow::Result<()> {
    let output = execute(command, ctx)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
