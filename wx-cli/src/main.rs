//! wx-cli - store and query weather station telemetry.

use anyhow::Context as _;
use chrono_tz::Tz;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "wx-cli",
    version,
    about = "Weather station telemetry toolkit"
)]
struct Cli {
    /// Observation database
    #[arg(long, env = "TSTWEATHERDB", global = true, default_value = "weather.db")]
    db: PathBuf,

    /// Forecast database (defaults to the observation database)
    #[arg(long, env = "FORECASTDB", global = true)]
    forecast_db: Option<PathBuf>,

    /// IANA timezone used to resolve periods
    #[arg(long, env = "WX_TIMEZONE", global = true, default_value = "Europe/Stockholm")]
    tz: String,

    /// Deadline for each store call, in seconds
    #[arg(long, env = "WX_STORE_TIMEOUT", global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Harvest grid (.npy)
    #[arg(long, env = "WX_HARVEST_GRID", global = true)]
    grid: Option<PathBuf>,

    #[command(subcommand)]
    command: wx_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    let tz: Tz = cli
        .tz
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("invalid timezone {}", cli.tz))?;
    log::debug!("using database {} in {}", cli.db.display(), tz);

    let ctx = wx_cmd::Context::open(
        &cli.db,
        cli.forecast_db.as_deref(),
        tz,
        Duration::from_secs(cli.timeout_secs),
        cli.grid,
    )?;
    wx_cmd::run(cli.command, &ctx)
}
