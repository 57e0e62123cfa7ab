//! SQLite store and query engine for weather station data.
//!
//! Two append-only tables share one timestamp domain:
//! - `weather` - station observations posted by the ingestion boundary
//! - `forecast` - third-party forecast samples
//!
//! Every read takes its [`TimeWindow`](wx_core::TimeWindow) as an argument.
//! There is no "active window" stored on the [`Database`], so two callers
//! resolving different periods never observe each other's bounds.
//!
//! # Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use wx_core::{Parameter, StationRecord, TimeWindow, DEFAULT_TIMEZONE};
//! use wx_db::Database;
//!
//! let db = Database::new().unwrap();
//! let record = StationRecord::parse(r#"{"timestamp": "2022-01-29 15:27:00", "outtemp": 5.0}"#).unwrap();
//! db.post(&record).unwrap();
//!
//! let day = NaiveDate::from_ymd_opt(2022, 1, 29).unwrap();
//! let window = TimeWindow::new(
//!     day.and_hms_opt(0, 0, 0).unwrap(),
//!     day.and_hms_opt(23, 59, 59).unwrap(),
//!     DEFAULT_TIMEZONE,
//! )
//! .unwrap();
//! let rows = db.query(&[Parameter::OutsideTemp], &window).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```
//!
//! # Timeouts
//!
//! Each store call runs under a deadline (see [`Database::with_timeout`]).
//! Lock waits give up through SQLite's busy timeout and long statements are
//! interrupted by a progress handler; both surface as
//! [`WxError::Timeout`](wx_core::WxError::Timeout).

pub mod schema;
mod loader;
mod queries;
pub mod models;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wx_core::{Result, WxError};

pub use models::ObservationView;

/// Store calls give up after this long unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// VM instructions between deadline checks.
const PROGRESS_OPS: i32 = 1000;

/// SQLite database holding the weather and forecast tables.
///
/// Cheaply cloneable; clones share one connection behind a mutex, so
/// statements are serialized. Writes are atomic per row (or per batch
/// for [`Database::insert`]).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    timeout: Duration,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        Self::from_connection(conn)
    }

    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(unavailable)?;
        log::debug!("opened store at {}", path.display());
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(schema::create_schema())
            .map_err(unavailable)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the deadline applied to each store call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` against the connection under the configured deadline.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| WxError::StoreUnavailable("connection lock poisoned".to_string()))?;
        conn.busy_timeout(self.timeout).map_err(unavailable)?;

        let deadline = Instant::now() + self.timeout;
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        let result = f(&mut *conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|e| self.classify(e))
    }

    fn classify(&self, e: rusqlite::Error) -> WxError {
        match e.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted)
            | Some(ErrorCode::DatabaseBusy)
            | Some(ErrorCode::DatabaseLocked) => {
                log::warn!("store call timed out after {:?}: {}", self.timeout, e);
                WxError::Timeout(self.timeout)
            }
            _ => unavailable(e),
        }
    }
}

fn unavailable(e: rusqlite::Error) -> WxError {
    WxError::StoreUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wx_core::{Parameter, Table};

    #[test]
    fn database_creates_successfully() {
        let db = Database::new();
        assert!(db.is_ok(), "Database should create without errors");
    }

    #[test]
    fn database_is_cloneable() {
        let db = Database::new().unwrap();
        let db2 = db.clone();
        let record = wx_core::StationRecord::parse(
            r#"{"timestamp": "2022-01-29 15:27:00", "outtemp": 5.0}"#,
        )
        .unwrap();
        db.post(&record).unwrap();
        assert_eq!(
            db2.row_count(Table::Weather).unwrap(),
            1,
            "Clone should see same data via shared connection"
        );
    }

    #[test]
    fn database_starts_empty() {
        let db = Database::new().unwrap();
        assert_eq!(db.row_count(Table::Weather).unwrap(), 0);
        assert_eq!(db.latest_value(Parameter::OutsideTemp).unwrap(), None);
    }

    #[test]
    fn opens_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.db");
        {
            let db = Database::open(&path).unwrap();
            let record = wx_core::StationRecord::parse(
                r#"{"timestamp": "2022-01-29 15:27:00", "outtemp": 5.0}"#,
            )
            .unwrap();
            db.post(&record).unwrap();
        }
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.row_count(Table::Weather).unwrap(), 1);
    }

    #[test]
    fn unopenable_path_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("weather.db");
        let err = Database::open(&path).err().unwrap();
        assert!(matches!(err, WxError::StoreUnavailable(_)));
    }

    #[test]
    fn long_statement_times_out() {
        let db = Database::new().unwrap().with_timeout(Duration::from_millis(50));
        let err = db
            .with_conn(|conn| {
                conn.query_row(
                    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c)
                     SELECT MAX(x) FROM c",
                    [],
                    |row| row.get::<_, i64>(0),
                )
            })
            .unwrap_err();
        assert!(matches!(err, WxError::Timeout(d) if d == Duration::from_millis(50)));
    }

    #[test]
    fn store_recovers_after_timeout() {
        let db = Database::new().unwrap().with_timeout(Duration::from_millis(50));
        let _ = db.with_conn(|conn| {
            conn.query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c)
                 SELECT MAX(x) FROM c",
                [],
                |row| row.get::<_, i64>(0),
            )
        });
        assert_eq!(db.row_count(Table::Weather).unwrap(), 0);
    }
}
