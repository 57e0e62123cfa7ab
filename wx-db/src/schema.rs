//! SQL schema definitions for the weather station database.
//!
//! Both tables are append-only and keyed by a text timestamp in
//! `YYYY-MM-DD HH:MM:SS` form, so lexical order is chronological order.

/// Returns the full SQL schema as a single batch string.
///
/// - `weather` - station observations, one REAL column per observed parameter
/// - `forecast` - forecast samples, the same columns plus the hourly rain band
///
/// Neither table has a primary key: the station may repeat a timestamp
/// and every post is kept.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS weather (
        timestamp TEXT NOT NULL,
        intemp REAL,
        outtemp REAL,
        outhumi REAL,
        outdew REAL,
        outfeel REAL,
        winsp REAL,
        gust REAL,
        windir REAL,
        presabs REAL,
        presrel REAL,
        rainh REAL,
        raind REAL,
        rainw REAL,
        rainm REAL,
        raint REAL
    );
    CREATE INDEX IF NOT EXISTS idx_weather_timestamp ON weather(timestamp);

    CREATE TABLE IF NOT EXISTS forecast (
        timestamp TEXT NOT NULL,
        intemp REAL,
        outtemp REAL,
        outhumi REAL,
        outdew REAL,
        outfeel REAL,
        winsp REAL,
        gust REAL,
        windir REAL,
        presabs REAL,
        presrel REAL,
        rainh REAL,
        raind REAL,
        rainw REAL,
        rainm REAL,
        raint REAL,
        rainhmin REAL,
        rainhmax REAL
    );
    CREATE INDEX IF NOT EXISTS idx_forecast_timestamp ON forecast(timestamp);
    "#
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use wx_core::Table;

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn schema_is_valid_sql() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema())
            .expect("Schema SQL should be valid");
    }

    #[test]
    fn schema_columns_match_allow_lists() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();

        for table in [Table::Weather, Table::Forecast] {
            let mut expected = vec!["timestamp".to_string()];
            expected.extend(table.columns().iter().map(|p| p.column().to_string()));
            assert_eq!(
                table_columns(&conn, table.name()),
                expected,
                "Columns of '{}' should match its allow-list",
                table
            );
        }
    }

    #[test]
    fn schema_creates_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();

        for idx in ["idx_weather_timestamp", "idx_forecast_timestamp"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?1",
                    [idx],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Index '{}' should exist", idx);
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_schema()).unwrap();
        conn.execute_batch(create_schema())
            .expect("Applying schema twice should succeed due to IF NOT EXISTS");
    }
}
