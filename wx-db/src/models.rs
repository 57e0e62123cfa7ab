//! Query result snapshots.
//!
//! All structs derive `Serialize` so they can be handed to a charting
//! front end as JSON.

use crate::Database;
use serde::Serialize;
use wx_core::{Observation, Parameter, Result, Table, TimeWindow};

/// The rows of one table for one window, captured together.
///
/// A view is never mutated. Refreshing builds a new view, which the
/// holder swaps in wholesale, so readers always see a window and the
/// rows that belong to it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ObservationView {
    pub table: Table,
    pub window: TimeWindow,
    pub columns: Vec<Parameter>,
    pub rows: Vec<Observation>,
}

impl ObservationView {
    /// Re-run the same projection over `window`.
    pub fn refreshed(&self, db: &Database, window: TimeWindow) -> Result<ObservationView> {
        db.view(self.table, &self.columns, window)
    }

    /// The non-null values of `parameter`, in row order.
    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.get(parameter)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Database {
    /// Capture `columns` of `table` over `window` as one snapshot.
    pub fn view(
        &self,
        table: Table,
        columns: &[Parameter],
        window: TimeWindow,
    ) -> Result<ObservationView> {
        let rows = self.select(table, columns, &window)?;
        Ok(ObservationView {
            table,
            window,
            columns: columns.to_vec(),
            rows,
        })
    }
}
