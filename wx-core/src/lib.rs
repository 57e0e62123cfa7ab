//! Core types for weather station telemetry.
//!
//! - [`parameter`] - the fixed vocabulary of stored fields and their units
//! - [`observation`] - stored rows and incoming station records
//! - [`window`] - period tokens resolved into concrete time windows
//! - [`error`] - the error type shared by the library crates

pub mod error;
pub mod observation;
pub mod parameter;
pub mod window;

pub use error::{Result, WxError};
pub use observation::{Observation, StationRecord};
pub use parameter::{Parameter, Table};
pub use window::{EndTime, Period, TimeWindow};

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: chrono_tz::Tz = chrono_tz::Europe::Stockholm;
