//! Stored rows and incoming station records.

use crate::error::{Result, WxError};
use crate::parameter::{Parameter, Table};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use wx_utils::dates::{format_timestamp, parse_timestamp};

/// Key carrying the sample time in station uploads and CSV exports.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// One row of the weather or forecast table.
///
/// `values` holds exactly the columns that were written or requested;
/// `None` is a stored NULL. Serializes flat, e.g.
/// `{"timestamp": "2022-01-29 15:27:00", "outtemp": 5.0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub values: BTreeMap<Parameter, Option<f64>>,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Observation {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter used by tests and the CSV loader.
    pub fn with(mut self, parameter: Parameter, value: Option<f64>) -> Self {
        self.values.insert(parameter, value);
        self
    }

    /// The non-null value of `parameter`, if present.
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied().flatten()
    }

    /// Timestamp in storage format.
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

/// A raw key/value upload from the station, before filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRecord(Map<String, Value>);

impl StationRecord {
    pub fn from_map(map: Map<String, Value>) -> Self {
        StationRecord(map)
    }

    /// Parse a JSON object body.
    pub fn parse(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => Ok(StationRecord(map)),
            Ok(other) => Err(WxError::Parse(format!("expected a JSON object, got {other}"))),
            Err(e) => Err(WxError::Parse(e.to_string())),
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Keep the fields `table` persists and drop everything else.
    ///
    /// Unknown keys are dropped silently (logged at debug level). Known
    /// fields that are null or not numeric are kept as NULL. The timestamp
    /// is required and normalized to storage format.
    pub fn filter(&self, table: Table) -> Result<Observation> {
        let raw_ts = match self.0.get(TIMESTAMP_KEY) {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => return Err(WxError::MissingTimestamp),
            Some(other) => return Err(WxError::Parse(other.to_string())),
        };
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| WxError::Parse(raw_ts.to_string()))?;

        let mut observation = Observation::new(timestamp);
        let mut dropped = 0usize;
        for (key, value) in &self.0 {
            if key == TIMESTAMP_KEY {
                continue;
            }
            match key.parse::<Parameter>() {
                Ok(p) if table.allows(p) => {
                    observation.values.insert(p, scalar_to_f64(value));
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            log::debug!("record {}: dropped {} unknown field(s)", raw_ts, dropped);
        }
        Ok(observation)
    }
}

fn scalar_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
