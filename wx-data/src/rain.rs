//! Rain accumulation reduced per calendar bucket.
//!
//! The station reports running totals (last hour, day, week, month and
//! all-time). The maximum inside each bucket is the bucket's total.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::collections::btree_map::{BTreeMap, Entry};
use wx_core::{Observation, Parameter, Result, WxError};

/// Calendar grouping used for one rain parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// `rainh`: date and hour.
    Hour,
    /// `raind`: date.
    Day,
    /// `rainw`: ISO week number.
    Week,
    /// `rainm`: month number.
    Month,
    /// `raint`: year.
    Year,
}

/// Grouping key. Week and month keys carry no year: the same week of two
/// different years lands in one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BucketKey {
    DateHour(NaiveDate, u32),
    Date(NaiveDate),
    Week(u32),
    Month(u32),
    Year(i32),
}

impl Bucket {
    pub fn for_parameter(parameter: Parameter) -> Option<Bucket> {
        match parameter {
            Parameter::RainHour => Some(Bucket::Hour),
            Parameter::RainDay => Some(Bucket::Day),
            Parameter::RainWeek => Some(Bucket::Week),
            Parameter::RainMonth => Some(Bucket::Month),
            Parameter::RainTotal => Some(Bucket::Year),
            _ => None,
        }
    }

    pub fn key(&self, ts: &NaiveDateTime) -> BucketKey {
        match self {
            Bucket::Hour => BucketKey::DateHour(ts.date(), ts.hour()),
            Bucket::Day => BucketKey::Date(ts.date()),
            Bucket::Week => BucketKey::Week(ts.iso_week().week()),
            Bucket::Month => BucketKey::Month(ts.month()),
            Bucket::Year => BucketKey::Year(ts.year()),
        }
    }
}

/// Group `rows` by the bucket of `parameter` and reduce each group to its
/// column-wise maximum (NULLs skipped; the timestamp becomes the latest in
/// the group). Output follows ascending bucket order, not input order, and
/// the bucket keys themselves are not part of the output.
///
/// Empty input is returned unchanged for any parameter.
pub fn aggregate(rows: &[Observation], parameter: Parameter) -> Result<Vec<Observation>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let bucket = Bucket::for_parameter(parameter).ok_or_else(|| WxError::UnsupportedParameter {
        parameter: parameter.to_string(),
        operation: "rain bucket aggregation",
    })?;

    let mut groups: BTreeMap<BucketKey, Observation> = BTreeMap::new();
    for row in rows {
        match groups.entry(bucket.key(&row.timestamp)) {
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
            }
            Entry::Occupied(mut slot) => merge_max(slot.get_mut(), row),
        }
    }
    log::debug!(
        "rain: {} rows reduced to {} {:?} buckets",
        rows.len(),
        groups.len(),
        bucket
    );
    Ok(groups.into_values().collect())
}

fn merge_max(acc: &mut Observation, row: &Observation) {
    acc.timestamp = acc.timestamp.max(row.timestamp);
    for (parameter, value) in &row.values {
        let slot = acc.values.entry(*parameter).or_insert(None);
        *slot = match (*slot, *value) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}
