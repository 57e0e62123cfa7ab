//! Period tokens and the time windows they resolve to.
//!
//! A window is a plain value handed to every query; nothing holds a
//! "current" window between calls.

use crate::error::{Result, WxError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use wx_utils::dates::{format_timestamp, parse_timestamp, truncate_to_seconds};

/// A named look-back period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Days3,
    Week,
    Month,
    Quartile,
    HalfYear,
    FullYear,
    /// From January 1 of the current year.
    ThisYear,
}

impl Period {
    pub const ALL: [Period; 8] = [
        Period::Day,
        Period::Days3,
        Period::Week,
        Period::Month,
        Period::Quartile,
        Period::HalfYear,
        Period::FullYear,
        Period::ThisYear,
    ];

    /// Map a token to a period. Unrecognized tokens fall back to [`Period::Day`].
    pub fn from_token(token: &str) -> Period {
        match token {
            "day" => Period::Day,
            "days3" => Period::Days3,
            "week" => Period::Week,
            "month" => Period::Month,
            "quartile" => Period::Quartile,
            "halfyear" => Period::HalfYear,
            "fullyear" => Period::FullYear,
            "thisyear" => Period::ThisYear,
            other => {
                log::debug!("unknown period token '{}', using 'day'", other);
                Period::Day
            }
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Days3 => "days3",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quartile => "quartile",
            Period::HalfYear => "halfyear",
            Period::FullYear => "fullyear",
            Period::ThisYear => "thisyear",
        }
    }

    /// Fixed look-back in days; `None` for [`Period::ThisYear`].
    pub fn days_back(&self) -> Option<i64> {
        match self {
            Period::Day => Some(1),
            Period::Days3 => Some(3),
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Quartile => Some(90),
            Period::HalfYear => Some(180),
            Period::FullYear => Some(365),
            Period::ThisYear => None,
        }
    }

    /// Start of the period ending at `now`.
    pub fn start(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self.days_back() {
            Some(days) => now - TimeDelta::days(days),
            None => NaiveDate::from_ymd_opt(now.year(), 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or(now),
        }
    }

    /// Length of the period ending at `now`.
    pub fn length(&self, now: NaiveDateTime) -> TimeDelta {
        now - self.start(now)
    }
}

impl FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Period::from_token(s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Where a window ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EndTime {
    /// Wall-clock time at resolution.
    #[default]
    Now,
    /// An explicit timestamp literal, parsed at resolution.
    At(String),
}

impl From<&str> for EndTime {
    fn from(s: &str) -> Self {
        if s == "now" {
            EndTime::Now
        } else {
            EndTime::At(s.to_string())
        }
    }
}

/// Current wall-clock time in `tz`, second precision.
pub fn now_in(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// A concrete `[start, end]` range in the local time of `tz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    #[serde(serialize_with = "serialize_naive")]
    pub start: NaiveDateTime,
    #[serde(serialize_with = "serialize_naive")]
    pub end: NaiveDateTime,
    #[serde(skip)]
    pub tz: Tz,
}

fn serialize_naive<S: serde::Serializer>(
    ts: &NaiveDateTime,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

impl TimeWindow {
    /// Build a window from explicit bounds.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, tz: Tz) -> Result<Self> {
        let start = truncate_to_seconds(start);
        let end = truncate_to_seconds(end);
        if end < start {
            return Err(WxError::InvertedWindow {
                start: format_timestamp(&start),
                end: format_timestamp(&end),
            });
        }
        Ok(TimeWindow { start, end, tz })
    }

    /// Resolve a period token to a window ending now.
    pub fn resolve(token: &str, tz: Tz) -> TimeWindow {
        Self::ending_now(Period::from_token(token), now_in(tz))
    }

    /// Resolve a period token with an explicit end. Fails only when the end
    /// literal cannot be parsed (or lands before the start).
    pub fn resolve_with_end(token: &str, tz: Tz, end: &EndTime) -> Result<TimeWindow> {
        Self::resolve_at(Period::from_token(token), now_in(tz), end)
    }

    /// Resolve against a fixed `now`. The start is always relative to `now`;
    /// `end` only moves the upper bound.
    pub fn resolve_at(period: Period, now: DateTime<Tz>, end: &EndTime) -> Result<TimeWindow> {
        match end {
            EndTime::Now => Ok(Self::ending_now(period, now)),
            EndTime::At(literal) => {
                let local = truncate_to_seconds(now.naive_local());
                let end = parse_timestamp(literal).ok_or_else(|| WxError::Parse(literal.clone()))?;
                Self::new(period.start(local), end, now.timezone())
            }
        }
    }

    fn ending_now(period: Period, now: DateTime<Tz>) -> TimeWindow {
        let local = truncate_to_seconds(now.naive_local());
        TimeWindow {
            start: period.start(local),
            end: local,
            tz: now.timezone(),
        }
    }

    /// Forecast display window: the period's history plus the same length
    /// ahead of now.
    pub fn forecast(period: Period, now: DateTime<Tz>) -> TimeWindow {
        let local = truncate_to_seconds(now.naive_local());
        TimeWindow {
            start: period.start(local),
            end: local + period.length(local),
            tz: now.timezone(),
        }
    }

    /// Forward window used for smoothing forecast series: from now to
    /// now + period length + one extra day.
    pub fn rolling(period: Period, now: DateTime<Tz>) -> TimeWindow {
        let local = truncate_to_seconds(now.naive_local());
        TimeWindow {
            start: local,
            end: local + period.length(local) + TimeDelta::days(1),
            tz: now.timezone(),
        }
    }

    pub fn start_str(&self) -> String {
        format_timestamp(&self.start)
    }

    pub fn end_str(&self) -> String {
        format_timestamp(&self.end)
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] {}", self.start_str(), self.end_str(), self.tz)
    }
}
