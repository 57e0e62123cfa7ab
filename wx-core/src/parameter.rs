//! The fixed vocabulary of station parameters.
//!
//! Column names, units and the per-table allow-lists live here. Only
//! names produced by [`Parameter::column`] are ever spliced into SQL, so
//! column projection is limited to this enum.

use crate::error::WxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A measured (or forecast) quantity stored as one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "intemp")]
    InsideTemp,
    #[serde(rename = "outtemp")]
    OutsideTemp,
    #[serde(rename = "outhumi")]
    OutsideHumidity,
    #[serde(rename = "outdew")]
    DewPoint,
    #[serde(rename = "outfeel")]
    FeelsLike,
    #[serde(rename = "winsp")]
    WindSpeed,
    #[serde(rename = "gust")]
    GustSpeed,
    #[serde(rename = "windir")]
    WindDirection,
    #[serde(rename = "presabs")]
    PressureAbsolute,
    #[serde(rename = "presrel")]
    PressureRelative,
    #[serde(rename = "rainh")]
    RainHour,
    #[serde(rename = "raind")]
    RainDay,
    #[serde(rename = "rainw")]
    RainWeek,
    #[serde(rename = "rainm")]
    RainMonth,
    #[serde(rename = "raint")]
    RainTotal,
    /// Lower edge of the forecast hourly rain band.
    #[serde(rename = "rainhmin")]
    RainHourMin,
    /// Upper edge of the forecast hourly rain band.
    #[serde(rename = "rainhmax")]
    RainHourMax,
}

impl Parameter {
    /// Fields persisted for station observations, in column order.
    pub const OBSERVED: [Parameter; 15] = [
        Parameter::InsideTemp,
        Parameter::OutsideTemp,
        Parameter::OutsideHumidity,
        Parameter::DewPoint,
        Parameter::FeelsLike,
        Parameter::WindSpeed,
        Parameter::GustSpeed,
        Parameter::WindDirection,
        Parameter::PressureAbsolute,
        Parameter::PressureRelative,
        Parameter::RainHour,
        Parameter::RainDay,
        Parameter::RainWeek,
        Parameter::RainMonth,
        Parameter::RainTotal,
    ];

    /// Fields persisted for forecasts: the observed set plus the rain band.
    pub const FORECAST: [Parameter; 17] = [
        Parameter::InsideTemp,
        Parameter::OutsideTemp,
        Parameter::OutsideHumidity,
        Parameter::DewPoint,
        Parameter::FeelsLike,
        Parameter::WindSpeed,
        Parameter::GustSpeed,
        Parameter::WindDirection,
        Parameter::PressureAbsolute,
        Parameter::PressureRelative,
        Parameter::RainHour,
        Parameter::RainDay,
        Parameter::RainWeek,
        Parameter::RainMonth,
        Parameter::RainTotal,
        Parameter::RainHourMin,
        Parameter::RainHourMax,
    ];

    /// Column name in both tables.
    pub fn column(&self) -> &'static str {
        match self {
            Parameter::InsideTemp => "intemp",
            Parameter::OutsideTemp => "outtemp",
            Parameter::OutsideHumidity => "outhumi",
            Parameter::DewPoint => "outdew",
            Parameter::FeelsLike => "outfeel",
            Parameter::WindSpeed => "winsp",
            Parameter::GustSpeed => "gust",
            Parameter::WindDirection => "windir",
            Parameter::PressureAbsolute => "presabs",
            Parameter::PressureRelative => "presrel",
            Parameter::RainHour => "rainh",
            Parameter::RainDay => "raind",
            Parameter::RainWeek => "rainw",
            Parameter::RainMonth => "rainm",
            Parameter::RainTotal => "raint",
            Parameter::RainHourMin => "rainhmin",
            Parameter::RainHourMax => "rainhmax",
        }
    }

    /// Unit label shown next to values.
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::InsideTemp
            | Parameter::OutsideTemp
            | Parameter::DewPoint
            | Parameter::FeelsLike => "°C",
            Parameter::OutsideHumidity => "%",
            Parameter::WindSpeed | Parameter::GustSpeed => "m/s",
            Parameter::WindDirection => "°",
            Parameter::PressureAbsolute | Parameter::PressureRelative => "hPa",
            Parameter::RainHour
            | Parameter::RainDay
            | Parameter::RainWeek
            | Parameter::RainMonth
            | Parameter::RainTotal
            | Parameter::RainHourMin
            | Parameter::RainHourMax => "mm",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::InsideTemp => "Temperature - Inside",
            Parameter::OutsideTemp => "Temperature - Outside",
            Parameter::OutsideHumidity => "Humidity",
            Parameter::DewPoint => "Dew point",
            Parameter::FeelsLike => "Temperature - Feels like",
            Parameter::WindSpeed => "Wind speed",
            Parameter::GustSpeed => "Gust speed",
            Parameter::WindDirection => "Wind direction",
            Parameter::PressureAbsolute => "Pressure - Absolute",
            Parameter::PressureRelative => "Pressure - Relative",
            Parameter::RainHour => "Rain - Hour",
            Parameter::RainDay => "Rain - Day",
            Parameter::RainWeek => "Rain - Week",
            Parameter::RainMonth => "Rain - Month",
            Parameter::RainTotal => "Rain - Total",
            Parameter::RainHourMin => "Rain - Hour (lower bound)",
            Parameter::RainHourMax => "Rain - Hour (upper bound)",
        }
    }

    /// True for the rain accumulation windows.
    pub fn is_rain(&self) -> bool {
        matches!(
            self,
            Parameter::RainHour
                | Parameter::RainDay
                | Parameter::RainWeek
                | Parameter::RainMonth
                | Parameter::RainTotal
        )
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Parameter {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::FORECAST
            .iter()
            .copied()
            .find(|p| p.column() == s)
            .ok_or_else(|| WxError::UnknownParameter(s.to_string()))
    }
}

/// The two stored tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    /// Station measurements.
    Weather,
    /// Third-party forecast samples, same timestamp domain.
    Forecast,
}

impl Table {
    /// SQL table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Weather => "weather",
            Table::Forecast => "forecast",
        }
    }

    /// The allow-list of value columns for this table.
    pub fn columns(&self) -> &'static [Parameter] {
        match self {
            Table::Weather => &Parameter::OBSERVED,
            Table::Forecast => &Parameter::FORECAST,
        }
    }

    /// Whether `parameter` is persisted in this table.
    pub fn allows(&self, parameter: Parameter) -> bool {
        self.columns().contains(&parameter)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_round_trip_through_from_str() {
        for p in Parameter::FORECAST {
            assert_eq!(p.column().parse::<Parameter>().unwrap(), p);
        }
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = "bogus_field".parse::<Parameter>().unwrap_err();
        assert!(matches!(err, WxError::UnknownParameter(name) if name == "bogus_field"));
    }

    #[test]
    fn units_match_station_vocabulary() {
        assert_eq!(Parameter::OutsideTemp.unit(), "°C");
        assert_eq!(Parameter::OutsideHumidity.unit(), "%");
        assert_eq!(Parameter::GustSpeed.unit(), "m/s");
        assert_eq!(Parameter::WindDirection.unit(), "°");
        assert_eq!(Parameter::PressureRelative.unit(), "hPa");
        assert_eq!(Parameter::RainTotal.unit(), "mm");
    }

    #[test]
    fn forecast_only_fields_are_not_observed() {
        assert!(Table::Forecast.allows(Parameter::RainHourMax));
        assert!(!Table::Weather.allows(Parameter::RainHourMax));
        assert!(!Table::Weather.allows(Parameter::RainHourMin));
        assert_eq!(Table::Weather.columns().len(), 15);
    }

    #[test]
    fn serde_uses_column_names() {
        let json = serde_json::to_string(&Parameter::WindDirection).unwrap();
        assert_eq!(json, "\"windir\"");
        let back: Parameter = serde_json::from_str("\"presrel\"").unwrap();
        assert_eq!(back, Parameter::PressureRelative);
    }

    #[test]
    fn only_accumulation_windows_are_rain() {
        let rain: Vec<_> = Parameter::FORECAST.iter().filter(|p| p.is_rain()).collect();
        assert_eq!(rain.len(), 5);
        assert!(!Parameter::RainHourMax.is_rain());
    }
}
