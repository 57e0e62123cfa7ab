//! Wind rose: joint frequency of direction sector and speed band.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use wx_core::{Observation, Parameter};

/// Width of one compass sector in degrees.
pub const SECTOR_WIDTH: f64 = 22.5;

/// The 16 compass sectors, in clockwise order from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Sector {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Sector {
    pub const ALL: [Sector; 16] = [
        Sector::N,
        Sector::NNE,
        Sector::NE,
        Sector::ENE,
        Sector::E,
        Sector::ESE,
        Sector::SE,
        Sector::SSE,
        Sector::S,
        Sector::SSW,
        Sector::SW,
        Sector::WSW,
        Sector::W,
        Sector::WNW,
        Sector::NW,
        Sector::NNW,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Exclusive upper bound of the sector in degrees.
    pub fn upper_bound(&self) -> f64 {
        self.index() as f64 * SECTOR_WIDTH + SECTOR_WIDTH / 2.0
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sector::N => "N",
            Sector::NNE => "NNE",
            Sector::NE => "NE",
            Sector::ENE => "ENE",
            Sector::E => "E",
            Sector::ESE => "ESE",
            Sector::SE => "SE",
            Sector::SSE => "SSE",
            Sector::S => "S",
            Sector::SSW => "SSW",
            Sector::SW => "SW",
            Sector::WSW => "WSW",
            Sector::W => "W",
            Sector::WNW => "WNW",
            Sector::NW => "NW",
            Sector::NNW => "NNW",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sector of a direction in degrees.
///
/// The first sector whose upper bound exceeds `degrees` wins; anything at
/// or past the last bound (348.75) wraps to north. Negative angles fall in
/// north as well. `None` for NaN.
pub fn classify_direction(degrees: f64) -> Option<Sector> {
    if degrees.is_nan() {
        return None;
    }
    Some(
        Sector::ALL
            .iter()
            .copied()
            .find(|s| degrees < s.upper_bound())
            .unwrap_or(Sector::N),
    )
}

/// One unit-wide speed band, `[lower, lower + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeedBand {
    pub lower: i64,
}

impl SpeedBand {
    pub fn upper(&self) -> i64 {
        self.lower + 1
    }
}

impl fmt::Display for SpeedBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lower, self.upper())
    }
}

impl Serialize for SpeedBand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Band of a finite speed. An integral speed opens the next band: 3.0
/// lands in "3-4".
pub fn classify_speed(speed: f64) -> SpeedBand {
    SpeedBand {
        lower: speed.floor() as i64,
    }
}

/// Speed and direction of one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    pub speed: Option<f64>,
    pub direction: Option<f64>,
}

impl WindSample {
    pub fn new(speed: Option<f64>, direction: Option<f64>) -> Self {
        WindSample { speed, direction }
    }

    pub fn from_observation(row: &Observation) -> Self {
        WindSample {
            speed: row.get(Parameter::WindSpeed),
            direction: row.get(Parameter::WindDirection),
        }
    }

    fn classify(&self) -> Option<(SpeedBand, Sector)> {
        let speed = self.speed.filter(|s| s.is_finite() && *s > 0.0)?;
        let sector = classify_direction(self.direction?)?;
        Some((classify_speed(speed), sector))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindHistogramRow {
    pub direction: Sector,
    pub strength: SpeedBand,
    /// Percent of all classified samples.
    pub frequency: f64,
}

/// Cross-tabulate samples into (sector, band) frequencies.
///
/// Samples without speed or direction, and calm samples (speed <= 0), are
/// dropped before counting, so frequencies sum to 100 over the classified
/// samples. Every observed band is crossed with all 16 sectors, zero
/// cells included, ordered by band and then by sector in compass order.
pub fn build_histogram<I>(samples: I) -> Vec<WindHistogramRow>
where
    I: IntoIterator<Item = WindSample>,
{
    let mut counts: BTreeMap<SpeedBand, [usize; 16]> = BTreeMap::new();
    let mut total = 0usize;
    for sample in samples {
        if let Some((band, sector)) = sample.classify() {
            counts.entry(band).or_insert([0; 16])[sector.index()] += 1;
            total += 1;
        }
    }
    if total == 0 {
        return Vec::new();
    }
    log::debug!("wind: {} samples in {} speed bands", total, counts.len());
    counts
        .into_iter()
        .flat_map(|(strength, per_sector)| {
            Sector::ALL.into_iter().map(move |direction| WindHistogramRow {
                direction,
                strength,
                frequency: per_sector[direction.index()] as f64 / total as f64 * 100.0,
            })
        })
        .collect()
}

/// Histogram of the `winsp`/`windir` columns of `rows`.
pub fn histogram_of(rows: &[Observation]) -> Vec<WindHistogramRow> {
    build_histogram(rows.iter().map(WindSample::from_observation))
}
