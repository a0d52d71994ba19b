use std::{fmt::Display, str::FromStr};

use bevy_reflect::Reflect;
use geo::{Coord, Point};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MILLIS_PER_SECOND: u32 = 1_000;
const MILLIS_PER_MINUTE: u32 = 60 * MILLIS_PER_SECOND;

static DMS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([NSEW])(\d{1,3})\.(\d{1,2})\.(\d{1,2})(?:\.(\d{1,3}))?$").unwrap());

#[derive(Error, Debug, PartialEq)]
pub enum DmsError {
    #[error("cannot convert non-finite value {0}")]
    NonFinite(f64),
    #[error("{value} is out of range for {axis}")]
    OutOfRange { value: f64, axis: Axis },
    #[error("invalid coordinate string: {0:?}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn hemisphere(self, negative: bool) -> Hemisphere {
        match (self, negative) {
            (Axis::Latitude, false) => Hemisphere::North,
            (Axis::Latitude, true) => Hemisphere::South,
            (Axis::Longitude, false) => Hemisphere::East,
            (Axis::Longitude, true) => Hemisphere::West,
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        })
    }
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn axis(self) -> Axis {
        match self {
            Hemisphere::North | Hemisphere::South => Axis::Latitude,
            Hemisphere::East | Hemisphere::West => Axis::Longitude,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Hemisphere::North | Hemisphere::East => 1.0,
            Hemisphere::South | Hemisphere::West => -1.0,
        }
    }

    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }
}

impl Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
            Hemisphere::East => "E",
            Hemisphere::West => "W",
        })
    }
}

/// A sexagesimal coordinate component with the seconds held in whole
/// thousandths, so the rendered `SS.sss` field can never read `60.000`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DegMinSec {
    pub hemisphere: Hemisphere,
    pub degrees: u16,
    pub minutes: u8,
    pub millis: u16,
}

impl DegMinSec {
    /// Degrees and minutes are truncated, seconds are rounded to three
    /// decimals and a rounded-up `60.000` is carried into the minutes (and
    /// from there into the degrees).
    pub fn from_decimal(value: f64, axis: Axis) -> Result<Self, DmsError> {
        if !value.is_finite() {
            return Err(DmsError::NonFinite(value));
        }
        let abs = value.abs();
        if abs > axis.limit() {
            return Err(DmsError::OutOfRange { value, axis });
        }

        let degrees = abs.trunc();
        let minutes = ((abs - degrees) * 60.0).trunc();
        let millis = (((abs - degrees) * 60.0 - minutes) * 60_000.0).round();

        Ok(Self::carried(
            axis.hemisphere(value < 0.0),
            degrees as u32,
            minutes as u32,
            millis as u32,
        ))
    }

    fn carried(hemisphere: Hemisphere, degrees: u32, minutes: u32, millis: u32) -> Self {
        let minutes = minutes + millis / MILLIS_PER_MINUTE;
        let millis = millis % MILLIS_PER_MINUTE;
        let degrees = degrees + minutes / 60;
        let minutes = minutes % 60;

        Self {
            hemisphere,
            degrees: degrees as u16,
            minutes: minutes as u8,
            millis: millis as u16,
        }
    }

    pub fn seconds(&self) -> f64 {
        f64::from(self.millis) / f64::from(MILLIS_PER_SECOND)
    }

    pub fn to_decimal(&self) -> f64 {
        self.hemisphere.sign()
            * (f64::from(self.degrees) + f64::from(self.minutes) / 60.0 + self.seconds() / 3600.0)
    }

}

impl Display for DegMinSec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:03}.{:02}.{:02}.{:03}",
            self.hemisphere,
            self.degrees,
            self.minutes,
            u32::from(self.millis) / MILLIS_PER_SECOND,
            u32::from(self.millis) % MILLIS_PER_SECOND,
        )
    }
}

impl FromStr for DegMinSec {
    type Err = DmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DmsError::Invalid(s.to_string());
        let captures = DMS_RE.captures(s.trim()).ok_or_else(invalid)?;
        let hemisphere = Hemisphere::from_letter(&captures[1]).ok_or_else(invalid)?;
        let degrees: u16 = captures[2].parse().map_err(|_| invalid())?;
        let minutes: u8 = captures[3].parse().map_err(|_| invalid())?;
        let seconds: u16 = captures[4].parse().map_err(|_| invalid())?;
        // "5" is half a second, not five thousandths
        let fraction: u16 = captures.get(5).map_or(Ok(0), |fraction| {
            format!("{:0<3}", fraction.as_str())
                .parse()
                .map_err(|_| invalid())
        })?;
        if minutes >= 60 || seconds >= 60 || f64::from(degrees) > hemisphere.axis().limit() {
            return Err(invalid());
        }

        Ok(Self {
            hemisphere,
            degrees,
            minutes,
            millis: seconds * 1_000 + fraction,
        })
    }
}

pub trait DegMinSecExt {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self;
    fn lat_dms(&self) -> Result<DegMinSec, DmsError>;
    fn lng_dms(&self) -> Result<DegMinSec, DmsError>;
    fn deg_min_sec_fmt(&self) -> Result<String, DmsError> {
        Ok(format!("{} {}", self.lat_dms()?, self.lng_dms()?))
    }
}

impl DegMinSecExt for Coord {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self {
        Self {
            y: lat.to_decimal(),
            x: lng.to_decimal(),
        }
    }

    fn lat_dms(&self) -> Result<DegMinSec, DmsError> {
        DegMinSec::from_decimal(self.y, Axis::Latitude)
    }

    fn lng_dms(&self) -> Result<DegMinSec, DmsError> {
        DegMinSec::from_decimal(self.x, Axis::Longitude)
    }
}

impl DegMinSecExt for Point {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self {
        Coord::from_deg_min_sec(lat, lng).into()
    }

    fn lat_dms(&self) -> Result<DegMinSec, DmsError> {
        self.0.lat_dms()
    }

    fn lng_dms(&self) -> Result<DegMinSec, DmsError> {
        self.0.lng_dms()
    }
}
