use std::{fmt::Display, str::FromStr};

use bevy_reflect::Reflect;
use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::Length;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RecordError {
    #[error("malformed record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },
    #[error("invalid coordinate in {record}: lat {lat}, lon {lon}")]
    InvalidCoordinate { record: String, lat: f64, lon: f64 },
}

impl RecordError {
    pub(crate) fn malformed(record: impl Display, reason: impl Into<String>) -> Self {
        RecordError::MalformedRecord {
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}

/// WGS84 decimal degrees, `x` is the longitude and `y` the latitude.
pub fn validate_point(point: Point, record: impl Display) -> Result<Point, RecordError> {
    let (lon, lat) = (point.x(), point.y());
    if lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
    {
        Ok(point)
    } else {
        Err(RecordError::InvalidCoordinate {
            record: record.to_string(),
            lat,
            lon,
        })
    }
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    Waypoint,
    Vor,
    Ndb,
}

impl FixKind {
    pub fn is_navaid(self) -> bool {
        matches!(self, FixKind::Vor | FixKind::Ndb)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Fix {
    pub identifier: String,
    pub location: Point,
    pub kind: FixKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RouteSegment {
    pub designator: String,
    #[serde(default)]
    pub group_id: Option<String>,
    pub sequence: f64,
    pub from_fix: Fix,
    pub to_fix: Fix,
    #[serde(default)]
    pub polyline: Vec<Point>,
    /// Published segment length, in metres when deserialized.
    #[serde(default)]
    pub route_distance: Option<Length>,
}

impl RouteSegment {
    /// First and last point of the drawn segment, falling back to the fixes
    /// when no geometry was supplied.
    pub fn endpoints(&self) -> (Point, Point) {
        match (self.polyline.first(), self.polyline.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (self.from_fix.location, self.to_fix.location),
        }
    }
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SectorKind {
    Cta,
    Ctr,
    Tma,
    Atz,
    Fir,
}

impl SectorKind {
    pub fn track_name(self, name: &str) -> String {
        match self {
            SectorKind::Cta => format!("CTA {name}"),
            SectorKind::Ctr => format!("CTR {name}"),
            SectorKind::Atz => format!("ATZ {name}"),
            SectorKind::Tma | SectorKind::Fir => name.to_string(),
        }
    }
}

/// Airspace boundary. The boundary may or may not repeat its first point.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sector {
    pub name: String,
    #[serde(default)]
    pub related_fir: String,
    pub kind: SectorKind,
    pub boundary: Vec<Point>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LabelAnchor {
    pub designator: String,
    pub position: Point,
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown {kind} code {code:?}")]
pub struct UnknownCode {
    kind: &'static str,
    code: String,
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AerodromeUse {
    Private,
    Public,
    Military,
    PublicMilitary,
    PrivatePublic,
    PublicRestricted,
}

impl AerodromeUse {
    /// Type code closing an airport line.
    pub fn type_code(self) -> u8 {
        match self {
            AerodromeUse::Private | AerodromeUse::PrivatePublic => 3,
            AerodromeUse::Military => 2,
            AerodromeUse::Public
            | AerodromeUse::PublicMilitary
            | AerodromeUse::PublicRestricted => 0,
        }
    }

    /// Suffix appended after the aerodrome name.
    pub fn name_suffix(self) -> u8 {
        match self {
            AerodromeUse::Private => 1,
            AerodromeUse::Public
            | AerodromeUse::Military
            | AerodromeUse::PublicMilitary
            | AerodromeUse::PrivatePublic
            | AerodromeUse::PublicRestricted => 2,
        }
    }
}

impl FromStr for AerodromeUse {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PRIV" => Ok(AerodromeUse::Private),
            "PUB" => Ok(AerodromeUse::Public),
            "MIL" => Ok(AerodromeUse::Military),
            "PUB/MIL" => Ok(AerodromeUse::PublicMilitary),
            "PRIV/PUB" => Ok(AerodromeUse::PrivatePublic),
            "PUB/REST" => Ok(AerodromeUse::PublicRestricted),
            code => Err(UnknownCode {
                kind: "aerodrome use",
                code: code.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WaypointCategory {
    Icao,
    Terminal,
    AdhpOther,
    BearingDistance,
    Designed,
    Other,
    Coordinate,
}

impl FromStr for WaypointCategory {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ICAO" => Ok(WaypointCategory::Icao),
            "TERMINAL" => Ok(WaypointCategory::Terminal),
            "OTHER:ADHP" => Ok(WaypointCategory::AdhpOther),
            "BRG_DIST" => Ok(WaypointCategory::BearingDistance),
            "DESIGNED" => Ok(WaypointCategory::Designed),
            "OTHER" => Ok(WaypointCategory::Other),
            "COORD" => Ok(WaypointCategory::Coordinate),
            code => Err(UnknownCode {
                kind: "waypoint category",
                code: code.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Aerodrome {
    pub identifier: String,
    pub name: String,
    pub fir: String,
    /// In metres when deserialized.
    pub elevation: Length,
    pub location: Point,
    /// Raw usage code as published, e.g. `PUB/MIL`.
    pub usage: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Heliport {
    pub identifier: String,
    pub name: String,
    pub fir: String,
    pub elevation: Length,
    pub location: Point,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Navaid {
    pub identifier: String,
    /// MHz for VORs, kHz for NDBs.
    pub frequency: f64,
    pub location: Point,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub identifier: String,
    pub location: Point,
    /// Raw category code as published, e.g. `TERMINAL`.
    pub category: String,
}

/// A record as handed over by the fetching side.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Feature {
    Airport(Aerodrome),
    Heliport(Heliport),
    Vor(Navaid),
    Ndb(Navaid),
    Waypoint(Waypoint),
    Sector(Sector),
    AirwaySegment(RouteSegment),
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Airport(Aerodrome { identifier, .. })
            | Feature::Heliport(Heliport { identifier, .. })
            | Feature::Vor(Navaid { identifier, .. })
            | Feature::Ndb(Navaid { identifier, .. })
            | Feature::Waypoint(Waypoint { identifier, .. }) => identifier,
            Feature::Sector(sector) => &sector.name,
            Feature::AirwaySegment(segment) => &segment.designator,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Feature::Airport(_) => "airport",
            Feature::Heliport(_) => "heliport",
            Feature::Vor(_) => "VOR",
            Feature::Ndb(_) => "NDB",
            Feature::Waypoint(_) => "waypoint",
            Feature::Sector(_) => "sector",
            Feature::AirwaySegment(_) => "airway segment",
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())
    }
}
