use std::fmt::Display;

use bevy_derive::{Deref, DerefMut};
use geo::Point;
use serde::Serialize;

use crate::dms::{DegMinSec, DegMinSecExt as _, DmsError};

/// One end of a `T;`/`L;` line: a fix identifier written twice, or a
/// formatted coordinate.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub enum Vertex {
    Fix(String),
    Coordinate { lat: DegMinSec, lng: DegMinSec },
}

impl Vertex {
    pub fn from_point(point: Point) -> Result<Self, DmsError> {
        Ok(Vertex::Coordinate {
            lat: point.lat_dms()?,
            lng: point.lng_dms()?,
        })
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vertex::Fix(identifier) => write!(f, "{identifier};{identifier}"),
            Vertex::Coordinate { lat, lng } => write!(f, "{lat};{lng}"),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq, Hash)]
pub enum Line {
    FirHeader(String),
    Section(String),
    Aerodrome {
        identifier: String,
        elevation_ft: i32,
        lat: DegMinSec,
        lng: DegMinSec,
        name: String,
        suffix: u8,
        /// Heliport lines end after the suffix.
        type_code: Option<u8>,
    },
    Fix {
        identifier: String,
        lat: DegMinSec,
        lng: DegMinSec,
        code: u8,
    },
    Navaid {
        identifier: String,
        frequency: String,
        lat: DegMinSec,
        lng: DegMinSec,
    },
    Track {
        name: String,
        vertex: Vertex,
    },
    Label {
        designator: String,
        vertex: Vertex,
    },
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::FirHeader(fir) => write!(f, "//FIR {fir}"),
            Line::Section(name) => write!(f, "//{name}"),
            Line::Aerodrome {
                identifier,
                elevation_ft,
                lat,
                lng,
                name,
                suffix,
                type_code,
            } => {
                write!(
                    f,
                    "{identifier};{elevation_ft};0;{lat};{lng};{name};{suffix};"
                )?;
                if let Some(type_code) = type_code {
                    write!(f, "{type_code};")?;
                }
                Ok(())
            }
            Line::Fix {
                identifier,
                lat,
                lng,
                code,
            } => write!(f, "{identifier};{lat};{lng};{code};"),
            Line::Navaid {
                identifier,
                frequency,
                lat,
                lng,
            } => write!(f, "{identifier};{frequency};{lat};{lng};"),
            Line::Track { name, vertex } => write!(f, "T;{name};{vertex};"),
            Line::Label { designator, vertex } => write!(f, "L;{designator};{vertex};"),
        }
    }
}

/// Ordered output, rendered one line per entry.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq, Deref, DerefMut)]
pub struct Lines(pub Vec<Line>);

impl Lines {
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<Line> for Lines {
    fn from_iter<T: IntoIterator<Item = Line>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Line> for Lines {
    fn extend<T: IntoIterator<Item = Line>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Lines {
    type Item = Line;
    type IntoIter = std::vec::IntoIter<Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for Lines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.0 {
            writeln!(f, "{line}")?;
        }

        Ok(())
    }
}
