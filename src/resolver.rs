use bevy_reflect::Reflect;
use geo::Point;
use multimap::MultiMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::feature::{Fix, FixKind};

const PRECISION: f64 = 1_000_000.0;

/// Latitude and longitude in millionths of a degree (ca 0.1m).
pub type QuantizedPosition = (i64, i64);

pub fn quantize(point: Point) -> QuantizedPosition {
    let lat = (point.y() * PRECISION).round() as i64;
    let lon = (point.x() * PRECISION).round() as i64;
    (lat, lon)
}

/// Which fix wins when several share a quantized position.
#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    FirstRegistered,
    /// VORs before NDBs before waypoints, then registration order.
    PreferNavaids,
}

fn navaid_rank(kind: FixKind) -> u8 {
    match kind {
        FixKind::Vor => 0,
        FixKind::Ndb => 1,
        FixKind::Waypoint => 2,
    }
}

/// Read-only lookup from a raw coordinate to the fix published there.
#[derive(Clone, Debug, Default)]
pub struct CoordinateResolver {
    by_position: MultiMap<QuantizedPosition, Fix>,
    tie_break: TieBreak,
}

impl CoordinateResolver {
    pub fn new(fixes: impl IntoIterator<Item = Fix>, tie_break: TieBreak) -> Self {
        let by_position = fixes.into_iter().fold(MultiMap::new(), |mut acc, fix| {
            acc.insert(quantize(fix.location), fix);
            acc
        });
        let shared = by_position
            .iter_all()
            .filter(|(_, fixes)| fixes.len() > 1)
            .count();
        debug!(
            "resolver: {} positions, {shared} shared by more than one fix",
            by_position.len()
        );

        Self {
            by_position,
            tie_break,
        }
    }

    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// All fixes at `point`, in registration order.
    pub fn candidates(&self, point: Point) -> &[Fix] {
        self.by_position
            .get_vec(&quantize(point))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn resolve_fix(&self, point: Point) -> Option<&Fix> {
        let candidates = self.candidates(point);
        let fix = match self.tie_break {
            TieBreak::FirstRegistered => candidates.first(),
            TieBreak::PreferNavaids => candidates.iter().min_by_key(|fix| navaid_rank(fix.kind)),
        };

        trace!(
            "resolving {:.6} {:.6}: {}",
            point.y(),
            point.x(),
            fix.map_or("None", |fix| &*fix.identifier)
        );

        fix
    }

    pub fn resolve(&self, point: Point) -> Option<&str> {
        self.resolve_fix(point).map(|fix| fix.identifier.as_str())
    }

    /// The fixes along `points` in order; points without a fix are left out.
    pub fn resolve_polyline(&self, points: &[Point]) -> Vec<&Fix> {
        points
            .iter()
            .filter_map(|point| self.resolve_fix(*point))
            .collect()
    }

    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.by_position
            .iter_all()
            .any(|(_, fixes)| fixes.iter().any(|fix| fix.identifier == identifier))
    }
}
