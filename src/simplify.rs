use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uom::si::f64::Length;
use uom::si::length::meter;

use crate::geodesy::EarthModel;

/// Distance below which a point counts as lying exactly on the chord.
pub const COLLINEAR_EPSILON: f64 = 1e-9;

pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// The tolerance also selects the distance metric, so planar and
/// great-circle distances are never compared against each other.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Cross-product distance in degree space.
    Degrees(f64),
    /// Cross-track distance on the earth model, in metres when deserialized.
    Distance(Length),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SimplifyMode {
    /// Ramer-Douglas-Peucker: drop points within the tolerance of the chord.
    Tolerant(Tolerance),
    /// Only drop points lying on the chord, within [`COLLINEAR_EPSILON`]
    /// degrees.
    ExactCollinear,
}

#[derive(Error, Debug, PartialEq)]
pub enum SimplifyError {
    #[error("simplification of {points} points exceeded the depth limit of {max_depth}")]
    DepthExceeded { points: usize, max_depth: usize },
}

#[derive(Clone, Copy, Debug)]
enum Metric {
    Planar,
    GreatCircle(EarthModel),
}

impl Metric {
    fn distance(self, point: Point, start: Point, end: Point) -> f64 {
        match self {
            Metric::Planar => planar_distance(point, start, end),
            Metric::GreatCircle(earth) if start == end => {
                earth.haversine(point, start).get::<meter>()
            }
            Metric::GreatCircle(earth) => earth.cross_track(point, start, end).get::<meter>(),
        }
    }
}

/// Distance from the line through `start` and `end`, or from `start` when
/// both coincide.
fn planar_distance(point: Point, start: Point, end: Point) -> f64 {
    let (dx, dy) = (end.x() - start.x(), end.y() - start.y());
    if start == end {
        return (point.x() - start.x()).hypot(point.y() - start.y());
    }
    let cross = dy * point.x() - dx * point.y() + end.x() * start.y() - end.y() * start.x();
    cross.abs() / dx.hypot(dy)
}

#[derive(Clone, Copy, Debug)]
pub struct PolylineSimplifier {
    mode: SimplifyMode,
    earth: EarthModel,
    max_depth: usize,
}

impl PolylineSimplifier {
    pub fn new(mode: SimplifyMode, earth: EarthModel) -> Self {
        Self {
            mode,
            earth,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn mode(&self) -> SimplifyMode {
        self.mode
    }

    fn metric_and_epsilon(&self) -> (Metric, f64) {
        match self.mode {
            SimplifyMode::Tolerant(Tolerance::Degrees(epsilon)) => (Metric::Planar, epsilon),
            SimplifyMode::Tolerant(Tolerance::Distance(epsilon)) => {
                (Metric::GreatCircle(self.earth), epsilon.get::<meter>())
            }
            SimplifyMode::ExactCollinear => (Metric::Planar, COLLINEAR_EPSILON),
        }
    }

    fn keeps(&self, distance: f64, epsilon: f64) -> bool {
        match self.mode {
            SimplifyMode::Tolerant(_) => distance > epsilon,
            SimplifyMode::ExactCollinear => distance >= epsilon,
        }
    }

    /// Simplifies `points`, keeping the first and last point. Inputs with
    /// fewer than three points are returned as they are.
    pub fn try_simplify(&self, points: &[Point]) -> Result<Vec<Point>, SimplifyError> {
        if points.len() < 3 {
            return Ok(points.to_vec());
        }
        let (metric, epsilon) = self.metric_and_epsilon();

        let mut keep = vec![false; points.len()];
        keep[0] = true;
        keep[points.len() - 1] = true;

        // (first, last, depth) spans still to be split
        let mut spans = vec![(0, points.len() - 1, 0)];
        while let Some((first, last, depth)) = spans.pop() {
            if last - first < 2 {
                continue;
            }
            if depth > self.max_depth {
                return Err(SimplifyError::DepthExceeded {
                    points: points.len(),
                    max_depth: self.max_depth,
                });
            }

            let (start, end) = (points[first], points[last]);
            let (index, d_max) = (first + 1..last).fold((first + 1, 0.0), |(index, d_max), i| {
                let distance = metric.distance(points[i], start, end);
                if distance > d_max {
                    (i, distance)
                } else {
                    (index, d_max)
                }
            });

            if self.keeps(d_max, epsilon) {
                keep[index] = true;
                spans.push((index, last, depth + 1));
                spans.push((first, index, depth + 1));
            }
        }

        Ok(points
            .iter()
            .zip(keep)
            .filter_map(|(point, keep)| keep.then_some(*point))
            .collect())
    }

    /// Like [`Self::try_simplify`], but hands back the input unchanged when
    /// the depth limit is hit.
    pub fn simplify(&self, points: &[Point]) -> Vec<Point> {
        self.try_simplify(points).unwrap_or_else(|e| {
            warn!("{e}, keeping all points");
            points.to_vec()
        })
    }
}
