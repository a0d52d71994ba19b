use bevy_reflect::Reflect;
use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uom::si::f64::Length;
use uom::si::length::nautical_mile;

use crate::{
    dms::DmsError,
    feature::{LabelAnchor, RouteSegment},
    geodesy::EarthModel,
    output::{Line, Lines, Vertex},
    sequence::RouteSequence,
};

pub const DEFAULT_MIN_SEPARATION_NM: f64 = 10.0;
pub const DEFAULT_MIN_SEGMENT_LENGTH_NM: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelStrategy {
    /// Every point of the route is a candidate.
    PerVertex,
    /// The midpoint of every segment at least `min_segment_length` long is a
    /// candidate.
    SegmentMidpoint { min_segment_length: Length },
}

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategyKind {
    PerVertex,
    #[default]
    SegmentMidpoint,
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelConfig {
    pub strategy: LabelStrategyKind,
    pub min_segment_length_nm: f64,
    pub min_separation_nm: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            strategy: LabelStrategyKind::default(),
            min_segment_length_nm: DEFAULT_MIN_SEGMENT_LENGTH_NM,
            min_separation_nm: DEFAULT_MIN_SEPARATION_NM,
        }
    }
}

impl LabelConfig {
    pub fn strategy(&self) -> LabelStrategy {
        match self.strategy {
            LabelStrategyKind::PerVertex => LabelStrategy::PerVertex,
            LabelStrategyKind::SegmentMidpoint => LabelStrategy::SegmentMidpoint {
                min_segment_length: Length::new::<nautical_mile>(self.min_segment_length_nm),
            },
        }
    }

    pub fn placer(&self, earth: EarthModel) -> LabelPlacer {
        LabelPlacer::new(
            self.strategy(),
            Length::new::<nautical_mile>(self.min_separation_nm),
            earth,
        )
    }
}

/// Arithmetic mean of both points, not the great-circle midpoint.
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0)
}

/// Last emitted label position of one walk.
struct Spacing<'a> {
    placer: &'a LabelPlacer,
    last: Option<Point>,
}

impl Spacing<'_> {
    fn admit(&mut self, candidate: Point) -> bool {
        let admitted = self.last.is_none_or(|last| {
            self.placer.earth.haversine(last, candidate) >= self.placer.min_separation
        });
        if admitted {
            self.last = Some(candidate);
        }
        admitted
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LabelPlacer {
    strategy: LabelStrategy,
    min_separation: Length,
    earth: EarthModel,
}

impl Default for LabelPlacer {
    fn default() -> Self {
        LabelConfig::default().placer(EarthModel::default())
    }
}

impl LabelPlacer {
    pub fn new(strategy: LabelStrategy, min_separation: Length, earth: EarthModel) -> Self {
        Self {
            strategy,
            min_separation,
            earth,
        }
    }

    pub fn strategy(&self) -> LabelStrategy {
        self.strategy
    }

    pub fn min_separation(&self) -> Length {
        self.min_separation
    }

    fn spacing(&self) -> Spacing<'_> {
        Spacing {
            placer: self,
            last: None,
        }
    }

    /// Published length of the segment, or the length of its geometry.
    pub fn segment_length(&self, segment: &RouteSegment) -> Length {
        segment.route_distance.unwrap_or_else(|| {
            if segment.polyline.len() >= 2 {
                self.earth.polyline_length(&segment.polyline)
            } else {
                self.earth
                    .haversine(segment.from_fix.location, segment.to_fix.location)
            }
        })
    }

    /// Labels along `points`, at least the minimum separation apart from
    /// the previous label.
    pub fn place_along(&self, designator: &str, points: &[Point]) -> Vec<LabelAnchor> {
        let mut spacing = self.spacing();
        points
            .iter()
            .filter(|point| spacing.admit(**point))
            .map(|position| LabelAnchor {
                designator: designator.to_string(),
                position: *position,
            })
            .collect()
    }

    pub fn place(&self, sequence: &RouteSequence) -> Vec<LabelAnchor> {
        let anchors = match self.strategy {
            LabelStrategy::PerVertex => self.place_along(&sequence.designator, &sequence.points()),
            LabelStrategy::SegmentMidpoint { min_segment_length } => {
                let mut spacing = self.spacing();
                sequence
                    .segments
                    .iter()
                    .filter(|segment| {
                        let length = self.segment_length(segment);
                        trace!(
                            "{} {} -> {}: {:.1} NM",
                            segment.designator,
                            segment.from_fix.identifier,
                            segment.to_fix.identifier,
                            length.get::<nautical_mile>()
                        );
                        length >= min_segment_length
                    })
                    .map(|segment| {
                        let (start, end) = segment.endpoints();
                        midpoint(start, end)
                    })
                    .filter(|candidate| spacing.admit(*candidate))
                    .map(|position| LabelAnchor {
                        designator: sequence.designator.clone(),
                        position,
                    })
                    .collect()
            }
        };
        debug!("{}: {} labels", sequence.designator, anchors.len());

        anchors
    }

    /// `L;` lines for every sequence, upper airways first.
    pub fn label_lines(&self, sequences: &[RouteSequence]) -> Result<Lines, DmsError> {
        let mut ordered: Vec<_> = sequences.iter().collect();
        ordered.sort_by_key(|sequence| sequence.level());

        ordered
            .into_iter()
            .flat_map(|sequence| self.place(sequence))
            .map(|anchor| anchor_line(&anchor))
            .collect()
    }
}

pub fn anchor_line(anchor: &LabelAnchor) -> Result<Line, DmsError> {
    Ok(Line::Label {
        designator: anchor.designator.clone(),
        vertex: Vertex::from_point(anchor.position)?,
    })
}
