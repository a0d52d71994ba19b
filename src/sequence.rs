use std::collections::{BTreeMap, HashSet};

use bevy_reflect::Reflect;
use geo::Point;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    feature::RouteSegment,
    output::{Line, Lines, Vertex},
    resolver::CoordinateResolver,
};

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    #[default]
    Designator,
    /// Segments without a group id fall back to their designator.
    GroupId,
}

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityPolicy {
    /// Any discontinuity fails the whole build.
    #[default]
    Strict,
    /// Groups with a discontinuity are left out.
    Permissive,
}

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Drop a record equal to the one emitted right before it.
    #[default]
    Adjacent,
    /// Drop every record emitted before, keeping first-seen order.
    GlobalStable,
}

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackSource {
    /// The from and to fix of every segment.
    #[default]
    Fixes,
    /// Every polyline vertex that resolves to a known fix.
    Polyline,
}

#[derive(Clone, Copy, Debug, Reflect, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AirwayLevel {
    Upper,
    Lower,
}

impl AirwayLevel {
    pub fn from_designator(designator: &str) -> Self {
        if designator.starts_with('U') {
            AirwayLevel::Upper
        } else {
            AirwayLevel::Lower
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Reflect, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SequenceConfig {
    pub grouping: GroupingKey,
    pub continuity: ContinuityPolicy,
    pub dedup: DedupPolicy,
    pub track_source: TrackSource,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("sequence error in {group} at index {index}: {expected} -> {found}")]
pub struct SequenceDiscontinuity {
    pub group: String,
    pub index: usize,
    pub expected: String,
    pub found: String,
}

#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("{} airway sequence errors", .0.len())]
    Discontinuities(Vec<SequenceDiscontinuity>),
}

/// The segments of one route, ordered by sequence number.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RouteSequence {
    pub key: String,
    pub designator: String,
    pub segments: Vec<RouteSegment>,
}

impl RouteSequence {
    pub fn level(&self) -> AirwayLevel {
        AirwayLevel::from_designator(&self.designator)
    }

    /// The drawn geometry of all segments, without repeating shared
    /// endpoints.
    pub fn points(&self) -> Vec<Point> {
        self.segments
            .iter()
            .flat_map(|segment| {
                if segment.polyline.is_empty() {
                    vec![segment.from_fix.location, segment.to_fix.location]
                } else {
                    segment.polyline.clone()
                }
            })
            .dedup()
            .collect()
    }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct SequenceOutcome {
    pub sequences: Vec<RouteSequence>,
    /// Discontinuities of the groups left out in permissive mode.
    pub skipped: Vec<SequenceDiscontinuity>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct AirwayRecords {
    pub tracks: Lines,
    pub labels: Lines,
    pub unresolved_points: usize,
}

/// Checks `segment[i].to_fix == segment[i + 1].from_fix` along an ordered
/// group, reporting the index of the segment that does not connect.
pub fn check_continuity(group: &str, segments: &[RouteSegment]) -> Vec<SequenceDiscontinuity> {
    segments
        .iter()
        .tuple_windows()
        .enumerate()
        .filter(|(_, (previous, next))| previous.to_fix.identifier != next.from_fix.identifier)
        .map(|(i, (previous, next))| SequenceDiscontinuity {
            group: group.to_string(),
            index: i + 1,
            expected: previous.to_fix.identifier.clone(),
            found: next.from_fix.identifier.clone(),
        })
        .collect()
}

fn dedup(lines: Vec<Line>, policy: DedupPolicy) -> Lines {
    match policy {
        DedupPolicy::Adjacent => lines.into_iter().dedup().collect(),
        DedupPolicy::GlobalStable => {
            let mut seen = HashSet::new();
            lines
                .into_iter()
                .filter(|line| seen.insert(line.clone()))
                .collect()
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceBuilder {
    config: SequenceConfig,
}

impl SequenceBuilder {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    fn group_key(&self, segment: &RouteSegment) -> String {
        match (self.config.grouping, &segment.group_id) {
            (GroupingKey::GroupId, Some(group_id)) => group_id.clone(),
            _ => segment.designator.clone(),
        }
    }

    /// Groups and orders `segments` and validates every group's continuity.
    pub fn build(
        &self,
        segments: impl IntoIterator<Item = RouteSegment>,
    ) -> Result<SequenceOutcome, SequenceError> {
        let groups = segments
            .into_iter()
            .fold(BTreeMap::<_, Vec<_>>::new(), |mut acc, segment| {
                let key = self.group_key(&segment);
                acc.entry(key).or_default().push(segment);
                acc
            });
        debug!("{} airway groups", groups.len());

        let mut outcome = SequenceOutcome::default();
        let mut errors = vec![];
        for (key, mut segments) in groups {
            // stable, ties keep input order
            segments.sort_by(|a, b| a.sequence.total_cmp(&b.sequence));

            let discontinuities = check_continuity(&key, &segments);
            if discontinuities.is_empty() {
                outcome.sequences.push(RouteSequence {
                    designator: segments
                        .first()
                        .map_or_else(|| key.clone(), |s| s.designator.clone()),
                    key,
                    segments,
                });
                continue;
            }

            for discontinuity in &discontinuities {
                warn!("{discontinuity}");
            }
            match self.config.continuity {
                ContinuityPolicy::Strict => errors.extend(discontinuities),
                ContinuityPolicy::Permissive => {
                    warn!("skipping airway {key}");
                    outcome.skipped.extend(discontinuities);
                }
            }
        }

        if errors.is_empty() {
            Ok(outcome)
        } else {
            Err(SequenceError::Discontinuities(errors))
        }
    }

    fn track_vertices(
        &self,
        segment: &RouteSegment,
        resolver: &CoordinateResolver,
        unresolved: &mut usize,
    ) -> Vec<String> {
        match self.config.track_source {
            TrackSource::Fixes => vec![
                segment.from_fix.identifier.clone(),
                segment.to_fix.identifier.clone(),
            ],
            TrackSource::Polyline => {
                let fixes = resolver.resolve_polyline(&segment.polyline);
                *unresolved += segment.polyline.len() - fixes.len();
                fixes.iter().map(|fix| fix.identifier.clone()).collect()
            }
        }
    }

    /// Track and label records of every sequence, upper airways first.
    pub fn emit(
        &self,
        sequences: &[RouteSequence],
        resolver: &CoordinateResolver,
    ) -> AirwayRecords {
        let mut unresolved_points = 0;
        let mut tracks = vec![];
        let mut labels = vec![];

        for sequence in sequences.iter().sorted_by_key(|sequence| sequence.level()) {
            for segment in &sequence.segments {
                for identifier in self.track_vertices(segment, resolver, &mut unresolved_points) {
                    tracks.push(Line::Track {
                        name: sequence.designator.clone(),
                        vertex: Vertex::Fix(identifier.clone()),
                    });
                    labels.push(Line::Label {
                        designator: sequence.designator.clone(),
                        vertex: Vertex::Fix(identifier),
                    });
                }
            }
        }

        AirwayRecords {
            tracks: dedup(tracks, self.config.dedup),
            labels: dedup(labels, self.config.dedup),
            unresolved_points,
        }
    }
}
