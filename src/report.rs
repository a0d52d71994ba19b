use serde::Serialize;
use tracing::warn;

use crate::{
    feature::{RecordError, SectorKind},
    sequence::SequenceDiscontinuity,
};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SimplificationFallback {
    pub sector: String,
    pub kind: SectorKind,
    pub points: usize,
}

/// Non-fatal issues of one export. Every entry has been logged when it was
/// recorded.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Report {
    /// Records left out entirely.
    pub malformed_records: Vec<RecordError>,
    /// Single boundary or polyline points left out of otherwise valid
    /// records.
    pub invalid_points: Vec<RecordError>,
    pub skipped_groups: Vec<SequenceDiscontinuity>,
    pub unresolved_points: usize,
    pub simplification_fallbacks: Vec<SimplificationFallback>,
}

impl Report {
    pub fn malformed(&mut self, error: RecordError) {
        warn!("skipping record: {error}");
        self.malformed_records.push(error);
    }

    pub fn invalid_point(&mut self, error: RecordError) {
        warn!("skipping point: {error}");
        self.invalid_points.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.malformed_records.len()
            + self.invalid_points.len()
            + self.skipped_groups.len()
            + self.unresolved_points
            + self.simplification_fallbacks.len()
    }
}
