use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::Length;
use uom::si::length::kilometer;

use crate::{
    feature::SectorKind,
    geodesy::{EarthModel, EARTH_MEAN_RADIUS_KM},
    label::LabelConfig,
    resolver::TieBreak,
    sequence::SequenceConfig,
    simplify::{PolylineSimplifier, SimplifyMode, Tolerance, DEFAULT_MAX_DEPTH},
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub earth_radius_km: f64,
    pub labels: LabelConfig,
    pub sequence: SequenceConfig,
    /// Sector kinds without an entry are written unsimplified.
    pub sector_simplification: BTreeMap<SectorKind, SimplifyMode>,
    pub simplify_max_depth: usize,
    pub resolver_tie_break: TieBreak,
    /// Only airports and heliports of these FIRs are written.
    pub fir_filter: Option<BTreeSet<String>>,
    /// Heliports with this identifier prefix are national ones.
    pub national_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: EARTH_MEAN_RADIUS_KM,
            labels: LabelConfig::default(),
            sequence: SequenceConfig::default(),
            sector_simplification: BTreeMap::from([
                (
                    SectorKind::Cta,
                    SimplifyMode::Tolerant(Tolerance::Degrees(0.01)),
                ),
                (
                    SectorKind::Atz,
                    SimplifyMode::Tolerant(Tolerance::Degrees(0.001)),
                ),
            ]),
            simplify_max_depth: DEFAULT_MAX_DEPTH,
            resolver_tie_break: TieBreak::default(),
            fir_filter: None,
            national_prefix: "SB".to_string(),
        }
    }
}

impl ExportConfig {
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        [
            ("earth_radius_km", self.earth_radius_km),
            ("labels.min_separation_nm", self.labels.min_separation_nm),
            (
                "labels.min_segment_length_nm",
                self.labels.min_segment_length_nm,
            ),
        ]
        .into_iter()
        .try_for_each(|(field, value)| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NotPositive { field, value })
            }
        })
    }

    pub fn earth(&self) -> EarthModel {
        EarthModel::with_radius(Length::new::<kilometer>(self.earth_radius_km))
    }

    pub fn simplifier(&self, kind: SectorKind) -> Option<PolylineSimplifier> {
        self.sector_simplification.get(&kind).map(|mode| {
            PolylineSimplifier::new(*mode, self.earth()).with_max_depth(self.simplify_max_depth)
        })
    }

    pub fn includes_fir(&self, fir: &str) -> bool {
        self.fir_filter
            .as_ref()
            .is_none_or(|firs| firs.contains(fir))
    }
}
