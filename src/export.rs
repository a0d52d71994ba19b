use std::collections::HashSet;

use geo::Point;
use itertools::Itertools as _;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uom::si::length::foot;

use crate::{
    config::ExportConfig,
    dms::{DegMinSec, DegMinSecExt as _, DmsError},
    feature::{
        validate_point, Aerodrome, AerodromeUse, Feature, Fix, FixKind, Heliport, Navaid,
        RecordError, RouteSegment, Sector, SectorKind, Waypoint, WaypointCategory,
    },
    output::{Line, Lines, Vertex},
    report::{Report, SimplificationFallback},
    resolver::CoordinateResolver,
    sequence::{SequenceBuilder, SequenceError},
};

pub const TERMINAL_FIXES: &str = "--TERMINAL FIXES--";
pub const AIRWAY_FIXES: &str = "--AIRWAY FIXES--";

#[derive(Error, Debug)]
pub enum ExportError {
    /// Carries the report collected up to the failure.
    #[error("airways: {source}")]
    Sequence {
        source: SequenceError,
        report: Box<Report>,
    },
    #[error("failed to format {record}: {source}")]
    Format { record: String, source: DmsError },
}

/// Output of one export, section by section.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Export {
    pub airports: Lines,
    pub heliports: Lines,
    pub sectors: Lines,
    pub fixes: Lines,
    /// VORs, then NDBs.
    pub navaids: Lines,
    /// Tracks, then fix labels.
    pub airways: Lines,
    /// Placed airway labels.
    pub labels: Lines,
    pub report: Report,
}

impl Export {
    pub fn all_lines(&self) -> Lines {
        [
            &self.airports,
            &self.heliports,
            &self.sectors,
            &self.fixes,
            &self.navaids,
            &self.airways,
            &self.labels,
        ]
        .into_iter()
        .flat_map(|lines| lines.iter().cloned())
        .collect()
    }
}

fn coordinates(point: Point, record: &str) -> Result<(DegMinSec, DegMinSec), ExportError> {
    let format = |source| ExportError::Format {
        record: record.to_string(),
        source,
    };
    Ok((
        point.lat_dms().map_err(format)?,
        point.lng_dms().map_err(format)?,
    ))
}

fn track(name: &str, point: Point) -> Result<Line, ExportError> {
    Ok(Line::Track {
        name: name.to_string(),
        vertex: Vertex::from_point(point).map_err(|source| ExportError::Format {
            record: name.to_string(),
            source,
        })?,
    })
}

/// Sorts by FIR and identifier and opens every FIR with a header.
fn fir_sections(mut entries: Vec<(String, String, Line)>) -> Lines {
    entries.sort_by(|(fir_a, id_a, _), (fir_b, id_b, _)| (fir_a, id_a).cmp(&(fir_b, id_b)));

    let mut lines = Lines::default();
    for (fir, group) in &entries.into_iter().chunk_by(|(fir, _, _)| fir.clone()) {
        lines.push(Line::FirHeader(fir));
        lines.extend(group.map(|(_, _, line)| line));
    }

    lines
}

/// Keeps input order, except that TMAs take the TMA places in name order.
fn tmas_by_name<'a>(sectors: impl Iterator<Item = &'a Sector>) -> Vec<&'a Sector> {
    let mut sectors: Vec<_> = sectors.collect();
    let is_tma = |sector: &&Sector| sector.kind == SectorKind::Tma;
    let tmas = sectors
        .iter()
        .copied()
        .filter(is_tma)
        .sorted_by(|a, b| a.name.cmp(&b.name));
    for (slot, tma) in sectors.iter_mut().filter(|slot| is_tma(slot)).zip(tmas) {
        *slot = tma;
    }

    sectors
}

/// Keeps the valid points, reporting every other one.
fn valid_points(points: Vec<Point>, record: &str, report: &mut Report) -> Vec<Point> {
    points
        .into_iter()
        .filter_map(|point| {
            validate_point(point, record)
                .map_err(|e| report.invalid_point(e))
                .ok()
        })
        .collect()
}

/// Validated records, sorted by kind.
#[derive(Debug, Default)]
struct Inventory {
    airports: Vec<(Aerodrome, AerodromeUse)>,
    heliports: Vec<Heliport>,
    vors: Vec<Navaid>,
    ndbs: Vec<Navaid>,
    waypoints: Vec<Waypoint>,
    /// VORs, NDBs and waypoints in input order.
    fixes: Vec<Fix>,
    identifiers: HashSet<(FixKind, String)>,
    sectors: Vec<Sector>,
    segments: Vec<RouteSegment>,
}

impl Inventory {
    fn from_features(features: impl IntoIterator<Item = Feature>, report: &mut Report) -> Self {
        let mut inventory = Self::default();
        for feature in features {
            if let Err(e) = inventory.ingest(feature, report) {
                report.malformed(e);
            }
        }
        debug!(
            "{} airports, {} heliports, {} VORs, {} NDBs, {} waypoints, {} sectors, {} airway \
             segments",
            inventory.airports.len(),
            inventory.heliports.len(),
            inventory.vors.len(),
            inventory.ndbs.len(),
            inventory.waypoints.len(),
            inventory.sectors.len(),
            inventory.segments.len()
        );

        inventory
    }

    fn navaid_fix(navaid: &Navaid, kind: FixKind, record: &str) -> Result<Fix, RecordError> {
        if !(navaid.frequency.is_finite() && navaid.frequency > 0.0) {
            return Err(RecordError::malformed(
                record,
                format!("invalid frequency {}", navaid.frequency),
            ));
        }
        Ok(Fix {
            identifier: navaid.identifier.clone(),
            location: validate_point(navaid.location, record)?,
            kind,
        })
    }

    /// Identifiers are unique within a fix kind, the first record wins.
    fn register(&mut self, fix: Fix, record: &str) -> Result<(), RecordError> {
        let key = (fix.kind, fix.identifier.clone());
        if !self.identifiers.insert(key) {
            return Err(RecordError::malformed(record, "duplicate identifier"));
        }
        self.fixes.push(fix);

        Ok(())
    }

    fn ingest(&mut self, feature: Feature, report: &mut Report) -> Result<(), RecordError> {
        let record = feature.to_string();
        if feature.name().trim().is_empty() {
            return Err(RecordError::malformed(record, "missing identifier"));
        }

        match feature {
            Feature::Airport(airport) => {
                validate_point(airport.location, &record)?;
                let usage = airport
                    .usage
                    .parse::<AerodromeUse>()
                    .map_err(|e| RecordError::malformed(&record, e.to_string()))?;
                self.airports.push((airport, usage));
            }
            Feature::Heliport(heliport) => {
                validate_point(heliport.location, &record)?;
                self.heliports.push(heliport);
            }
            Feature::Vor(vor) => {
                self.register(Self::navaid_fix(&vor, FixKind::Vor, &record)?, &record)?;
                self.vors.push(vor);
            }
            Feature::Ndb(ndb) => {
                self.register(Self::navaid_fix(&ndb, FixKind::Ndb, &record)?, &record)?;
                self.ndbs.push(ndb);
            }
            Feature::Waypoint(waypoint) => {
                waypoint
                    .category
                    .parse::<WaypointCategory>()
                    .map_err(|e| RecordError::malformed(&record, e.to_string()))?;
                let fix = Fix {
                    identifier: waypoint.identifier.clone(),
                    location: validate_point(waypoint.location, &record)?,
                    kind: FixKind::Waypoint,
                };
                self.register(fix, &record)?;
                self.waypoints.push(waypoint);
            }
            Feature::Sector(mut sector) => {
                sector.boundary = valid_points(sector.boundary, &record, report);
                if sector.boundary.len() < 2 {
                    return Err(RecordError::malformed(
                        record,
                        "fewer than 2 valid boundary points",
                    ));
                }
                self.sectors.push(sector);
            }
            Feature::AirwaySegment(mut segment) => {
                if !segment.sequence.is_finite() {
                    return Err(RecordError::malformed(record, "sequence number is not finite"));
                }
                validate_point(segment.from_fix.location, &record)?;
                validate_point(segment.to_fix.location, &record)?;
                let supplied = segment.polyline.len();
                segment.polyline = valid_points(segment.polyline, &record, report);
                if supplied > 0 && segment.polyline.len() < 2 {
                    return Err(RecordError::malformed(
                        record,
                        "fewer than 2 valid polyline points",
                    ));
                }
                self.segments.push(segment);
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn airports(&self, airports: &[(Aerodrome, AerodromeUse)]) -> Result<Lines, ExportError> {
        let entries = airports
            .iter()
            .filter(|(airport, _)| self.config.includes_fir(&airport.fir))
            .map(|(airport, usage)| {
                let (lat, lng) = coordinates(airport.location, &airport.identifier)?;
                Ok::<_, ExportError>((
                    airport.fir.clone(),
                    airport.identifier.clone(),
                    Line::Aerodrome {
                        identifier: airport.identifier.clone(),
                        elevation_ft: airport.elevation.get::<foot>().round() as i32,
                        lat,
                        lng,
                        name: airport.name.clone(),
                        suffix: usage.name_suffix(),
                        type_code: Some(usage.type_code()),
                    },
                ))
            })
            .collect::<Result<_, ExportError>>()?;

        Ok(fir_sections(entries))
    }

    fn heliports(&self, heliports: &[Heliport]) -> Result<Lines, ExportError> {
        let entries = heliports
            .iter()
            .filter(|heliport| self.config.includes_fir(&heliport.fir))
            .map(|heliport| {
                let (lat, lng) = coordinates(heliport.location, &heliport.identifier)?;
                let national = heliport
                    .identifier
                    .starts_with(&self.config.national_prefix);
                Ok::<_, ExportError>((
                    heliport.fir.clone(),
                    heliport.identifier.clone(),
                    Line::Aerodrome {
                        identifier: heliport.identifier.clone(),
                        elevation_ft: heliport.elevation.get::<foot>().round() as i32,
                        lat,
                        lng,
                        name: heliport.name.clone(),
                        suffix: if national { 2 } else { 1 },
                        type_code: None,
                    },
                ))
            })
            .collect::<Result<_, ExportError>>()?;

        Ok(fir_sections(entries))
    }

    fn simplified(&self, sector: &Sector, report: &mut Report) -> Vec<Point> {
        let Some(simplifier) = self.config.simplifier(sector.kind) else {
            return sector.boundary.clone();
        };

        simplifier.try_simplify(&sector.boundary).unwrap_or_else(|e| {
            warn!("{:?} {}: {e}, keeping all points", sector.kind, sector.name);
            report.simplification_fallbacks.push(SimplificationFallback {
                sector: sector.name.clone(),
                kind: sector.kind,
                points: sector.boundary.len(),
            });
            sector.boundary.clone()
        })
    }

    /// Sector tracks grouped by FIR, FIRs in order of first appearance.
    fn sectors(&self, sectors: &[Sector], report: &mut Report) -> Result<Lines, ExportError> {
        let mut lines = Lines::default();
        for fir in sectors.iter().map(|sector| &sector.related_fir).unique() {
            if !fir.is_empty() {
                lines.push(Line::FirHeader(fir.clone()));
            }
            let in_fir = sectors.iter().filter(|sector| &sector.related_fir == fir);
            for sector in tmas_by_name(in_fir) {
                let name = sector.kind.track_name(&sector.name);
                let points = self.simplified(sector, report);
                debug!(
                    "{name}: {} of {} points",
                    points.len(),
                    sector.boundary.len()
                );
                for point in points {
                    lines.push(track(&name, point)?);
                }
            }
        }

        Ok(lines)
    }

    /// Terminal fixes, then the fixes used by airways.
    fn fixes(waypoints: &[Waypoint], segments: &[RouteSegment]) -> Result<Lines, ExportError> {
        let airway_fixes: HashSet<_> = segments
            .iter()
            .flat_map(|segment| [&segment.from_fix.identifier, &segment.to_fix.identifier])
            .collect();
        let (airway, terminal): (Vec<_>, Vec<_>) = waypoints
            .iter()
            .sorted_by(|a, b| a.identifier.cmp(&b.identifier))
            .partition(|waypoint| airway_fixes.contains(&waypoint.identifier));

        let mut lines = Lines::default();
        let sections = [(TERMINAL_FIXES, terminal, 1), (AIRWAY_FIXES, airway, 0)];
        for (section, waypoints, code) in sections {
            lines.push(Line::Section(section.to_string()));
            for waypoint in waypoints {
                let (lat, lng) = coordinates(waypoint.location, &waypoint.identifier)?;
                lines.push(Line::Fix {
                    identifier: waypoint.identifier.clone(),
                    lat,
                    lng,
                    code,
                });
            }
        }

        Ok(lines)
    }

    fn navaids(vors: &[Navaid], ndbs: &[Navaid]) -> Result<Lines, ExportError> {
        let vors = vors
            .iter()
            .sorted_by(|a, b| a.identifier.cmp(&b.identifier))
            .map(|vor| (vor, format!("{:.2}", vor.frequency)));
        let ndbs = ndbs
            .iter()
            .sorted_by(|a, b| a.identifier.cmp(&b.identifier))
            .map(|ndb| (ndb, format!("{:.1}", ndb.frequency)));

        vors.chain(ndbs)
            .map(|(navaid, frequency)| {
                let (lat, lng) = coordinates(navaid.location, &navaid.identifier)?;
                Ok::<_, ExportError>(Line::Navaid {
                    identifier: navaid.identifier.clone(),
                    frequency,
                    lat,
                    lng,
                })
            })
            .collect()
    }

    pub fn export(
        &self,
        features: impl IntoIterator<Item = Feature>,
    ) -> Result<Export, ExportError> {
        let mut report = Report::default();
        let inventory = Inventory::from_features(features, &mut report);
        let resolver =
            CoordinateResolver::new(inventory.fixes.clone(), self.config.resolver_tie_break);

        let builder = SequenceBuilder::new(self.config.sequence);
        let outcome = match builder.build(inventory.segments.iter().cloned()) {
            Ok(outcome) => outcome,
            Err(source) => {
                return Err(ExportError::Sequence {
                    source,
                    report: Box::new(report),
                });
            }
        };
        report.skipped_groups = outcome.skipped;
        let records = builder.emit(&outcome.sequences, &resolver);
        report.unresolved_points += records.unresolved_points;
        let mut airways = records.tracks;
        airways.extend(records.labels);

        let labels = self
            .config
            .labels
            .placer(self.config.earth())
            .label_lines(&outcome.sequences)
            .map_err(|source| ExportError::Format {
                record: "airway labels".to_string(),
                source,
            })?;

        let export = Export {
            airports: self.airports(&inventory.airports)?,
            heliports: self.heliports(&inventory.heliports)?,
            sectors: self.sectors(&inventory.sectors, &mut report)?,
            fixes: Self::fixes(&inventory.waypoints, &inventory.segments)?,
            navaids: Self::navaids(&inventory.vors, &inventory.ndbs)?,
            airways,
            labels,
            report,
        };
        if !export.report.is_clean() {
            warn!(
                "export finished with {} issues",
                export.report.issue_count()
            );
        }

        Ok(export)
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use geo::{point, Point};
    use itertools::Itertools as _;
    use pretty_assertions_sorted::assert_eq;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    use super::{ExportError, Exporter};
    use crate::{
        config::ExportConfig,
        feature::{
            Aerodrome, Feature, Fix, FixKind, Heliport, Navaid, RecordError, RouteSegment, Sector,
            SectorKind, Waypoint,
        },
        sequence::{ContinuityPolicy, SequenceError, TrackSource},
    };

    /// Airport at `elevation` metres. `site` is the FIR and the location.
    fn airport(
        identifier: &str,
        name: &str,
        site: (&str, Point),
        elevation: f64,
        usage: &str,
    ) -> Feature {
        let (fir, location) = site;
        Feature::Airport(Aerodrome {
            identifier: identifier.to_string(),
            name: name.to_string(),
            fir: fir.to_string(),
            elevation: Length::new::<meter>(elevation),
            location,
            usage: usage.to_string(),
        })
    }

    fn heliport(identifier: &str, name: &str, elevation: f64, location: Point) -> Feature {
        Feature::Heliport(Heliport {
            identifier: identifier.to_string(),
            name: name.to_string(),
            fir: "SBBS".to_string(),
            elevation: Length::new::<meter>(elevation),
            location,
        })
    }

    fn navaid(identifier: &str, frequency: f64, location: Point) -> Navaid {
        Navaid {
            identifier: identifier.to_string(),
            frequency,
            location,
        }
    }

    fn waypoint(identifier: &str, location: Point, category: &str) -> Feature {
        Feature::Waypoint(Waypoint {
            identifier: identifier.to_string(),
            location,
            category: category.to_string(),
        })
    }

    fn fix(identifier: &str, location: Point, kind: FixKind) -> Fix {
        Fix {
            identifier: identifier.to_string(),
            location,
            kind,
        }
    }

    fn segment(
        designator: &str,
        sequence: f64,
        from_fix: Fix,
        to_fix: Fix,
        polyline: bool,
    ) -> Feature {
        Feature::AirwaySegment(RouteSegment {
            designator: designator.to_string(),
            group_id: None,
            sequence,
            polyline: if polyline {
                vec![from_fix.location, to_fix.location]
            } else {
                vec![]
            },
            from_fix,
            to_fix,
            route_distance: None,
        })
    }

    fn sector(name: &str, fir: &str, kind: SectorKind, boundary: Vec<Point>) -> Feature {
        Feature::Sector(Sector {
            name: name.to_string(),
            related_fir: fir.to_string(),
            kind,
            boundary,
        })
    }

    fn isopo() -> Fix {
        fix("ISOPO", point! { x: -46.0, y: -23.0 }, FixKind::Waypoint)
    }

    fn ugnol() -> Fix {
        fix("UGNOL", point! { x: -45.5, y: -22.5 }, FixKind::Waypoint)
    }

    fn scb() -> Fix {
        fix("SCB", point! { x: -46.5, y: -23.0 }, FixKind::Vor)
    }

    fn bs(lon: f64, lat: f64) -> (&'static str, Point) {
        ("SBBS", point! { x: lon, y: lat })
    }

    fn features() -> Vec<Feature> {
        vec![
            airport("SBSP", "CONGONHAS", bs(-46.75, -23.5), 802.0, "PUB"),
            airport("SBGR", "GUARULHOS", bs(-46.5, -23.25), 750.0, "PUB/MIL"),
            airport(
                "SBAF",
                "CAMPO DOS AFONSOS",
                ("SBRE", point! { x: -43.25, y: -22.75 }),
                10.0,
                "MIL",
            ),
            airport("SDXX", "FAZENDA", bs(-47.0, -22.0), 500.0, "PRIV"),
            airport("SBZZ", "SAZONAL", bs(-47.0, -22.0), 0.0, "SEASONAL"),
            airport("SBYY", "FORA", bs(-47.0, -92.0), 0.0, "PUB"),
            heliport("SJHC", "HELIPONTO", 3.0, point! { x: -46.5, y: -23.75 }),
            heliport("SBHE", "HELI SB", 0.0, point! { x: -46.0, y: -24.0 }),
            Feature::Vor(navaid("SCB", 112.7, scb().location)),
            Feature::Vor(navaid("BGC", 116.9, point! { x: -47.25, y: -22.5 })),
            Feature::Ndb(navaid("RC", 275.0, point! { x: -47.5, y: -22.25 })),
            waypoint("UGNOL", ugnol().location, "ICAO"),
            waypoint("ISOPO", isopo().location, "ICAO"),
            waypoint("ALPHA", point! { x: -46.25, y: -23.25 }, "TERMINAL"),
            waypoint("BRAVO", point! { x: -46.25, y: -23.5 }, "VFR"),
            sector(
                "BRASILIA 1",
                "SBBS",
                SectorKind::Cta,
                vec![
                    point! { x: -47.0, y: -15.0 },
                    point! { x: -46.0, y: -15.001 },
                    point! { x: -45.0, y: -15.0 },
                    point! { x: -45.0, y: -16.0 },
                    point! { x: -47.0, y: -16.0 },
                    point! { x: -47.0, y: -15.0 },
                    point! { x: -47.0, y: 95.0 },
                ],
            ),
            sector(
                "CURITIBA",
                "SBCW",
                SectorKind::Tma,
                vec![point! { x: -49.0, y: -25.0 }, point! { x: -49.5, y: -25.5 }],
            ),
            sector(
                "SAO PAULO",
                "SBBS",
                SectorKind::Ctr,
                vec![
                    point! { x: -46.5, y: -23.5 },
                    point! { x: -46.25, y: -23.5 },
                    point! { x: -46.5, y: -23.75 },
                ],
            ),
            segment("W10", 1.0, ugnol(), scb(), false),
            segment("UZ6", 1.0, isopo(), ugnol(), true),
        ]
    }

    fn export() -> super::Export {
        Exporter::default().export(features()).unwrap()
    }

    #[test]
    fn test_airports() {
        assert_eq!(
            export().airports.to_strings(),
            vec![
                "//FIR SBBS",
                "SBGR;2461;0;S023.15.00.000;W046.30.00.000;GUARULHOS;2;0;",
                "SBSP;2631;0;S023.30.00.000;W046.45.00.000;CONGONHAS;2;0;",
                "SDXX;1640;0;S022.00.00.000;W047.00.00.000;FAZENDA;1;3;",
                "//FIR SBRE",
                "SBAF;33;0;S022.45.00.000;W043.15.00.000;CAMPO DOS AFONSOS;2;2;",
            ]
        );
    }

    #[test]
    fn test_fir_filter() {
        let exporter = Exporter::new(ExportConfig {
            fir_filter: Some(BTreeSet::from(["SBRE".to_string()])),
            ..Default::default()
        });
        let export = exporter.export(features()).unwrap();
        assert_eq!(
            export.airports.to_strings(),
            vec![
                "//FIR SBRE",
                "SBAF;33;0;S022.45.00.000;W043.15.00.000;CAMPO DOS AFONSOS;2;2;",
            ]
        );
        assert!(export.heliports.is_empty());
    }

    #[test]
    fn test_heliports() {
        assert_eq!(
            export().heliports.to_strings(),
            vec![
                "//FIR SBBS",
                "SBHE;0;0;S024.00.00.000;W046.00.00.000;HELI SB;2;",
                "SJHC;10;0;S023.45.00.000;W046.30.00.000;HELIPONTO;1;",
            ]
        );
    }

    #[test]
    fn test_sectors() {
        assert_eq!(
            export().sectors.to_strings(),
            vec![
                "//FIR SBBS",
                "T;CTA BRASILIA 1;S015.00.00.000;W047.00.00.000;",
                "T;CTA BRASILIA 1;S015.00.00.000;W045.00.00.000;",
                "T;CTA BRASILIA 1;S016.00.00.000;W045.00.00.000;",
                "T;CTA BRASILIA 1;S016.00.00.000;W047.00.00.000;",
                "T;CTA BRASILIA 1;S015.00.00.000;W047.00.00.000;",
                "T;CTR SAO PAULO;S023.30.00.000;W046.30.00.000;",
                "T;CTR SAO PAULO;S023.30.00.000;W046.15.00.000;",
                "T;CTR SAO PAULO;S023.45.00.000;W046.30.00.000;",
                "//FIR SBCW",
                "T;CURITIBA;S025.00.00.000;W049.00.00.000;",
                "T;CURITIBA;S025.30.00.000;W049.30.00.000;",
            ]
        );
    }

    #[test]
    fn test_fixes_and_navaids() {
        let export = export();
        assert_eq!(
            export.fixes.to_strings(),
            vec![
                "//--TERMINAL FIXES--",
                "ALPHA;S023.15.00.000;W046.15.00.000;1;",
                "//--AIRWAY FIXES--",
                "ISOPO;S023.00.00.000;W046.00.00.000;0;",
                "UGNOL;S022.30.00.000;W045.30.00.000;0;",
            ]
        );
        assert_eq!(
            export.navaids.to_strings(),
            vec![
                "BGC;116.90;S022.30.00.000;W047.15.00.000;",
                "SCB;112.70;S023.00.00.000;W046.30.00.000;",
                "RC;275.0;S022.15.00.000;W047.30.00.000;",
            ]
        );
    }

    #[test]
    fn test_duplicate_identifiers() {
        let mut features = features();
        features.push(waypoint("ISOPO", point! { x: -40.0, y: -23.0 }, "ICAO"));
        // other kinds may reuse an identifier
        let ndb = navaid("SCB", 330.0, point! { x: -46.0, y: -22.0 });
        features.push(Feature::Ndb(ndb));

        let export = Exporter::default().export(features).unwrap();
        assert_eq!(
            export.fixes.to_strings(),
            vec![
                "//--TERMINAL FIXES--",
                "ALPHA;S023.15.00.000;W046.15.00.000;1;",
                "//--AIRWAY FIXES--",
                "ISOPO;S023.00.00.000;W046.00.00.000;0;",
                "UGNOL;S022.30.00.000;W045.30.00.000;0;",
            ]
        );
        assert_eq!(
            export.navaids.to_strings(),
            vec![
                "BGC;116.90;S022.30.00.000;W047.15.00.000;",
                "SCB;112.70;S023.00.00.000;W046.30.00.000;",
                "RC;275.0;S022.15.00.000;W047.30.00.000;",
                "SCB;330.0;S022.00.00.000;W046.00.00.000;",
            ]
        );
        let skipped = &export.report.malformed_records;
        assert_eq!(skipped.len(), 4);
        assert_eq!(
            skipped[3].to_string(),
            "malformed record waypoint ISOPO: duplicate identifier"
        );
    }

    #[test]
    fn test_tmas_by_name() {
        let edge = vec![point! { x: -49.0, y: -25.0 }; 2];
        let features = vec![
            sector("ZULU", "SBCW", SectorKind::Tma, edge.clone()),
            sector("LONDRINA", "SBCW", SectorKind::Ctr, edge.clone()),
            sector("ALFA", "SBCW", SectorKind::Tma, edge),
        ];
        let export = Exporter::default().export(features).unwrap();
        let names: Vec<_> = export
            .sectors
            .to_strings()
            .into_iter()
            .map(|line| line.split(';').take(2).join(";"))
            .dedup()
            .collect();
        assert_eq!(
            names,
            vec!["//FIR SBCW", "T;ALFA", "T;CTR LONDRINA", "T;ZULU"]
        );
    }

    #[test]
    fn test_airways_and_labels() {
        let export = export();
        assert_eq!(
            export.airways.to_strings(),
            vec![
                "T;UZ6;ISOPO;ISOPO;",
                "T;UZ6;UGNOL;UGNOL;",
                "T;W10;UGNOL;UGNOL;",
                "T;W10;SCB;SCB;",
                "L;UZ6;ISOPO;ISOPO;",
                "L;UZ6;UGNOL;UGNOL;",
                "L;W10;UGNOL;UGNOL;",
                "L;W10;SCB;SCB;",
            ]
        );
        assert_eq!(
            export.labels.to_strings(),
            vec![
                "L;UZ6;S022.45.00.000;W045.45.00.000;",
                "L;W10;S022.45.00.000;W046.00.00.000;",
            ]
        );
    }

    #[test]
    fn test_report() {
        let report = export().report;
        let skipped: Vec<_> = report
            .malformed_records
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            skipped,
            vec![
                "malformed record airport SBZZ: unknown aerodrome use code \"SEASONAL\"",
                "invalid coordinate in airport SBYY: lat -92, lon -47",
                "malformed record waypoint BRAVO: unknown waypoint category code \"VFR\"",
            ]
        );
        assert_eq!(
            report.invalid_points,
            vec![RecordError::InvalidCoordinate {
                record: "sector BRASILIA 1".to_string(),
                lat: 95.0,
                lon: -47.0,
            }]
        );
        assert!(report.skipped_groups.is_empty());
        assert_eq!(report.unresolved_points, 0);
        assert!(report.simplification_fallbacks.is_empty());
        assert_eq!(report.issue_count(), 4);
    }

    #[test]
    fn test_all_lines_order() {
        let export = export();
        let all = export.all_lines();
        assert_eq!(
            all.len(),
            export.airports.len()
                + export.heliports.len()
                + export.sectors.len()
                + export.fixes.len()
                + export.navaids.len()
                + export.airways.len()
                + export.labels.len()
        );
        assert_eq!(all.first(), export.airports.first());
        assert_eq!(all.last(), export.labels.last());
    }

    #[test]
    fn test_discontinuity() {
        let mut features = features();
        features.push(segment("W10", 2.0, isopo(), ugnol(), false));

        let Err(ExportError::Sequence { source, report }) =
            Exporter::default().export(features.clone())
        else {
            panic!("expected a sequence error");
        };
        assert!(matches!(
            source,
            SequenceError::Discontinuities(ref errors) if errors.len() == 1
        ));
        // the records skipped before the airways are kept
        assert_eq!(report.malformed_records.len(), 3);
        assert_eq!(report.invalid_points.len(), 1);

        let exporter = Exporter::new(ExportConfig {
            sequence: crate::sequence::SequenceConfig {
                continuity: ContinuityPolicy::Permissive,
                ..Default::default()
            },
            ..Default::default()
        });
        let export = exporter.export(features).unwrap();
        assert_eq!(
            export.airways.to_strings(),
            vec![
                "T;UZ6;ISOPO;ISOPO;",
                "T;UZ6;UGNOL;UGNOL;",
                "L;UZ6;ISOPO;ISOPO;",
                "L;UZ6;UGNOL;UGNOL;",
            ]
        );
        assert_eq!(export.report.skipped_groups.len(), 1);
        assert_eq!(export.report.skipped_groups[0].group, "W10");
        assert_eq!(export.report.skipped_groups[0].expected, "SCB");
        assert_eq!(export.report.skipped_groups[0].found, "ISOPO");
    }

    #[test]
    fn test_polyline_tracks() {
        let exporter = Exporter::new(ExportConfig {
            sequence: crate::sequence::SequenceConfig {
                track_source: TrackSource::Polyline,
                ..Default::default()
            },
            ..Default::default()
        });
        let export = exporter.export(features()).unwrap();
        // W10 has no geometry
        assert_eq!(
            export.airways.to_strings(),
            vec![
                "T;UZ6;ISOPO;ISOPO;",
                "T;UZ6;UGNOL;UGNOL;",
                "L;UZ6;ISOPO;ISOPO;",
                "L;UZ6;UGNOL;UGNOL;",
            ]
        );
        assert_eq!(export.report.unresolved_points, 0);
    }

    #[test]
    fn test_simplification_fallback() {
        let exporter = Exporter::new(ExportConfig {
            simplify_max_depth: 0,
            ..Default::default()
        });
        let export = exporter.export(features()).unwrap();
        let fallbacks = &export.report.simplification_fallbacks;
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].sector, "BRASILIA 1");
        assert_eq!(fallbacks[0].points, 6);
        assert_eq!(
            export
                .sectors
                .iter()
                .filter(|line| line.to_string().starts_with("T;CTA"))
                .count(),
            6
        );
    }

    #[test]
    fn test_demo_features() {
        let features: Vec<Feature> =
            serde_json::from_slice(include_bytes!("../demos/features.json")).unwrap();
        let export = Exporter::default().export(features).unwrap();
        assert!(export.report.is_clean(), "{:?}", export.report);
        assert!(!export.airports.is_empty());
        assert!(!export.sectors.is_empty());
        assert!(!export.airways.is_empty());
        assert!(!export.labels.is_empty());
    }
}
