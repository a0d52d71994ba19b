//! Turns aeronautical feature records into the semicolon-delimited lines of a
//! sector file.
//!
//! Fetching and parsing the source data is left to the caller; this crate
//! starts at typed [`Feature`] records and ends at ordered [`output::Line`]s.

pub mod config;
pub mod dms;
pub mod export;
pub mod feature;
pub mod geodesy;
pub mod label;
pub mod output;
pub mod report;
pub mod resolver;
pub mod sequence;
pub mod simplify;

pub use config::ExportConfig;
pub use dms::{Axis, DegMinSec, DegMinSecExt, DmsError};
pub use export::{Export, ExportError, Exporter};
pub use feature::Feature;
pub use report::Report;
