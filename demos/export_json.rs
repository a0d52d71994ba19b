use std::{env::args_os, io};

use aurora_sectorgen::{ExportConfig, Exporter, Feature};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let path = args_os()
        .nth(1)
        .expect("missing argument: path to features .json");
    let features: Vec<Feature> = serde_json::from_slice(&fs_err::read(path).unwrap()).unwrap();
    let config = args_os().nth(2).map_or_else(ExportConfig::default, |path| {
        ExportConfig::from_json(&fs_err::read(path).unwrap()).unwrap()
    });

    match Exporter::new(config).export(features) {
        Ok(export) => {
            print!("{}", export.all_lines());
            if !export.report.is_clean() {
                eprintln!("{}", serde_json::to_string(&export.report).unwrap());
            }
        }
        Err(e) => eprintln!("{e}"),
    }
}
