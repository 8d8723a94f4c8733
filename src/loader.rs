//! Delimited-text loader for trajectory tables

use crate::error::{LoadError, ParseError};
use crate::record::Record;
use crate::timefmt::TimeNormalizer;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "DateTime",
    "Latitude",
    "Longitude",
    "Radius",
    "Thickness",
    "Mass",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "DateTime")]
    date_time: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Radius")]
    radius: f64,
    #[serde(rename = "Thickness")]
    thickness: f64,
    #[serde(rename = "Mass")]
    mass: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// A row that did not make it into the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub line: u64,
    pub reason: ParseError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub path: PathBuf,
    pub loaded: usize,
    pub dropped: Vec<DroppedRow>,
}

impl LoadReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

#[derive(Debug)]
pub struct Loaded {
    pub records: Vec<Record>,
    pub report: LoadReport,
}

/// Load a table from disk. The whole file is read before returning.
pub fn load_file(path: &Path, options: &LoadOptions, time: &TimeNormalizer) -> Result<Loaded, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(file, path, options, time)
}

/// Load a table from any reader; `origin` is only used in messages.
pub fn load_reader<R: Read>(
    input: R,
    origin: &Path,
    options: &LoadOptions,
    time: &TimeNormalizer,
) -> Result<Loaded, LoadError> {
    let csv_error = |source: csv::Error| LoadError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: origin.to_path_buf(),
                column,
            });
        }
    }

    let mut records = Vec::new();
    let mut report = LoadReport {
        path: origin.to_path_buf(),
        ..LoadReport::default()
    };

    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(csv_error(err)),
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                drop_row(&mut report, line, ParseError::Field(err.to_string()));
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        match parse_row(&row, &headers, time) {
            Ok(record) => records.push(record),
            Err(reason) => drop_row(&mut report, line, reason),
        }
    }

    report.loaded = records.len();
    tracing::info!(
        path = %origin.display(),
        loaded = report.loaded,
        dropped = report.dropped_count(),
        "trajectory table loaded"
    );

    if records.is_empty() {
        return Err(LoadError::NoRecords {
            path: origin.to_path_buf(),
            dropped: report.dropped_count(),
        });
    }

    Ok(Loaded { records, report })
}

fn parse_row(row: &csv::StringRecord, headers: &csv::StringRecord, time: &TimeNormalizer) -> Result<Record, ParseError> {
    let raw: RawRow = row
        .deserialize(Some(headers))
        .map_err(|e| ParseError::Field(e.to_string()))?;

    for (name, value) in [
        ("Latitude", raw.latitude),
        ("Longitude", raw.longitude),
        ("Radius", raw.radius),
        ("Thickness", raw.thickness),
        ("Mass", raw.mass),
    ] {
        if !value.is_finite() {
            return Err(ParseError::Field(format!("{name} is not a finite number")));
        }
    }

    Ok(Record {
        timestamp: time.parse(&raw.date_time)?,
        latitude: raw.latitude,
        longitude: raw.longitude,
        radius: raw.radius,
        thickness: raw.thickness,
        mass: raw.mass,
    })
}

fn drop_row(report: &mut LoadReport, line: u64, reason: ParseError) {
    tracing::warn!(line, %reason, "dropping row");
    report.dropped.push(DroppedRow { line, reason });
}
