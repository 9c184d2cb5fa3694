//! Parsing of the exported track text into samples.
//!
//! Rows look like `"1754543792","""49.972678,36.301253""","37911894"`: a timestamp, the
//! coordinates quoted once more inside a quoted field, and an odometer reading or `null`.
//! Bad rows are dropped one at a time, a broken export still yields whatever is readable.

use thiserror::Error;
use tracing::{debug, info};

use crate::sample::Sample;

const ODOMETER_NULL: &str = "null";

#[derive(Debug, Error, PartialEq)]
enum RowError {
    #[error("expected at least 3 fields, found {0}")]
    FieldCount(usize),
    #[error("timestamp {0:?} is not a usable number")]
    Timestamp(String),
    #[error("location {0:?} is not a lat,lng pair")]
    Location(String),
    #[error("unreadable row: {0}")]
    Csv(String),
}

/// Parses the whole payload, header row included, into samples sorted by timestamp.
pub fn parse(text: &str) -> Vec<Sample> {
    let mut samples = Vec::new();
    let mut dropped = 0;
    // the first line is the header
    for (number, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                dropped += 1;
                debug!(line = number + 1, "dropping row: {e}");
            }
        }
    }

    // stable, so equal timestamps keep their input order
    samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    info!(count = samples.len(), dropped, "loaded samples");
    samples
}

// one reader per line, an unbalanced quote cannot run on into the next row
fn parse_line(line: &str) -> Result<Sample, RowError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => parse_row(&record),
        Some(Err(e)) => Err(RowError::Csv(e.to_string())),
        None => Err(RowError::FieldCount(0)),
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<Sample, RowError> {
    if record.len() < 3 {
        return Err(RowError::FieldCount(record.len()));
    }

    let timestamp = parse_timestamp(&record[0])?;
    let (latitude, longitude) = parse_location(&record[1])?;
    let odometer = parse_odometer(&record[2]);

    Sample::new(timestamp, latitude, longitude, odometer)
        .ok_or_else(|| RowError::Timestamp(record[0].to_string()))
}

fn parse_timestamp(field: &str) -> Result<f64, RowError> {
    strip_quotes(field)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .ok_or_else(|| RowError::Timestamp(field.to_string()))
}

fn parse_location(field: &str) -> Result<(f64, f64), RowError> {
    let err = || RowError::Location(field.to_string());

    let stripped = strip_quotes(field);
    let parts: Vec<_> = stripped.split(',').collect();
    let [lat, lng] = parts.as_slice() else {
        return Err(err());
    };

    let lat: f64 = lat.trim().parse().map_err(|_| err())?;
    let lng: f64 = lng.trim().parse().map_err(|_| err())?;
    if !lat.is_finite() || !lng.is_finite() {
        return Err(err());
    }
    Ok((lat, lng))
}

// decimals are truncated toward zero, anything else that is not a number counts as no
// reading, the fix itself is still good
fn parse_odometer(field: &str) -> Option<i64> {
    let field = strip_quotes(field);
    let field = field.trim();
    if field == ODOMETER_NULL {
        return None;
    }
    field.parse().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(|x| x.trunc() as i64)
    })
}

// the csv reader removes one quoting layer, the exporter sometimes adds another
fn strip_quotes(field: &str) -> String {
    field.replace('"', "")
}
