//! Trial CSV Ingestion
//!
//! Force-plate exports arrive as semicolon-delimited CSVs with three
//! device-metadata lines above the header row. The loader skips the
//! preamble, zero-bases the elapsed-time channel, and classifies every
//! remaining column as numeric or categorical once, over the whole column,
//! so downstream code can dispatch on the declared schema.

use crate::series::types::{Condition, TimeSeries, TIME_CHANNEL};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Device metadata lines preceding the header row in trial exports.
const SKIP_METADATA_LINES: usize = 3;

/// File-name fragments of non-trial captures living in the same directory.
const SKIP_FILE_FRAGMENTS: &[&str] = &["info", "walking_calibration", "mvc"];

/// Load one trial export into a schema-checked series.
pub fn load_trial_csv(path: &Path) -> crate::Result<TimeSeries> {
    let file = std::fs::File::open(path)?;
    let series = read_trial(BufReader::new(file))
        .map_err(|e| annotate(e, path))?;
    debug!(
        path = %path.display(),
        samples = series.len(),
        numeric = series.schema().numeric.len(),
        categorical = series.schema().categorical.len(),
        "loaded trial"
    );
    Ok(series)
}

/// Load every recognized condition trial from one participant directory.
///
/// Files whose names match none of the condition labels, plus info/
/// calibration captures, are skipped. Results come back in condition
/// order, so batch output is deterministic regardless of directory
/// enumeration order.
pub fn load_participant_dir(dir: &Path) -> crate::Result<Vec<(Condition, TimeSeries)>> {
    if !dir.is_dir() {
        return Err(crate::Error::Ingest(format!(
            "participant directory not found: {}",
            dir.display()
        )));
    }

    let mut trials: Vec<(Condition, TimeSeries)> = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "csv").unwrap_or(false))
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let lowered = name.to_lowercase();
        if SKIP_FILE_FRAGMENTS.iter().any(|f| lowered.contains(f)) {
            debug!(file = %name, "skipping non-trial capture");
            continue;
        }
        match Condition::from_file_name(&name) {
            Some(condition) => {
                let series = load_trial_csv(&path)?;
                trials.push((condition, series));
            }
            None => {
                warn!(file = %name, "no condition label in file name, skipping");
            }
        }
    }

    trials.sort_by_key(|(condition, _)| *condition);
    Ok(trials)
}

/// Parse a trial export from any reader. Split out from the file wrapper
/// so tests can feed in-memory CSVs.
fn read_trial<R: Read>(reader: BufReader<R>) -> crate::Result<TimeSeries> {
    let mut lines = reader.lines();
    for _ in 0..SKIP_METADATA_LINES {
        // A file shorter than the preamble cannot contain a trial
        match lines.next() {
            Some(line) => {
                line?;
            }
            None => {
                return Err(crate::Error::Ingest(
                    "file ends inside the metadata preamble".to_string(),
                ));
            }
        }
    }

    let body: Vec<String> = lines.collect::<Result<_, _>>()?;
    let joined = body.join("\n");
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(false)
        .from_reader(joined.as_bytes());

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let time_idx = headers
        .iter()
        .position(|h| h == TIME_CHANNEL)
        .ok_or_else(|| {
            crate::Error::Ingest(format!("missing required column {TIME_CHANNEL:?}"))
        })?;

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in csv_reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(crate::Error::Ingest(format!(
                "row has {} fields, header has {}",
                record.len(),
                headers.len()
            )));
        }
        for (col, cell) in columns.iter_mut().zip(record.iter()) {
            col.push(cell.trim().to_string());
        }
    }

    if columns[time_idx].is_empty() {
        return Err(crate::Error::Ingest("trial contains no samples".to_string()));
    }

    let raw_time = parse_numeric_column(&columns[time_idx]).ok_or_else(|| {
        crate::Error::Ingest(format!("column {TIME_CHANNEL:?} is not numeric"))
    })?;
    // Zero-base: elapsed time relative to the first sample
    let t0 = raw_time[0];
    let time: Vec<f64> = raw_time.iter().map(|t| t - t0).collect();

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if idx == time_idx {
            continue;
        }
        match parse_numeric_column(&columns[idx]) {
            Some(values) => numeric.push((header.clone(), values)),
            None => categorical.push((header.clone(), std::mem::take(&mut columns[idx]))),
        }
    }

    TimeSeries::new(time, numeric, categorical)
}

/// Parse a whole column as f64, or report it non-numeric.
///
/// Empty cells become NaN (sparse sensor dropouts keep a column numeric);
/// any other unparseable cell makes the column categorical.
fn parse_numeric_column(cells: &[String]) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(cells.len());
    for cell in cells {
        if cell.is_empty() {
            values.push(f64::NAN);
        } else {
            values.push(cell.parse::<f64>().ok()?);
        }
    }
    Some(values)
}

fn annotate(err: crate::Error, path: &Path) -> crate::Error {
    match err {
        crate::Error::Ingest(msg) => {
            crate::Error::Ingest(format!("{}: {msg}", path.display()))
        }
        crate::Error::Series(msg) => {
            crate::Error::Series(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}
