//! Jump Table Persistence
//!
//! The segmenter's output is persisted as one CSV per participant, one row
//! per jump record, and re-read later by the normalization pass. The table
//! is the handover artifact between the two passes: writing a record and
//! reading it back must preserve every field to 4-decimal precision.

use crate::segmentation::JumpRecord;
use crate::series::Condition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decimal places kept when persisting time fields.
const TIME_DECIMALS: f64 = 10_000.0;

/// One CSV row. Field order defines the column order of the artifact.
#[derive(Debug, Serialize, Deserialize)]
struct TableRow {
    condition: Condition,
    jump_nr: u32,
    start_ana: f64,
    end_ana: f64,
    window_duration: f64,
    flight_duration: f64,
    takeoff_time: f64,
    landing_time: f64,
    clipped: bool,
}

impl TableRow {
    fn from_record(record: &JumpRecord) -> Self {
        Self {
            condition: record.condition,
            jump_nr: record.index,
            start_ana: round4(record.start_ana),
            end_ana: round4(record.end_ana),
            window_duration: round4(record.window_duration),
            flight_duration: round4(record.flight_duration),
            takeoff_time: round4(record.takeoff_time),
            landing_time: round4(record.landing_time),
            clipped: record.clipped,
        }
    }

    fn into_record(self) -> JumpRecord {
        JumpRecord {
            index: self.jump_nr,
            condition: self.condition,
            takeoff_time: self.takeoff_time,
            landing_time: self.landing_time,
            flight_duration: self.flight_duration,
            start_ana: self.start_ana,
            end_ana: self.end_ana,
            window_duration: self.window_duration,
            clipped: self.clipped,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * TIME_DECIMALS).round() / TIME_DECIMALS
}

/// All jump records of one participant, across conditions.
#[derive(Debug, Clone)]
pub struct JumpTable {
    participant: String,
    records: Vec<JumpRecord>,
}

impl JumpTable {
    /// Create an empty table for one participant.
    pub fn new(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            records: Vec::new(),
        }
    }

    /// The owning participant.
    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Append the records of one segmented trial.
    pub fn extend(&mut self, records: Vec<JumpRecord>) {
        self.records.extend(records);
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[JumpRecord] {
        &self.records
    }

    /// Number of records across all conditions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no jumps were recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one condition, chronological.
    pub fn jumps_for(&self, condition: Condition) -> Vec<&JumpRecord> {
        self.records
            .iter()
            .filter(|r| r.condition == condition)
            .collect()
    }

    /// Look up one record. A missing entry is a fatal lookup error: the
    /// jump table is a required precomputed artifact.
    pub fn lookup(&self, condition: Condition, index: u32) -> crate::Result<&JumpRecord> {
        self.records
            .iter()
            .find(|r| r.condition == condition && r.index == index)
            .ok_or_else(|| {
                crate::Error::Table(format!(
                    "no jump table entry for {} jump {} (participant {})",
                    condition, index, self.participant
                ))
            })
    }

    /// Path of the table artifact for a participant.
    pub fn path_for(dir: &Path, participant: &str) -> PathBuf {
        dir.join(format!("{participant}_jumps.csv"))
    }

    /// Write the table, rounding time fields to 4 decimals.
    pub fn save(&self, dir: &Path) -> crate::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = Self::path_for(dir, &self.participant);
        let mut writer = csv::Writer::from_path(&path)?;
        for record in &self.records {
            writer.serialize(TableRow::from_record(record))?;
        }
        writer.flush()?;
        info!(
            participant = %self.participant,
            jumps = self.records.len(),
            path = %path.display(),
            "wrote jump table"
        );
        Ok(path)
    }

    /// Read a participant's table back. A missing file is fatal for the
    /// requesting unit.
    pub fn load(dir: &Path, participant: &str) -> crate::Result<Self> {
        let path = Self::path_for(dir, participant);
        if !path.exists() {
            return Err(crate::Error::Table(format!(
                "jump table not found: {}",
                path.display()
            )));
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut records = Vec::new();
        for row in reader.deserialize::<TableRow>() {
            records.push(row?.into_record());
        }
        debug!(
            participant = %participant,
            jumps = records.len(),
            "loaded jump table"
        );
        Ok(Self {
            participant: participant.to_string(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(condition: Condition, index: u32, takeoff: f64) -> JumpRecord {
        let landing = takeoff + 0.5;
        JumpRecord {
            index,
            condition,
            takeoff_time: takeoff,
            landing_time: landing,
            flight_duration: landing - takeoff,
            start_ana: (takeoff - 0.75).max(0.0),
            end_ana: landing + 0.75,
            window_duration: landing + 0.75 - (takeoff - 0.75).max(0.0),
            clipped: takeoff < 0.75,
        }
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(1.23456789), 1.2346);
        assert_eq!(round4(0.1), 0.1);
        assert_eq!(round4(-2.00005), -2.0);
    }

    #[test]
    fn test_lookup_by_condition_and_index() {
        let mut table = JumpTable::new("ID_1");
        table.extend(vec![
            make_record(Condition::Real1, 1, 2.0),
            make_record(Condition::Real1, 2, 6.0),
            make_record(Condition::Vr1, 1, 3.0),
        ]);

        let jump = table.lookup(Condition::Real1, 2).unwrap();
        assert_eq!(jump.takeoff_time, 6.0);

        assert_eq!(table.jumps_for(Condition::Real1).len(), 2);
        assert_eq!(table.jumps_for(Condition::Vr1).len(), 1);
        assert_eq!(table.jumps_for(Condition::Vr2).len(), 0);
    }

    #[test]
    fn test_missing_entry_is_fatal() {
        let table = JumpTable::new("ID_1");
        let result = table.lookup(Condition::Real1, 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = JumpTable::new("ID_3");
        table.extend(vec![
            make_record(Condition::Real1, 1, 2.5),
            make_record(Condition::Vr2, 1, 4.25),
        ]);

        let path = table.save(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("ID_3_jumps.csv"));

        let loaded = JumpTable::load(dir.path(), "ID_3").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.records(), table.records());
    }

    #[test]
    fn test_roundtrip_rounds_to_four_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = JumpTable::new("ID_4");

        // Full-precision values as the segmenter produces them
        let mut record = make_record(Condition::Real2, 1, 2.0);
        record.takeoff_time = 2.123456789;
        record.landing_time = 2.523456789;
        record.flight_duration = 0.400000000123;
        table.extend(vec![record]);

        table.save(dir.path()).unwrap();
        let loaded = JumpTable::load(dir.path(), "ID_4").unwrap();
        let jump = loaded.lookup(Condition::Real2, 1).unwrap();

        assert_eq!(jump.takeoff_time, 2.1235);
        assert_eq!(jump.landing_time, 2.5235);
        assert_eq!(jump.flight_duration, 0.4);
    }

    #[test]
    fn test_saved_values_are_stable_across_rewrites() {
        // Rounding is idempotent: saving a loaded table changes nothing
        let dir = tempfile::tempdir().unwrap();
        let mut table = JumpTable::new("ID_5");
        let mut record = make_record(Condition::Vr1, 1, 1.0);
        record.takeoff_time = 1.00009;
        table.extend(vec![record]);

        table.save(dir.path()).unwrap();
        let first = JumpTable::load(dir.path(), "ID_5").unwrap();
        first.save(dir.path()).unwrap();
        let second = JumpTable::load(dir.path(), "ID_5").unwrap();

        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_load_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = JumpTable::load(dir.path(), "ID_404");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_table_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let table = JumpTable::new("ID_6");
        table.save(dir.path()).unwrap();

        let loaded = JumpTable::load(dir.path(), "ID_6").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_clipped_flag_survives_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = JumpTable::new("ID_7");
        table.extend(vec![
            make_record(Condition::Real1, 1, 0.2), // clipped at series start
            make_record(Condition::Real1, 2, 5.0),
        ]);

        table.save(dir.path()).unwrap();
        let loaded = JumpTable::load(dir.path(), "ID_7").unwrap();
        assert!(loaded.lookup(Condition::Real1, 1).unwrap().clipped);
        assert!(!loaded.lookup(Condition::Real1, 2).unwrap().clipped);
    }
}
