//! Batch Orchestration
//!
//! Runs the full pipeline over every configured participant and all four
//! conditions. Each (participant, condition) unit is independent: a fatal
//! error inside one unit is caught, recorded with its identifying context,
//! and the batch continues with the next unit. Every unit builds its own
//! results and the orchestrator merges them afterwards, so units can be
//! fanned out across workers without shared mutable state.

use crate::normalize::{NormalizeConfig, NormalizedJump, TimeNormalizer};
use crate::report::{channel_ensemble, render_ensemble_chart, render_force_overview};
use crate::segmentation::{detect_jumps, SegmenterConfig};
use crate::series::{load_participant_dir, Condition, TimeSeries};
use crate::table::JumpTable;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Batch-level options: where trials live, where artifacts go, which units
/// to run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory holding one sub-directory of trial CSVs per participant.
    pub data_dir: PathBuf,
    /// Directory for tables, normalized series, charts, and the summary.
    pub output_dir: PathBuf,
    /// Participants to process, in reporting order.
    pub participants: Vec<String>,
    /// Fan units out across a rayon worker pool.
    pub parallel: bool,
    /// Render overview/ensemble charts (best-effort display output).
    pub render_charts: bool,
    /// Channels to render ensemble charts for.
    pub chart_channels: Vec<String>,
}

/// Outcome of one (participant, condition) unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Processed,
    Failed,
}

/// Per-unit report carried into the run summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    pub participant: String,
    /// `None` for participant-level failures (e.g. unreadable directory)
    /// that prevented any condition from being attempted.
    pub condition: Option<Condition>,
    pub status: UnitStatus,
    pub jumps: usize,
    pub normalized: usize,
    pub skipped_jumps: usize,
    pub error: Option<String>,
}

impl UnitReport {
    fn processed(
        participant: &str,
        condition: Condition,
        jumps: usize,
        normalized: usize,
        skipped_jumps: usize,
    ) -> Self {
        Self {
            participant: participant.to_string(),
            condition: Some(condition),
            status: UnitStatus::Processed,
            jumps,
            normalized,
            skipped_jumps,
            error: None,
        }
    }

    fn failed(participant: &str, condition: Option<Condition>, error: String) -> Self {
        Self {
            participant: participant.to_string(),
            condition,
            status: UnitStatus::Failed,
            jumps: 0,
            normalized: 0,
            skipped_jumps: 0,
            error: Some(error),
        }
    }
}

/// Machine-readable record of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed_units: usize,
    pub failed_units: usize,
    pub total_jumps: usize,
    pub normalized_jumps: usize,
    pub skipped_jumps: usize,
    pub units: Vec<UnitReport>,
}

impl RunSummary {
    fn from_units(run_id: Uuid, started_at: DateTime<Utc>, units: Vec<UnitReport>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            processed_units: units
                .iter()
                .filter(|u| u.status == UnitStatus::Processed)
                .count(),
            failed_units: units
                .iter()
                .filter(|u| u.status == UnitStatus::Failed)
                .count(),
            total_jumps: units.iter().map(|u| u.jumps).sum(),
            normalized_jumps: units.iter().map(|u| u.normalized).sum(),
            skipped_jumps: units.iter().map(|u| u.skipped_jumps).sum(),
            units,
        }
    }

    /// Write the summary as pretty JSON.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Per-unit counters returned by the normalization pass.
struct UnitStats {
    jumps: usize,
    normalized: usize,
    skipped: usize,
}

/// Orchestrates segmentation, persistence, normalization, and rendering
/// over the configured participant set.
pub struct BatchRunner {
    segmenter: SegmenterConfig,
    normalizer: NormalizeConfig,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(
        segmenter: SegmenterConfig,
        normalizer: NormalizeConfig,
        options: BatchOptions,
    ) -> Self {
        Self {
            segmenter,
            normalizer,
            options,
        }
    }

    /// Run the batch. Configuration errors abort up front; unit failures
    /// are recorded and do not abort the run.
    pub fn run(&self) -> crate::Result<RunSummary> {
        self.segmenter.validate()?;
        self.normalizer.validate()?;
        if self.options.participants.is_empty() {
            return Err(crate::Error::Config(
                "participant list must not be empty".to_string(),
            ));
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            participants = self.options.participants.len(),
            parallel = self.options.parallel,
            "starting batch run"
        );

        std::fs::create_dir_all(self.tables_dir())?;
        std::fs::create_dir_all(self.normalized_dir())?;
        if self.options.render_charts {
            std::fs::create_dir_all(self.charts_dir())?;
        }

        // One worker per participant; each builds its own report list and
        // the results are merged afterwards in participant order.
        let units: Vec<UnitReport> = if self.options.parallel {
            self.options
                .participants
                .par_iter()
                .map(|p| self.process_participant(p))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            self.options
                .participants
                .iter()
                .flat_map(|p| self.process_participant(p))
                .collect()
        };

        let summary = RunSummary::from_units(run_id, started_at, units);
        summary.save(&self.options.output_dir.join("run_summary.json"))?;

        info!(
            processed = summary.processed_units,
            failed = summary.failed_units,
            jumps = summary.total_jumps,
            normalized = summary.normalized_jumps,
            skipped_jumps = summary.skipped_jumps,
            "batch run finished"
        );
        Ok(summary)
    }

    fn tables_dir(&self) -> PathBuf {
        self.options.output_dir.join("tables")
    }

    fn normalized_dir(&self) -> PathBuf {
        self.options.output_dir.join("normalized")
    }

    fn charts_dir(&self) -> PathBuf {
        self.options.output_dir.join("charts")
    }

    /// Process every condition trial of one participant.
    fn process_participant(&self, participant: &str) -> Vec<UnitReport> {
        let dir = self.options.data_dir.join(participant);
        let trials = match load_participant_dir(&dir) {
            Ok(trials) => trials,
            Err(e) => {
                error!(participant, error = %e, "failed to load participant data");
                return vec![UnitReport::failed(participant, None, e.to_string())];
            }
        };
        if trials.is_empty() {
            warn!(participant, "no recognized condition trials");
            return vec![UnitReport::failed(
                participant,
                None,
                "no recognized condition trials".to_string(),
            )];
        }

        // Segmentation pass: one jump table per participant
        let mut table = JumpTable::new(participant);
        let mut failures: BTreeMap<Condition, String> = BTreeMap::new();
        for (condition, series) in &trials {
            match detect_jumps(series, *condition, &self.segmenter) {
                Ok(records) => {
                    if records.is_empty() {
                        info!(participant, condition = %condition, "no jumps detected");
                    }
                    table.extend(records);
                }
                Err(e) => {
                    error!(
                        participant,
                        condition = %condition,
                        error = %e,
                        "segmentation failed"
                    );
                    failures.insert(*condition, e.to_string());
                }
            }
        }

        // Persist, then re-read: the normalizer consumes the stored
        // artifact, so its values match what any later run would see.
        let table = match table
            .save(&self.tables_dir())
            .and_then(|_| JumpTable::load(&self.tables_dir(), participant))
        {
            Ok(table) => table,
            Err(e) => {
                error!(participant, error = %e, "jump table persistence failed");
                return trials
                    .iter()
                    .map(|(c, _)| UnitReport::failed(participant, Some(*c), e.to_string()))
                    .collect();
            }
        };

        // Normalization pass per condition
        let mut reports = Vec::with_capacity(trials.len());
        for (condition, series) in &trials {
            if let Some(cause) = failures.get(condition) {
                reports.push(UnitReport::failed(
                    participant,
                    Some(*condition),
                    cause.clone(),
                ));
                continue;
            }
            match self.normalize_condition(participant, *condition, series, &table) {
                Ok(stats) => reports.push(UnitReport::processed(
                    participant,
                    *condition,
                    stats.jumps,
                    stats.normalized,
                    stats.skipped,
                )),
                Err(e) => {
                    error!(
                        participant,
                        condition = %condition,
                        error = %e,
                        "normalization failed"
                    );
                    reports.push(UnitReport::failed(
                        participant,
                        Some(*condition),
                        e.to_string(),
                    ));
                }
            }
        }
        reports
    }

    /// Normalize one condition's jumps and emit its display artifacts.
    fn normalize_condition(
        &self,
        participant: &str,
        condition: Condition,
        series: &TimeSeries,
        table: &JumpTable,
    ) -> crate::Result<UnitStats> {
        let records = table.jumps_for(condition);
        let normalizer = TimeNormalizer::new(self.normalizer.clone());

        let mut normalized: Vec<NormalizedJump> = Vec::with_capacity(records.len());
        let mut skipped = 0usize;
        for &record in &records {
            match normalizer.normalize(series, record)? {
                Some(jump) => normalized.push(jump),
                None => {
                    warn!(
                        participant,
                        key = %record.key(),
                        "insufficient data for this jump, skipped"
                    );
                    skipped += 1;
                }
            }
        }

        if !normalized.is_empty() {
            let path = self
                .normalized_dir()
                .join(format!("{participant}_{condition}_normalized.csv"));
            write_normalized_csv(&path, &normalized)?;
        }

        if self.options.render_charts {
            self.render_unit_charts(participant, condition, series, table, &normalized);
        }

        Ok(UnitStats {
            jumps: records.len(),
            normalized: normalized.len(),
            skipped,
        })
    }

    /// Charts are display output: a rendering failure is logged, never
    /// fatal for the unit.
    fn render_unit_charts(
        &self,
        participant: &str,
        condition: Condition,
        series: &TimeSeries,
        table: &JumpTable,
        normalized: &[NormalizedJump],
    ) {
        let charts_dir = self.charts_dir();
        let records: Vec<_> = table.jumps_for(condition).into_iter().cloned().collect();

        match series.total_force(&self.segmenter.left_channel, &self.segmenter.right_channel) {
            Ok(total) => {
                let path = charts_dir.join(format!("{participant}_{condition}_overview.svg"));
                let title = format!("{participant} {condition}: detected jump windows");
                if let Err(e) = render_force_overview(series, &total, &records, &title, &path) {
                    warn!(participant, condition = %condition, error = %e, "overview chart failed");
                }
            }
            Err(e) => {
                warn!(participant, condition = %condition, error = %e, "overview chart skipped");
            }
        }

        if normalized.is_empty() {
            return;
        }
        let refs: Vec<&NormalizedJump> = normalized.iter().collect();
        for channel in &self.options.chart_channels {
            let ensemble = match channel_ensemble(&refs, channel) {
                Ok(Some(ensemble)) => ensemble,
                Ok(None) => continue,
                Err(e) => {
                    warn!(channel = %channel, error = %e, "ensemble aggregation failed");
                    continue;
                }
            };
            let path = charts_dir.join(format!(
                "{participant}_{condition}_{}_ensemble.svg",
                sanitize(channel)
            ));
            let title = format!("{participant} {condition}: {channel} (mean ± SD)");
            if let Err(e) = render_ensemble_chart(&ensemble, &refs, &title, &path) {
                warn!(participant, condition = %condition, channel = %channel, error = %e, "ensemble chart failed");
            }
        }
    }
}

/// Write a condition's normalized jumps as one long-format CSV: a row per
/// (jump, normalized time point). Writing an empty collection is a no-op.
pub fn write_normalized_csv(path: &Path, jumps: &[NormalizedJump]) -> crate::Result<()> {
    let Some(first) = jumps.first() else {
        return Ok(());
    };
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["key".to_string(), "jump_nr".to_string(), "time_normalized".to_string()];
    header.extend(first.numeric.iter().map(|(n, _)| n.clone()));
    header.extend(first.categorical.iter().map(|(n, _)| n.clone()));
    writer.write_record(&header)?;

    for jump in jumps {
        for i in 0..jump.points() {
            let mut row = vec![
                jump.key.clone(),
                jump.jump_index.to_string(),
                format_value(jump.time_normalized[i]),
            ];
            row.extend(jump.numeric.iter().map(|(_, v)| format_value(v[i])));
            row.extend(jump.categorical.iter().map(|(_, v)| v[i].clone()));
            writer.write_record(&row)?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), jumps = jumps.len(), "wrote normalized series");
    Ok(())
}

fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value}")
    } else {
        String::new()
    }
}

/// Channel names double as file-name fragments; keep them path-safe.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
