//! Jump detection
//!
//! Turns a continuous bilateral force signal into an ordered list of
//! discrete jump windows. Two detection policies share the pairing,
//! duration-filter, and windowing stages:
//!
//! - [`DetectionPolicy::ThresholdCrossing`] (canonical): flight phases are
//!   stretches where total force drops below a fixed threshold.
//! - [`DetectionPolicy::PeakPairing`] (alternate): takeoff/landing impact
//!   peaks above a per-participant calibrated height are paired
//!   two-at-a-time. Selectable because peak force scales with body mass.

pub mod peaks;
pub mod threshold;

use crate::series::{Condition, TimeSeries, LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which jump detection strategy the segmenter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionPolicy {
    /// Flight phase = total force below `flight_threshold` (canonical).
    ThresholdCrossing,
    /// Consecutive force peaks above `peak_min_height` paired as
    /// (takeoff, landing).
    PeakPairing,
}

/// Segmenter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Detection strategy.
    pub policy: DetectionPolicy,
    /// Left force plate channel name.
    pub left_channel: String,
    /// Right force plate channel name.
    pub right_channel: String,
    /// Force level (N) below which the system counts as airborne.
    pub flight_threshold: f64,
    /// Minimum time below threshold for a real flight phase (filters
    /// contact-noise blips).
    pub min_flight_seconds: f64,
    /// Extra time included before takeoff and after landing in the
    /// analysis window.
    pub buffer_seconds: f64,
    /// Peak-pairing policy: minimum peak force (N), calibrated per
    /// participant.
    pub peak_min_height: f64,
    /// Peak-pairing policy: minimum inter-peak distance in samples.
    pub peak_min_distance_samples: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            policy: DetectionPolicy::ThresholdCrossing,
            left_channel: LEFT_FORCE_CHANNEL.to_string(),
            right_channel: RIGHT_FORCE_CHANNEL.to_string(),
            flight_threshold: 50.0,
            min_flight_seconds: 0.2,
            buffer_seconds: 0.75,
            peak_min_height: 1200.0,
            peak_min_distance_samples: 100,
        }
    }
}

impl SegmenterConfig {
    /// Validate caller-supplied values at entry.
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.flight_threshold > 0.0) {
            return Err(crate::Error::Config(format!(
                "flight_threshold must be positive, got {}",
                self.flight_threshold
            )));
        }
        if !(self.min_flight_seconds > 0.0) {
            return Err(crate::Error::Config(format!(
                "min_flight_seconds must be positive, got {}",
                self.min_flight_seconds
            )));
        }
        if !(self.buffer_seconds > 0.0) {
            return Err(crate::Error::Config(format!(
                "buffer_seconds must be positive, got {}",
                self.buffer_seconds
            )));
        }
        if !(self.peak_min_height > 0.0) {
            return Err(crate::Error::Config(format!(
                "peak_min_height must be positive, got {}",
                self.peak_min_height
            )));
        }
        if self.peak_min_distance_samples == 0 {
            return Err(crate::Error::Config(
                "peak_min_distance_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One detected jump event. Created by the segmenter, immutable
/// thereafter; the sole input (besides the raw series) to the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpRecord {
    /// 1-based sequence index, dense per series.
    pub index: u32,
    /// Condition of the source trial.
    pub condition: Condition,
    /// Ground -> flight transition time (first airborne sample).
    pub takeoff_time: f64,
    /// Flight -> ground transition time (first grounded sample).
    pub landing_time: f64,
    /// `landing_time - takeoff_time`.
    pub flight_duration: f64,
    /// Buffered analysis-window start, clipped to the series start.
    pub start_ana: f64,
    /// Buffered analysis-window end, clipped to the series end.
    pub end_ana: f64,
    /// `end_ana - start_ana`.
    pub window_duration: f64,
    /// True when the buffer was cut at a series boundary, so the window
    /// is shorter than `flight_duration + 2 * buffer_seconds`.
    pub clipped: bool,
}

impl JumpRecord {
    /// Stable identifier used as the normalized-jump key.
    pub fn key(&self) -> String {
        format!("{}_jump_{}", self.condition, self.index)
    }
}

/// Detect jumps in one trial under the configured policy.
///
/// Pure over its inputs: no side effects, no mutation of the series.
/// Zero detected transitions yield an empty list, not an error.
pub fn detect_jumps(
    series: &TimeSeries,
    condition: Condition,
    config: &SegmenterConfig,
) -> crate::Result<Vec<JumpRecord>> {
    config.validate()?;
    let total = series.total_force(&config.left_channel, &config.right_channel)?;

    let candidate_pairs = match config.policy {
        DetectionPolicy::ThresholdCrossing => {
            threshold::flight_pairs(&total, config.flight_threshold)
        }
        DetectionPolicy::PeakPairing => peaks::flight_pairs(
            &total,
            config.peak_min_height,
            config.peak_min_distance_samples,
        ),
    };

    let records = build_records(series.time(), &candidate_pairs, condition, config);
    debug!(
        condition = %condition,
        candidates = candidate_pairs.len(),
        accepted = records.len(),
        "segmented trial"
    );
    Ok(records)
}

/// Turn candidate (takeoff, landing) index pairs into jump records:
/// duration filter, buffered window, dense 1-based sequence indices.
fn build_records(
    time: &[f64],
    pairs: &[(usize, usize)],
    condition: Condition,
    config: &SegmenterConfig,
) -> Vec<JumpRecord> {
    let t_min = time[0];
    let t_max = time[time.len() - 1];
    let mut records = Vec::new();

    for &(idx_off, idx_on) in pairs {
        let takeoff_time = time[idx_off];
        let landing_time = time[idx_on];
        let flight_duration = landing_time - takeoff_time;

        // Rejects contact-noise blips, not genuine jumps
        if flight_duration <= config.min_flight_seconds {
            debug!(
                takeoff = takeoff_time,
                flight = flight_duration,
                "candidate below minimum flight duration, rejected"
            );
            continue;
        }

        let raw_start = takeoff_time - config.buffer_seconds;
        let raw_end = landing_time + config.buffer_seconds;
        let start_ana = raw_start.max(t_min);
        let end_ana = raw_end.min(t_max);

        records.push(JumpRecord {
            index: records.len() as u32 + 1,
            condition,
            takeoff_time,
            landing_time,
            flight_duration,
            start_ana,
            end_ana,
            window_duration: end_ana - start_ana,
            clipped: raw_start < t_min || raw_end > t_max,
        });
    }

    records
}
