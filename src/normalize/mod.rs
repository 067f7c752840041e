//! Time Normalization
//!
//! Maps one variable-length jump slice onto a fixed-length canonical
//! representation so jumps of different real durations can be averaged or
//! compared sample-for-sample. Resampling is piecewise linear over the
//! sample index axis — endpoints are preserved exactly and the target axis
//! never leaves the source range, so there is no extrapolation.

use crate::segmentation::JumpRecord;
use crate::series::{Condition, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which boundary ends the normalized slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizeBound {
    /// Slice up to the takeoff: only the preparatory phase.
    Takeoff,
    /// Slice across the whole buffered analysis window.
    FullWindow,
}

/// Normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Number of points on the canonical axis.
    pub points: usize,
    /// End boundary of the slice, a caller decision rather than fixed
    /// behavior (preparatory-phase studies normalize up to takeoff only).
    pub bound: NormalizeBound,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            points: 100,
            bound: NormalizeBound::FullWindow,
        }
    }
}

impl NormalizeConfig {
    /// Validate caller-supplied values at entry.
    ///
    /// A canonical axis needs at least 2 points, otherwise it cannot carry
    /// both slice endpoints.
    pub fn validate(&self) -> crate::Result<()> {
        if self.points < 2 {
            return Err(crate::Error::Config(format!(
                "normalize points must be at least 2, got {}",
                self.points
            )));
        }
        Ok(())
    }
}

/// The fixed-length representation of one jump.
///
/// Every channel holds exactly the configured number of points. Created by
/// the normalizer, consumed by aggregation and rendering, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJump {
    /// Stable composite identifier: `{condition}_jump_{index}`.
    pub key: String,
    /// Condition of the source trial.
    pub condition: Condition,
    /// 1-based sequence index of the source jump.
    pub jump_index: u32,
    /// Synthetic axis, `points` evenly spaced values from 0 to 1.
    pub time_normalized: Vec<f64>,
    /// Resampled numeric channels, in source column order.
    pub numeric: Vec<(String, Vec<f64>)>,
    /// Categorical channels, first sample broadcast across all points.
    pub categorical: Vec<(String, Vec<String>)>,
}

impl NormalizedJump {
    /// Number of points on the canonical axis.
    pub fn points(&self) -> usize {
        self.time_normalized.len()
    }

    /// Look up a resampled numeric channel by name.
    pub fn numeric_channel(&self, name: &str) -> Option<&[f64]> {
        self.numeric
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }
}

/// Resamples jump slices onto the canonical axis.
#[derive(Debug, Clone)]
pub struct TimeNormalizer {
    config: NormalizeConfig,
}

impl TimeNormalizer {
    /// Create a normalizer with the given configuration.
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    /// The configured end boundary for a record.
    fn end_boundary(&self, jump: &JumpRecord) -> f64 {
        match self.config.bound {
            NormalizeBound::Takeoff => jump.takeoff_time,
            NormalizeBound::FullWindow => jump.end_ana,
        }
    }

    /// Normalize one jump from its source series.
    ///
    /// Returns `Ok(None)` when the slice holds fewer than 2 samples —
    /// that jump is skipped, the run continues. Identical inputs always
    /// produce identical output.
    pub fn normalize(
        &self,
        series: &TimeSeries,
        jump: &JumpRecord,
    ) -> crate::Result<Option<NormalizedJump>> {
        self.config.validate()?;

        let start = jump.start_ana;
        let end = self.end_boundary(jump);
        let time = series.time();

        // Inclusive on both ends: boundary samples are retained
        let lo = time.partition_point(|t| *t < start);
        let hi = time.partition_point(|t| *t <= end);
        let n = hi.saturating_sub(lo);
        if n < 2 {
            debug!(
                key = %jump.key(),
                samples = n,
                "insufficient data for this jump, skipping"
            );
            return Ok(None);
        }

        let target = linspace(0.0, (n - 1) as f64, self.config.points);

        let numeric = series
            .numeric_channels()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    resample_linear(&values[lo..hi], &target),
                )
            })
            .collect();

        // Identity/label columns do not interpolate meaningfully:
        // broadcast the first sample instead
        let categorical = series
            .categorical_channels()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    vec![values[lo].clone(); self.config.points],
                )
            })
            .collect();

        Ok(Some(NormalizedJump {
            key: jump.key(),
            condition: jump.condition,
            jump_index: jump.index,
            time_normalized: linspace(0.0, 1.0, self.config.points),
            numeric,
            categorical,
        }))
    }
}

/// `n` evenly spaced values across `[start, end]`, endpoints exact.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    debug_assert!(n >= 2);
    let step = (end - start) / (n - 1) as f64;
    let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
    values[n - 1] = end;
    values
}

/// Piecewise-linear interpolation of `values` (on the index axis
/// `0..values.len()-1`) at the given target positions.
fn resample_linear(values: &[f64], target: &[f64]) -> Vec<f64> {
    let last = values.len() - 1;
    target
        .iter()
        .map(|&t| {
            let k = t.floor() as usize;
            if k >= last {
                values[last]
            } else {
                let frac = t - k as f64;
                values[k] * (1.0 - frac) + values[k + 1] * frac
            }
        })
        .collect()
}
