//! Time-Series Data Model
//!
//! Defines the schema-checked series container shared by the segmenter and
//! the normalizer, and the closed set of experimental conditions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column name of the elapsed-time channel in trial exports.
pub const TIME_CHANNEL: &str = "time";

/// Column name of the left force plate channel.
pub const LEFT_FORCE_CHANNEL: &str = "LT Force (N)";

/// Column name of the right force plate channel.
pub const RIGHT_FORCE_CHANNEL: &str = "RT Force (N)";

/// Experimental condition of one recorded trial.
///
/// A closed enum instead of free-form string labels: condition typos become
/// compile errors and match arms are exhaustiveness-checked. String forms
/// exist only at the file-name and CSV boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "REAL_1")]
    Real1,
    #[serde(rename = "REAL_2")]
    Real2,
    #[serde(rename = "VR_1")]
    Vr1,
    #[serde(rename = "VR_2")]
    Vr2,
}

impl Condition {
    /// All conditions, in batch processing order.
    pub const ALL: [Condition; 4] = [
        Condition::Real1,
        Condition::Real2,
        Condition::Vr1,
        Condition::Vr2,
    ];

    /// The label used in file names and the jump table.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Real1 => "REAL_1",
            Condition::Real2 => "REAL_2",
            Condition::Vr1 => "VR_1",
            Condition::Vr2 => "VR_2",
        }
    }

    /// Recognize the condition from a trial file name by label fragment
    /// (e.g. `ID_3_export_VR_1.csv` -> `Vr1`).
    pub fn from_file_name(name: &str) -> Option<Condition> {
        Condition::ALL
            .iter()
            .copied()
            .find(|c| name.contains(c.label()))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Condition {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::ALL
            .iter()
            .copied()
            .find(|c| c.label() == s)
            .ok_or_else(|| crate::Error::Series(format!("unknown condition label: {s:?}")))
    }
}

/// Declared channel layout of a series.
///
/// The loader classifies every column once, at ingestion; downstream code
/// dispatches on this schema instead of inspecting values at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSchema {
    /// Names of numeric channels, in column order.
    pub numeric: Vec<String>,
    /// Names of categorical (label/identity) channels, in column order.
    pub categorical: Vec<String>,
}

/// One continuous recording: a strictly increasing time channel plus named
/// numeric and categorical channels of equal length.
///
/// Read-only after construction; both the segmenter and the normalizer
/// borrow it immutably.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    time: Vec<f64>,
    numeric: Vec<(String, Vec<f64>)>,
    categorical: Vec<(String, Vec<String>)>,
}

impl TimeSeries {
    /// Build a series, validating the analysis preconditions.
    ///
    /// Fails if the series is empty, if the time channel is not strictly
    /// increasing, or if any channel's length differs from the time
    /// channel's. These are fatal input errors, never silently tolerated.
    pub fn new(
        time: Vec<f64>,
        numeric: Vec<(String, Vec<f64>)>,
        categorical: Vec<(String, Vec<String>)>,
    ) -> crate::Result<Self> {
        if time.is_empty() {
            return Err(crate::Error::Series("empty time channel".to_string()));
        }
        for (i, pair) in time.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(crate::Error::Series(format!(
                    "time channel not strictly increasing at sample {}: {} -> {}",
                    i + 1,
                    pair[0],
                    pair[1]
                )));
            }
        }
        for (name, values) in &numeric {
            if values.len() != time.len() {
                return Err(crate::Error::Series(format!(
                    "channel {:?} has {} samples, expected {}",
                    name,
                    values.len(),
                    time.len()
                )));
            }
        }
        for (name, values) in &categorical {
            if values.len() != time.len() {
                return Err(crate::Error::Series(format!(
                    "channel {:?} has {} samples, expected {}",
                    name,
                    values.len(),
                    time.len()
                )));
            }
        }
        Ok(Self {
            time,
            numeric,
            categorical,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True if the series holds no samples. Unreachable for validated
    /// series; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The elapsed-time channel (seconds, zero-based).
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Timestamp of the first sample.
    pub fn start_time(&self) -> f64 {
        self.time[0]
    }

    /// Timestamp of the last sample.
    pub fn end_time(&self) -> f64 {
        self.time[self.time.len() - 1]
    }

    /// Look up a numeric channel by name.
    pub fn numeric_channel(&self, name: &str) -> Option<&[f64]> {
        self.numeric
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Look up a categorical channel by name.
    pub fn categorical_channel(&self, name: &str) -> Option<&[String]> {
        self.categorical
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Iterate numeric channels in column order.
    pub fn numeric_channels(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.numeric.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Iterate categorical channels in column order.
    pub fn categorical_channels(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categorical
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// The declared channel schema.
    pub fn schema(&self) -> ChannelSchema {
        ChannelSchema {
            numeric: self.numeric.iter().map(|(n, _)| n.clone()).collect(),
            categorical: self.categorical.iter().map(|(n, _)| n.clone()).collect(),
        }
    }

    /// Sum two force channels into a total-force signal.
    ///
    /// Missing channels and non-finite samples are fatal input errors: the
    /// segmenter's thresholding is meaningless over NaN/Inf forces.
    pub fn total_force(&self, left: &str, right: &str) -> crate::Result<Vec<f64>> {
        let lhs = self
            .numeric_channel(left)
            .ok_or_else(|| crate::Error::Series(format!("missing force channel {left:?}")))?;
        let rhs = self
            .numeric_channel(right)
            .ok_or_else(|| crate::Error::Series(format!("missing force channel {right:?}")))?;

        let mut total = Vec::with_capacity(lhs.len());
        for (i, (l, r)) in lhs.iter().zip(rhs.iter()).enumerate() {
            let sum = l + r;
            if !sum.is_finite() {
                return Err(crate::Error::Series(format!(
                    "non-finite force at sample {i}: {l} + {r}"
                )));
            }
            total.push(sum);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_series(n: usize) -> TimeSeries {
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        let force: Vec<f64> = vec![100.0; n];
        TimeSeries::new(
            time,
            vec![
                (LEFT_FORCE_CHANNEL.to_string(), force.clone()),
                (RIGHT_FORCE_CHANNEL.to_string(), force),
            ],
            vec![("side".to_string(), vec!["both".to_string(); n])],
        )
        .unwrap()
    }

    #[test]
    fn test_series_construction() {
        let series = make_series(10);
        assert_eq!(series.len(), 10);
        assert_eq!(series.start_time(), 0.0);
        assert!((series.end_time() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_rejected() {
        let result = TimeSeries::new(vec![], vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_monotonic_time_rejected() {
        let result = TimeSeries::new(vec![0.0, 0.2, 0.1], vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_timestamps_rejected() {
        // Strictly increasing: equal neighbors are a violation too
        let result = TimeSeries::new(vec![0.0, 0.1, 0.1, 0.2], vec![], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = TimeSeries::new(
            vec![0.0, 0.1, 0.2],
            vec![("f".to_string(), vec![1.0, 2.0])],
            vec![],
        );
        assert!(result.is_err());

        let result = TimeSeries::new(
            vec![0.0, 0.1],
            vec![],
            vec![("label".to_string(), vec!["a".to_string()])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_channel_lookup() {
        let series = make_series(5);
        assert!(series.numeric_channel(LEFT_FORCE_CHANNEL).is_some());
        assert!(series.numeric_channel("no such channel").is_none());
        assert_eq!(
            series.categorical_channel("side").map(|v| v[0].as_str()),
            Some("both")
        );
    }

    #[test]
    fn test_schema_declares_channels() {
        let series = make_series(5);
        let schema = series.schema();
        assert_eq!(
            schema.numeric,
            vec![LEFT_FORCE_CHANNEL.to_string(), RIGHT_FORCE_CHANNEL.to_string()]
        );
        assert_eq!(schema.categorical, vec!["side".to_string()]);
    }

    #[test]
    fn test_total_force_sums_channels() {
        let series = make_series(4);
        let total = series
            .total_force(LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL)
            .unwrap();
        assert_eq!(total, vec![200.0; 4]);
    }

    #[test]
    fn test_total_force_missing_channel_is_fatal() {
        let series = make_series(4);
        let result = series.total_force("LT Force (N)", "missing");
        assert!(result.is_err());
    }

    #[test]
    fn test_total_force_non_finite_is_fatal() {
        let series = TimeSeries::new(
            vec![0.0, 0.1],
            vec![
                ("l".to_string(), vec![100.0, f64::NAN]),
                ("r".to_string(), vec![100.0, 50.0]),
            ],
            vec![],
        )
        .unwrap();
        assert!(series.total_force("l", "r").is_err());
    }

    #[test]
    fn test_condition_labels_roundtrip() {
        for condition in Condition::ALL {
            let parsed: Condition = condition.label().parse().unwrap();
            assert_eq!(parsed, condition);
            assert_eq!(condition.to_string(), condition.label());
        }
    }

    #[test]
    fn test_condition_unknown_label() {
        assert!("REAL_3".parse::<Condition>().is_err());
        assert!("".parse::<Condition>().is_err());
    }

    #[test]
    fn test_condition_from_file_name() {
        assert_eq!(
            Condition::from_file_name("ID_1_trial_REAL_1.csv"),
            Some(Condition::Real1)
        );
        assert_eq!(
            Condition::from_file_name("subject_VR_2_export.csv"),
            Some(Condition::Vr2)
        );
        assert_eq!(Condition::from_file_name("MVC_Beine.csv"), None);
        assert_eq!(Condition::from_file_name("info.csv"), None);
    }

    #[test]
    fn test_condition_serde_uses_labels() {
        let json = serde_json::to_string(&Condition::Vr1).unwrap();
        assert_eq!(json, "\"VR_1\"");
        let back: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Condition::Vr1);
    }
}
