//! Ensemble Statistics
//!
//! Sample-for-sample mean and standard deviation across the normalized
//! jumps of one condition. Display-only aggregation: the normalized time
//! axis makes jumps of different real durations comparable point by point.

use crate::normalize::NormalizedJump;
use tracing::debug;

/// Mean ± SD of one channel across an ensemble of normalized jumps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEnsemble {
    /// Channel name.
    pub channel: String,
    /// Number of jumps aggregated.
    pub jumps: usize,
    /// Point-wise mean, one value per normalized time point.
    pub mean: Vec<f64>,
    /// Point-wise population standard deviation.
    pub sd: Vec<f64>,
}

/// Aggregate one numeric channel across normalized jumps.
///
/// Returns `Ok(None)` when no jump carries the channel (nothing to
/// aggregate). Jumps that were normalized with different point counts
/// cannot be averaged point-wise and are a caller error.
pub fn channel_ensemble(
    jumps: &[&NormalizedJump],
    channel: &str,
) -> crate::Result<Option<ChannelEnsemble>> {
    let traces: Vec<&[f64]> = jumps
        .iter()
        .filter_map(|j| j.numeric_channel(channel))
        .collect();
    if traces.is_empty() {
        debug!(channel, "no normalized jumps carry this channel");
        return Ok(None);
    }

    let points = traces[0].len();
    if traces.iter().any(|t| t.len() != points) {
        return Err(crate::Error::Report(format!(
            "normalized jumps disagree on point count for channel {channel:?}"
        )));
    }

    let count = traces.len() as f64;
    let mut mean = vec![0.0; points];
    let mut sd = vec![0.0; points];

    for trace in &traces {
        for (m, v) in mean.iter_mut().zip(trace.iter()) {
            *m += v;
        }
    }
    for m in &mut mean {
        *m /= count;
    }

    for trace in &traces {
        for ((s, v), m) in sd.iter_mut().zip(trace.iter()).zip(mean.iter()) {
            *s += (v - m) * (v - m);
        }
    }
    for s in &mut sd {
        *s = (*s / count).sqrt();
    }

    Ok(Some(ChannelEnsemble {
        channel: channel.to_string(),
        jumps: traces.len(),
        mean,
        sd,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Condition;

    fn jump_with(channel: &str, values: Vec<f64>, index: u32) -> NormalizedJump {
        let points = values.len();
        NormalizedJump {
            key: format!("REAL_1_jump_{index}"),
            condition: Condition::Real1,
            jump_index: index,
            time_normalized: crate::normalize::linspace(0.0, 1.0, points),
            numeric: vec![(channel.to_string(), values)],
            categorical: vec![],
        }
    }

    #[test]
    fn test_identical_traces_have_zero_sd() {
        let a = jump_with("knee", vec![1.0, 2.0, 3.0], 1);
        let b = jump_with("knee", vec![1.0, 2.0, 3.0], 2);

        let ensemble = channel_ensemble(&[&a, &b], "knee").unwrap().unwrap();
        assert_eq!(ensemble.jumps, 2);
        assert_eq!(ensemble.mean, vec![1.0, 2.0, 3.0]);
        assert_eq!(ensemble.sd, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mean_and_population_sd() {
        let a = jump_with("knee", vec![1.0, 10.0], 1);
        let b = jump_with("knee", vec![3.0, 14.0], 2);

        let ensemble = channel_ensemble(&[&a, &b], "knee").unwrap().unwrap();
        assert_eq!(ensemble.mean, vec![2.0, 12.0]);
        // Population SD: sqrt(((1-2)^2 + (3-2)^2) / 2) = 1
        assert_eq!(ensemble.sd, vec![1.0, 2.0]);
    }

    #[test]
    fn test_missing_channel_yields_none() {
        let a = jump_with("knee", vec![1.0, 2.0], 1);
        let result = channel_ensemble(&[&a], "hip").unwrap();
        assert!(result.is_none());

        let result = channel_ensemble(&[], "knee").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_point_count_mismatch_is_error() {
        let a = jump_with("knee", vec![1.0, 2.0], 1);
        let b = jump_with("knee", vec![1.0, 2.0, 3.0], 2);
        let result = channel_ensemble(&[&a, &b], "knee");
        assert!(result.is_err());
    }

    #[test]
    fn test_single_jump_ensemble() {
        let a = jump_with("knee", vec![4.0, 5.0, 6.0], 1);
        let ensemble = channel_ensemble(&[&a], "knee").unwrap().unwrap();
        assert_eq!(ensemble.jumps, 1);
        assert_eq!(ensemble.mean, vec![4.0, 5.0, 6.0]);
        assert_eq!(ensemble.sd, vec![0.0, 0.0, 0.0]);
    }
}
