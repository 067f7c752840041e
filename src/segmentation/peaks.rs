//! Peak-Pairing Flight Detection
//!
//! Alternate policy: a jump shows up in the force signal as two impact
//! peaks, the push-off before takeoff and the impact at landing. Peaks
//! above a per-participant calibrated height are located and paired
//! two-at-a-time. Trades the absolute flight threshold for a calibrated
//! peak height, which must track body mass.

use tracing::trace;

/// Find candidate (takeoff-peak, landing-peak) sample-index pairs.
///
/// A peak is a strict local maximum above `min_height`. Peaks closer than
/// `min_distance` samples to the previously kept peak are suppressed in
/// chronological order, so a jagged impact plateau yields one peak, not a
/// cluster. Consecutive surviving peaks are paired (0,1), (2,3), ...; a
/// trailing unpaired peak is dropped.
pub(crate) fn flight_pairs(
    total_force: &[f64],
    min_height: f64,
    min_distance: usize,
) -> Vec<(usize, usize)> {
    let peaks = find_peaks(total_force, min_height, min_distance);
    if peaks.len() % 2 != 0 {
        trace!(peaks = peaks.len(), "odd peak count, dropping trailing peak");
    }
    peaks.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

/// Strict local maxima above `min_height`, with greedy chronological
/// minimum-distance suppression.
fn find_peaks(signal: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    if signal.len() < 3 {
        return peaks;
    }

    let mut last_kept: Option<usize> = None;
    for i in 1..signal.len() - 1 {
        if signal[i] < min_height {
            continue;
        }
        if !(signal[i] > signal[i - 1] && signal[i] > signal[i + 1]) {
            continue;
        }
        if let Some(prev) = last_kept {
            if i - prev < min_distance {
                continue;
            }
        }
        peaks.push(i);
        last_kept = Some(i);
    }
    peaks
}
