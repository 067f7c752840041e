//! Threshold-Crossing Flight Detection
//!
//! The canonical detection policy: a flight phase is a maximal stretch of
//! samples where total force sits below the flight threshold. Hysteresis
//! against contact noise comes from the minimum-flight-duration filter
//! applied afterwards, not from a second threshold.

/// Find candidate (takeoff, landing) sample-index pairs.
///
/// Edges of the in-air mask are taken from the first difference: a
/// grounded -> airborne transition yields a takeoff candidate at the first
/// airborne sample, airborne -> grounded a landing candidate at the first
/// grounded sample. Orphaned edges at the series boundaries (starting
/// mid-flight, ending mid-flight) are dropped rather than fabricating a
/// boundary; the longer edge list is truncated so pairing stays
/// chronological.
pub(crate) fn flight_pairs(total_force: &[f64], flight_threshold: f64) -> Vec<(usize, usize)> {
    let in_air: Vec<bool> = total_force.iter().map(|f| *f < flight_threshold).collect();

    let mut takeoffs: Vec<usize> = Vec::new();
    let mut landings: Vec<usize> = Vec::new();
    for i in 1..in_air.len() {
        match (in_air[i - 1], in_air[i]) {
            (false, true) => takeoffs.push(i),
            (true, false) => landings.push(i),
            _ => {}
        }
    }

    // A series that begins airborne produces a landing with no prior
    // takeoff; drop it so pairing starts at the first real takeoff.
    if let (Some(&first_takeoff), Some(&first_landing)) = (takeoffs.first(), landings.first()) {
        if first_landing < first_takeoff {
            landings.remove(0);
        }
    }

    // A trailing takeoff without a landing is truncated by the zip.
    takeoffs.into_iter().zip(landings).collect()
}
