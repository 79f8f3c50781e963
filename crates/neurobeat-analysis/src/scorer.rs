//! Beat synchronization scoring.
//!
//! Consecutive onset intervals are compared with the beat interval. Pairs
//! deviating by half a beat or more are taken to be unrelated vocalizations
//! and left out of the average rather than penalized; an average deviation of
//! a fifth of a beat or more scores zero.

/// Onsets considered per score.
pub const RECENT_ONSETS: usize = 5;

/// Pairs with `deviation >= EXCLUSION_RATIO * beat` are excluded.
pub const EXCLUSION_RATIO: f64 = 0.5;

/// Average deviation at which the score reaches zero, as a fraction of a beat.
pub const TOLERANCE_RATIO: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncScore {
    /// Accuracy in `0.0..=100.0`.
    pub accuracy: f64,
    pub average_deviation: f64,
    /// Interval pairs that passed the exclusion filter.
    pub pairs: usize,
}

/// Score the last [`RECENT_ONSETS`] of `onsets` against `bpm`.
///
/// Returns `None` when no pair qualifies, in which case the previous score
/// should be kept.
pub fn score(onsets: &[f64], bpm: u32) -> Option<SyncScore> {
    let beat = 60.0 / bpm.max(1) as f64;
    let start = onsets.len().saturating_sub(RECENT_ONSETS);
    let recent = &onsets[start..];

    let (total, pairs) = recent
        .windows(2)
        .map(|pair| ((pair[1] - pair[0]) - beat).abs())
        .filter(|deviation| *deviation < beat * EXCLUSION_RATIO)
        .fold((0.0, 0usize), |(sum, n), deviation| (sum + deviation, n + 1));

    if pairs == 0 {
        return None;
    }

    let average_deviation = total / pairs as f64;
    let accuracy = (100.0 * (1.0 - average_deviation / (beat * TOLERANCE_RATIO))).clamp(0.0, 100.0);
    Some(SyncScore {
        accuracy,
        average_deviation,
        pairs,
    })
}

/// Accuracy as reported to callers: nearest integer in `0..=100`.
#[inline]
pub fn round_accuracy(accuracy: f64) -> u8 {
    if accuracy.is_nan() {
        return 0;
    }
    accuracy.clamp(0.0, 100.0).round() as u8
}
