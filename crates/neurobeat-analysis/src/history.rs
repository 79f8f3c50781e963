//! Rhythm history: recent voice onset times, bounded by a sliding window.

/// Strictly increasing onset timestamps (engine seconds).
///
/// Growth is bounded by [`trim`](Self::trim), not by capacity.
#[derive(Debug, Clone)]
pub struct RhythmHistory {
    onsets: Vec<f64>,
    window: f64,
}

impl RhythmHistory {
    pub fn new(window: f64) -> Self {
        Self {
            onsets: Vec::new(),
            window,
        }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    /// Append `time` if it is later than the last onset.
    pub fn push(&mut self, time: f64) -> bool {
        match self.onsets.last() {
            Some(&last) if time <= last => false,
            _ => {
                self.onsets.push(time);
                true
            }
        }
    }

    /// Drop every onset with `now - t >= window`.
    pub fn trim(&mut self, now: f64) {
        let stale = self.onsets.partition_point(|&t| now - t >= self.window);
        if stale > 0 {
            self.onsets.drain(..stale);
        }
    }

    /// The last `n` onsets, oldest first.
    pub fn recent(&self, n: usize) -> &[f64] {
        let start = self.onsets.len().saturating_sub(n);
        &self.onsets[start..]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.onsets
    }

    pub fn last(&self) -> Option<f64> {
        self.onsets.last().copied()
    }

    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    pub fn clear(&mut self) {
        self.onsets.clear();
    }
}
