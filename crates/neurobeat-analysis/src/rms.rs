//! Root-mean-square level of a waveform buffer.

/// RMS of `samples` (full scale = 1.0). Empty input is silence.
#[inline]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
