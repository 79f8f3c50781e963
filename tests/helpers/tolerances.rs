//! Tolerance constants for audio and timing tests.

/// Floating point rounding errors (exact gain, exact clock arithmetic).
pub const FLOAT_EPSILON: f64 = 1e-9;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;
