//! Integration test modules for neurobeat

pub mod audio;
pub mod engine;
pub mod transport;
pub mod voice;
