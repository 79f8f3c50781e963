//! Centralized error type for the neurobeat umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] neurobeat_core::Error),

    #[error("Synth: {0}")]
    Synth(#[from] neurobeat_synth::Error),

    #[error("Voice analysis: {0}")]
    Analysis(#[from] neurobeat_analysis::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
