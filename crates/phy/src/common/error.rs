//! Error definitions for PHY construction.
//!
//! Every failure is structural and detected while building a PHY: once a [`Phy`](crate::Phy)
//! exists its per-cycle datapath is total and cannot fail. Calibration mistakes are not
//! errors; they show up as corrupted read data for the calibration routine to notice.

use thiserror::Error;

use crate::timing::MemoryFamily;

/// Errors raised while resolving settings or building a PHY.
#[derive(Debug, Error)]
pub enum PhyError {
    /// Unknown memory family, unmatched clock period, or out-of-range pad geometry.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A computed latency or phase assignment is outside its legal range.
    #[error("invalid latency configuration: {0}")]
    InvalidLatencyConfiguration(String),

    /// The phase count cannot be used with this memory family.
    #[error("phase count {nphases} is not supported for {family}")]
    UnsupportedPhaseCount {
        /// Memory family requested.
        family: MemoryFamily,
        /// Phase count requested.
        nphases: usize,
    },

    /// The configuration document could not be parsed.
    #[error("malformed PHY configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used by all fallible constructors.
pub type PhyResult<T> = Result<T, PhyError>;
