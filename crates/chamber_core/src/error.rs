//! Error taxonomy for a bake run.
//!
//! Every variant aborts the run. There is no partial recovery.

use thiserror::Error;

/// Errors raised while stepping or materializing a chamber run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChamberError {
    #[error("identity conflict: '{name}' already names a {found} object")]
    IdentityConflict { name: String, found: String },

    #[error("particle {index}: non-finite {field}")]
    NonFinite { index: usize, field: &'static str },

    #[error("invalid charge {charge}: must be finite")]
    InvalidCharge { charge: f32 },

    #[error("invalid mass {mass}: must be finite and > 0")]
    InvalidMass { mass: f32 },

    #[error("run did not converge after {steps} steps ({dirty} particles still dirty)")]
    LivenessStall { steps: u64, dirty: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("host error: {0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, ChamberError>;
