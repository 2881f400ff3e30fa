//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `DcError` as one
//! variant, so configuration failures raised here surface unchanged.

use thiserror::Error;

/// The top-level error type for `dc-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DcError {
    /// A configuration value that can never produce a valid run.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied shift inputs that fail validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid {name} distribution: {reason}")]
    Distribution {
        name:   &'static str,
        reason: String,
    },
}

/// Shorthand result type for all `dc-*` crates.
pub type DcResult<T> = Result<T, DcError>;
