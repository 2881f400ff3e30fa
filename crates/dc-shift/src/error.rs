use dc_core::{DcError, SimTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShiftError {
    /// Configuration or input rejected before the clock started.
    #[error(transparent)]
    Core(#[from] DcError),

    #[error("shift configuration error: {0}")]
    Config(String),

    /// The run went idle with processes still suspended.
    #[error("shift stalled at {at}: {live} process(es) still waiting")]
    Stalled { live: usize, at: SimTime },
}

pub type EngineResult<T> = Result<T, ShiftError>;
