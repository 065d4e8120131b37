//! Engine faults.

use alloc::string::String;

use thiserror::Error;
use tp_ir::SongError;

/// Faults that stop playback. End of song is not a fault; see
/// [`TickOutcome::SongEnded`](crate::TickOutcome::SongEnded).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Song(#[from] SongError),
    #[error("instrument {instrument} has an unsupported kind: {kind}")]
    UnsupportedInstrument { instrument: u8, kind: &'static str },
    #[error("sample referenced by instrument {instrument} is missing from the bank")]
    MissingSample { instrument: u8 },
    #[error("no filter registered under {0:?}")]
    UnknownFilter(String),
    #[error("filter {0:?} was given parameters for a different filter")]
    InvalidFilterParams(String),
    #[error("filter coefficient {coefficient} is not a number")]
    FilterCoefficient { coefficient: &'static str },
    #[error("moving average window size must be at least 1")]
    InvalidWindowSize,
    #[error("speed must be at least 1 tick per row")]
    InvalidSpeed,
    #[error("tempo must be non-zero")]
    InvalidTempo,
    #[error("sampler output must have at least one channel and a non-zero rate")]
    InvalidSampler,
}
