//! Error taxonomy for the client core.

use thiserror::Error;

/// Every failure the client core can surface.
///
/// `InvalidStake` and `RoundInProgress` are local rejections that never
/// reach the network. Engine failures abort the in-progress operation with
/// no partial state mutation; all variants are recoverable by user retry.
#[derive(Debug, Error)]
pub enum GameError {
    /// Local bet validation failed before any request was issued.
    #[error("invalid stake: {0}")]
    InvalidStake(String),

    /// A bet was submitted while another round is still in flight.
    #[error("a round is already in progress")]
    RoundInProgress,

    /// A bet settled on the engine after a game reset; its result was discarded.
    #[error("the round was cancelled by a game reset")]
    RoundCancelled,

    /// Transport failure or engine-side 5xx.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine refused the request (4xx) with a reason.
    #[error("engine rejected the request ({status}): {reason}")]
    EngineRejected { status: u16, reason: String },

    /// Not enough settled rounds to compute meaningful statistics.
    #[error("not enough history for analytics: {rounds} round(s), need at least 2")]
    InsufficientData { rounds: usize },
}

impl From<reqwest::Error> for GameError {
    fn from(err: reqwest::Error) -> Self {
        GameError::EngineUnavailable(err.to_string())
    }
}
