//! Advisory recommendation supplied by the engine.

use serde::{Deserialize, Serialize};

use super::StrategyId;

/// One-shot suggestion for the next bet.
///
/// Freshness bookkeeping lives in the advice cache, not here: the payload is
/// immutable once fetched and may be handed out to any number of readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    /// Suggested dice sum to bet on (2..=12)
    pub recommended_sum: u8,

    /// Suggested staking strategy
    pub recommended_strategy: StrategyId,

    /// Human-readable rationale
    pub reasoning: String,
}
