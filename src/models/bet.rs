//! Bet settlement payload returned by the engine for a single round.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BetOutcome, Trend};

/// The two dice the engine rolled and their total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiceRoll {
    pub dice_sum: u8,
    pub dice1: u8,
    pub dice2: u8,
}

/// Settlement of one bet.
///
/// Transient: consumed once to update [`GameState`](super::GameState) and to
/// schedule the reveal, then superseded by the next bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetResult {
    pub dice_roll: DiceRoll,

    /// Signed settlement amount for the round
    pub profit_loss: Decimal,

    /// Authoritative bankroll after settlement
    pub new_bankroll: Decimal,

    pub result: BetOutcome,

    /// Portfolio positions that paid out, as (bet_sum, win_amount) pairs
    #[serde(default)]
    pub winning_positions: Vec<(u8, Decimal)>,

    /// Whether this roll flipped the market regime
    #[serde(default)]
    pub trend_changed: bool,

    /// The new regime, present iff `trend_changed`
    #[serde(default)]
    pub new_trend: Option<Trend>,

    /// Engine-generated headline, present iff `trend_changed` (display only)
    #[serde(default)]
    pub market_news: Option<String>,
}
