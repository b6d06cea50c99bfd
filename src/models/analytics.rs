//! Raw analytics series as the engine records them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Trend;

/// Per-round history straight from the engine of record.
///
/// All series are parallel, one entry per settled round, except
/// `bankroll_history` which carries the initial bankroll at index 0. Derived
/// statistics are computed locally by the analytics aggregator; anything the
/// engine pre-computes is ignored and rebuilt from these raw fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Bankroll level per round, index 0 = initial bankroll
    #[serde(default)]
    pub bankroll_history: Vec<Decimal>,

    /// 1 for a won round, 0 for a lost one
    #[serde(default)]
    pub win_history: Vec<u8>,

    /// Stake placed each round
    #[serde(default)]
    pub bet_amounts: Vec<Decimal>,

    /// Dice sum the player bet on each round
    #[serde(default)]
    pub bet_sums: Vec<u8>,

    /// Dice sum actually rolled each round
    #[serde(default)]
    pub dice_results: Vec<u8>,

    /// Market regime in effect when each round settled
    #[serde(default)]
    pub trends: Vec<Trend>,

    /// Signed settlement amount per round, as reported by the engine
    #[serde(default)]
    pub profit_history: Vec<Decimal>,

    /// When the engine captured this snapshot
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalyticsSnapshot {
    /// Number of settled rounds covered by this snapshot.
    pub fn rounds(&self) -> usize {
        self.win_history.len()
    }
}
