//! Multi-position portfolio types, passed through to the engine verbatim.
//!
//! The portfolio sub-API is engine-owned; the client never computes with
//! these beyond display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One staked position on a dice sum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub bet_sum: u8,
    pub amount: Decimal,
}

/// The engine-side betting portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub positions: Vec<PortfolioPosition>,

    #[serde(default = "default_max_positions")]
    pub max_positions: u32,
}

fn default_max_positions() -> u32 {
    5
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            max_positions: default_max_positions(),
        }
    }
}

impl Portfolio {
    /// Total amount currently staked across all positions.
    pub fn total_invested(&self) -> Decimal {
        self.positions.iter().map(|p| p.amount).sum()
    }
}

/// Engine-computed risk profile for the current portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub expected_return: Decimal,
    pub max_loss: Decimal,
    pub max_gain: Decimal,
    pub win_probability: f64,
}
