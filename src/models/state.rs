//! Core game state owned by the round controller.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Portfolio;

/// Market regime the engine uses to bias dice-sum probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bull,
    Bear,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Bull => "bull",
            Trend::Bear => "bear",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a settled round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Win,
    Loss,
}

/// Staking strategy identifier.
///
/// The engine owns the strategy semantics; the client only needs the id to
/// size a seed stake and to request strategy changes. Ids the engine may
/// grow that this client does not know map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyId {
    Percentage,
    Fixed,
    Kelly,
    Martingale,
    Fibonacci,
    Dalembert,
    Masaniello,
    #[serde(other)]
    Unknown,
}

impl StrategyId {
    pub const ALL: [StrategyId; 7] = [
        StrategyId::Percentage,
        StrategyId::Fixed,
        StrategyId::Kelly,
        StrategyId::Martingale,
        StrategyId::Fibonacci,
        StrategyId::Dalembert,
        StrategyId::Masaniello,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Percentage => "percentage",
            StrategyId::Fixed => "fixed",
            StrategyId::Kelly => "kelly",
            StrategyId::Martingale => "martingale",
            StrategyId::Fibonacci => "fibonacci",
            StrategyId::Dalembert => "dalembert",
            StrategyId::Masaniello => "masaniello",
            StrategyId::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentage" => Ok(StrategyId::Percentage),
            "fixed" => Ok(StrategyId::Fixed),
            "kelly" => Ok(StrategyId::Kelly),
            "martingale" => Ok(StrategyId::Martingale),
            "fibonacci" => Ok(StrategyId::Fibonacci),
            "dalembert" => Ok(StrategyId::Dalembert),
            "masaniello" => Ok(StrategyId::Masaniello),
            other => Err(format!(
                "unknown strategy '{other}' (expected one of: percentage, fixed, kelly, \
                 martingale, fibonacci, dalembert, masaniello)"
            )),
        }
    }
}

/// Snapshot of the game as the engine reports it.
///
/// Owned exclusively by the round controller: replaced wholesale on a new
/// game, field-updated when a bet settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Current bankroll
    pub money: Decimal,

    /// Outcome of every settled round, oldest first
    #[serde(default)]
    pub bet_history: Vec<BetOutcome>,

    /// Current market trend
    pub trend: Trend,

    /// Market volatility in [0, 1]
    #[serde(default)]
    pub volatility: f64,

    /// Number of settled rounds
    #[serde(default)]
    pub round_count: u32,

    /// Engine-published probability for each dice sum 2..=12, fixed per trend
    #[serde(default)]
    pub probabilities: BTreeMap<u8, f64>,

    /// Staking strategy currently active on the engine
    pub current_strategy: StrategyId,

    /// Multi-position betting portfolio (engine-owned, pass-through)
    #[serde(default)]
    pub portfolio: Portfolio,
}

impl GameState {
    /// Fraction of settled rounds that were wins.
    pub fn win_rate(&self) -> f64 {
        if self.bet_history.is_empty() {
            return 0.0;
        }
        let wins = self
            .bet_history
            .iter()
            .filter(|r| **r == BetOutcome::Win)
            .count();
        wins as f64 / self.bet_history.len() as f64
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            money: Decimal::ZERO,
            bet_history: Vec::new(),
            trend: Trend::Bull,
            volatility: 0.0,
            round_count: 0,
            probabilities: BTreeMap::new(),
            current_strategy: StrategyId::Percentage,
            portfolio: Portfolio::default(),
        }
    }
}
