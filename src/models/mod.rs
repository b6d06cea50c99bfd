//! Data models for game state, bets, advice and analytics.

mod advice;
mod analytics;
mod bet;
mod portfolio;
mod state;

pub use advice::Advice;
pub use analytics::AnalyticsSnapshot;
pub use bet::{BetResult, DiceRoll};
pub use portfolio::{Portfolio, PortfolioPosition, RiskMetrics};
pub use state::{BetOutcome, GameState, StrategyId, Trend};
