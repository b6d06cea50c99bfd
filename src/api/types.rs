//! Request and error-payload types for the engine API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::StrategyId;

/// Body of `POST /init`.
#[derive(Debug, Clone, Serialize)]
pub struct InitGameRequest {
    pub initial_bankroll: Decimal,
    pub strategy: StrategyId,
}

/// Body of `POST /bet` and `POST /portfolio/add`.
#[derive(Debug, Clone, Serialize)]
pub struct BetRequest {
    pub bet_sum: u8,
    pub amount: Decimal,
}

/// Rejection payload the engine attaches to 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}
