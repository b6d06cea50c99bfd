//! HTTP client for the remote game engine.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::GameError;
use crate::models::{
    Advice, AnalyticsSnapshot, BetResult, GameState, Portfolio, RiskMetrics, StrategyId,
};

use super::types::{BetRequest, DetailResponse, InitGameRequest};

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine operations the client core consumes.
///
/// The round controller and advice cache talk to this trait rather than the
/// concrete HTTP client so they can be exercised against an in-memory engine
/// in tests. No operation retries on its own; callers decide.
#[async_trait]
pub trait EngineApi: Send + Sync {
    async fn init(&self, initial_bankroll: Decimal, strategy: StrategyId)
        -> Result<GameState, GameError>;
    async fn state(&self) -> Result<GameState, GameError>;
    async fn place_bet(&self, bet_sum: u8, amount: Decimal) -> Result<BetResult, GameError>;
    async fn change_strategy(&self, strategy: StrategyId) -> Result<GameState, GameError>;
    async fn advice(&self) -> Result<Advice, GameError>;
    async fn analytics(&self) -> Result<AnalyticsSnapshot, GameError>;

    // Portfolio sub-API: opaque pass-through, no client-side logic.
    async fn portfolio_add(&self, bet_sum: u8, amount: Decimal) -> Result<bool, GameError>;
    async fn portfolio_remove(&self, bet_sum: u8) -> Result<Decimal, GameError>;
    async fn portfolio_clear(&self) -> Result<(), GameError>;
    async fn portfolio(&self) -> Result<Portfolio, GameError>;
    async fn portfolio_risk(&self) -> Result<RiskMetrics, GameError>;
}

/// Client for the DiceTrader engine API.
pub struct EngineClient {
    client: Client,
    base_url: String,
}

impl EngineClient {
    /// Create a new client against the default engine URL.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_ENGINE_URL.to_string())
    }

    /// Create with a custom base URL.
    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Map a response to the failure taxonomy: 4xx carry an engine reason,
    /// everything else non-2xx means the engine is unavailable.
    async fn check(response: Response) -> Result<Response, GameError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<DetailResponse>(&body)
            .map(|d| d.detail)
            .unwrap_or(body);

        if status.is_client_error() {
            Err(GameError::EngineRejected {
                status: status.as_u16(),
                reason,
            })
        } else {
            Err(GameError::EngineUnavailable(format!("{status}: {reason}")))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GameError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let response = self.client.get(&url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GameError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl EngineApi for EngineClient {
    async fn init(
        &self,
        initial_bankroll: Decimal,
        strategy: StrategyId,
    ) -> Result<GameState, GameError> {
        let body = InitGameRequest {
            initial_bankroll,
            strategy,
        };
        self.post_json("/init", Some(&body)).await
    }

    async fn state(&self) -> Result<GameState, GameError> {
        self.get_json("/state").await
    }

    async fn place_bet(&self, bet_sum: u8, amount: Decimal) -> Result<BetResult, GameError> {
        let body = BetRequest { bet_sum, amount };
        self.post_json("/bet", Some(&body)).await
    }

    async fn change_strategy(&self, strategy: StrategyId) -> Result<GameState, GameError> {
        self.post_json::<(), _>(&format!("/strategy/change/{}", strategy.as_str()), None)
            .await
    }

    async fn advice(&self) -> Result<Advice, GameError> {
        self.get_json("/strategy/advice").await
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, GameError> {
        self.get_json("/analytics").await
    }

    async fn portfolio_add(&self, bet_sum: u8, amount: Decimal) -> Result<bool, GameError> {
        let body = BetRequest { bet_sum, amount };
        self.post_json("/portfolio/add", Some(&body)).await
    }

    async fn portfolio_remove(&self, bet_sum: u8) -> Result<Decimal, GameError> {
        self.post_json::<(), _>(&format!("/portfolio/remove/{bet_sum}"), None)
            .await
    }

    async fn portfolio_clear(&self) -> Result<(), GameError> {
        let _: serde_json::Value = self.post_json::<(), _>("/portfolio/clear", None).await?;
        Ok(())
    }

    async fn portfolio(&self) -> Result<Portfolio, GameError> {
        self.get_json("/portfolio").await
    }

    async fn portfolio_risk(&self) -> Result<RiskMetrics, GameError> {
        self.get_json("/portfolio/risk").await
    }
}
