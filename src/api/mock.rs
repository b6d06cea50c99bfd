//! Deterministic in-memory engine for tests.
//!
//! All state is controllable from test code: scripted settlements, forced
//! rejections, an optional advice latency, and call counters for asserting
//! how many requests actually went out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::Duration;

use crate::error::GameError;
use crate::models::{
    Advice, AnalyticsSnapshot, BetOutcome, BetResult, DiceRoll, GameState, Portfolio,
    RiskMetrics, StrategyId,
};

use super::EngineApi;

pub struct MockEngine {
    template: Mutex<GameState>,
    bet_results: Mutex<VecDeque<BetResult>>,
    advice: Mutex<Advice>,
    snapshot: Mutex<AnalyticsSnapshot>,
    advice_delay: Mutex<Option<Duration>>,
    bet_delay: Mutex<Option<Duration>>,
    reject_bets: Mutex<Option<String>>,
    fail_advice: Mutex<Option<String>>,
    pub init_calls: AtomicU32,
    pub bet_calls: AtomicU32,
    pub advice_calls: AtomicU32,
}

impl MockEngine {
    pub fn new(template: GameState) -> Self {
        Self {
            template: Mutex::new(template),
            bet_results: Mutex::new(VecDeque::new()),
            advice: Mutex::new(Advice {
                recommended_sum: 7,
                recommended_strategy: StrategyId::Kelly,
                reasoning: "seven is the most common outcome".to_string(),
            }),
            snapshot: Mutex::new(AnalyticsSnapshot::default()),
            advice_delay: Mutex::new(None),
            bet_delay: Mutex::new(None),
            reject_bets: Mutex::new(None),
            fail_advice: Mutex::new(None),
            init_calls: AtomicU32::new(0),
            bet_calls: AtomicU32::new(0),
            advice_calls: AtomicU32::new(0),
        }
    }

    /// Queue the settlement the next `place_bet` returns.
    pub fn push_bet_result(&self, result: BetResult) {
        self.bet_results.lock().unwrap().push_back(result);
    }

    pub fn set_advice(&self, advice: Advice) {
        *self.advice.lock().unwrap() = advice;
    }

    /// Make advice fetches take this long (under a paused test clock).
    pub fn set_advice_delay(&self, delay: Duration) {
        *self.advice_delay.lock().unwrap() = Some(delay);
    }

    /// Make bet settlements take this long (under a paused test clock).
    pub fn set_bet_delay(&self, delay: Duration) {
        *self.bet_delay.lock().unwrap() = Some(delay);
    }

    /// Force all subsequent bets to be rejected with this reason.
    pub fn reject_bets(&self, reason: &str) {
        *self.reject_bets.lock().unwrap() = Some(reason.to_string());
    }

    /// Accept bets again after `reject_bets`.
    pub fn allow_bets(&self) {
        *self.reject_bets.lock().unwrap() = None;
    }

    /// Force all subsequent advice fetches to fail.
    pub fn fail_advice(&self, reason: &str) {
        *self.fail_advice.lock().unwrap() = Some(reason.to_string());
    }

    /// Serve advice again after `fail_advice`.
    pub fn restore_advice(&self) {
        *self.fail_advice.lock().unwrap() = None;
    }
}

/// Shorthand for a scripted settlement.
pub fn settled(
    dice1: u8,
    dice2: u8,
    profit_loss: Decimal,
    new_bankroll: Decimal,
    result: BetOutcome,
) -> BetResult {
    BetResult {
        dice_roll: DiceRoll {
            dice_sum: dice1 + dice2,
            dice1,
            dice2,
        },
        profit_loss,
        new_bankroll,
        result,
        winning_positions: Vec::new(),
        trend_changed: false,
        new_trend: None,
        market_news: None,
    }
}

#[async_trait]
impl EngineApi for MockEngine {
    async fn init(
        &self,
        initial_bankroll: Decimal,
        strategy: StrategyId,
    ) -> Result<GameState, GameError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let mut template = self.template.lock().unwrap();
        template.money = initial_bankroll;
        template.current_strategy = strategy;
        template.bet_history.clear();
        template.round_count = 0;
        Ok(template.clone())
    }

    async fn state(&self) -> Result<GameState, GameError> {
        Ok(self.template.lock().unwrap().clone())
    }

    async fn place_bet(&self, _bet_sum: u8, _amount: Decimal) -> Result<BetResult, GameError> {
        self.bet_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.bet_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.reject_bets.lock().unwrap().clone() {
            return Err(GameError::EngineRejected {
                status: 400,
                reason,
            });
        }
        self.bet_results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GameError::EngineUnavailable("no scripted settlement".to_string()))
    }

    async fn change_strategy(&self, strategy: StrategyId) -> Result<GameState, GameError> {
        let mut template = self.template.lock().unwrap();
        template.current_strategy = strategy;
        Ok(template.clone())
    }

    async fn advice(&self) -> Result<Advice, GameError> {
        self.advice_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.advice_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.fail_advice.lock().unwrap().clone() {
            return Err(GameError::EngineUnavailable(reason));
        }
        Ok(self.advice.lock().unwrap().clone())
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, GameError> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn portfolio_add(&self, _bet_sum: u8, _amount: Decimal) -> Result<bool, GameError> {
        Ok(true)
    }

    async fn portfolio_remove(&self, _bet_sum: u8) -> Result<Decimal, GameError> {
        Ok(Decimal::ZERO)
    }

    async fn portfolio_clear(&self) -> Result<(), GameError> {
        Ok(())
    }

    async fn portfolio(&self) -> Result<Portfolio, GameError> {
        Ok(Portfolio::default())
    }

    async fn portfolio_risk(&self) -> Result<RiskMetrics, GameError> {
        Ok(RiskMetrics {
            expected_return: Decimal::ZERO,
            max_loss: Decimal::ZERO,
            max_gain: Decimal::ZERO,
            win_probability: 0.0,
        })
    }
}
