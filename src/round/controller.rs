//! Round controller: sequences bet submission, settlement arrival and the
//! timed reveal so state mutation and the user-visible reveal never
//! desynchronize.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::EngineApi;
use crate::error::GameError;
use crate::models::{Advice, BetResult, GameState, StrategyId};
use crate::trading::StakeSizer;

use super::advice_cache::AdviceCache;
use super::lifecycle::{Phase, RevealSchedule, RevealTiming, RoundLifecycle};

struct Inner {
    state: GameState,
    lifecycle: RoundLifecycle,
    last_result: Option<BetResult>,
    /// Bumped by every game reset; in-flight work from an older generation
    /// must never touch the fresh state.
    generation: u64,
}

/// Read-only view for a presentation layer.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot {
    pub state: GameState,
    pub phase: Phase,
    pub schedule: Option<RevealSchedule>,
    pub last_result: Option<BetResult>,
}

/// Owns the game state and drives rounds against the engine.
///
/// All engine calls are issued from here; the state machine itself lives in
/// [`RoundLifecycle`]. Settlement is applied by a spawned timer task when
/// the reveal window elapses, and announced on a watch channel.
pub struct RoundController<E: EngineApi> {
    engine: Arc<E>,
    timing: RevealTiming,
    inner: Arc<RwLock<Inner>>,
    reveal_task: Mutex<Option<JoinHandle<()>>>,
    advice_cache: AdviceCache,
    settled_tx: watch::Sender<u64>,
}

impl<E: EngineApi + 'static> RoundController<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self::with_timing(engine, RevealTiming::default())
    }

    pub fn with_timing(engine: Arc<E>, timing: RevealTiming) -> Self {
        let (settled_tx, _) = watch::channel(0u64);
        Self {
            engine,
            timing,
            inner: Arc::new(RwLock::new(Inner {
                state: GameState::default(),
                lifecycle: RoundLifecycle::new(),
                last_result: None,
                generation: 0,
            })),
            reveal_task: Mutex::new(None),
            advice_cache: AdviceCache::new(),
            settled_tx,
        }
    }

    /// Start a fresh game, replacing all state wholesale.
    ///
    /// Valid in any phase: a pending reveal is cancelled so a stale
    /// settlement cannot apply to the reset game. Nothing local changes if
    /// the engine call fails.
    pub async fn new_game(
        &self,
        initial_bankroll: Decimal,
        strategy: StrategyId,
    ) -> Result<GameState, GameError> {
        let state = self.engine.init(initial_bankroll, strategy).await?;

        if let Some(handle) = self.reveal_task.lock().await.take() {
            handle.abort();
        }
        {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            inner.lifecycle.reset();
            inner.state = state.clone();
            inner.last_result = None;
        }
        self.advice_cache.clear().await;

        info!(
            bankroll = %state.money,
            strategy = %state.current_strategy,
            "New game started"
        );
        Ok(state)
    }

    /// Adopt the engine's current view of the game. Only valid while idle.
    pub async fn sync_state(&self) -> Result<GameState, GameError> {
        let state = self.engine.state().await?;

        let mut inner = self.inner.write().await;
        if inner.lifecycle.phase() != Phase::Idle {
            return Err(GameError::RoundInProgress);
        }
        inner.state = state.clone();
        Ok(state)
    }

    /// Submit a bet on `bet_sum` for `amount`.
    ///
    /// Stake problems are rejected locally before any request goes out. On
    /// acceptance the returned schedule carries the reveal deadlines and
    /// final faces; the settlement applies when `banner_at` passes.
    pub async fn submit_bet(
        &self,
        bet_sum: u8,
        amount: Decimal,
    ) -> Result<RevealSchedule, GameError> {
        if !(2..=12).contains(&bet_sum) {
            return Err(GameError::InvalidStake(format!(
                "bet sum {bet_sum} is outside 2..=12"
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(GameError::InvalidStake(
                "stake must be positive".to_string(),
            ));
        }

        let generation = {
            let mut inner = self.inner.write().await;
            if amount > inner.state.money {
                return Err(GameError::InvalidStake(format!(
                    "stake {amount} exceeds bankroll {}",
                    inner.state.money
                )));
            }
            inner.lifecycle.begin_submit()?;
            inner.generation
        };

        let result = match self.engine.place_bet(bet_sum, amount).await {
            Ok(result) => result,
            Err(err) => {
                // All-or-nothing: an aborted bet leaves no trace.
                let mut inner = self.inner.write().await;
                if inner.generation == generation {
                    inner.lifecycle.abort_submit();
                }
                return Err(err);
            }
        };

        let schedule = {
            let mut inner = self.inner.write().await;
            if inner.generation != generation {
                // The game was reset while the bet was in flight.
                return Err(GameError::RoundCancelled);
            }
            let schedule = inner
                .lifecycle
                .begin_roll(result, Instant::now(), &self.timing);
            debug!(sum = bet_sum, amount = %amount, "Bet accepted, reveal scheduled");
            schedule
        };

        let task = {
            let inner = Arc::clone(&self.inner);
            let settled_tx = self.settled_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(schedule.banner_at).await;

                let mut guard = inner.write().await;
                if guard.generation != generation {
                    return;
                }
                let inner = &mut *guard;
                if let Some(result) = inner.lifecycle.settle(&mut inner.state) {
                    info!(
                        sum = result.dice_roll.dice_sum,
                        outcome = ?result.result,
                        bankroll = %result.new_bankroll,
                        "Round settled"
                    );
                    inner.last_result = Some(result);
                    inner.lifecycle.finish();
                    settled_tx.send_modify(|n| *n += 1);
                }
            })
        };
        *self.reveal_task.lock().await = Some(task);

        Ok(schedule)
    }

    /// Switch staking strategy. The engine's post-change state is
    /// authoritative; while a reveal is pending only the strategy field is
    /// adopted, since the engine's state already contains the in-flight
    /// settlement and adopting it wholesale would apply the round twice.
    pub async fn change_strategy(&self, strategy: StrategyId) -> Result<GameState, GameError> {
        let state = self.engine.change_strategy(strategy).await?;

        let mut inner = self.inner.write().await;
        if inner.lifecycle.phase() == Phase::Idle {
            inner.state = state.clone();
        } else {
            inner.state.current_strategy = state.current_strategy;
        }
        Ok(state)
    }

    /// Advisory recommendation for the next bet, cached per round/trend.
    pub async fn advice(&self) -> Result<Advice, GameError> {
        let (round_count, trend, money) = {
            let inner = self.inner.read().await;
            (
                inner.state.round_count,
                inner.state.trend,
                inner.state.money,
            )
        };
        self.advice_cache
            .get_or_refresh(self.engine.as_ref(), round_count, trend, money)
            .await
    }

    /// Advice plus the stake its recommended strategy implies.
    pub async fn recommended_stake(&self) -> Result<(Advice, Decimal), GameError> {
        let advice = self.advice().await?;
        let inner = self.inner.read().await;
        let stake = StakeSizer::size(advice.recommended_strategy, &inner.state, &advice);
        Ok((advice, stake))
    }

    /// Current state for rendering.
    pub async fn snapshot(&self) -> ControllerSnapshot {
        let inner = self.inner.read().await;
        ControllerSnapshot {
            state: inner.state.clone(),
            phase: inner.lifecycle.phase(),
            schedule: inner.lifecycle.schedule(),
            last_result: inner.last_result.clone(),
        }
    }

    /// Settlement announcements: the value increments once per settled
    /// round.
    pub fn settlements(&self) -> watch::Receiver<u64> {
        self.settled_tx.subscribe()
    }
}
