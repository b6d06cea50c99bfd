//! The round lifecycle as a pure, timer-free state machine.
//!
//! The async controller drives this with real timers; tests drive it
//! directly. Reveal deadlines are plain data so a rendering layer can
//! animate the roll however it likes.

use tokio::time::{Duration, Instant};

use crate::error::GameError;
use crate::models::{BetResult, GameState};

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No bet in flight; submissions accepted.
    Idle,
    /// Bet sent to the engine, settlement not yet received.
    Submitting,
    /// Settlement received but held back while the reveal window runs.
    Rolling,
    /// Settlement applied; the result banner may be shown.
    Revealed,
}

/// Durations of the reveal window.
#[derive(Debug, Clone, Copy)]
pub struct RevealTiming {
    /// Randomized face-cycling portion of the animation
    pub cycle: Duration,

    /// Grace period between the faces settling and the result banner
    pub grace: Duration,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            cycle: Duration::from_millis(1500),
            grace: Duration::from_millis(300),
        }
    }
}

impl RevealTiming {
    /// Submission-accepted to result-banner duration.
    pub fn total(&self) -> Duration {
        self.cycle + self.grace
    }
}

/// Reveal deadlines and the final dice faces for one accepted bet.
#[derive(Debug, Clone, Copy)]
pub struct RevealSchedule {
    pub started_at: Instant,

    /// Face cycling stops here; the true faces show from this point
    pub settle_at: Instant,

    /// The result banner may be shown; settlement applies
    pub banner_at: Instant,

    /// The true dice faces
    pub faces: (u8, u8),
}

/// `Idle → Submitting → Rolling → Revealed → Idle`.
///
/// Owns the pending settlement while the reveal window runs. State mutation
/// happens only in [`settle`](Self::settle), never while submitting or
/// rolling, so an aborted round leaves the game untouched.
#[derive(Debug)]
pub struct RoundLifecycle {
    phase: Phase,
    pending: Option<BetResult>,
    schedule: Option<RevealSchedule>,
}

impl RoundLifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
            schedule: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Schedule of the roll currently revealing, if any.
    pub fn schedule(&self) -> Option<RevealSchedule> {
        self.schedule
    }

    /// Start submitting a bet. Rejected unless idle, which guarantees at
    /// most one in-flight reveal per round.
    pub fn begin_submit(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Idle {
            return Err(GameError::RoundInProgress);
        }
        self.phase = Phase::Submitting;
        Ok(())
    }

    /// Back out of a submission the engine failed.
    pub fn abort_submit(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Idle;
        }
    }

    /// Accept the engine's settlement and open the reveal window.
    ///
    /// The schedule is rebuilt from scratch for every bet; reveal state is
    /// never re-parameterized in place, so a stale frame from the previous
    /// roll cannot leak into this one.
    pub fn begin_roll(
        &mut self,
        result: BetResult,
        now: Instant,
        timing: &RevealTiming,
    ) -> RevealSchedule {
        let schedule = RevealSchedule {
            started_at: now,
            settle_at: now + timing.cycle,
            banner_at: now + timing.total(),
            faces: (result.dice_roll.dice1, result.dice_roll.dice2),
        };

        self.pending = Some(result);
        self.schedule = Some(schedule);
        self.phase = Phase::Rolling;
        schedule
    }

    /// Apply the pending settlement to the game state. Only legal while
    /// rolling; returns the settled result.
    pub fn settle(&mut self, state: &mut GameState) -> Option<BetResult> {
        if self.phase != Phase::Rolling {
            return None;
        }
        let result = self.pending.take()?;

        state.money = result.new_bankroll;
        state.bet_history.push(result.result);
        state.round_count += 1;
        if result.trend_changed {
            if let Some(trend) = result.new_trend {
                state.trend = trend;
            }
        }

        self.phase = Phase::Revealed;
        Some(result)
    }

    /// Close out a revealed round, accepting submissions again.
    pub fn finish(&mut self) {
        if self.phase == Phase::Revealed {
            self.phase = Phase::Idle;
            self.schedule = None;
        }
    }

    /// Drop any pending settlement and return to idle (new game).
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.pending = None;
        self.schedule = None;
    }
}

impl Default for RoundLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::settled;
    use crate::models::{BetOutcome, Trend};
    use rust_decimal_macros::dec;

    fn state() -> GameState {
        GameState {
            money: dec!(100),
            ..GameState::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn full_round_applies_state_exactly_once() {
        let mut lifecycle = RoundLifecycle::new();
        let mut game = state();
        let timing = RevealTiming::default();

        lifecycle.begin_submit().unwrap();
        assert_eq!(lifecycle.phase(), Phase::Submitting);

        let result = settled(3, 4, dec!(30), dec!(130), BetOutcome::Win);
        let schedule = lifecycle.begin_roll(result, Instant::now(), &timing);
        assert_eq!(lifecycle.phase(), Phase::Rolling);
        assert_eq!(schedule.faces, (3, 4));
        assert_eq!(schedule.settle_at - schedule.started_at, Duration::from_millis(1500));
        assert_eq!(schedule.banner_at - schedule.started_at, Duration::from_millis(1800));

        // Nothing mutates before settlement
        assert_eq!(game.money, dec!(100));
        assert!(game.bet_history.is_empty());

        let revealed = lifecycle.settle(&mut game).unwrap();
        assert_eq!(lifecycle.phase(), Phase::Revealed);
        assert_eq!(revealed.dice_roll.dice_sum, 7);
        assert_eq!(game.money, dec!(130));
        assert_eq!(game.bet_history, vec![BetOutcome::Win]);
        assert_eq!(game.round_count, 1);

        // A second settle is a no-op
        assert!(lifecycle.settle(&mut game).is_none());
        assert_eq!(game.round_count, 1);

        lifecycle.finish();
        assert_eq!(lifecycle.phase(), Phase::Idle);
        assert!(lifecycle.schedule().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_is_rejected_outside_idle() {
        let mut lifecycle = RoundLifecycle::new();
        let mut game = state();

        lifecycle.begin_submit().unwrap();
        assert!(matches!(
            lifecycle.begin_submit(),
            Err(GameError::RoundInProgress)
        ));

        let result = settled(2, 3, dec!(-5), dec!(95), BetOutcome::Loss);
        lifecycle.begin_roll(result, Instant::now(), &RevealTiming::default());
        assert!(matches!(
            lifecycle.begin_submit(),
            Err(GameError::RoundInProgress)
        ));

        lifecycle.settle(&mut game);
        assert!(matches!(
            lifecycle.begin_submit(),
            Err(GameError::RoundInProgress)
        ));

        lifecycle.finish();
        assert!(lifecycle.begin_submit().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_submit_restores_idle_without_mutation() {
        let mut lifecycle = RoundLifecycle::new();
        let game = state();

        lifecycle.begin_submit().unwrap();
        lifecycle.abort_submit();

        assert_eq!(lifecycle.phase(), Phase::Idle);
        assert_eq!(game.money, dec!(100));
        assert!(lifecycle.begin_submit().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_the_pending_settlement() {
        let mut lifecycle = RoundLifecycle::new();
        let mut game = state();

        lifecycle.begin_submit().unwrap();
        let result = settled(6, 6, dec!(180), dec!(280), BetOutcome::Win);
        lifecycle.begin_roll(result, Instant::now(), &RevealTiming::default());

        lifecycle.reset();
        assert_eq!(lifecycle.phase(), Phase::Idle);
        assert!(lifecycle.schedule().is_none());

        // The dropped settlement can never apply
        assert!(lifecycle.settle(&mut game).is_none());
        assert_eq!(game.money, dec!(100));
        assert_eq!(game.round_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_adopts_a_changed_trend() {
        let mut lifecycle = RoundLifecycle::new();
        let mut game = state();
        assert_eq!(game.trend, Trend::Bull);

        lifecycle.begin_submit().unwrap();
        let mut result = settled(1, 2, dec!(-5), dec!(95), BetOutcome::Loss);
        result.trend_changed = true;
        result.new_trend = Some(Trend::Bear);
        lifecycle.begin_roll(result, Instant::now(), &RevealTiming::default());

        lifecycle.settle(&mut game).unwrap();
        assert_eq!(game.trend, Trend::Bear);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_trend_is_left_alone() {
        let mut lifecycle = RoundLifecycle::new();
        let mut game = state();

        lifecycle.begin_submit().unwrap();
        let result = settled(4, 4, dec!(35), dec!(135), BetOutcome::Win);
        lifecycle.begin_roll(result, Instant::now(), &RevealTiming::default());

        lifecycle.settle(&mut game).unwrap();
        assert_eq!(game.trend, Trend::Bull);
    }
}
