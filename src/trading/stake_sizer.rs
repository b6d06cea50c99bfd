//! Stake sizing: strategy id plus bankroll and advice in, wager out.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::models::{Advice, GameState, StrategyId};

/// Payout multiplier for a winning bet on the given dice sum.
///
/// Used for Kelly sizing and display only; settlement odds are
/// engine-authoritative.
pub fn payout_for_sum(sum: u8) -> u32 {
    match sum {
        2 | 12 => 36,
        3 | 11 => 18,
        4 | 10 => 12,
        5 | 9 => 9,
        6 | 8 => 7,
        7 => 6,
        _ => 0,
    }
}

/// Calculator translating a staking strategy into a concrete wager.
///
/// Pure: no engine involvement. Progression strategies (martingale,
/// fibonacci, dalembert) size only the seed stake here; their loss
/// progressions are an engine concern.
pub struct StakeSizer;

impl StakeSizer {
    /// Hard lower bound on the Kelly fraction.
    const KELLY_FLOOR: f64 = 0.02;
    /// Hard upper bound on the Kelly fraction.
    const KELLY_CAP: f64 = 0.25;
    /// Probability assumed when the state carries none for the advised sum.
    const DEFAULT_PROBABILITY: f64 = 0.1;

    /// Compute the wager for `strategy` given the current game state and
    /// the advisory recommendation.
    ///
    /// The result is rounded to cents and never exceeds the bankroll.
    pub fn size(strategy: StrategyId, state: &GameState, advice: &Advice) -> Decimal {
        let money = state.money;

        let stake = match strategy {
            StrategyId::Fixed => dec!(5),
            StrategyId::Kelly => Self::kelly(state, advice),
            StrategyId::Martingale => money * dec!(0.01),
            StrategyId::Fibonacci | StrategyId::Dalembert => money * dec!(0.02),
            StrategyId::Masaniello => money * dec!(0.03),
            StrategyId::Percentage | StrategyId::Unknown => money * dec!(0.05),
        };

        stake
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .min(money)
            .max(Decimal::ZERO)
    }

    /// Kelly criterion on the advised sum: `clamp(p*b - (1-p), 0.02, 0.25)`
    /// of bankroll, with `b` from the fixed payout table.
    fn kelly(state: &GameState, advice: &Advice) -> Decimal {
        let sum = advice.recommended_sum;
        let p = state
            .probabilities
            .get(&sum)
            .copied()
            .unwrap_or(Self::DEFAULT_PROBABILITY);
        let b = payout_for_sum(sum) as f64;

        let fraction = (p * b - (1.0 - p)).clamp(Self::KELLY_FLOOR, Self::KELLY_CAP);

        state.money * Decimal::try_from(fraction).unwrap_or(dec!(0.02))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn advice_for(sum: u8) -> Advice {
        Advice {
            recommended_sum: sum,
            recommended_strategy: StrategyId::Kelly,
            reasoning: String::new(),
        }
    }

    fn state_with(money: Decimal, probabilities: &[(u8, f64)]) -> GameState {
        GameState {
            money,
            probabilities: probabilities.iter().copied().collect(),
            ..GameState::default()
        }
    }

    #[test]
    fn percentage_bets_five_percent() {
        let state = state_with(dec!(100), &[]);
        let stake = StakeSizer::size(StrategyId::Percentage, &state, &advice_for(7));
        assert_eq!(stake, dec!(5.00));
    }

    #[test]
    fn kelly_matches_clamped_formula() {
        // p=0.1667, b=6: min(0.25, max(0.02, 0.1667*6 - 0.8333)) * 200 = 33.38
        let state = state_with(dec!(200), &[(7, 0.1667)]);
        let stake = StakeSizer::size(StrategyId::Kelly, &state, &advice_for(7));
        assert_eq!(stake, dec!(33.38));
    }

    #[test]
    fn kelly_defaults_probability_when_absent() {
        // p=0.1, b=6: edge is negative, floor kicks in -> 2% of bankroll
        let state = state_with(dec!(100), &[]);
        let stake = StakeSizer::size(StrategyId::Kelly, &state, &advice_for(7));
        assert_eq!(stake, dec!(2.00));
    }

    #[test]
    fn kelly_cap_limits_extreme_edges() {
        // p=0.9 on snake eyes (b=36) is an absurd edge; cap at 25%
        let state = state_with(dec!(100), &[(2, 0.9)]);
        let stake = StakeSizer::size(StrategyId::Kelly, &state, &advice_for(2));
        assert_eq!(stake, dec!(25.00));
    }

    #[test]
    fn fixed_stake_is_capped_at_bankroll() {
        let state = state_with(dec!(3), &[]);
        let stake = StakeSizer::size(StrategyId::Fixed, &state, &advice_for(7));
        assert_eq!(stake, dec!(3));
    }

    #[test]
    fn seed_stakes_for_progression_strategies() {
        let state = state_with(dec!(1000), &[]);
        let cases = [
            (StrategyId::Martingale, dec!(10.00)),
            (StrategyId::Fibonacci, dec!(20.00)),
            (StrategyId::Dalembert, dec!(20.00)),
            (StrategyId::Masaniello, dec!(30.00)),
            (StrategyId::Fixed, dec!(5)),
        ];
        for (strategy, expected) in cases {
            assert_eq!(
                StakeSizer::size(strategy, &state, &advice_for(7)),
                expected,
                "{strategy}"
            );
        }
    }

    #[test]
    fn unrecognized_strategy_falls_back_to_five_percent() {
        let state = state_with(dec!(80), &[]);
        let stake = StakeSizer::size(StrategyId::Unknown, &state, &advice_for(7));
        assert_eq!(stake, dec!(4.00));
    }

    #[test]
    fn payout_table_is_symmetric() {
        assert_eq!(payout_for_sum(2), 36);
        assert_eq!(payout_for_sum(7), 6);
        assert_eq!(payout_for_sum(12), 36);
        for sum in 2..=7u8 {
            assert_eq!(payout_for_sum(sum), payout_for_sum(14 - sum));
        }
        assert_eq!(payout_for_sum(1), 0);
        assert_eq!(payout_for_sum(13), 0);
    }

    proptest! {
        #[test]
        fn every_strategy_stays_within_bankroll(bankroll in 0.01f64..100_000.0) {
            let money = Decimal::try_from(bankroll).unwrap().round_dp(2);
            let state = state_with(money, &[(7, 0.1667)]);
            for strategy in StrategyId::ALL {
                let stake = StakeSizer::size(strategy, &state, &advice_for(7));
                prop_assert!(stake >= Decimal::ZERO, "{strategy}: {stake} < 0");
                prop_assert!(stake <= money, "{strategy}: {stake} > {money}");
                prop_assert!(stake.scale() <= 2, "{strategy}: {stake} not cents");
            }
        }

        #[test]
        fn kelly_fraction_respects_clamp_bounds(
            p in 0.0001f64..0.9999,
            sum in 2u8..=12,
            bankroll in 1.0f64..100_000.0,
        ) {
            let money = Decimal::try_from(bankroll).unwrap().round_dp(2);
            let state = state_with(money, &[(sum, p)]);
            let stake = StakeSizer::size(StrategyId::Kelly, &state, &advice_for(sum));

            // Cent rounding allows up to half a cent of slack on either bound.
            let slack = dec!(0.005);
            let floor = money * dec!(0.02) - slack;
            let cap = money * dec!(0.25) + slack;
            prop_assert!(stake >= floor.min(money), "{stake} below {floor}");
            prop_assert!(stake <= cap, "{stake} above {cap}");
        }
    }
}
