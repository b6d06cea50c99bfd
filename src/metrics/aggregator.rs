//! Aggregator deriving performance metrics from raw engine history.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::error::GameError;
use crate::models::{AnalyticsSnapshot, Trend};

/// Win/loss tally for one dice sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SumRecord {
    pub wins: u32,
    pub losses: u32,
}

/// Metrics derived from an [`AnalyticsSnapshot`].
///
/// Rebuilt from scratch on every fetch; never incrementally mutated.
#[derive(Debug, Clone)]
pub struct AnalyticsReport {
    /// Settled rounds covered
    pub rounds: usize,

    /// Fraction of rounds won (0.0 to 1.0)
    pub win_rate: f64,

    /// Mean settlement of winning rounds, in dollars
    pub avg_win: Decimal,

    /// Mean magnitude of losing rounds, in dollars
    pub avg_loss: Decimal,

    /// Mean per-round return over its standard deviation; 0 when undefined
    pub sharpe_ratio: f64,

    /// Worst relative decline from a running bankroll peak (0.0 to 1.0)
    pub max_drawdown: f64,

    /// Mean per-round return across rounds settled under a bull market
    pub avg_return_bull: f64,

    /// Mean per-round return across rounds settled under a bear market
    pub avg_return_bear: f64,

    /// Win/loss tallies for every dice sum 2..=12
    pub sum_distribution: BTreeMap<u8, SumRecord>,
}

/// Calculator for the derived analytics fields.
pub struct AnalyticsAggregator;

impl AnalyticsAggregator {
    /// Derive the full report from raw history.
    ///
    /// Fails with `InsufficientData` below 2 settled rounds rather than
    /// computing degenerate statistics.
    pub fn aggregate(snapshot: &AnalyticsSnapshot) -> Result<AnalyticsReport, GameError> {
        let rounds = snapshot.rounds();
        if rounds < 2 {
            return Err(GameError::InsufficientData { rounds });
        }

        let wins = snapshot.win_history.iter().filter(|w| **w == 1).count();
        let win_rate = wins as f64 / rounds as f64;

        let (avg_win, avg_loss) = Self::settlement_averages(&snapshot.profit_history);

        let returns = Self::per_round_returns(&snapshot.bankroll_history);
        let sharpe_ratio = Self::sharpe(&returns);
        let max_drawdown = Self::max_drawdown(&snapshot.bankroll_history);
        let (avg_return_bull, avg_return_bear) =
            Self::trend_conditioned_returns(&returns, &snapshot.trends);

        let sum_distribution =
            Self::sum_distribution(&snapshot.bet_sums, &snapshot.win_history);

        Ok(AnalyticsReport {
            rounds,
            win_rate,
            avg_win,
            avg_loss,
            sharpe_ratio,
            max_drawdown,
            avg_return_bull,
            avg_return_bear,
            sum_distribution,
        })
    }

    /// Mean winning settlement and mean losing magnitude, from the
    /// engine-reported per-round settlements (not re-derived from bankroll
    /// deltas).
    fn settlement_averages(profits: &[Decimal]) -> (Decimal, Decimal) {
        let (wins, losses): (Vec<&Decimal>, Vec<&Decimal>) =
            profits.iter().partition(|p| **p > Decimal::ZERO);

        let avg_win = if wins.is_empty() {
            Decimal::ZERO
        } else {
            wins.iter().copied().sum::<Decimal>() / Decimal::from(wins.len() as u32)
        };

        let avg_loss = if losses.is_empty() {
            Decimal::ZERO
        } else {
            losses.iter().map(|l| l.abs()).sum::<Decimal>()
                / Decimal::from(losses.len() as u32)
        };

        (avg_win, avg_loss)
    }

    /// Simple return per round. `returns[i]` covers the move from
    /// `bankroll_history[i]` to `bankroll_history[i+1]`, so it lines up with
    /// `trends[i]`. A zero bankroll (ruin) yields a 0 return to keep the
    /// series aligned.
    fn per_round_returns(bankroll: &[Decimal]) -> Vec<f64> {
        bankroll
            .windows(2)
            .map(|w| {
                let prev = w[0].to_f64().unwrap_or(0.0);
                let curr = w[1].to_f64().unwrap_or(0.0);
                if prev > 0.0 {
                    (curr - prev) / prev
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Mean over standard deviation, 0 when variance is zero or fewer than
    /// 2 returns exist.
    fn sharpe(returns: &[f64]) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }

        let mean = returns.to_vec().mean();
        let std_dev = returns.to_vec().std_dev();

        if std_dev > 0.0 {
            mean / std_dev
        } else {
            0.0
        }
    }

    /// Worst peak-to-trough decline relative to the running peak.
    fn max_drawdown(bankroll: &[Decimal]) -> f64 {
        let mut peak = f64::MIN;
        let mut max_dd = 0.0f64;

        for value in bankroll {
            let value = value.to_f64().unwrap_or(0.0);
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (peak - value) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }

        max_dd
    }

    /// Average return partitioned by the regime each round settled under.
    /// Empty partitions report 0.
    fn trend_conditioned_returns(returns: &[f64], trends: &[Trend]) -> (f64, f64) {
        let mut bull = Vec::new();
        let mut bear = Vec::new();

        for (ret, trend) in returns.iter().zip(trends.iter()) {
            match trend {
                Trend::Bull => bull.push(*ret),
                Trend::Bear => bear.push(*ret),
            }
        }

        let avg = |series: Vec<f64>| {
            if series.is_empty() {
                0.0
            } else {
                series.mean()
            }
        };

        (avg(bull), avg(bear))
    }

    /// Win/loss counts per dice sum, with every sum 2..=12 present.
    fn sum_distribution(bet_sums: &[u8], win_history: &[u8]) -> BTreeMap<u8, SumRecord> {
        let mut distribution: BTreeMap<u8, SumRecord> =
            (2..=12).map(|sum| (sum, SumRecord::default())).collect();

        for (sum, win) in bet_sums.iter().zip(win_history.iter()) {
            if let Some(record) = distribution.get_mut(sum) {
                if *win == 1 {
                    record.wins += 1;
                } else {
                    record.losses += 1;
                }
            }
        }

        distribution
    }
}
