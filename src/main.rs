//! DiceTrader client
//!
//! Plays a dice-sum betting game against a remote engine with bull/bear
//! market regimes: strategy-driven stake sizing, one-shot advisory
//! recommendations and aggregate performance analytics.

mod api;
mod error;
mod metrics;
mod models;
mod round;
mod trading;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{EngineApi, EngineClient, DEFAULT_ENGINE_URL};
use crate::error::GameError;
use crate::metrics::{AnalyticsAggregator, AnalyticsReport};
use crate::models::{BetOutcome, BetResult, GameState, StrategyId};
use crate::round::RoundController;
use crate::trading::payout_for_sum;

/// DiceTrader client CLI.
#[derive(Parser)]
#[command(name = "dicetrader")]
#[command(about = "Bet on dice sums against a simulated market", long_about = None)]
struct Cli {
    /// Engine base URL
    #[arg(short, long, env = "DICETRADER_ENGINE_URL", default_value = DEFAULT_ENGINE_URL)]
    engine_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game
    NewGame {
        /// Initial bankroll
        #[arg(short, long, default_value = "100")]
        bankroll: f64,

        /// Starting strategy
        #[arg(short, long, default_value = "percentage")]
        strategy: StrategyId,
    },

    /// Show the current game state
    State,

    /// Place a single bet and watch the reveal
    Bet {
        /// Dice sum to bet on (2-12)
        #[arg(short, long)]
        sum: u8,

        /// Amount to stake
        #[arg(short, long)]
        amount: f64,
    },

    /// Fetch the advisory recommendation for the next bet
    Advice,

    /// Show the stake the advised strategy implies
    Stake,

    /// Change the staking strategy
    Strategy {
        /// One of: percentage, fixed, kelly, martingale, fibonacci, dalembert, masaniello
        strategy: StrategyId,
    },

    /// Show aggregate performance analytics
    Analytics,

    /// Play rounds automatically following the advisor
    Auto {
        /// Number of rounds to play
        #[arg(short, long, default_value = "10")]
        rounds: u32,
    },

    /// Manage the multi-position betting portfolio
    #[command(subcommand)]
    Portfolio(PortfolioCommands),
}

#[derive(Subcommand)]
enum PortfolioCommands {
    /// Add a position
    Add {
        #[arg(short, long)]
        sum: u8,
        #[arg(short, long)]
        amount: f64,
    },
    /// Remove the position on a sum
    Remove {
        #[arg(short, long)]
        sum: u8,
    },
    /// Clear all positions
    Clear,
    /// Show current positions
    Show,
    /// Show portfolio risk metrics
    Risk,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let engine = Arc::new(EngineClient::with_base_url(cli.engine_url.clone())?);
    let controller = RoundController::new(Arc::clone(&engine));

    match cli.command {
        Commands::NewGame { bankroll, strategy } => {
            let state = controller
                .new_game(Decimal::try_from(bankroll)?, strategy)
                .await?;
            println!("New game started.");
            print_state(&state);
        }

        Commands::State => {
            let state = controller.sync_state().await?;
            print_state(&state);
        }

        Commands::Bet { sum, amount } => {
            controller.sync_state().await?;
            let mut settlements = controller.settlements();

            let schedule = controller.submit_bet(sum, Decimal::try_from(amount)?).await?;
            println!("Bet ${amount:.2} on {sum}. Dice are rolling...");

            tokio::time::sleep_until(schedule.settle_at).await;
            let (d1, d2) = schedule.faces;
            println!("Faces: {} + {} = {}", d1, d2, d1 + d2);

            settlements.changed().await?;
            let snap = controller.snapshot().await;
            if let Some(result) = snap.last_result {
                print_settlement(&result);
                println!("Bankroll: ${:.2}", snap.state.money);
            }
        }

        Commands::Advice => {
            controller.sync_state().await?;
            let advice = controller.advice().await?;
            println!("\n=== Recommendation ===");
            println!("Sum:      {} (payout {}x)", advice.recommended_sum, payout_for_sum(advice.recommended_sum));
            println!("Strategy: {}", advice.recommended_strategy.to_string().to_uppercase());
            println!("Why:      {}", advice.reasoning);
        }

        Commands::Stake => {
            controller.sync_state().await?;
            let (advice, stake) = controller.recommended_stake().await?;
            println!(
                "Advised: bet ${:.2} on {} ({})",
                stake,
                advice.recommended_sum,
                advice.recommended_strategy
            );
        }

        Commands::Strategy { strategy } => {
            controller.sync_state().await?;
            let state = controller.change_strategy(strategy).await?;
            println!(
                "Strategy changed to {}.",
                state.current_strategy.to_string().to_uppercase()
            );
        }

        Commands::Analytics => match engine.analytics().await {
            Ok(snapshot) => match AnalyticsAggregator::aggregate(&snapshot) {
                Ok(report) => print_report(&report),
                Err(GameError::InsufficientData { rounds }) => {
                    println!(
                        "Not enough data yet ({rounds} round(s) played). \
                         Place more bets; analytics needs at least 2 rounds."
                    );
                }
                Err(err) => return Err(err.into()),
            },
            Err(err) => return Err(err.into()),
        },

        Commands::Auto { rounds } => {
            let state = controller.sync_state().await?;
            println!("\n=== Autoplay ===");
            println!("Bankroll: ${:.2}", state.money);
            println!("Rounds:   {rounds}");
            println!("\nPress Ctrl+C to stop.\n");

            run_autoplay(&controller, Arc::clone(&engine), rounds).await?;

            let snap = controller.snapshot().await;
            print_state(&snap.state);
        }

        Commands::Portfolio(command) => run_portfolio(engine.as_ref(), command).await?,
    }

    Ok(())
}

/// Advice-driven betting loop with an independent analytics refresh.
async fn run_autoplay(
    controller: &RoundController<EngineClient>,
    engine: Arc<EngineClient>,
    rounds: u32,
) -> Result<()> {
    // Analytics refresh runs on its own cadence, reading only
    // engine-of-record state; torn down with the loop.
    let poller = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        interval.tick().await;
        loop {
            interval.tick().await;
            match engine.analytics().await {
                Ok(snapshot) => {
                    if let Ok(report) = AnalyticsAggregator::aggregate(&snapshot) {
                        info!(
                            win_rate = report.win_rate,
                            sharpe = report.sharpe_ratio,
                            drawdown = report.max_drawdown,
                            "Analytics refreshed"
                        );
                    }
                }
                Err(err) => warn!(error = %err, "Analytics refresh failed"),
            }
        }
    });

    let mut settlements = controller.settlements();
    let mut stopped = false;

    for round in 1..=rounds {
        let (advice, stake) = controller.recommended_stake().await?;
        if stake <= Decimal::ZERO {
            println!("Bankroll exhausted, stopping.");
            break;
        }

        println!(
            "[{round}/{rounds}] Betting ${:.2} on {} ({})",
            stake, advice.recommended_sum, advice.recommended_strategy
        );
        controller
            .submit_bet(advice.recommended_sum, stake)
            .await?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping autoplay...");
                stopped = true;
            }
            changed = settlements.changed() => {
                changed?;
                let snap = controller.snapshot().await;
                if let Some(result) = snap.last_result {
                    print_settlement(&result);
                }
            }
        }

        if stopped {
            break;
        }
    }

    poller.abort();
    Ok(())
}

async fn run_portfolio(engine: &EngineClient, command: PortfolioCommands) -> Result<()> {
    match command {
        PortfolioCommands::Add { sum, amount } => {
            let added = engine.portfolio_add(sum, Decimal::try_from(amount)?).await?;
            if added {
                println!("Added ${amount:.2} on {sum}.");
            } else {
                println!("Portfolio is full.");
            }
        }
        PortfolioCommands::Remove { sum } => {
            let amount = engine.portfolio_remove(sum).await?;
            println!("Removed ${amount:.2} from {sum}.");
        }
        PortfolioCommands::Clear => {
            engine.portfolio_clear().await?;
            println!("Portfolio cleared.");
        }
        PortfolioCommands::Show => {
            let portfolio = engine.portfolio().await?;
            if portfolio.positions.is_empty() {
                println!("No open positions.");
            } else {
                println!("\n{:>4} {:>10}", "SUM", "AMOUNT");
                for position in &portfolio.positions {
                    println!("{:>4} {:>10.2}", position.bet_sum, position.amount);
                }
                println!("\nTotal invested: ${:.2}", portfolio.total_invested());
            }
        }
        PortfolioCommands::Risk => {
            let risk = engine.portfolio_risk().await?;
            println!("\n=== Portfolio Risk ===");
            println!("Expected Return: ${:.2}", risk.expected_return);
            println!("Max Loss:        ${:.2}", risk.max_loss);
            println!("Max Gain:        ${:.2}", risk.max_gain);
            println!("Win Probability: {:.1}%", risk.win_probability * 100.0);
        }
    }
    Ok(())
}

fn print_report(report: &AnalyticsReport) {
    println!("\n=== Performance ({} rounds) ===", report.rounds);
    println!("Win Rate:     {:.1}%", report.win_rate * 100.0);
    println!("Avg Win:      ${:.2}", report.avg_win);
    println!("Avg Loss:     ${:.2}", report.avg_loss);
    println!("Sharpe Ratio: {:.2}", report.sharpe_ratio);
    println!("Max Drawdown: {:.1}%", report.max_drawdown * 100.0);

    println!("\n=== Average Return by Trend ===");
    println!("Bull: {:+.2}%", report.avg_return_bull * 100.0);
    println!("Bear: {:+.2}%", report.avg_return_bear * 100.0);

    println!("\n=== Win/Loss by Sum ===");
    println!("{:>4} {:>6} {:>7}", "SUM", "WINS", "LOSSES");
    for (sum, record) in &report.sum_distribution {
        println!("{:>4} {:>6} {:>7}", sum, record.wins, record.losses);
    }
}

fn print_state(state: &GameState) {
    println!("\n=== Game ===");
    println!("Bankroll:   ${:.2}", state.money);
    println!("Trend:      {}", state.trend.as_str().to_uppercase());
    println!("Volatility: {:.0}%", state.volatility * 100.0);
    println!("Strategy:   {}", state.current_strategy.to_string().to_uppercase());
    println!("Rounds:     {}", state.round_count);
    println!("Win Rate:   {:.1}%", state.win_rate() * 100.0);

    if !state.probabilities.is_empty() {
        println!("\n{:>4} {:>8} {:>7}", "SUM", "PROB", "PAYOUT");
        for (sum, probability) in &state.probabilities {
            println!(
                "{:>4} {:>7.1}% {:>6}x",
                sum,
                probability * 100.0,
                payout_for_sum(*sum)
            );
        }
    }
}

fn print_settlement(result: &BetResult) {
    match result.result {
        BetOutcome::Win => println!("You won ${:.2}!", result.profit_loss),
        BetOutcome::Loss => println!("You lost ${:.2}.", result.profit_loss.abs()),
    }
    if result.trend_changed {
        if let Some(trend) = result.new_trend {
            println!("Market trend changed to {}.", trend.as_str().to_uppercase());
        }
        if let Some(news) = &result.market_news {
            println!("News: {news}");
        }
    }
}
