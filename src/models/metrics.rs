//! Performance metric and ranking models derived from a portfolio.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Performance summary for one strategy's portfolio.
///
/// Ratio metrics are `Option` where the denominator can be empty: win rate
/// is undefined with zero resolved trades, Sharpe with fewer than two
/// snapshots. Serialized as null rather than faked as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub strategy_id: String,

    pub strategy_name: String,

    /// Equity: available + locked + cooldown
    pub equity: Decimal,

    pub realized_pnl: Decimal,

    /// Mark-to-market P&L of open positions at latest known prices
    pub unrealized_pnl: Decimal,

    /// realized + unrealized
    pub total_pnl: Decimal,

    /// total_pnl / starting capital
    pub roi: Decimal,

    pub won: u32,
    pub lost: u32,
    pub voided: u32,
    pub open: u32,

    /// won / (won + lost); None when nothing has resolved
    pub win_rate: Option<f64>,

    /// Largest peak-to-trough decline of the snapshot equity curve (0 to 1)
    pub max_drawdown: f64,

    /// Mean hourly return over its standard deviation; None with fewer
    /// than two snapshots
    pub sharpe_ratio: Option<f64>,

    pub signals_evaluated: u64,
    pub signals_taken: u64,

    /// taken / evaluated. Can exceed 1.0 when the evaluated counter
    /// started later than the taken counter; reported unclamped as the
    /// original system did.
    pub percent_made: Option<f64>,
}

/// One entry of the final ranking produced when a simulation ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStrategy {
    /// 1-based rank by final equity, descending
    pub rank: u32,

    pub strategy_id: String,

    pub strategy_name: String,

    pub final_value: Decimal,

    pub total_pnl: Decimal,

    pub roi: Decimal,

    pub win_rate: Option<f64>,

    /// Positions opened over the simulation's life
    pub trades: u32,
}

/// Final report returned by `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub simulation_id: String,

    pub started_at: DateTime<Utc>,

    pub ended_at: DateTime<Utc>,

    pub rankings: Vec<RankedStrategy>,
}

impl SimulationReport {
    pub fn duration_hours(&self) -> i64 {
        (self.ended_at - self.started_at).num_hours()
    }
}

impl Default for SimulationReport {
    fn default() -> Self {
        Self {
            simulation_id: String::new(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            rankings: Vec::new(),
        }
    }
}
