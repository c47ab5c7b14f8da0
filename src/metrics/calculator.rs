//! Calculator for portfolio performance metrics: P&L, win rate, MDD,
//! Sharpe ratio, and the final cross-strategy ranking.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use crate::models::{
    Portfolio, PortfolioMetrics, PositionStatus, RankedStrategy, Simulation, SimulationReport,
};

/// Hours in a year, for annualizing hourly snapshot returns.
const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Pure metrics computation over a portfolio. Reads only; every number is
/// recomputable from the portfolio alone.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute the full performance summary for one portfolio.
    pub fn calculate(portfolio: &Portfolio) -> PortfolioMetrics {
        let won = Self::count_status(portfolio, PositionStatus::Won);
        let lost = Self::count_status(portfolio, PositionStatus::Lost);
        let voided = Self::count_status(portfolio, PositionStatus::Void);

        let realized_pnl = portfolio.realized_pnl();
        let unrealized_pnl = portfolio.unrealized_pnl();
        let total_pnl = realized_pnl + unrealized_pnl;
        let roi = if portfolio.starting_capital.is_zero() {
            Decimal::ZERO
        } else {
            total_pnl / portfolio.starting_capital
        };

        // VOID trades carry no win/loss information
        let win_rate = if won + lost > 0 {
            Some(f64::from(won) / f64::from(won + lost))
        } else {
            None
        };

        let percent_made = if portfolio.signals_evaluated > 0 {
            // Unclamped: counters that started at different times can put
            // this above 100
            Some(portfolio.signals_taken as f64 / portfolio.signals_evaluated as f64 * 100.0)
        } else {
            None
        };

        PortfolioMetrics {
            strategy_id: portfolio.strategy_id.clone(),
            strategy_name: portfolio.strategy_name.clone(),
            equity: portfolio.equity(),
            realized_pnl,
            unrealized_pnl,
            total_pnl,
            roi,
            won,
            lost,
            voided,
            open: portfolio.open_positions.len() as u32,
            win_rate,
            max_drawdown: Self::max_drawdown(portfolio),
            sharpe_ratio: Self::sharpe_ratio(portfolio),
            signals_evaluated: portfolio.signals_evaluated,
            signals_taken: portfolio.signals_taken,
            percent_made,
        }
    }

    fn count_status(portfolio: &Portfolio, status: PositionStatus) -> u32 {
        portfolio
            .closed_positions
            .iter()
            .filter(|p| p.status == status)
            .count() as u32
    }

    /// Largest peak-to-trough decline of the snapshot equity curve, as a
    /// fraction of the peak.
    fn max_drawdown(portfolio: &Portfolio) -> f64 {
        let mut peak = 0.0f64;
        let mut max_dd = 0.0f64;

        for snapshot in &portfolio.hourly_snapshots {
            let value = snapshot.portfolio_value.to_f64().unwrap_or(0.0);
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

    /// Sharpe-like ratio over hourly snapshot returns, annualized, with a
    /// 0% risk-free rate. `None` until the curve has enough points to carry
    /// a variance.
    fn sharpe_ratio(portfolio: &Portfolio) -> Option<f64> {
        let values: Vec<f64> = portfolio
            .hourly_snapshots
            .iter()
            .filter_map(|s| s.portfolio_value.to_f64())
            .collect();

        let returns: Vec<f64> = values
            .windows(2)
            .filter(|w| w[0] > 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect();

        if returns.len() < 2 {
            return None;
        }

        let mean = returns.clone().mean();
        let std_dev = returns.std_dev();
        if std_dev > 0.0 {
            Some(mean / std_dev * HOURS_PER_YEAR.sqrt())
        } else {
            None
        }
    }
}

/// Produces the final leaderboard when a simulation ends.
pub struct Ranker;

impl Ranker {
    /// Rank portfolios by final equity, descending. Ties go to the earlier
    /// portfolio, then the lexically smaller strategy id, so the order is
    /// total and stable across runs.
    pub fn rank(
        sim: &Simulation,
        portfolios: &[Portfolio],
        ended_at: DateTime<Utc>,
    ) -> SimulationReport {
        let mut entries: Vec<(&Portfolio, PortfolioMetrics)> = portfolios
            .iter()
            .map(|p| (p, MetricsCalculator::calculate(p)))
            .collect();

        entries.sort_by(|(pa, ma), (pb, mb)| {
            mb.equity
                .cmp(&ma.equity)
                .then(pa.created_at.cmp(&pb.created_at))
                .then(pa.strategy_id.cmp(&pb.strategy_id))
        });

        let rankings = entries
            .into_iter()
            .enumerate()
            .map(|(i, (portfolio, metrics))| RankedStrategy {
                rank: i as u32 + 1,
                strategy_id: metrics.strategy_id,
                strategy_name: metrics.strategy_name,
                final_value: metrics.equity,
                total_pnl: metrics.total_pnl,
                roi: metrics.roi,
                win_rate: metrics.win_rate,
                trades: portfolio.signals_taken as u32,
            })
            .collect();

        SimulationReport {
            simulation_id: sim.id.clone(),
            started_at: sim.starts_at,
            ended_at,
            rankings,
        }
    }
}
