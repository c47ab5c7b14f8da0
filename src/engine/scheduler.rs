//! Periodic maintenance driven by an external tick.
//!
//! The engine has no internal worker threads. A caller (the CLI, a cron
//! job) invokes `tick` and the scheduler does the wall-clock work: matured
//! cooldown capital returns to available and the current elapsed hour gets
//! its equity snapshot. Both steps are idempotent, so ticks can fire as
//! often or as rarely as the caller likes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Simulation;

use super::ledger::PortfolioLedger;

/// Aggregate result of a tick across a simulation's portfolios.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickOutcome {
    /// Cooldown capital returned to available, summed over portfolios
    pub capital_released: Decimal,

    /// Hourly snapshots written by this tick
    pub snapshots_recorded: u32,
}

/// Result of ticking one portfolio.
pub struct PortfolioTick {
    pub released: Decimal,

    /// Positions whose cooldown flag flipped, for persistence
    pub released_positions: Vec<String>,

    pub snapshot_recorded: bool,
}

pub struct CapitalScheduler;

impl CapitalScheduler {
    /// Whether a scheduled simulation's start time has passed.
    pub fn due_for_promotion(sim: &Simulation, now: DateTime<Utc>) -> bool {
        sim.state == crate::models::LifecycleState::Scheduled && now >= sim.starts_at
    }

    /// Run one tick against a portfolio held under its lock.
    pub fn tick_portfolio(
        ledger: &mut PortfolioLedger,
        hour_index: u32,
        now: DateTime<Utc>,
    ) -> PortfolioTick {
        let (released, released_positions) = ledger.release_cooldown(now);
        let snapshot_recorded = ledger.record_snapshot(hour_index, now);

        PortfolioTick {
            released,
            released_positions,
            snapshot_recorded,
        }
    }
}
