//! Portfolio state: one isolated capital pool per strategy per simulation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::position::Position;

/// Equity sample recorded once per elapsed simulation hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlySnapshot {
    /// Hours elapsed since the simulation started
    pub hour_index: u32,

    /// Total equity: available + locked + cooldown
    pub portfolio_value: Decimal,

    /// portfolio_value − starting capital
    pub cumulative_pnl: Decimal,

    /// Open positions at snapshot time
    pub open_positions: u32,

    pub recorded_at: DateTime<Utc>,
}

/// Capital and position state for one strategy inside a simulation.
///
/// Capital cycles Available → Locked → Cooldown → Available; the three
/// buckets always sum to `starting_capital + Σ realized P&L of settled
/// positions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub strategy_id: String,

    pub strategy_name: String,

    pub starting_capital: Decimal,

    /// Cash spendable on new positions
    pub available_cash: Decimal,

    /// Stake committed to open positions
    pub locked_capital: Decimal,

    /// Settled proceeds waiting out the hold period
    pub cooldown_capital: Decimal,

    /// Open positions keyed by position id
    pub open_positions: HashMap<String, Position>,

    /// Settled positions, append-only, in settlement order
    pub closed_positions: Vec<Position>,

    /// One entry per elapsed hour, append-only
    pub hourly_snapshots: Vec<HourlySnapshot>,

    /// Signals this strategy has evaluated (accepted or not)
    pub signals_evaluated: u64,

    /// Signals that became positions
    pub signals_taken: u64,

    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(
        strategy_id: String,
        strategy_name: String,
        starting_capital: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_id,
            strategy_name,
            starting_capital,
            available_cash: starting_capital,
            locked_capital: Decimal::ZERO,
            cooldown_capital: Decimal::ZERO,
            open_positions: HashMap::new(),
            closed_positions: Vec::new(),
            hourly_snapshots: Vec::new(),
            signals_evaluated: 0,
            signals_taken: 0,
            created_at,
        }
    }

    /// Total equity excluding unrealized mark-to-market.
    pub fn equity(&self) -> Decimal {
        self.available_cash + self.locked_capital + self.cooldown_capital
    }

    /// Sum of realized P&L across settled positions.
    pub fn realized_pnl(&self) -> Decimal {
        self.closed_positions
            .iter()
            .filter_map(|p| p.settlement.as_ref())
            .map(|s| s.realized_pnl)
            .sum()
    }

    /// Unrealized mark-to-market P&L of open positions.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.open_positions.values().map(|p| p.unrealized_pnl()).sum()
    }

    /// Capital conservation check: the three buckets must equal starting
    /// capital plus realized P&L.
    pub fn is_balanced(&self) -> bool {
        self.equity() == self.starting_capital + self.realized_pnl()
    }

    /// Find a settled position by id.
    pub fn closed_position(&self, position_id: &str) -> Option<&Position> {
        self.closed_positions.iter().find(|p| p.id == position_id)
    }

    /// Hour index of the most recent snapshot, if any.
    pub fn last_snapshot_hour(&self) -> Option<u32> {
        self.hourly_snapshots.last().map(|s| s.hour_index)
    }
}
