//! Pluggable persistence boundary for portfolio state.
//!
//! One abstraction, two backings: `MemoryStore` for tests and ephemeral
//! runs, `SqliteStore` for durable runs. The engine is written once against
//! the trait and performs no implicit retries; a failed store call surfaces
//! to the caller, whose retry is safe because every transition is
//! idempotent.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::engine::StrategyConfig;
use crate::error::StoreError;
use crate::models::{HourlySnapshot, LifecycleState, Portfolio, Position, Simulation};

/// Persistence contract for simulations and their portfolios.
///
/// Callers hold the per-portfolio lock across load-mutate-save, so each
/// state transition observes and writes a consistent portfolio.
pub trait PortfolioStore: Send + Sync {
    /// Persist a new simulation with its strategy configs and portfolios.
    async fn insert_simulation(
        &self,
        sim: &Simulation,
        configs: &[StrategyConfig],
        portfolios: &[Portfolio],
    ) -> Result<(), StoreError>;

    /// Persist a lifecycle transition.
    async fn update_simulation_state(
        &self,
        sim_id: &str,
        state: LifecycleState,
    ) -> Result<(), StoreError>;

    /// Load every stored simulation with its configs, for registry restore.
    async fn load_simulations(&self) -> Result<Vec<(Simulation, Vec<StrategyConfig>)>, StoreError>;

    /// Load the full portfolio for one strategy.
    async fn load_portfolio(
        &self,
        sim_id: &str,
        strategy_id: &str,
    ) -> Result<Portfolio, StoreError>;

    /// Persist a portfolio's capital state, counters, and open positions.
    /// Closed positions and snapshots go through the append methods.
    async fn save_portfolio(&self, sim_id: &str, portfolio: &Portfolio) -> Result<(), StoreError>;

    /// Atomically record one newly settled position: rewrite its row and
    /// move its stake from locked to cooldown capital, but only if the
    /// store still holds it OPEN. Returns whether this call applied it.
    ///
    /// The conditional write is the cross-process guard: the per-portfolio
    /// lock serializes settlements within one process, and this method
    /// keeps two processes sharing a database from both applying the same
    /// P&L delta.
    async fn apply_settlement(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<bool, StoreError>;

    /// Update a settled position's stored row, currently the
    /// cooldown-release flag. Upsert by position id.
    async fn append_closed_position(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<(), StoreError>;

    /// Record an hourly snapshot. Upsert by hour index.
    async fn append_snapshot(
        &self,
        sim_id: &str,
        strategy_id: &str,
        snapshot: &HourlySnapshot,
    ) -> Result<(), StoreError>;

    /// Strategy ids holding OPEN positions in a market. Re-derived by
    /// query, never from cached references, so resolution sees positions
    /// written by other processes.
    async fn find_open_positions_by_market(
        &self,
        sim_id: &str,
        market_id: &str,
    ) -> Result<Vec<String>, StoreError>;
}
