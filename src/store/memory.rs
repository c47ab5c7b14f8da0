//! In-memory map-backed store, used by tests and ephemeral runs.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::engine::StrategyConfig;
use crate::error::StoreError;
use crate::models::{HourlySnapshot, LifecycleState, Portfolio, Position, Simulation};

use super::PortfolioStore;

struct StoredSimulation {
    sim: Simulation,
    configs: Vec<StrategyConfig>,
    portfolios: HashMap<String, Portfolio>,
}

/// HashMap-backed `PortfolioStore`.
#[derive(Default)]
pub struct MemoryStore {
    simulations: RwLock<HashMap<String, StoredSimulation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PortfolioStore for MemoryStore {
    async fn insert_simulation(
        &self,
        sim: &Simulation,
        configs: &[StrategyConfig],
        portfolios: &[Portfolio],
    ) -> Result<(), StoreError> {
        let mut sims = self.simulations.write().await;
        sims.insert(
            sim.id.clone(),
            StoredSimulation {
                sim: sim.clone(),
                configs: configs.to_vec(),
                portfolios: portfolios
                    .iter()
                    .map(|p| (p.strategy_id.clone(), p.clone()))
                    .collect(),
            },
        );
        Ok(())
    }

    async fn update_simulation_state(
        &self,
        sim_id: &str,
        state: LifecycleState,
    ) -> Result<(), StoreError> {
        let mut sims = self.simulations.write().await;
        let stored = sims
            .get_mut(sim_id)
            .ok_or_else(|| StoreError::Corrupt(format!("simulation {sim_id} not stored")))?;
        stored.sim.state = state;
        Ok(())
    }

    async fn load_simulations(&self) -> Result<Vec<(Simulation, Vec<StrategyConfig>)>, StoreError> {
        let sims = self.simulations.read().await;
        Ok(sims
            .values()
            .map(|s| (s.sim.clone(), s.configs.clone()))
            .collect())
    }

    async fn load_portfolio(
        &self,
        sim_id: &str,
        strategy_id: &str,
    ) -> Result<Portfolio, StoreError> {
        let sims = self.simulations.read().await;
        sims.get(sim_id)
            .and_then(|s| s.portfolios.get(strategy_id))
            .cloned()
            .ok_or_else(|| StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: strategy_id.to_string(),
            })
    }

    async fn save_portfolio(&self, sim_id: &str, portfolio: &Portfolio) -> Result<(), StoreError> {
        let mut sims = self.simulations.write().await;
        let stored = sims
            .get_mut(sim_id)
            .and_then(|s| s.portfolios.get_mut(&portfolio.strategy_id))
            .ok_or_else(|| StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: portfolio.strategy_id.clone(),
            })?;

        stored.available_cash = portfolio.available_cash;
        stored.locked_capital = portfolio.locked_capital;
        stored.cooldown_capital = portfolio.cooldown_capital;
        stored.signals_evaluated = portfolio.signals_evaluated;
        stored.signals_taken = portfolio.signals_taken;
        stored.open_positions = portfolio.open_positions.clone();
        Ok(())
    }

    async fn apply_settlement(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<bool, StoreError> {
        let mut sims = self.simulations.write().await;
        let stored = sims
            .get_mut(sim_id)
            .and_then(|s| s.portfolios.get_mut(strategy_id))
            .ok_or_else(|| StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: strategy_id.to_string(),
            })?;

        let settlement = position.settlement.ok_or_else(|| {
            StoreError::Corrupt(format!("position {} has no settlement", position.id))
        })?;
        if stored.open_positions.remove(&position.id).is_none() {
            return Ok(false);
        }

        stored.locked_capital -= position.invested;
        stored.cooldown_capital += settlement.exit_value;
        stored.closed_positions.push(position.clone());
        Ok(true)
    }

    async fn append_closed_position(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<(), StoreError> {
        let mut sims = self.simulations.write().await;
        let stored = sims
            .get_mut(sim_id)
            .and_then(|s| s.portfolios.get_mut(strategy_id))
            .ok_or_else(|| StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: strategy_id.to_string(),
            })?;

        match stored
            .closed_positions
            .iter_mut()
            .find(|p| p.id == position.id)
        {
            Some(existing) => *existing = position.clone(),
            None => stored.closed_positions.push(position.clone()),
        }
        Ok(())
    }

    async fn append_snapshot(
        &self,
        sim_id: &str,
        strategy_id: &str,
        snapshot: &HourlySnapshot,
    ) -> Result<(), StoreError> {
        let mut sims = self.simulations.write().await;
        let stored = sims
            .get_mut(sim_id)
            .and_then(|s| s.portfolios.get_mut(strategy_id))
            .ok_or_else(|| StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: strategy_id.to_string(),
            })?;

        if !stored
            .hourly_snapshots
            .iter()
            .any(|s| s.hour_index == snapshot.hour_index)
        {
            stored.hourly_snapshots.push(snapshot.clone());
        }
        Ok(())
    }

    async fn find_open_positions_by_market(
        &self,
        sim_id: &str,
        market_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let sims = self.simulations.read().await;
        let stored = sims
            .get(sim_id)
            .ok_or_else(|| StoreError::Corrupt(format!("simulation {sim_id} not stored")))?;

        Ok(stored
            .portfolios
            .values()
            .filter(|p| {
                p.open_positions
                    .values()
                    .any(|pos| pos.market_id == market_id)
            })
            .map(|p| p.strategy_id.clone())
            .collect())
    }
}
