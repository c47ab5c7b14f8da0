//! Registry of live simulations.
//!
//! Holds each simulation's metadata and strategy configs plus one async
//! mutex per portfolio. The portfolio mutex is the unit of mutual
//! exclusion: every load-mutate-save against a portfolio runs under it,
//! while different portfolios proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::EngineError;
use crate::models::{LifecycleState, Simulation};

use super::config::StrategyConfig;

/// One strategy's config and its portfolio lock.
pub struct StrategyEntry {
    pub config: StrategyConfig,
    pub lock: Mutex<()>,
}

/// Shared per-simulation state.
pub struct SimulationHandle {
    pub meta: RwLock<Simulation>,
    strategies: Vec<StrategyEntry>,
}

impl SimulationHandle {
    pub fn new(sim: Simulation, configs: Vec<StrategyConfig>) -> Self {
        Self {
            meta: RwLock::new(sim),
            strategies: configs
                .into_iter()
                .map(|config| StrategyEntry {
                    config,
                    lock: Mutex::new(()),
                })
                .collect(),
        }
    }

    /// Strategies in creation order.
    pub fn strategies(&self) -> impl Iterator<Item = &StrategyEntry> {
        self.strategies.iter()
    }

    pub fn strategy(&self, strategy_id: &str) -> Option<&StrategyEntry> {
        self.strategies.iter().find(|e| e.config.id == strategy_id)
    }

    pub async fn state(&self) -> LifecycleState {
        self.meta.read().await.state
    }
}

/// All simulations known to this process, keyed by id.
#[derive(Default)]
pub struct SimulationRegistry {
    simulations: RwLock<HashMap<String, Arc<SimulationHandle>>>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, sim: Simulation, configs: Vec<StrategyConfig>) {
        let id = sim.id.clone();
        let handle = Arc::new(SimulationHandle::new(sim, configs));
        self.simulations.write().await.insert(id, handle);
    }

    pub async fn get(&self, sim_id: &str) -> Result<Arc<SimulationHandle>, EngineError> {
        self.simulations
            .read()
            .await
            .get(sim_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSimulation(sim_id.to_string()))
    }

    /// Metadata of every registered simulation.
    pub async fn list(&self) -> Vec<Simulation> {
        let handles: Vec<Arc<SimulationHandle>> =
            self.simulations.read().await.values().cloned().collect();

        let mut sims = Vec::with_capacity(handles.len());
        for handle in handles {
            sims.push(handle.meta.read().await.clone());
        }
        sims.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        sims
    }

    /// Rebuild the registry from stored simulations, so a fresh process can
    /// keep operating on simulations created by earlier runs.
    pub async fn restore(&self, stored: Vec<(Simulation, Vec<StrategyConfig>)>) {
        for (sim, configs) in stored {
            self.insert(sim, configs).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimulationSettings;
    use chrono::Utc;

    fn sim(id: &str) -> Simulation {
        Simulation {
            id: id.to_string(),
            created_at: Utc::now(),
            starts_at: Utc::now(),
            settings: SimulationSettings::default(),
            state: LifecycleState::Active,
        }
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let registry = SimulationRegistry::new();
        registry
            .insert(sim("sim-1"), vec![StrategyConfig::default()])
            .await;

        let handle = registry.get("sim-1").await.unwrap();
        assert!(handle.strategy("default").is_some());
        assert!(handle.strategy("missing").is_none());

        assert!(matches!(
            registry.get("sim-2").await,
            Err(EngineError::UnknownSimulation(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_registers_stored_simulations() {
        let registry = SimulationRegistry::new();
        registry
            .restore(vec![
                (sim("a"), vec![StrategyConfig::default()]),
                (sim("b"), vec![]),
            ])
            .await;

        assert_eq!(registry.list().await.len(), 2);
        assert!(registry.get("b").await.is_ok());
    }
}
