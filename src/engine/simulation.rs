//! The simulation engine: every external operation enters here.
//!
//! The engine is stateless over the store. Each operation takes the
//! portfolio's registry lock, loads the portfolio, applies the transition
//! through a ledger, and writes the result back, so concurrent triggers
//! (signals, resolutions, ticks, end) serialize per portfolio and nowhere
//! else.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::metrics::{MetricsCalculator, Ranker};
use crate::models::{
    HourlySnapshot, LifecycleState, Portfolio, PortfolioMetrics, Position, Simulation,
    SimulationReport, TradeSignal,
};
use crate::store::PortfolioStore;

use super::config::CreateSimulation;
use super::evaluator::{RejectReason, SignalEvaluator};
use super::ledger::{LedgerSettings, PortfolioLedger};
use super::registry::{SimulationHandle, SimulationRegistry};
use super::resolution::{MarketResolution, ResolutionEngine};
use super::scheduler::{CapitalScheduler, TickOutcome};
use super::sizer::PositionSizer;

/// One strategy's reason for declining a signal.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyRejection {
    pub strategy_id: String,
    pub reason: RejectReason,
}

/// Outcome of one signal across every strategy in a simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SignalOutcome {
    pub signal_id: String,

    /// True when at least one strategy entered a position
    pub accepted: bool,

    pub strategies_entered: Vec<String>,

    pub rejections: Vec<StrategyRejection>,
}

/// Outcome of a market resolution delivery.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    pub market_id: String,

    /// Positions settled by this delivery; redeliveries count zero
    pub positions_resolved: u32,
}

/// Per-strategy slice of a status report.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyStatus {
    pub available_cash: Decimal,
    pub locked_capital: Decimal,
    pub cooldown_capital: Decimal,

    #[serde(flatten)]
    pub metrics: PortfolioMetrics,

    /// Populated only when full detail was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_positions: Option<Vec<Position>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_positions: Option<Vec<Position>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_snapshots: Option<Vec<HourlySnapshot>>,
}

/// Point-in-time view of a simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStatus {
    pub simulation: Simulation,
    pub strategies: Vec<StrategyStatus>,
}

/// Engine facade over one store backend.
pub struct SimulationEngine<S> {
    store: Arc<S>,
    registry: SimulationRegistry,
}

impl<S: PortfolioStore> SimulationEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            registry: SimulationRegistry::new(),
        }
    }

    /// Register every stored simulation, so operations keep working across
    /// process restarts.
    pub async fn restore(&self) -> Result<(), EngineError> {
        let stored = self.store.load_simulations().await?;
        self.registry.restore(stored).await;
        Ok(())
    }

    /// Metadata of every known simulation.
    pub async fn list(&self) -> Vec<Simulation> {
        self.registry.list().await
    }

    /// Create a simulation with one isolated portfolio per strategy.
    pub async fn create_simulation(
        &self,
        request: CreateSimulation,
        now: DateTime<Utc>,
    ) -> Result<Simulation, EngineError> {
        if request.strategies.is_empty() {
            return Err(EngineError::InvalidConfig(
                "a simulation needs at least one strategy".to_string(),
            ));
        }

        let mut configs = request.strategies;
        for config in &mut configs {
            if let Some(capital) = request.initial_capital_per_strategy {
                config.starting_capital = capital;
            }
            config.validate()?;
        }
        for (i, config) in configs.iter().enumerate() {
            if configs[..i].iter().any(|c| c.id == config.id) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate strategy id {}",
                    config.id
                )));
            }
        }

        let starts_at = request.starts_at.unwrap_or(now);
        let sim = Simulation {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            starts_at,
            settings: request.settings,
            state: if starts_at > now {
                LifecycleState::Scheduled
            } else {
                LifecycleState::Active
            },
        };

        let portfolios: Vec<Portfolio> = configs
            .iter()
            .map(|c| Portfolio::new(c.id.clone(), c.name.clone(), c.starting_capital, now))
            .collect();

        self.store
            .insert_simulation(&sim, &configs, &portfolios)
            .await?;
        self.registry.insert(sim.clone(), configs).await;

        info!(
            sim = %sim.id,
            strategies = portfolios.len(),
            state = sim.state.as_str(),
            "Created simulation"
        );
        Ok(sim)
    }

    /// Evaluate a signal against every strategy, entering positions where
    /// accepted. Signals before a scheduled start are dropped untouched.
    pub async fn ingest_signal(
        &self,
        sim_id: &str,
        signal: &TradeSignal,
        now: DateTime<Utc>,
    ) -> Result<SignalOutcome, EngineError> {
        let handle = self.registry.get(sim_id).await?;
        let sim = self.ensure_running(sim_id, &handle, now).await?;
        let Some(sim) = sim else {
            warn!(sim = %sim_id, signal = %signal.id, "Signal before scheduled start, dropped");
            return Ok(SignalOutcome {
                signal_id: signal.id.clone(),
                accepted: false,
                strategies_entered: Vec::new(),
                rejections: Vec::new(),
            });
        };

        let settings = LedgerSettings::from(&sim.settings);
        let mut entered = Vec::new();
        let mut rejections = Vec::new();

        for entry in handle.strategies() {
            let _guard = entry.lock.lock().await;
            let portfolio = self.store.load_portfolio(sim_id, &entry.config.id).await?;
            let mut ledger = PortfolioLedger::new(portfolio, settings.clone());

            ledger.portfolio_mut().signals_evaluated += 1;
            // Later activity on a market is the freshest price we see
            ledger.mark_price(&signal.market_id, signal.price);

            let evaluation = SignalEvaluator::evaluate(signal, &entry.config, ledger.portfolio());
            let decision = if let Some(reason) = evaluation.reason {
                Err(reason)
            } else {
                PositionSizer::stake(signal, &entry.config, ledger.portfolio())
            };

            match decision {
                Ok(stake) => {
                    let position_id = Uuid::new_v4().to_string();
                    ledger.open(position_id, signal, stake, now)?;
                    ledger.portfolio_mut().signals_taken += 1;
                    entered.push(entry.config.id.clone());
                }
                Err(reason) => {
                    rejections.push(StrategyRejection {
                        strategy_id: entry.config.id.clone(),
                        reason,
                    });
                }
            }

            self.store
                .save_portfolio(sim_id, ledger.portfolio())
                .await?;
        }

        Ok(SignalOutcome {
            signal_id: signal.id.clone(),
            accepted: !entered.is_empty(),
            strategies_entered: entered,
            rejections,
        })
    }

    /// Settle every open position on a resolved market across every
    /// strategy. Safe to deliver repeatedly.
    pub async fn resolve_market(
        &self,
        sim_id: &str,
        market_id: &str,
        winning_outcome: &str,
        now: DateTime<Utc>,
    ) -> Result<ResolutionOutcome, EngineError> {
        let handle = self.registry.get(sim_id).await?;
        if handle.state().await == LifecycleState::Ended {
            return Err(EngineError::SimulationEnded(sim_id.to_string()));
        }

        let settings = LedgerSettings::from(&handle.meta.read().await.settings);
        let resolution = MarketResolution::new(market_id, winning_outcome);

        // Candidates come from the store, not from memory: positions written
        // by another process still resolve.
        let strategy_ids = self
            .store
            .find_open_positions_by_market(sim_id, market_id)
            .await?;

        let mut resolved = 0u32;
        for strategy_id in strategy_ids {
            let Some(entry) = handle.strategy(&strategy_id) else {
                warn!(sim = %sim_id, strategy = %strategy_id, "Stored portfolio has no registered strategy");
                continue;
            };

            let _guard = entry.lock.lock().await;
            let portfolio = self.store.load_portfolio(sim_id, &strategy_id).await?;
            let mut ledger = PortfolioLedger::new(portfolio, settings.clone());

            let newly = ResolutionEngine::resolve(&mut ledger, &resolution, now)?;
            if newly.is_empty() {
                continue;
            }

            // Each settlement persists through one conditional store write.
            // When a racing process already settled a position, the write
            // reports it unapplied and this delivery does not count it; the
            // ledger's in-memory view is discarded either way.
            for position_id in &newly {
                let position = ledger
                    .portfolio()
                    .closed_position(position_id)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownPosition(position_id.clone()))?;
                if self
                    .store
                    .apply_settlement(sim_id, &strategy_id, &position)
                    .await?
                {
                    resolved += 1;
                }
            }
        }

        Ok(ResolutionOutcome {
            market_id: market_id.to_string(),
            positions_resolved: resolved,
        })
    }

    /// One scheduler tick: promote a due SCHEDULED simulation, release
    /// matured cooldown capital, record the current hour's snapshots.
    pub async fn tick(
        &self,
        sim_id: &str,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, EngineError> {
        let handle = self.registry.get(sim_id).await?;
        let Some(sim) = self.ensure_running(sim_id, &handle, now).await? else {
            return Ok(TickOutcome::default());
        };

        let settings = LedgerSettings::from(&sim.settings);
        let hour_index = sim.elapsed_hours(now);
        let mut outcome = TickOutcome::default();

        for entry in handle.strategies() {
            let _guard = entry.lock.lock().await;
            let portfolio = self.store.load_portfolio(sim_id, &entry.config.id).await?;
            let mut ledger = PortfolioLedger::new(portfolio, settings.clone());

            let tick = CapitalScheduler::tick_portfolio(&mut ledger, hour_index, now);

            for position_id in &tick.released_positions {
                let position = ledger
                    .portfolio()
                    .closed_position(position_id)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownPosition(position_id.clone()))?;
                self.store
                    .append_closed_position(sim_id, &entry.config.id, &position)
                    .await?;
            }
            if tick.snapshot_recorded {
                if let Some(snapshot) = ledger.portfolio().hourly_snapshots.last() {
                    self.store
                        .append_snapshot(sim_id, &entry.config.id, snapshot)
                        .await?;
                }
                outcome.snapshots_recorded += 1;
            }
            if !tick.released.is_zero() || tick.snapshot_recorded {
                self.store
                    .save_portfolio(sim_id, ledger.portfolio())
                    .await?;
            }

            outcome.capital_released += tick.released;
        }

        Ok(outcome)
    }

    /// Capital breakdown and performance summary per strategy. `full` adds
    /// positions and snapshots.
    pub async fn status(
        &self,
        sim_id: &str,
        full: bool,
    ) -> Result<SimulationStatus, EngineError> {
        let handle = self.registry.get(sim_id).await?;
        let simulation = handle.meta.read().await.clone();

        let mut strategies = Vec::new();
        for entry in handle.strategies() {
            let _guard = entry.lock.lock().await;
            let portfolio = self.store.load_portfolio(sim_id, &entry.config.id).await?;

            let metrics = MetricsCalculator::calculate(&portfolio);
            strategies.push(StrategyStatus {
                available_cash: portfolio.available_cash,
                locked_capital: portfolio.locked_capital,
                cooldown_capital: portfolio.cooldown_capital,
                metrics,
                open_positions: full
                    .then(|| portfolio.open_positions.values().cloned().collect()),
                closed_positions: full.then(|| portfolio.closed_positions.clone()),
                hourly_snapshots: full.then(|| portfolio.hourly_snapshots.clone()),
            });
        }

        Ok(SimulationStatus {
            simulation,
            strategies,
        })
    }

    /// End the simulation and produce the final ranking. Terminal: every
    /// later operation fails with `SimulationEnded`.
    pub async fn end_simulation(
        &self,
        sim_id: &str,
        now: DateTime<Utc>,
    ) -> Result<SimulationReport, EngineError> {
        let handle = self.registry.get(sim_id).await?;

        let sim = {
            let mut meta = handle.meta.write().await;
            if meta.state == LifecycleState::Ended {
                return Err(EngineError::SimulationEnded(sim_id.to_string()));
            }
            meta.state = LifecycleState::Ended;
            meta.clone()
        };
        self.store
            .update_simulation_state(sim_id, LifecycleState::Ended)
            .await?;

        let mut portfolios = Vec::new();
        for entry in handle.strategies() {
            let _guard = entry.lock.lock().await;
            portfolios.push(self.store.load_portfolio(sim_id, &entry.config.id).await?);
        }

        let report = Ranker::rank(&sim, &portfolios, now);
        info!(
            sim = %sim_id,
            strategies = report.rankings.len(),
            hours = report.duration_hours(),
            "Ended simulation"
        );
        Ok(report)
    }

    /// Reject ended simulations and promote due scheduled ones. Returns
    /// `None` while the simulation has not started yet.
    async fn ensure_running(
        &self,
        sim_id: &str,
        handle: &SimulationHandle,
        now: DateTime<Utc>,
    ) -> Result<Option<Simulation>, EngineError> {
        {
            let meta = handle.meta.read().await;
            match meta.state {
                LifecycleState::Ended => {
                    return Err(EngineError::SimulationEnded(sim_id.to_string()))
                }
                LifecycleState::Active => return Ok(Some(meta.clone())),
                LifecycleState::Scheduled => {}
            }
        }

        let mut meta = handle.meta.write().await;
        if !CapitalScheduler::due_for_promotion(&meta, now) {
            return Ok(None);
        }
        meta.state = LifecycleState::Active;
        self.store
            .update_simulation_state(sim_id, LifecycleState::Active)
            .await?;
        info!(sim = %sim_id, "Simulation started");
        Ok(Some(meta.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{SizingRule, StrategyConfig};
    use crate::models::{sample_signal, SimulationSettings};
    use crate::store::MemoryStore;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn engine() -> SimulationEngine<MemoryStore> {
        SimulationEngine::new(Arc::new(MemoryStore::new()))
    }

    fn fixed_strategy(id: &str, amount: Decimal) -> StrategyConfig {
        StrategyConfig {
            id: id.to_string(),
            name: id.to_uppercase(),
            sizing: SizingRule::Fixed { amount },
            ..Default::default()
        }
    }

    fn no_slippage() -> SimulationSettings {
        SimulationSettings {
            slippage_pct: Decimal::ZERO,
            ..Default::default()
        }
    }

    async fn create(engine: &SimulationEngine<MemoryStore>, now: DateTime<Utc>) -> Simulation {
        engine
            .create_simulation(
                CreateSimulation {
                    initial_capital_per_strategy: None,
                    settings: no_slippage(),
                    starts_at: None,
                    strategies: vec![fixed_strategy("fixed-50", dec!(50))],
                },
                now,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_bad_configs() {
        let engine = engine();
        let now = Utc::now();

        let empty = CreateSimulation {
            initial_capital_per_strategy: None,
            settings: SimulationSettings::default(),
            starts_at: None,
            strategies: vec![],
        };
        assert!(matches!(
            engine.create_simulation(empty, now).await,
            Err(EngineError::InvalidConfig(_))
        ));

        let duplicated = CreateSimulation {
            initial_capital_per_strategy: None,
            settings: SimulationSettings::default(),
            starts_at: None,
            strategies: vec![fixed_strategy("a", dec!(50)), fixed_strategy("a", dec!(60))],
        };
        assert!(matches!(
            engine.create_simulation(duplicated, now).await,
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_accepted_signal_locks_capital() {
        let engine = engine();
        let now = Utc::now();
        let sim = create(&engine, now).await;

        let outcome = engine
            .ingest_signal(&sim.id, &sample_signal(), now)
            .await
            .unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.strategies_entered, vec!["fixed-50".to_string()]);

        let status = engine.status(&sim.id, false).await.unwrap();
        let s = &status.strategies[0];
        assert_eq!(s.available_cash, dec!(950));
        assert_eq!(s.locked_capital, dec!(50));
        assert_eq!(s.metrics.open, 1);
        assert_eq!(s.metrics.signals_evaluated, 1);
        assert_eq!(s.metrics.signals_taken, 1);
    }

    #[tokio::test]
    async fn test_rejected_signal_reports_reason_and_touches_nothing() {
        let engine = engine();
        let now = Utc::now();
        let sim = create(&engine, now).await;

        let mut signal = sample_signal();
        signal.price = dec!(0.97); // outside default bounds
        let outcome = engine.ingest_signal(&sim.id, &signal, now).await.unwrap();

        assert!(!outcome.accepted);
        assert_eq!(outcome.rejections.len(), 1);
        assert!(matches!(
            outcome.rejections[0].reason,
            RejectReason::PriceOutOfRange
        ));

        let status = engine.status(&sim.id, false).await.unwrap();
        let s = &status.strategies[0];
        assert_eq!(s.available_cash, dec!(1000));
        assert_eq!(s.metrics.signals_evaluated, 1);
        assert_eq!(s.metrics.signals_taken, 0);
    }

    #[tokio::test]
    async fn test_won_market_lifecycle() {
        // $1000 capital, $50 at 0.40, market resolves WON: P&L $75,
        // $125 parked in cooldown, then available after the hold period.
        let engine = engine();
        let now = Utc::now();
        let sim = create(&engine, now).await;
        let signal = sample_signal();

        engine.ingest_signal(&sim.id, &signal, now).await.unwrap();
        let resolved = engine
            .resolve_market(&sim.id, &signal.market_id, "Yes", now)
            .await
            .unwrap();
        assert_eq!(resolved.positions_resolved, 1);

        let status = engine.status(&sim.id, false).await.unwrap();
        let s = &status.strategies[0];
        assert_eq!(s.available_cash, dec!(950));
        assert_eq!(s.locked_capital, Decimal::ZERO);
        assert_eq!(s.cooldown_capital, dec!(125));
        assert_eq!(s.metrics.realized_pnl, dec!(75));
        assert_eq!(s.metrics.won, 1);

        let tick = engine.tick(&sim.id, now + Duration::hours(25)).await.unwrap();
        assert_eq!(tick.capital_released, dec!(125));
        assert_eq!(tick.snapshots_recorded, 1);

        let status = engine.status(&sim.id, false).await.unwrap();
        let s = &status.strategies[0];
        assert_eq!(s.available_cash, dec!(1075));
        assert_eq!(s.cooldown_capital, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_resolution_redelivery_counts_zero() {
        let engine = engine();
        let now = Utc::now();
        let sim = create(&engine, now).await;
        let signal = sample_signal();

        engine.ingest_signal(&sim.id, &signal, now).await.unwrap();
        let first = engine
            .resolve_market(&sim.id, &signal.market_id, "Yes", now)
            .await
            .unwrap();
        let second = engine
            .resolve_market(&sim.id, &signal.market_id, "Yes", now)
            .await
            .unwrap();

        assert_eq!(first.positions_resolved, 1);
        assert_eq!(second.positions_resolved, 0);
    }

    #[tokio::test]
    async fn test_concurrent_resolution_settles_exactly_once() {
        let engine = Arc::new(engine());
        let now = Utc::now();
        let sim = create(&engine, now).await;
        let signal = sample_signal();
        engine.ingest_signal(&sim.id, &signal, now).await.unwrap();

        let (a, b) = {
            let (e1, e2) = (engine.clone(), engine.clone());
            let (id1, id2) = (sim.id.clone(), sim.id.clone());
            let (m1, m2) = (signal.market_id.clone(), signal.market_id.clone());
            tokio::join!(
                tokio::spawn(async move { e1.resolve_market(&id1, &m1, "Yes", now).await }),
                tokio::spawn(async move { e2.resolve_market(&id2, &m2, "Yes", now).await }),
            )
        };

        let total = a.unwrap().unwrap().positions_resolved + b.unwrap().unwrap().positions_resolved;
        assert_eq!(total, 1);

        let status = engine.status(&sim.id, false).await.unwrap();
        assert_eq!(status.strategies[0].cooldown_capital, dec!(125));
    }

    #[tokio::test]
    async fn test_end_ranks_and_is_terminal() {
        let engine = engine();
        let now = Utc::now();
        let sim = engine
            .create_simulation(
                CreateSimulation {
                    initial_capital_per_strategy: Some(dec!(1000)),
                    settings: no_slippage(),
                    starts_at: None,
                    strategies: vec![
                        fixed_strategy("winner", dec!(50)),
                        StrategyConfig {
                            id: "idle".to_string(),
                            name: "IDLE".to_string(),
                            min_edge: 0.9, // accepts nothing
                            ..Default::default()
                        },
                    ],
                },
                now,
            )
            .await
            .unwrap();

        let signal = sample_signal();
        engine.ingest_signal(&sim.id, &signal, now).await.unwrap();
        engine
            .resolve_market(&sim.id, &signal.market_id, "Yes", now)
            .await
            .unwrap();

        let report = engine.end_simulation(&sim.id, now).await.unwrap();
        assert_eq!(report.rankings.len(), 2);
        assert_eq!(report.rankings[0].strategy_id, "winner");
        assert_eq!(report.rankings[0].rank, 1);
        assert_eq!(report.rankings[0].final_value, dec!(1075));
        assert_eq!(report.rankings[1].strategy_id, "idle");

        assert!(matches!(
            engine.end_simulation(&sim.id, now).await,
            Err(EngineError::SimulationEnded(_))
        ));
        assert!(matches!(
            engine.ingest_signal(&sim.id, &sample_signal(), now).await,
            Err(EngineError::SimulationEnded(_))
        ));
        assert!(matches!(
            engine.tick(&sim.id, now).await,
            Err(EngineError::SimulationEnded(_))
        ));
    }

    #[tokio::test]
    async fn test_scheduled_simulation_drops_early_signals() {
        let engine = engine();
        let now = Utc::now();
        let sim = engine
            .create_simulation(
                CreateSimulation {
                    initial_capital_per_strategy: None,
                    settings: no_slippage(),
                    starts_at: Some(now + Duration::hours(5)),
                    strategies: vec![fixed_strategy("fixed-50", dec!(50))],
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(sim.state, LifecycleState::Scheduled);

        let early = engine
            .ingest_signal(&sim.id, &sample_signal(), now)
            .await
            .unwrap();
        assert!(!early.accepted);
        assert!(early.rejections.is_empty());

        // Counters untouched by the dropped signal
        let status = engine.status(&sim.id, false).await.unwrap();
        assert_eq!(status.strategies[0].metrics.signals_evaluated, 0);

        // Tick after the start time promotes
        engine.tick(&sim.id, now + Duration::hours(6)).await.unwrap();
        let status = engine.status(&sim.id, false).await.unwrap();
        assert_eq!(status.simulation.state, LifecycleState::Active);

        let late = engine
            .ingest_signal(&sim.id, &sample_signal(), now + Duration::hours(6))
            .await
            .unwrap();
        assert!(late.accepted);
    }

    #[tokio::test]
    async fn test_restore_recovers_registry_from_store() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let sim = {
            let engine = SimulationEngine::new(store.clone());
            let sim = create(&engine, now).await;
            engine
                .ingest_signal(&sim.id, &sample_signal(), now)
                .await
                .unwrap();
            sim
        };

        // Fresh engine over the same store, as after a restart
        let engine = SimulationEngine::new(store);
        assert!(matches!(
            engine.status(&sim.id, false).await,
            Err(EngineError::UnknownSimulation(_))
        ));

        engine.restore().await.unwrap();
        let status = engine.status(&sim.id, false).await.unwrap();
        assert_eq!(status.strategies[0].locked_capital, dec!(50));
    }

    #[tokio::test]
    async fn test_unknown_simulation() {
        let engine = engine();
        assert!(matches!(
            engine.status("nope", false).await,
            Err(EngineError::UnknownSimulation(_))
        ));
    }
}
