//! Simulation engine: strategy config, signal evaluation, sizing, the
//! capital ledger, market resolution, scheduling, and the engine facade.

mod config;
mod evaluator;
mod ledger;
mod registry;
mod resolution;
mod scheduler;
mod simulation;
mod sizer;

pub use config::{CreateSimulation, SizingRule, StrategyConfig};
pub use evaluator::{Evaluation, RejectReason, SignalEvaluator};
pub use ledger::{LedgerSettings, PortfolioLedger};
pub use registry::{SimulationHandle, SimulationRegistry, StrategyEntry};
pub use resolution::{MarketResolution, ResolutionEngine};
pub use scheduler::{CapitalScheduler, PortfolioTick, TickOutcome};
pub use simulation::{
    ResolutionOutcome, SignalOutcome, SimulationEngine, SimulationStatus, StrategyRejection,
    StrategyStatus,
};
pub use sizer::PositionSizer;
