//! Data models for signals, positions, portfolios, simulations, and metrics.

mod metrics;
mod portfolio;
mod position;
mod signal;
mod simulation;

pub use metrics::{PortfolioMetrics, RankedStrategy, SimulationReport};
pub use portfolio::{HourlySnapshot, Portfolio};
pub use position::{Position, PositionOutcome, PositionStatus, Settlement};
pub use signal::{Side, TradeSignal, TraderStats};
pub use simulation::{LifecycleState, Simulation, SimulationSettings};

#[cfg(test)]
pub(crate) use signal::tests::sample_signal;
