//! Engine and store error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the simulation engine.
///
/// Signal rejections and skipped trades are not errors: they come back as
/// structured data in the intake response so evaluated-vs-taken ratios stay
/// reconstructable from the response stream alone.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid strategy config: {0}")]
    InvalidConfig(String),

    #[error("insufficient capital: requested {requested}, available {available}")]
    InsufficientCapital {
        requested: Decimal,
        available: Decimal,
    },

    #[error("simulation {0} has ended")]
    SimulationEnded(String),

    #[error("unknown simulation {0}")]
    UnknownSimulation(String),

    #[error("unknown position {0}")]
    UnknownPosition(String),

    #[error("store unavailable")]
    StoreUnavailable(#[from] StoreError),
}

/// Failures at the persistence boundary.
///
/// The engine performs no implicit retries on these; callers retry, relying
/// on settle/release idempotence to make retries safe.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("portfolio {strategy_id} not found in simulation {sim_id}")]
    PortfolioNotFound { sim_id: String, strategy_id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}
