//! Performance metrics and final ranking.

mod calculator;

pub use calculator::{MetricsCalculator, Ranker};
