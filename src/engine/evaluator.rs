//! Signal evaluation: applies a strategy's acceptance filters to an
//! incoming trade signal. Pure decision logic, no side effects; callers
//! count evaluated-vs-taken for reporting.

use serde::{Deserialize, Serialize};

use crate::models::{Portfolio, TradeSignal};

use super::config::StrategyConfig;

/// Why a strategy declined a signal. Wire names are kebab-case and stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    PriceOutOfRange,
    EdgeTooLow,
    ScoreTooLow,
    InsufficientTrackRecord,
    CategoryNotAllowed,
    TraderMismatch,
    InsufficientCapital,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::PriceOutOfRange => "price-out-of-range",
            RejectReason::EdgeTooLow => "edge-too-low",
            RejectReason::ScoreTooLow => "score-too-low",
            RejectReason::InsufficientTrackRecord => "insufficient-track-record",
            RejectReason::CategoryNotAllowed => "category-not-allowed",
            RejectReason::TraderMismatch => "trader-mismatch",
            RejectReason::InsufficientCapital => "insufficient-capital",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept/reject decision for one (signal, strategy) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub accepted: bool,
    pub reason: Option<RejectReason>,
}

impl Evaluation {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn reject(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// Stateless evaluator shared by every strategy.
pub struct SignalEvaluator;

impl SignalEvaluator {
    /// Apply a strategy's filters to a signal against its portfolio.
    ///
    /// Filters run cheapest-first; the reported reason is the first one
    /// that fails.
    pub fn evaluate(
        signal: &TradeSignal,
        config: &StrategyConfig,
        portfolio: &Portfolio,
    ) -> Evaluation {
        if let Some(target) = &config.target_trader {
            if !target.eq_ignore_ascii_case(&signal.trader_address) {
                return Evaluation::reject(RejectReason::TraderMismatch);
            }
        }

        if signal.price < config.min_price || signal.price > config.max_price {
            return Evaluation::reject(RejectReason::PriceOutOfRange);
        }

        if signal.edge() < config.min_edge {
            return Evaluation::reject(RejectReason::EdgeTooLow);
        }

        if let Some(min_score) = config.min_model_score {
            match signal.model_score {
                Some(score) if score >= min_score => {}
                // Missing score fails a strategy that requires one
                _ => return Evaluation::reject(RejectReason::ScoreTooLow),
            }
        }

        if signal.trader_stats.resolved_trades < config.min_resolved_trades {
            return Evaluation::reject(RejectReason::InsufficientTrackRecord);
        }

        if let Some(allowed) = &config.categories {
            let in_list = signal
                .category
                .as_ref()
                .map(|c| allowed.iter().any(|a| a.eq_ignore_ascii_case(c)))
                .unwrap_or(false);
            if !in_list {
                return Evaluation::reject(RejectReason::CategoryNotAllowed);
            }
        }

        if portfolio.available_cash < config.min_bet {
            return Evaluation::reject(RejectReason::InsufficientCapital);
        }

        Evaluation::accept()
    }
}
