//! Market resolution: settles open positions when a market's winning
//! outcome is announced.
//!
//! Redelivery-safe end to end: candidate strategies are re-derived by
//! store query rather than cached references, and the ledger's `settle`
//! is idempotent, so repeated resolution calls for the same market settle
//! each position exactly once.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::EngineError;
use crate::models::{Position, PositionOutcome, Side};

use super::ledger::PortfolioLedger;

/// A market's announced result.
#[derive(Debug, Clone)]
pub struct MarketResolution {
    pub market_id: String,
    pub winning_outcome: String,
}

impl MarketResolution {
    pub fn new(market_id: impl Into<String>, winning_outcome: impl Into<String>) -> Self {
        Self {
            market_id: market_id.into(),
            winning_outcome: winning_outcome.into(),
        }
    }

    /// A voided market refunds every position regardless of side.
    pub fn is_void(&self) -> bool {
        self.winning_outcome.eq_ignore_ascii_case("VOID")
    }

    /// Map the announced outcome onto one position's held side. A buy of
    /// the winning outcome wins; a sell of the winning outcome loses.
    pub fn outcome_for(&self, position: &Position) -> PositionOutcome {
        if self.is_void() {
            return PositionOutcome::Void;
        }

        let held_won = position
            .outcome
            .eq_ignore_ascii_case(&self.winning_outcome);
        match (position.side, held_won) {
            (Side::Buy, true) | (Side::Sell, false) => PositionOutcome::Won,
            _ => PositionOutcome::Lost,
        }
    }
}

/// Settles a resolved market against one portfolio at a time.
pub struct ResolutionEngine;

impl ResolutionEngine {
    /// Settle every open position this portfolio holds in the resolved
    /// market. Returns the ids of positions newly settled by this call;
    /// positions already settled by an earlier delivery are not repeated.
    pub fn resolve(
        ledger: &mut PortfolioLedger,
        resolution: &MarketResolution,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, EngineError> {
        let candidates = ledger.open_positions_in_market(&resolution.market_id);
        let mut newly_settled = Vec::new();

        for position_id in candidates {
            let outcome = {
                let position = ledger
                    .portfolio()
                    .open_positions
                    .get(&position_id)
                    .ok_or_else(|| EngineError::UnknownPosition(position_id.clone()))?;
                resolution.outcome_for(position)
            };

            let (settlement, newly) = ledger.settle(&position_id, outcome, now)?;
            if newly {
                info!(
                    strategy = %ledger.portfolio().strategy_id,
                    market = %resolution.market_id,
                    position = %position_id,
                    pnl = %settlement.realized_pnl,
                    "Resolved position"
                );
                newly_settled.push(position_id);
            }
        }

        Ok(newly_settled)
    }
}
