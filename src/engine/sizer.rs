//! Position sizing: turns an accepted signal into a stake under the
//! strategy's sizing rule.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::models::{Portfolio, TradeSignal};

use super::config::{SizingRule, StrategyConfig};
use super::evaluator::RejectReason;

/// Edge at which edge-proportional sizing reaches max_bet. Signals with
/// more edge than this are capped, not extrapolated.
const FULL_SIZE_EDGE: f64 = 0.20;

/// Stake calculator shared by every strategy.
pub struct PositionSizer;

impl PositionSizer {
    /// Compute the stake for an accepted signal.
    ///
    /// The result is clamped to `[min_bet, max_bet]`, capped at available
    /// cash, and never lets locked capital exceed total equity. A stake
    /// that cannot meet `min_bet` rejects; callers must re-evaluate rather
    /// than silently retry smaller.
    pub fn stake(
        signal: &TradeSignal,
        config: &StrategyConfig,
        portfolio: &Portfolio,
    ) -> Result<Decimal, RejectReason> {
        let equity = portfolio.equity();

        let raw = match &config.sizing {
            SizingRule::Fixed { amount } => *amount,
            SizingRule::FixedFraction { weight } => equity * *weight,
            SizingRule::Kelly { fraction } => {
                let edge = signal.edge_estimate();
                if edge <= 0.0 {
                    return Err(RejectReason::EdgeTooLow);
                }
                let edge = Decimal::from_f64(edge).unwrap_or(Decimal::ZERO);
                equity * *fraction * edge
            }
            SizingRule::EdgeProportional => {
                let edge = signal.edge_estimate().clamp(0.0, FULL_SIZE_EDGE);
                let t = Decimal::from_f64(edge / FULL_SIZE_EDGE).unwrap_or(Decimal::ZERO);
                config.min_bet + (config.max_bet - config.min_bet) * t
            }
        };

        let clamped = raw.max(config.min_bet).min(config.max_bet);
        let stake = clamped.min(portfolio.available_cash);

        if stake < config.min_bet {
            return Err(RejectReason::InsufficientCapital);
        }

        Ok(stake)
    }
}
