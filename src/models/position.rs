//! Simulated position model with its settlement lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::{Side, TradeSignal};

/// Lifecycle status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Won,
    Lost,
    Void,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Won => "WON",
            PositionStatus::Lost => "LOST",
            PositionStatus::Void => "VOID",
        }
    }
}

/// Settlement outcome relative to the held side, decided by resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOutcome {
    Won,
    Lost,
    Void,
}

/// Result of settling a position. Returned again verbatim when a settled
/// position is re-settled, so resolution redelivery is a no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settlement {
    /// Proceeds credited to cooldown (invested × payout multiplier)
    pub exit_value: Decimal,

    /// exit_value − invested
    pub realized_pnl: Decimal,

    /// realized_pnl / invested
    pub realized_roi: Decimal,

    pub settled_at: DateTime<Utc>,

    /// When the cooled-down proceeds become spendable again
    pub cooldown_until: DateTime<Utc>,
}

/// One simulated position, created only by the ledger's `open` and
/// append-only after settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,

    /// Signal that produced this position
    pub signal_id: String,

    /// Trader the signal was copied from
    pub source_trader: String,

    pub market_id: String,

    pub outcome: String,

    pub side: Side,

    /// Entry price after slippage
    pub entry_price: Decimal,

    /// Outcome tokens held (invested / entry_price)
    pub shares: Decimal,

    /// Stake committed in USDC
    pub invested: Decimal,

    pub opened_at: DateTime<Utc>,

    /// Latest observed price for the market, used for mark-to-market.
    /// Starts at the entry price and is refreshed from later signals.
    pub current_price: Decimal,

    pub status: PositionStatus,

    /// Present once settled
    #[serde(default)]
    pub settlement: Option<Settlement>,

    /// Whether the cooled-down proceeds were already moved back to
    /// available. Tracked per position so release is idempotent.
    #[serde(default)]
    pub cooldown_released: bool,
}

impl Position {
    /// Create an OPEN position from an accepted signal.
    pub fn open(
        id: String,
        signal: &TradeSignal,
        entry_price: Decimal,
        invested: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        let shares = if entry_price.is_zero() {
            Decimal::ZERO
        } else {
            invested / entry_price
        };
        Self {
            id,
            signal_id: signal.id.clone(),
            source_trader: signal.trader_address.clone(),
            market_id: signal.market_id.clone(),
            outcome: signal.outcome.clone(),
            side: signal.side,
            entry_price,
            shares,
            invested,
            opened_at,
            current_price: entry_price,
            status: PositionStatus::Open,
            settlement: None,
            cooldown_released: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Mark-to-market value at the latest known price.
    pub fn market_value(&self) -> Decimal {
        self.shares * self.current_price
    }

    /// Unrealized P&L at the latest known price.
    pub fn unrealized_pnl(&self) -> Decimal {
        self.market_value() - self.invested
    }

    /// Compute the settlement for an outcome. Pure; the ledger applies it.
    ///
    /// WON pays $1 per share, LOST pays nothing, VOID refunds
    /// `invested × void_payout` (1.0 = full refund, no P&L).
    pub fn settlement_for(
        &self,
        outcome: PositionOutcome,
        void_payout: Decimal,
        settled_at: DateTime<Utc>,
        cooldown_until: DateTime<Utc>,
    ) -> Settlement {
        let exit_value = match outcome {
            PositionOutcome::Won => self.shares,
            PositionOutcome::Lost => Decimal::ZERO,
            PositionOutcome::Void => self.invested * void_payout,
        };
        let realized_pnl = exit_value - self.invested;
        let realized_roi = if self.invested.is_zero() {
            Decimal::ZERO
        } else {
            realized_pnl / self.invested
        };
        Settlement {
            exit_value,
            realized_pnl,
            realized_roi,
            settled_at,
            cooldown_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::signal::tests::sample_signal;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn open_position(invested: Decimal, price: Decimal) -> Position {
        let signal = sample_signal();
        Position::open("pos-1".to_string(), &signal, price, invested, Utc::now())
    }

    #[test]
    fn test_won_settlement_math() {
        // $50 at 0.40 => 125 shares => $125 payout, $75 profit
        let pos = open_position(dec!(50), dec!(0.40));
        let now = Utc::now();
        let s = pos.settlement_for(
            PositionOutcome::Won,
            Decimal::ONE,
            now,
            now + Duration::hours(24),
        );

        assert_eq!(s.exit_value, dec!(125));
        assert_eq!(s.realized_pnl, dec!(75));
        assert_eq!(s.realized_roi, dec!(1.5));
    }

    #[test]
    fn test_lost_settlement_loses_stake() {
        let pos = open_position(dec!(50), dec!(0.40));
        let now = Utc::now();
        let s = pos.settlement_for(PositionOutcome::Lost, Decimal::ONE, now, now);

        assert_eq!(s.exit_value, Decimal::ZERO);
        assert_eq!(s.realized_pnl, dec!(-50));
        assert_eq!(s.realized_roi, dec!(-1));
    }

    #[test]
    fn test_void_full_refund_by_default() {
        let pos = open_position(dec!(50), dec!(0.40));
        let now = Utc::now();
        let s = pos.settlement_for(PositionOutcome::Void, Decimal::ONE, now, now);

        assert_eq!(s.exit_value, dec!(50));
        assert_eq!(s.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_void_partial_refund() {
        let pos = open_position(dec!(100), dec!(0.50));
        let now = Utc::now();
        let s = pos.settlement_for(PositionOutcome::Void, dec!(0.95), now, now);

        assert_eq!(s.exit_value, dec!(95));
        assert_eq!(s.realized_pnl, dec!(-5));
    }

    #[test]
    fn test_mark_to_market() {
        let mut pos = open_position(dec!(40), dec!(0.40));
        assert_eq!(pos.unrealized_pnl(), Decimal::ZERO);

        pos.current_price = dec!(0.60);
        // 100 shares * 0.60 = 60, minus 40 invested
        assert_eq!(pos.unrealized_pnl(), dec!(20));
    }
}
