//! Portfolio ledger: the capital state machine.
//!
//! Capital cycles Available → Locked → Cooldown → Available. Settlement
//! parks proceeds in cooldown rather than returning them straight to
//! available: that models settlement latency of the underlying market and
//! keeps realized profits from being redeployed within the same
//! evaluation cycle, which would distort strategy comparison.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::EngineError;
use crate::models::{
    HourlySnapshot, Portfolio, Position, PositionOutcome, PositionStatus, Settlement,
    SimulationSettings, TradeSignal,
};

/// Per-simulation parameters the ledger needs for each transition.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub cooldown: Duration,
    pub slippage_pct: Decimal,
    pub void_payout: Decimal,
}

impl From<&SimulationSettings> for LedgerSettings {
    fn from(s: &SimulationSettings) -> Self {
        Self {
            cooldown: Duration::hours(i64::from(s.cooldown_hours)),
            slippage_pct: s.slippage_pct,
            void_payout: s.void_payout,
        }
    }
}

/// Owns one strategy's portfolio for the duration of an operation.
///
/// All mutation of a portfolio goes through a ledger while the caller holds
/// that portfolio's lock; the ledger itself is single-threaded.
pub struct PortfolioLedger {
    portfolio: Portfolio,
    settings: LedgerSettings,
}

impl PortfolioLedger {
    pub fn new(portfolio: Portfolio, settings: LedgerSettings) -> Self {
        Self {
            portfolio,
            settings,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    /// Open a position: moves `stake` from available to locked.
    ///
    /// Fails with `InsufficientCapital` when the stake exceeds available
    /// cash at call time. Callers must re-run sizing rather than retry
    /// with an implicitly smaller stake.
    pub fn open(
        &mut self,
        position_id: String,
        signal: &TradeSignal,
        stake: Decimal,
        now: DateTime<Utc>,
    ) -> Result<&Position, EngineError> {
        if stake > self.portfolio.available_cash {
            return Err(EngineError::InsufficientCapital {
                requested: stake,
                available: self.portfolio.available_cash,
            });
        }

        // Entry slippage always works against the fill
        let entry_price = (signal.price * (Decimal::ONE + self.settings.slippage_pct))
            .min(Decimal::ONE);

        self.portfolio.available_cash -= stake;
        self.portfolio.locked_capital += stake;

        let position = Position::open(position_id.clone(), signal, entry_price, stake, now);
        debug!(
            strategy = %self.portfolio.strategy_id,
            market = %position.market_id,
            stake = %stake,
            price = %entry_price,
            "Opened position"
        );

        self.portfolio
            .open_positions
            .insert(position_id.clone(), position);
        self.portfolio
            .open_positions
            .get(&position_id)
            .ok_or_else(|| EngineError::UnknownPosition(position_id))
    }

    /// Settle a position: moves its stake from locked to cooldown plus or
    /// minus realized P&L.
    ///
    /// Idempotent: settling an already-settled position returns the
    /// previously computed settlement with `newly_settled = false`, because
    /// resolution feeds redeliver. The requested outcome is ignored on
    /// repeats; the first settlement stands.
    pub fn settle(
        &mut self,
        position_id: &str,
        outcome: PositionOutcome,
        now: DateTime<Utc>,
    ) -> Result<(Settlement, bool), EngineError> {
        if let Some(prior) = self.portfolio.closed_position(position_id) {
            let settlement = prior
                .settlement
                .ok_or_else(|| EngineError::UnknownPosition(position_id.to_string()))?;
            return Ok((settlement, false));
        }

        let mut position = self
            .portfolio
            .open_positions
            .remove(position_id)
            .ok_or_else(|| EngineError::UnknownPosition(position_id.to_string()))?;

        let settlement = position.settlement_for(
            outcome,
            self.settings.void_payout,
            now,
            now + self.settings.cooldown,
        );

        position.status = match outcome {
            PositionOutcome::Won => PositionStatus::Won,
            PositionOutcome::Lost => PositionStatus::Lost,
            PositionOutcome::Void => PositionStatus::Void,
        };
        position.settlement = Some(settlement);
        // Nothing to release later when the position paid out nothing
        position.cooldown_released = settlement.exit_value.is_zero();

        self.portfolio.locked_capital -= position.invested;
        self.portfolio.cooldown_capital += settlement.exit_value;

        debug!(
            strategy = %self.portfolio.strategy_id,
            position = %position_id,
            status = position.status.as_str(),
            pnl = %settlement.realized_pnl,
            "Settled position"
        );

        self.portfolio.closed_positions.push(position);
        Ok((settlement, true))
    }

    /// Move matured cooldown capital back to available. Returns the amount
    /// released and the ids of the positions it came from.
    ///
    /// Release is tracked per settled position, never as an aggregate pool,
    /// so calling this repeatedly or concurrently (under the portfolio
    /// lock) can never double-release the same proceeds.
    pub fn release_cooldown(&mut self, now: DateTime<Utc>) -> (Decimal, Vec<String>) {
        let mut released = Decimal::ZERO;
        let mut position_ids = Vec::new();

        for position in &mut self.portfolio.closed_positions {
            if position.cooldown_released {
                continue;
            }
            let Some(settlement) = position.settlement else {
                continue;
            };
            if settlement.cooldown_until > now {
                continue;
            }
            position.cooldown_released = true;
            released += settlement.exit_value;
            position_ids.push(position.id.clone());
        }

        if !released.is_zero() {
            self.portfolio.cooldown_capital -= released;
            self.portfolio.available_cash += released;
            debug!(
                strategy = %self.portfolio.strategy_id,
                amount = %released,
                "Released cooldown capital"
            );
        }

        (released, position_ids)
    }

    /// Record the snapshot for an elapsed hour if it is not already there.
    /// Returns whether a snapshot was recorded.
    pub fn record_snapshot(&mut self, hour_index: u32, now: DateTime<Utc>) -> bool {
        let already = self
            .portfolio
            .last_snapshot_hour()
            .map_or(false, |h| h >= hour_index);
        if already {
            return false;
        }

        let value = self.portfolio.equity();
        self.portfolio.hourly_snapshots.push(HourlySnapshot {
            hour_index,
            portfolio_value: value,
            cumulative_pnl: value - self.portfolio.starting_capital,
            open_positions: self.portfolio.open_positions.len() as u32,
            recorded_at: now,
        });
        true
    }

    /// Refresh the mark price of open positions in a market from a newly
    /// observed signal price.
    pub fn mark_price(&mut self, market_id: &str, price: Decimal) {
        for position in self.portfolio.open_positions.values_mut() {
            if position.market_id == market_id {
                position.current_price = price;
            }
        }
    }

    /// Ids of open positions held in a market.
    pub fn open_positions_in_market(&self, market_id: &str) -> Vec<String> {
        self.portfolio
            .open_positions
            .values()
            .filter(|p| p.market_id == market_id)
            .map(|p| p.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_signal;
    use rust_decimal_macros::dec;

    fn ledger(cash: Decimal) -> PortfolioLedger {
        let portfolio = Portfolio::new("s1".to_string(), "S1".to_string(), cash, Utc::now());
        let settings = LedgerSettings {
            cooldown: Duration::hours(24),
            slippage_pct: Decimal::ZERO,
            void_payout: Decimal::ONE,
        };
        PortfolioLedger::new(portfolio, settings)
    }

    #[test]
    fn test_open_moves_available_to_locked() {
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();

        ledger
            .open("p1".to_string(), &signal, dec!(50), Utc::now())
            .unwrap();

        let p = ledger.portfolio();
        assert_eq!(p.available_cash, dec!(950));
        assert_eq!(p.locked_capital, dec!(50));
        assert!(p.is_balanced());
    }

    #[test]
    fn test_open_fails_beyond_available_cash() {
        let mut ledger = ledger(dec!(30));
        let signal = sample_signal();

        let err = ledger
            .open("p1".to_string(), &signal, dec!(50), Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientCapital { .. }));

        // No partial effect
        assert_eq!(ledger.portfolio().available_cash, dec!(30));
        assert_eq!(ledger.portfolio().locked_capital, Decimal::ZERO);
    }

    #[test]
    fn test_slippage_raises_entry_price() {
        let portfolio = Portfolio::new("s1".to_string(), "S1".to_string(), dec!(1000), Utc::now());
        let settings = LedgerSettings {
            cooldown: Duration::hours(24),
            slippage_pct: dec!(0.05),
            void_payout: Decimal::ONE,
        };
        let mut ledger = PortfolioLedger::new(portfolio, settings);

        let signal = sample_signal(); // price 0.40
        let pos = ledger
            .open("p1".to_string(), &signal, dec!(50), Utc::now())
            .unwrap();
        assert_eq!(pos.entry_price, dec!(0.42));
    }

    #[test]
    fn test_won_settlement_scenario() {
        // Spec scenario: $1000 capital, $50 at 0.40, market resolves WON.
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();
        let now = Utc::now();

        ledger.open("p1".to_string(), &signal, dec!(50), now).unwrap();
        let (s, newly) = ledger.settle("p1", PositionOutcome::Won, now).unwrap();

        assert!(newly);
        assert_eq!(s.realized_pnl, dec!(75)); // 50 * (1/0.40 - 1)
        let p = ledger.portfolio();
        assert_eq!(p.available_cash, dec!(950));
        assert_eq!(p.locked_capital, Decimal::ZERO);
        assert_eq!(p.cooldown_capital, dec!(125));
        assert!(p.is_balanced());

        // Not yet matured: nothing moves
        let (early, _) = ledger.release_cooldown(now + Duration::hours(1));
        assert_eq!(early, Decimal::ZERO);

        // Matured: proceeds return to available
        let (released, ids) = ledger.release_cooldown(now + Duration::hours(25));
        assert_eq!(released, dec!(125));
        assert_eq!(ids, vec!["p1".to_string()]);
        let p = ledger.portfolio();
        assert_eq!(p.available_cash, dec!(1075));
        assert_eq!(p.cooldown_capital, Decimal::ZERO);
        assert!(p.is_balanced());
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();
        let now = Utc::now();

        ledger.open("p1".to_string(), &signal, dec!(50), now).unwrap();
        let (first, _) = ledger.settle("p1", PositionOutcome::Won, now).unwrap();
        let snapshot = ledger.portfolio().clone();

        // Redelivery, even with a contradictory outcome, is a no-op
        let (second, newly) = ledger
            .settle("p1", PositionOutcome::Lost, now + Duration::hours(1))
            .unwrap();

        assert!(!newly);
        assert_eq!(second.realized_pnl, first.realized_pnl);
        assert_eq!(ledger.portfolio().cooldown_capital, snapshot.cooldown_capital);
        assert_eq!(ledger.portfolio().available_cash, snapshot.available_cash);
        assert_eq!(ledger.portfolio().closed_positions.len(), 1);
    }

    #[test]
    fn test_release_cooldown_never_double_releases() {
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();
        let now = Utc::now();

        ledger.open("p1".to_string(), &signal, dec!(50), now).unwrap();
        ledger.settle("p1", PositionOutcome::Won, now).unwrap();

        let later = now + Duration::hours(30);
        let (first, _) = ledger.release_cooldown(later);
        let (second, second_ids) = ledger.release_cooldown(later);

        assert_eq!(first, dec!(125));
        assert_eq!(second, Decimal::ZERO);
        assert!(second_ids.is_empty());
        assert!(ledger.portfolio().is_balanced());
    }

    #[test]
    fn test_lost_position_releases_nothing() {
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();
        let now = Utc::now();

        ledger.open("p1".to_string(), &signal, dec!(50), now).unwrap();
        let (s, _) = ledger.settle("p1", PositionOutcome::Lost, now).unwrap();

        assert_eq!(s.realized_pnl, dec!(-50));
        let p = ledger.portfolio();
        assert_eq!(p.cooldown_capital, Decimal::ZERO);
        assert_eq!(p.equity(), dec!(950));
        assert!(p.is_balanced());

        let (released, _) = ledger.release_cooldown(now + Duration::days(2));
        assert_eq!(released, Decimal::ZERO);
    }

    #[test]
    fn test_status_count_identities() {
        let mut ledger = ledger(dec!(1000));
        let now = Utc::now();

        for (i, outcome) in [
            Some(PositionOutcome::Won),
            Some(PositionOutcome::Lost),
            Some(PositionOutcome::Void),
            None,
        ]
        .into_iter()
        .enumerate()
        {
            let mut signal = sample_signal();
            signal.market_id = format!("0xmarket{i}");
            let id = format!("p{i}");
            ledger.open(id.clone(), &signal, dec!(50), now).unwrap();
            if let Some(outcome) = outcome {
                ledger.settle(&id, outcome, now).unwrap();
            }
        }

        let p = ledger.portfolio();
        let settled = p.closed_positions.len();
        let won = p
            .closed_positions
            .iter()
            .filter(|x| x.status == PositionStatus::Won)
            .count();
        let lost = p
            .closed_positions
            .iter()
            .filter(|x| x.status == PositionStatus::Lost)
            .count();
        let voided = p
            .closed_positions
            .iter()
            .filter(|x| x.status == PositionStatus::Void)
            .count();

        assert_eq!(won + lost + voided, settled);
        assert_eq!(p.open_positions.len() + settled, 4);
        assert!(p.is_balanced());
    }

    #[test]
    fn test_snapshot_idempotent_per_hour() {
        let mut ledger = ledger(dec!(1000));
        let now = Utc::now();

        assert!(ledger.record_snapshot(0, now));
        assert!(!ledger.record_snapshot(0, now));
        assert!(ledger.record_snapshot(3, now));
        assert!(!ledger.record_snapshot(2, now)); // never rewrites history

        let hours: Vec<u32> = ledger
            .portfolio()
            .hourly_snapshots
            .iter()
            .map(|s| s.hour_index)
            .collect();
        assert_eq!(hours, vec![0, 3]);
    }

    #[test]
    fn test_mark_price_updates_open_positions() {
        let mut ledger = ledger(dec!(1000));
        let signal = sample_signal();
        let now = Utc::now();

        ledger.open("p1".to_string(), &signal, dec!(40), now).unwrap();
        ledger.mark_price(&signal.market_id, dec!(0.60));

        let pos = &ledger.portfolio().open_positions["p1"];
        assert_eq!(pos.current_price, dec!(0.60));
        assert_eq!(pos.unrealized_pnl(), dec!(20));
    }
}
