//! SQLite-backed store.
//!
//! Everything needed to resume a simulation after restart:
//! - Simulation metadata, settings, and strategy configs
//! - Per-strategy capital state and counters
//! - Positions across their full lifecycle
//! - Hourly equity snapshots
//!
//! Money columns are REAL; decimals convert at the boundary. Timestamps
//! are RFC 3339 TEXT.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::engine::StrategyConfig;
use crate::error::StoreError;
use crate::models::{
    HourlySnapshot, LifecycleState, Portfolio, Position, PositionStatus, Settlement, Side,
    Simulation, SimulationSettings,
};

use super::PortfolioStore;

/// SQLite connection pool implementing `PortfolioStore`.
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct SimulationRow {
    id: String,
    created_at: String,
    starts_at: String,
    duration_days: i64,
    cooldown_hours: i64,
    slippage_pct: f64,
    void_payout: f64,
    state: String,
    strategies_json: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PortfolioRow {
    strategy_id: String,
    strategy_name: String,
    starting_capital: f64,
    available_cash: f64,
    locked_capital: f64,
    cooldown_capital: f64,
    signals_evaluated: i64,
    signals_taken: i64,
    created_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PositionRow {
    id: String,
    signal_id: String,
    source_trader: String,
    market_id: String,
    outcome: String,
    side: String,
    entry_price: f64,
    shares: f64,
    invested: f64,
    opened_at: String,
    current_price: f64,
    status: String,
    exit_value: Option<f64>,
    realized_pnl: Option<f64>,
    realized_roi: Option<f64>,
    settled_at: Option<String>,
    cooldown_until: Option<String>,
    cooldown_released: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    hour_index: i64,
    portfolio_value: f64,
    cumulative_pnl: f64,
    open_positions: i64,
    recorded_at: String,
}

fn decimal(value: f64, column: &str) -> Result<Decimal, StoreError> {
    Decimal::from_f64(value)
        .ok_or_else(|| StoreError::Corrupt(format!("non-finite value in column {column}")))
}

fn real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp in column {column}: {e}")))
}

impl SimulationRow {
    fn into_simulation(self) -> Result<(Simulation, Vec<StrategyConfig>), StoreError> {
        let configs: Vec<StrategyConfig> = serde_json::from_str(&self.strategies_json)
            .map_err(|e| StoreError::Corrupt(format!("bad strategies_json: {e}")))?;
        let state = LifecycleState::parse(&self.state)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown state {}", self.state)))?;

        Ok((
            Simulation {
                id: self.id,
                created_at: timestamp(&self.created_at, "created_at")?,
                starts_at: timestamp(&self.starts_at, "starts_at")?,
                settings: SimulationSettings {
                    duration_days: self.duration_days as u32,
                    cooldown_hours: self.cooldown_hours as u32,
                    slippage_pct: decimal(self.slippage_pct, "slippage_pct")?,
                    void_payout: decimal(self.void_payout, "void_payout")?,
                },
                state,
            },
            configs,
        ))
    }
}

impl PositionRow {
    fn into_position(self) -> Result<Position, StoreError> {
        let side = match self.side.as_str() {
            "BUY" => Side::Buy,
            "SELL" => Side::Sell,
            other => return Err(StoreError::Corrupt(format!("unknown side {other}"))),
        };
        let status = match self.status.as_str() {
            "OPEN" => PositionStatus::Open,
            "WON" => PositionStatus::Won,
            "LOST" => PositionStatus::Lost,
            "VOID" => PositionStatus::Void,
            other => return Err(StoreError::Corrupt(format!("unknown status {other}"))),
        };

        let settlement = match (self.exit_value, self.settled_at, self.cooldown_until) {
            (Some(exit_value), Some(settled_at), Some(cooldown_until)) => Some(Settlement {
                exit_value: decimal(exit_value, "exit_value")?,
                realized_pnl: decimal(self.realized_pnl.unwrap_or_default(), "realized_pnl")?,
                realized_roi: decimal(self.realized_roi.unwrap_or_default(), "realized_roi")?,
                settled_at: timestamp(&settled_at, "settled_at")?,
                cooldown_until: timestamp(&cooldown_until, "cooldown_until")?,
            }),
            _ => None,
        };

        if status != PositionStatus::Open && settlement.is_none() {
            return Err(StoreError::Corrupt(format!(
                "settled position {} has no settlement columns",
                self.id
            )));
        }

        Ok(Position {
            id: self.id,
            signal_id: self.signal_id,
            source_trader: self.source_trader,
            market_id: self.market_id,
            outcome: self.outcome,
            side,
            entry_price: decimal(self.entry_price, "entry_price")?,
            shares: decimal(self.shares, "shares")?,
            invested: decimal(self.invested, "invested")?,
            opened_at: timestamp(&self.opened_at, "opened_at")?,
            current_price: decimal(self.current_price, "current_price")?,
            status,
            settlement,
            cooldown_released: self.cooldown_released,
        })
    }
}

impl SqliteStore {
    /// Connect and run migrations.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS simulations (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                duration_days INTEGER NOT NULL,
                cooldown_hours INTEGER NOT NULL,
                slippage_pct REAL NOT NULL,
                void_payout REAL NOT NULL,
                state TEXT NOT NULL,
                strategies_json TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS portfolios (
                sim_id TEXT NOT NULL,
                strategy_id TEXT NOT NULL,
                strategy_name TEXT NOT NULL,
                starting_capital REAL NOT NULL,
                available_cash REAL NOT NULL,
                locked_capital REAL NOT NULL DEFAULT 0,
                cooldown_capital REAL NOT NULL DEFAULT 0,
                signals_evaluated INTEGER NOT NULL DEFAULT 0,
                signals_taken INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (sim_id, strategy_id),
                FOREIGN KEY (sim_id) REFERENCES simulations(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                id TEXT PRIMARY KEY,
                sim_id TEXT NOT NULL,
                strategy_id TEXT NOT NULL,
                signal_id TEXT NOT NULL,
                source_trader TEXT NOT NULL,
                market_id TEXT NOT NULL,
                outcome TEXT NOT NULL,
                side TEXT NOT NULL,
                entry_price REAL NOT NULL,
                shares REAL NOT NULL,
                invested REAL NOT NULL,
                opened_at TEXT NOT NULL,
                current_price REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'OPEN',
                exit_value REAL,
                realized_pnl REAL,
                realized_roi REAL,
                settled_at TEXT,
                cooldown_until TEXT,
                cooldown_released INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (sim_id) REFERENCES simulations(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                sim_id TEXT NOT NULL,
                strategy_id TEXT NOT NULL,
                hour_index INTEGER NOT NULL,
                portfolio_value REAL NOT NULL,
                cumulative_pnl REAL NOT NULL,
                open_positions INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (sim_id, strategy_id, hour_index),
                FOREIGN KEY (sim_id) REFERENCES simulations(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_positions_market ON positions(sim_id, market_id, status)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_positions_portfolio ON positions(sim_id, strategy_id, status)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_position(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<(), StoreError> {
        let settlement = position.settlement.as_ref();

        sqlx::query(
            r#"
            INSERT INTO positions (
                id, sim_id, strategy_id, signal_id, source_trader, market_id,
                outcome, side, entry_price, shares, invested, opened_at,
                current_price, status, exit_value, realized_pnl, realized_roi,
                settled_at, cooldown_until, cooldown_released
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                current_price = excluded.current_price,
                status = excluded.status,
                exit_value = excluded.exit_value,
                realized_pnl = excluded.realized_pnl,
                realized_roi = excluded.realized_roi,
                settled_at = excluded.settled_at,
                cooldown_until = excluded.cooldown_until,
                cooldown_released = excluded.cooldown_released
            "#,
        )
        .bind(&position.id)
        .bind(sim_id)
        .bind(strategy_id)
        .bind(&position.signal_id)
        .bind(&position.source_trader)
        .bind(&position.market_id)
        .bind(&position.outcome)
        .bind(position.side.as_str())
        .bind(real(position.entry_price))
        .bind(real(position.shares))
        .bind(real(position.invested))
        .bind(position.opened_at.to_rfc3339())
        .bind(real(position.current_price))
        .bind(position.status.as_str())
        .bind(settlement.map(|s| real(s.exit_value)))
        .bind(settlement.map(|s| real(s.realized_pnl)))
        .bind(settlement.map(|s| real(s.realized_roi)))
        .bind(settlement.map(|s| s.settled_at.to_rfc3339()))
        .bind(settlement.map(|s| s.cooldown_until.to_rfc3339()))
        .bind(position.cooldown_released)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl PortfolioStore for SqliteStore {
    async fn insert_simulation(
        &self,
        sim: &Simulation,
        configs: &[StrategyConfig],
        portfolios: &[Portfolio],
    ) -> Result<(), StoreError> {
        let strategies_json = serde_json::to_string(configs)
            .map_err(|e| StoreError::Corrupt(format!("unserializable strategy config: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO simulations (
                id, created_at, starts_at, duration_days, cooldown_hours,
                slippage_pct, void_payout, state, strategies_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sim.id)
        .bind(sim.created_at.to_rfc3339())
        .bind(sim.starts_at.to_rfc3339())
        .bind(i64::from(sim.settings.duration_days))
        .bind(i64::from(sim.settings.cooldown_hours))
        .bind(real(sim.settings.slippage_pct))
        .bind(real(sim.settings.void_payout))
        .bind(sim.state.as_str())
        .bind(strategies_json)
        .execute(&self.pool)
        .await?;

        for portfolio in portfolios {
            sqlx::query(
                r#"
                INSERT INTO portfolios (
                    sim_id, strategy_id, strategy_name, starting_capital,
                    available_cash, locked_capital, cooldown_capital,
                    signals_evaluated, signals_taken, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sim.id)
            .bind(&portfolio.strategy_id)
            .bind(&portfolio.strategy_name)
            .bind(real(portfolio.starting_capital))
            .bind(real(portfolio.available_cash))
            .bind(real(portfolio.locked_capital))
            .bind(real(portfolio.cooldown_capital))
            .bind(portfolio.signals_evaluated as i64)
            .bind(portfolio.signals_taken as i64)
            .bind(portfolio.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn update_simulation_state(
        &self,
        sim_id: &str,
        state: LifecycleState,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE simulations SET state = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(sim_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_simulations(&self) -> Result<Vec<(Simulation, Vec<StrategyConfig>)>, StoreError> {
        let rows = sqlx::query_as::<_, SimulationRow>("SELECT * FROM simulations")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SimulationRow::into_simulation).collect()
    }

    async fn load_portfolio(
        &self,
        sim_id: &str,
        strategy_id: &str,
    ) -> Result<Portfolio, StoreError> {
        let row = sqlx::query_as::<_, PortfolioRow>(
            "SELECT * FROM portfolios WHERE sim_id = ? AND strategy_id = ?",
        )
        .bind(sim_id)
        .bind(strategy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::PortfolioNotFound {
            sim_id: sim_id.to_string(),
            strategy_id: strategy_id.to_string(),
        })?;

        let positions = sqlx::query_as::<_, PositionRow>(
            "SELECT * FROM positions WHERE sim_id = ? AND strategy_id = ? ORDER BY opened_at",
        )
        .bind(sim_id)
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await?;

        let snapshots = sqlx::query_as::<_, SnapshotRow>(
            "SELECT * FROM snapshots WHERE sim_id = ? AND strategy_id = ? ORDER BY hour_index",
        )
        .bind(sim_id)
        .bind(strategy_id)
        .fetch_all(&self.pool)
        .await?;

        let mut portfolio = Portfolio::new(
            row.strategy_id,
            row.strategy_name,
            decimal(row.starting_capital, "starting_capital")?,
            timestamp(&row.created_at, "created_at")?,
        );
        portfolio.available_cash = decimal(row.available_cash, "available_cash")?;
        portfolio.locked_capital = decimal(row.locked_capital, "locked_capital")?;
        portfolio.cooldown_capital = decimal(row.cooldown_capital, "cooldown_capital")?;
        portfolio.signals_evaluated = row.signals_evaluated as u64;
        portfolio.signals_taken = row.signals_taken as u64;

        let mut closed = Vec::new();
        for row in positions {
            let position = row.into_position()?;
            if position.is_open() {
                portfolio
                    .open_positions
                    .insert(position.id.clone(), position);
            } else {
                closed.push(position);
            }
        }
        // Settlement order, not entry order
        closed.sort_by_key(|p| p.settlement.map(|s| s.settled_at));
        portfolio.closed_positions = closed;

        for row in snapshots {
            portfolio.hourly_snapshots.push(HourlySnapshot {
                hour_index: row.hour_index as u32,
                portfolio_value: decimal(row.portfolio_value, "portfolio_value")?,
                cumulative_pnl: decimal(row.cumulative_pnl, "cumulative_pnl")?,
                open_positions: row.open_positions as u32,
                recorded_at: timestamp(&row.recorded_at, "recorded_at")?,
            });
        }

        Ok(portfolio)
    }

    async fn save_portfolio(&self, sim_id: &str, portfolio: &Portfolio) -> Result<(), StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE portfolios SET
                available_cash = ?,
                locked_capital = ?,
                cooldown_capital = ?,
                signals_evaluated = ?,
                signals_taken = ?
            WHERE sim_id = ? AND strategy_id = ?
            "#,
        )
        .bind(real(portfolio.available_cash))
        .bind(real(portfolio.locked_capital))
        .bind(real(portfolio.cooldown_capital))
        .bind(portfolio.signals_evaluated as i64)
        .bind(portfolio.signals_taken as i64)
        .bind(sim_id)
        .bind(&portfolio.strategy_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: portfolio.strategy_id.clone(),
            });
        }

        // Settled rows were already rewritten by append_closed_position, so
        // only stale OPEN rows are dropped here.
        sqlx::query(
            "DELETE FROM positions WHERE sim_id = ? AND strategy_id = ? AND status = 'OPEN'",
        )
        .bind(sim_id)
        .bind(&portfolio.strategy_id)
        .execute(&self.pool)
        .await?;

        for position in portfolio.open_positions.values() {
            self.insert_position(sim_id, &portfolio.strategy_id, position)
                .await?;
        }

        Ok(())
    }

    async fn apply_settlement(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<bool, StoreError> {
        let settlement = position.settlement.ok_or_else(|| {
            StoreError::Corrupt(format!("position {} has no settlement", position.id))
        })?;

        // One transaction: the conditional status flip and the capital
        // delta land together or not at all. A concurrent delivery that
        // lost the race sees zero rows affected and applies nothing.
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE positions SET
                status = ?,
                exit_value = ?,
                realized_pnl = ?,
                realized_roi = ?,
                settled_at = ?,
                cooldown_until = ?,
                cooldown_released = ?
            WHERE id = ? AND status = 'OPEN'
            "#,
        )
        .bind(position.status.as_str())
        .bind(real(settlement.exit_value))
        .bind(real(settlement.realized_pnl))
        .bind(real(settlement.realized_roi))
        .bind(settlement.settled_at.to_rfc3339())
        .bind(settlement.cooldown_until.to_rfc3339())
        .bind(position.cooldown_released)
        .bind(&position.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let credited = sqlx::query(
            r#"
            UPDATE portfolios SET
                locked_capital = locked_capital - ?,
                cooldown_capital = cooldown_capital + ?
            WHERE sim_id = ? AND strategy_id = ?
            "#,
        )
        .bind(real(position.invested))
        .bind(real(settlement.exit_value))
        .bind(sim_id)
        .bind(strategy_id)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::PortfolioNotFound {
                sim_id: sim_id.to_string(),
                strategy_id: strategy_id.to_string(),
            });
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn append_closed_position(
        &self,
        sim_id: &str,
        strategy_id: &str,
        position: &Position,
    ) -> Result<(), StoreError> {
        self.insert_position(sim_id, strategy_id, position).await
    }

    async fn append_snapshot(
        &self,
        sim_id: &str,
        strategy_id: &str,
        snapshot: &HourlySnapshot,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO snapshots (
                sim_id, strategy_id, hour_index, portfolio_value,
                cumulative_pnl, open_positions, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sim_id)
        .bind(strategy_id)
        .bind(i64::from(snapshot.hour_index))
        .bind(real(snapshot.portfolio_value))
        .bind(real(snapshot.cumulative_pnl))
        .bind(i64::from(snapshot.open_positions))
        .bind(snapshot.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_open_positions_by_market(
        &self,
        sim_id: &str,
        market_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT strategy_id FROM positions WHERE sim_id = ? AND market_id = ? AND status = 'OPEN'",
        )
        .bind(sim_id)
        .bind(market_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
