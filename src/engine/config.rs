//! Strategy and simulation configuration.
//!
//! Per-strategy behavior differences are pure data: every strategy runs
//! through the same evaluator and sizer, differing only in filters and
//! thresholds, which keeps cross-strategy metrics directly comparable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::SimulationSettings;

/// How an accepted signal is sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SizingRule {
    /// Constant stake per trade
    Fixed { amount: Decimal },

    /// Stake = equity × weight
    FixedFraction { weight: Decimal },

    /// Stake = equity × fraction × edge estimate; no edge, no bet
    Kelly { fraction: Decimal },

    /// Stake scales linearly from min_bet to max_bet with the signal's
    /// edge estimate. The preferred mode: all strategies size by the same
    /// logic, so comparison stays fair.
    EdgeProportional,
}

/// Immutable parameters for one strategy variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: String,

    pub name: String,

    // === Acceptance filters ===
    /// Minimum entry price (0-1)
    pub min_price: Decimal,

    /// Maximum entry price (0-1)
    pub max_price: Decimal,

    /// Minimum edge (trader win rate minus price)
    pub min_edge: f64,

    /// Minimum model score, when the strategy requires one
    #[serde(default)]
    pub min_model_score: Option<f64>,

    /// Minimum resolved trades in the source trader's track record
    pub min_resolved_trades: u32,

    /// Market categories to accept; None accepts every category
    #[serde(default)]
    pub categories: Option<Vec<String>>,

    /// Follow a single trader only, when set
    #[serde(default)]
    pub target_trader: Option<String>,

    // === Sizing ===
    pub sizing: SizingRule,

    /// Smallest stake worth taking
    pub min_bet: Decimal,

    /// Largest stake per position
    pub max_bet: Decimal,

    /// Isolated capital pool at simulation start
    pub starting_capital: Decimal,
}

impl StrategyConfig {
    /// Validate at creation time. A bad config is fatal: the simulation is
    /// not created.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.is_empty() {
            return Err(EngineError::InvalidConfig("strategy id is empty".to_string()));
        }
        if self.min_price < Decimal::ZERO || self.max_price > Decimal::ONE {
            return Err(EngineError::InvalidConfig(format!(
                "{}: price bounds must lie in [0, 1]",
                self.id
            )));
        }
        if self.min_price >= self.max_price {
            return Err(EngineError::InvalidConfig(format!(
                "{}: min_price {} >= max_price {}",
                self.id, self.min_price, self.max_price
            )));
        }
        if self.min_bet <= Decimal::ZERO || self.min_bet > self.max_bet {
            return Err(EngineError::InvalidConfig(format!(
                "{}: bet bounds [{}, {}] are invalid",
                self.id, self.min_bet, self.max_bet
            )));
        }
        if self.starting_capital <= Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "{}: starting capital must be positive",
                self.id
            )));
        }
        match &self.sizing {
            SizingRule::Fixed { amount } if *amount <= Decimal::ZERO => {
                Err(EngineError::InvalidConfig(format!(
                    "{}: fixed amount must be positive",
                    self.id
                )))
            }
            SizingRule::FixedFraction { weight }
                if *weight <= Decimal::ZERO || *weight > Decimal::ONE =>
            {
                Err(EngineError::InvalidConfig(format!(
                    "{}: fraction weight must lie in (0, 1]",
                    self.id
                )))
            }
            SizingRule::Kelly { fraction }
                if *fraction <= Decimal::ZERO || *fraction > Decimal::ONE =>
            {
                Err(EngineError::InvalidConfig(format!(
                    "{}: kelly fraction must lie in (0, 1]",
                    self.id
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default".to_string(),
            min_price: dec!(0.05),
            max_price: dec!(0.95),
            min_edge: 0.0,
            min_model_score: None,
            min_resolved_trades: 0,
            categories: None,
            target_trader: None,
            sizing: SizingRule::EdgeProportional,
            min_bet: dec!(10),
            max_bet: dec!(100),
            starting_capital: dec!(1000),
        }
    }
}

/// Request payload for creating a simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSimulation {
    /// Overrides each strategy's starting capital when set
    #[serde(default)]
    pub initial_capital_per_strategy: Option<Decimal>,

    #[serde(default)]
    pub settings: SimulationSettings,

    /// Start later than creation; omitted means start immediately
    #[serde(default)]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,

    pub strategies: Vec<StrategyConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(StrategyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_price_bounds() {
        let config = StrategyConfig {
            min_price: dec!(0.9),
            max_price: dec!(0.1),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_bet_bounds() {
        let config = StrategyConfig {
            min_bet: dec!(500),
            max_bet: dec!(100),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nonpositive_kelly_fraction() {
        let config = StrategyConfig {
            sizing: SizingRule::Kelly {
                fraction: Decimal::ZERO,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sizing_rule_round_trips_through_json() {
        let rule = SizingRule::Kelly {
            fraction: dec!(0.25),
        };
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("kelly"));
        let back: SizingRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
