//! Trade signal model: one trade copied from an external trader, read-only
//! input to the simulation engine.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Snapshot of the source trader's track record at signal time.
///
/// Captured by the upstream feed; the engine never recomputes it, so every
/// strategy filters on the same point-in-time numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderStats {
    /// Number of resolved trades in the trader's history
    pub resolved_trades: u32,

    /// Win rate across resolved trades (0.0 to 1.0)
    pub win_rate: f64,

    /// Lifetime realized P&L in USDC
    #[serde(default)]
    pub total_pnl: Decimal,
}

/// A live trade signal copied from an external trader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Unique signal identifier from the feed
    pub id: String,

    /// Source trader's wallet address
    pub trader_address: String,

    /// Market condition ID
    pub market_id: String,

    /// Market title for display
    #[serde(default)]
    pub market_title: String,

    /// Market category (e.g., "sports", "politics"), when known
    #[serde(default)]
    pub category: Option<String>,

    /// Outcome token being traded (e.g., "Yes", "No")
    pub outcome: String,

    /// Trade direction
    pub side: Side,

    /// Price per token in USDC (0.0 to 1.0)
    pub price: Decimal,

    /// USDC value of the source trade
    pub size_usdc: Decimal,

    /// When the source trade occurred
    pub timestamp: DateTime<Utc>,

    /// Trader track record at signal time
    pub trader_stats: TraderStats,

    /// Optional model-assigned edge score for this signal
    #[serde(default)]
    pub model_score: Option<f64>,
}

impl TradeSignal {
    /// Estimated pricing edge: trader win rate minus entry price.
    ///
    /// A trader who wins 60% of the time buying at 0.40 has a 0.20 edge.
    pub fn edge(&self) -> f64 {
        self.trader_stats.win_rate - self.price.to_f64().unwrap_or(1.0)
    }

    /// Edge estimate used for sizing: the model score when present,
    /// otherwise the track-record edge.
    pub fn edge_estimate(&self) -> f64 {
        self.model_score.unwrap_or_else(|| self.edge())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn sample_signal() -> TradeSignal {
        TradeSignal {
            id: "sig-1".to_string(),
            trader_address: "0xabc".to_string(),
            market_id: "0xmarket".to_string(),
            market_title: "Test Market".to_string(),
            category: Some("sports".to_string()),
            outcome: "Yes".to_string(),
            side: Side::Buy,
            price: dec!(0.40),
            size_usdc: dec!(200),
            timestamp: Utc::now(),
            trader_stats: TraderStats {
                resolved_trades: 50,
                win_rate: 0.60,
                total_pnl: dec!(1500),
            },
            model_score: None,
        }
    }

    #[test]
    fn test_edge_from_track_record() {
        let signal = sample_signal();
        assert!((signal.edge() - 0.20).abs() < 1e-9);
        assert!((signal.edge_estimate() - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_model_score_overrides_edge_estimate() {
        let mut signal = sample_signal();
        signal.model_score = Some(0.08);
        assert!((signal.edge_estimate() - 0.08).abs() < 1e-9);
        // Raw edge is unchanged
        assert!((signal.edge() - 0.20).abs() < 1e-9);
    }
}
