use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use screener_core::{RuleMatch, ScreenError, ScreenRule, SymbolRecord};

use crate::indicators;

/// Latest price strictly above a threshold. Works on both record shapes.
#[derive(Debug, Clone)]
pub struct PriceAboveRule {
    pub threshold: f64,
}

#[async_trait]
impl ScreenRule for PriceAboveRule {
    fn name(&self) -> &str {
        "price_above"
    }

    async fn evaluate(
        &self,
        _symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError> {
        let Some(price) = record.latest_price() else {
            return Ok(None);
        };
        if !price.is_finite() {
            return Err(ScreenError::InvalidData(format!("non-finite price {price}")));
        }
        if price > self.threshold {
            Ok(Some(RuleMatch {
                price: Some(price),
                details: json!({ "price": price, "threshold": self.threshold }),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Latest bar volume at least `min_ratio` times the trailing average.
/// Needs bar history, so snapshot records never match.
#[derive(Debug, Clone)]
pub struct VolumeSurgeRule {
    pub min_ratio: f64,
    pub lookback: usize,
}

#[async_trait]
impl ScreenRule for VolumeSurgeRule {
    fn name(&self) -> &str {
        "volume_surge"
    }

    async fn evaluate(
        &self,
        _symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError> {
        let SymbolRecord::TimeSeries(ts) = record else {
            return Ok(None);
        };
        let (Some(latest), Some(average)) =
            (ts.latest_volume(), ts.average_volume(self.lookback))
        else {
            return Ok(None);
        };
        let Some(ratio) = indicators::volume_ratio(latest, average) else {
            return Ok(None);
        };
        if ratio >= self.min_ratio {
            Ok(Some(RuleMatch {
                price: ts.latest_close(),
                details: json!({
                    "volume": latest,
                    "average_volume": average,
                    "ratio": ratio,
                    "min_ratio": self.min_ratio,
                }),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Oversold screen: latest RSI at or below `max_rsi`.
#[derive(Debug, Clone)]
pub struct RsiThresholdRule {
    pub period: usize,
    pub max_rsi: f64,
}

#[async_trait]
impl ScreenRule for RsiThresholdRule {
    fn name(&self) -> &str {
        "rsi_below"
    }

    async fn evaluate(
        &self,
        _symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError> {
        if self.period == 0 {
            return Err(ScreenError::RuleFailure("rsi period must be positive".into()));
        }
        let SymbolRecord::TimeSeries(ts) = record else {
            return Ok(None);
        };
        let closes = ts.closes();
        let Some(value) = indicators::rsi(&closes, self.period) else {
            // Not enough bars for this period; skip rather than fail.
            return Ok(None);
        };
        if value <= self.max_rsi {
            Ok(Some(RuleMatch {
                price: ts.latest_close(),
                details: json!({
                    "rsi": value,
                    "period": self.period,
                    "max_rsi": self.max_rsi,
                }),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Fast moving average above slow moving average on closes. Simple by
/// default; `exponential` switches both averages to EMA.
#[derive(Debug, Clone)]
pub struct MaCrossoverRule {
    pub fast: usize,
    pub slow: usize,
    pub exponential: bool,
}

#[async_trait]
impl ScreenRule for MaCrossoverRule {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    async fn evaluate(
        &self,
        _symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError> {
        if self.fast == 0 || self.fast >= self.slow {
            return Err(ScreenError::RuleFailure(format!(
                "fast period {} must be positive and below slow period {}",
                self.fast, self.slow
            )));
        }
        let SymbolRecord::TimeSeries(ts) = record else {
            return Ok(None);
        };
        let closes = ts.closes();
        let average = if self.exponential {
            indicators::ema
        } else {
            indicators::sma
        };
        let (Some(fast), Some(slow)) = (average(&closes, self.fast), average(&closes, self.slow))
        else {
            return Ok(None);
        };
        if fast > slow {
            Ok(Some(RuleMatch {
                price: ts.latest_close(),
                details: json!({
                    "fast_ma": fast,
                    "slow_ma": slow,
                    "fast_period": self.fast,
                    "slow_period": self.slow,
                    "exponential": self.exponential,
                }),
            }))
        } else {
            Ok(None)
        }
    }
}

/// Serializable rule selection, the caller-facing knob in a params file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    PriceAbove { threshold: f64 },
    VolumeSurge { min_ratio: f64, lookback: usize },
    RsiBelow { period: usize, max_rsi: f64 },
    MaCrossover {
        fast: usize,
        slow: usize,
        #[serde(default)]
        exponential: bool,
    },
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig::PriceAbove { threshold: 100.0 }
    }
}

impl RuleConfig {
    pub fn build(&self) -> Arc<dyn ScreenRule> {
        match *self {
            RuleConfig::PriceAbove { threshold } => Arc::new(PriceAboveRule { threshold }),
            RuleConfig::VolumeSurge { min_ratio, lookback } => {
                Arc::new(VolumeSurgeRule { min_ratio, lookback })
            }
            RuleConfig::RsiBelow { period, max_rsi } => {
                Arc::new(RsiThresholdRule { period, max_rsi })
            }
            RuleConfig::MaCrossover { fast, slow, exponential } => {
                Arc::new(MaCrossoverRule { fast, slow, exponential })
            }
        }
    }
}
