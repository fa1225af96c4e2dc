use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use screener_core::{MatchEntry, ScreenResult, ScreenRule, SymbolRecord};

use crate::ScreenerParams;

/// Runs one rule over a `data_dict` and produces the result contract.
///
/// `screen` never returns an error: per-symbol failures are logged and
/// recorded while the loop continues, and an unusable invocation degrades to
/// an empty result with a populated `errors` field.
pub struct Screener {
    rule: Arc<dyn ScreenRule>,
    params: ScreenerParams,
}

impl Screener {
    pub fn new(rule: Arc<dyn ScreenRule>) -> Self {
        Self {
            rule,
            params: ScreenerParams::default(),
        }
    }

    pub fn with_params(rule: Arc<dyn ScreenRule>, params: ScreenerParams) -> Self {
        Self { rule, params }
    }

    /// Build both the rule and the screener from a params file payload.
    pub fn from_params(params: ScreenerParams) -> Self {
        let rule = params.rule.build();
        Self { rule, params }
    }

    pub async fn screen(&self, data: &HashMap<String, SymbolRecord>) -> ScreenResult {
        let mut result = ScreenResult::empty();
        let total = data.len();
        let mut failed = 0usize;

        tracing::info!("Screening {} symbols with rule '{}'", total, self.rule.name());

        // Sorted iteration: identical input gives byte-identical output.
        // No ordering is promised to consumers.
        let mut symbols: Vec<&String> = data.keys().collect();
        symbols.sort();

        for symbol in symbols {
            let record = &data[symbol];

            if let Some(expected) = self.params.expected_shape {
                if record.shape() != expected {
                    tracing::debug!(
                        "Skipping {}: expected {:?} record, got {:?}",
                        symbol,
                        expected,
                        record.shape()
                    );
                    continue;
                }
            }

            if record.is_placeholder() && !self.params.include_placeholder {
                tracing::debug!("Skipping {}: placeholder data", symbol);
                continue;
            }

            match self.rule.evaluate(symbol, record).await {
                Ok(Some(m)) => {
                    result.details.insert(symbol.clone(), m.details.clone());
                    result.matches.push(self.match_entry(symbol, m));
                }
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Rule '{}' failed for {}: {}", self.rule.name(), symbol, e);
                    result.push_error(format!("{symbol}: {e}"));
                }
            }
        }

        if let Some(limit) = self.params.limit {
            if result.matches.len() > limit {
                for dropped in result.matches.split_off(limit) {
                    result.details.remove(dropped.symbol());
                }
            }
        }

        tracing::info!(
            "Screen complete: {}/{} symbols matched, {} failed",
            result.matches.len(),
            total,
            failed
        );

        result
    }

    /// Screen a raw JSON `data_dict`. An undecodable payload is an
    /// invocation-level failure and degrades to an empty result with an
    /// `errors` explanation.
    pub async fn screen_value(&self, data: Value) -> ScreenResult {
        match serde_json::from_value::<HashMap<String, SymbolRecord>>(data) {
            Ok(data) => self.screen(&data).await,
            Err(e) => {
                tracing::warn!("Unusable data_dict: {}", e);
                ScreenResult::failed(format!("unusable data_dict: {e}"))
            }
        }
    }

    fn match_entry(&self, symbol: &str, m: screener_core::RuleMatch) -> MatchEntry {
        if self.params.detailed_matches {
            let extra = match m.details {
                Value::Object(map) => map,
                other => {
                    let mut map = Map::new();
                    map.insert("details".to_string(), other);
                    map
                }
            };
            MatchEntry::Detailed {
                symbol: symbol.to_string(),
                price: m.price,
                extra,
            }
        } else {
            MatchEntry::Symbol(symbol.to_string())
        }
    }
}
