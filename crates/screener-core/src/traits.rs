use async_trait::async_trait;

use crate::{ScreenError, SymbolRecord};

/// The inputs that justified a match, destined for `details[symbol]`.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub price: Option<f64>,
    pub details: serde_json::Value,
}

/// A screening rule evaluated once per symbol.
///
/// `Ok(None)` means "no match" — including records that are simply missing
/// the field the rule needs; those are skipped, never errors. `Err` means
/// the rule itself failed for this symbol and the caller should log it and
/// keep going with the remaining symbols.
#[async_trait]
pub trait ScreenRule: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(
        &self,
        symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError>;
}
