use serde::{Deserialize, Serialize};

use screener_core::RecordShape;
use screener_rules::RuleConfig;

/// API credentials handed to the invocation explicitly. Rules that talk to a
/// data provider take these from here; nothing reads ambient process
/// environment on the screen path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
    #[serde(default)]
    pub api_secret: Option<String>,
}

/// Per-invocation configuration, loaded from an optional JSON params file.
/// Every field has a default so an absent file means an empty parameter set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerParams {
    pub rule: RuleConfig,
    /// When set, records of the other shape are skipped per-symbol. When
    /// unset, both shapes are accepted. The caller declares what it sends;
    /// the screener never guesses a default shape.
    pub expected_shape: Option<RecordShape>,
    /// Emit matches as inline objects (symbol + price + details) instead of
    /// bare symbol strings.
    pub detailed_matches: bool,
    /// Evaluate records flagged as placeholder data instead of skipping them.
    pub include_placeholder: bool,
    /// Keep at most this many matches (applied after the deterministic sort).
    pub limit: Option<usize>,
    pub credentials: Option<ApiCredentials>,
}
