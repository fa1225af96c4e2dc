use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Record shape a caller declares it will supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    TimeSeries,
    Snapshot,
}

/// Historical bar series for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    pub bars: Vec<Bar>,
}

impl TimeSeriesRecord {
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn latest_volume(&self) -> Option<f64> {
        self.bars.last().map(|b| b.volume)
    }

    /// Mean volume over up to `lookback` bars preceding the latest bar.
    /// None when there is no history before the latest bar.
    pub fn average_volume(&self, lookback: usize) -> Option<f64> {
        if self.bars.len() < 2 || lookback == 0 {
            return None;
        }
        let history = &self.bars[..self.bars.len() - 1];
        let start = history.len().saturating_sub(lookback);
        let window = &history[start..];
        Some(window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64)
    }
}

/// Flat snapshot for one symbol. Every data field is optional: callers send
/// partial records and screening skips the symbol instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Synthetic/default values substituted when real market data was
    /// unavailable. Rules skip these unless explicitly told otherwise.
    #[serde(default)]
    pub is_placeholder: bool,
}

/// One entry of `data_dict`: either a bar series or a flat snapshot.
/// The shape is resolved once here, at the deserialization boundary, so
/// downstream rule logic is shape-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolRecord {
    TimeSeries(TimeSeriesRecord),
    Snapshot(SnapshotRecord),
}

impl SymbolRecord {
    pub fn shape(&self) -> RecordShape {
        match self {
            SymbolRecord::TimeSeries(_) => RecordShape::TimeSeries,
            SymbolRecord::Snapshot(_) => RecordShape::Snapshot,
        }
    }

    /// Latest traded price: snapshot price, or the last close of the series.
    pub fn latest_price(&self) -> Option<f64> {
        match self {
            SymbolRecord::TimeSeries(ts) => ts.latest_close(),
            SymbolRecord::Snapshot(snap) => snap.price,
        }
    }

    pub fn latest_volume(&self) -> Option<f64> {
        match self {
            SymbolRecord::TimeSeries(ts) => ts.latest_volume(),
            SymbolRecord::Snapshot(snap) => snap.volume,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        match self {
            SymbolRecord::TimeSeries(_) => false,
            SymbolRecord::Snapshot(snap) => snap.is_placeholder,
        }
    }
}

/// A `matches` entry. Both wire forms are observed in the field and both
/// must round-trip: a bare symbol string, or an inline object carrying the
/// symbol plus the numbers that justified the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchEntry {
    Symbol(String),
    Detailed {
        symbol: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        price: Option<f64>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl MatchEntry {
    pub fn symbol(&self) -> &str {
        match self {
            MatchEntry::Symbol(s) => s,
            MatchEntry::Detailed { symbol, .. } => symbol,
        }
    }
}

/// The serialized result contract toward the hosting process.
/// Built fresh per invocation, serialized once, discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenResult {
    pub matches: Vec<MatchEntry>,
    pub details: Map<String, Value>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl ScreenResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Degraded result: zero matches plus an explanation. This is the shape
    /// every failure mode collapses to instead of a crashed process.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            details: Map::new(),
            errors: Some(vec![reason.into()]),
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.get_or_insert_with(Vec::new).push(message.into());
    }

    /// Symbols named by `matches`, in both wire forms.
    pub fn match_symbols(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.symbol()).collect()
    }
}
