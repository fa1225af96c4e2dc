use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use screener_core::{
    RecordShape, RuleMatch, ScreenError, ScreenRule, SnapshotRecord, SymbolRecord,
};
use screener_rules::PriceAboveRule;

use crate::{Screener, ScreenerParams};

fn snapshot(price: Option<f64>) -> SymbolRecord {
    SymbolRecord::Snapshot(SnapshotRecord {
        price,
        ..Default::default()
    })
}

fn data(entries: &[(&str, Option<f64>)]) -> HashMap<String, SymbolRecord> {
    entries
        .iter()
        .map(|&(symbol, price)| (symbol.to_string(), snapshot(price)))
        .collect()
}

fn price_screener() -> Screener {
    Screener::new(Arc::new(PriceAboveRule { threshold: 100.0 }))
}

/// Fails for one designated symbol, matches everything else above 100.
struct FailOn {
    bad_symbol: &'static str,
}

#[async_trait]
impl ScreenRule for FailOn {
    fn name(&self) -> &str {
        "fail_on"
    }

    async fn evaluate(
        &self,
        symbol: &str,
        record: &SymbolRecord,
    ) -> Result<Option<RuleMatch>, ScreenError> {
        if symbol == self.bad_symbol {
            return Err(ScreenError::RuleFailure("simulated failure".into()));
        }
        PriceAboveRule { threshold: 100.0 }.evaluate(symbol, record).await
    }
}

#[tokio::test]
async fn empty_input_yields_empty_result() {
    let result = price_screener().screen(&HashMap::new()).await;
    assert!(result.matches.is_empty());
    assert!(result.details.is_empty());
    assert!(result.errors.is_none());
}

#[tokio::test]
async fn price_threshold_scenario() {
    let result = price_screener()
        .screen(&data(&[("AAPL", Some(150.0)), ("MSFT", Some(40.0))]))
        .await;
    assert_eq!(result.match_symbols(), vec!["AAPL"]);
    assert_eq!(result.details["AAPL"]["price"], json!(150.0));
    assert!(!result.details.contains_key("MSFT"));
    assert!(result.errors.is_none());
}

#[tokio::test]
async fn missing_field_symbol_is_silently_skipped() {
    let result = price_screener()
        .screen(&data(&[("AAPL", Some(150.0)), ("NOPX", None)]))
        .await;
    assert_eq!(result.match_symbols(), vec!["AAPL"]);
    assert!(result.errors.is_none());
}

#[tokio::test]
async fn one_symbol_failure_does_not_stop_the_screen() {
    let screener = Screener::new(Arc::new(FailOn { bad_symbol: "BOOM" }));
    let result = screener
        .screen(&data(&[
            ("AAPL", Some(150.0)),
            ("BOOM", Some(500.0)),
            ("NVDA", Some(900.0)),
        ]))
        .await;
    assert_eq!(result.match_symbols(), vec!["AAPL", "NVDA"]);
    let errors = result.errors.expect("failure must be recorded");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("BOOM"));
}

#[tokio::test]
async fn details_keys_match_bare_symbols() {
    let result = price_screener()
        .screen(&data(&[
            ("AAPL", Some(150.0)),
            ("NVDA", Some(900.0)),
            ("MSFT", Some(40.0)),
        ]))
        .await;
    for symbol in result.match_symbols() {
        assert!(result.details.contains_key(symbol), "no details for {symbol}");
    }
    assert_eq!(result.details.len(), result.matches.len());
}

#[tokio::test]
async fn identical_input_gives_identical_output() {
    let input = data(&[
        ("AAPL", Some(150.0)),
        ("NVDA", Some(900.0)),
        ("MSFT", Some(40.0)),
        ("NOPX", None),
    ]);
    let screener = price_screener();
    let first = serde_json::to_string(&screener.screen(&input).await).unwrap();
    let second = serde_json::to_string(&screener.screen(&input).await).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn limit_truncates_matches_and_details_together() {
    let params = ScreenerParams {
        limit: Some(1),
        ..Default::default()
    };
    let screener = Screener::with_params(Arc::new(PriceAboveRule { threshold: 100.0 }), params);
    let result = screener
        .screen(&data(&[("AAPL", Some(150.0)), ("NVDA", Some(900.0))]))
        .await;
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.details.len(), 1);
    assert!(result.details.contains_key(result.match_symbols()[0]));
}

#[tokio::test]
async fn detailed_match_form_carries_price() {
    let params = ScreenerParams {
        detailed_matches: true,
        ..Default::default()
    };
    let screener = Screener::with_params(Arc::new(PriceAboveRule { threshold: 100.0 }), params);
    let result = screener.screen(&data(&[("AAPL", Some(150.0))])).await;
    let entry = serde_json::to_value(&result.matches[0]).unwrap();
    assert_eq!(entry["symbol"], json!("AAPL"));
    assert_eq!(entry["price"], json!(150.0));
}

#[tokio::test]
async fn expected_shape_skips_mismatched_records() {
    let params = ScreenerParams {
        expected_shape: Some(RecordShape::TimeSeries),
        ..Default::default()
    };
    let screener = Screener::with_params(Arc::new(PriceAboveRule { threshold: 100.0 }), params);
    // Snapshot records only; all get skipped under a time-series expectation.
    let result = screener.screen(&data(&[("AAPL", Some(150.0))])).await;
    assert!(result.matches.is_empty());
    assert!(result.errors.is_none());
}

#[tokio::test]
async fn placeholder_records_are_skipped_by_default() {
    let mut input = HashMap::new();
    input.insert(
        "FAKE".to_string(),
        SymbolRecord::Snapshot(SnapshotRecord {
            price: Some(150.0),
            is_placeholder: true,
            ..Default::default()
        }),
    );
    let result = price_screener().screen(&input).await;
    assert!(result.matches.is_empty());

    let params = ScreenerParams {
        include_placeholder: true,
        ..Default::default()
    };
    let screener = Screener::with_params(Arc::new(PriceAboveRule { threshold: 100.0 }), params);
    let result = screener.screen(&input).await;
    assert_eq!(result.match_symbols(), vec!["FAKE"]);
}

#[tokio::test]
async fn undecodable_data_dict_degrades_to_errors() {
    let result = price_screener().screen_value(json!([1, 2, 3])).await;
    assert!(result.matches.is_empty());
    assert!(result.details.is_empty());
    let errors = result.errors.expect("explanation required");
    assert!(errors[0].contains("unusable data_dict"));
}

#[tokio::test]
async fn screen_value_accepts_raw_json_dict() {
    let result = price_screener()
        .screen_value(json!({
            "AAPL": {"price": 150.0},
            "MSFT": {"price": 40.0}
        }))
        .await;
    assert_eq!(result.match_symbols(), vec!["AAPL"]);
}
