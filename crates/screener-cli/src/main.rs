//! screener-cli: run one screen invocation over a `data_dict` and frame the
//! result on stdout between RESULT_JSON_START / RESULT_JSON_END.
//!
//! Usage:
//!   screener-cli [params.json]                 # data_dict JSON on stdin
//!   screener-cli params.json --input data.json
//!   screener-cli --probe                       # environment report, no screen
//!
//! Diagnostics go to stderr; stdout carries nothing but the framed result.
//! Exit code is zero whenever the framing was written, including degraded
//! (zero matches + errors) results.

use std::io::Read;

use anyhow::Context;

use env_probe::LibraryProbe;
use result_protocol::{FramedEmitter, FramingError};
use screener_core::ScreenResult;
use screener_engine::{Screener, ScreenerParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screener_cli=info,screener_engine=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--probe") {
        return run_probe().await;
    }

    let input_path = args
        .iter()
        .position(|a| a == "--input")
        .and_then(|i| args.get(i + 1))
        .cloned();
    let params_path = positional_arg(&args);

    let result = match load_params(params_path.as_deref()) {
        Ok(params) => {
            let screener = Screener::from_params(params);
            match read_input(input_path.as_deref()) {
                Ok(data) => screener.screen_value(data).await,
                Err(e) => {
                    tracing::warn!("Unreadable input: {:#}", e);
                    ScreenResult::failed(format!("unreadable input: {e:#}"))
                }
            }
        }
        Err(e) => {
            tracing::warn!("Unusable params file: {:#}", e);
            ScreenResult::failed(format!("unusable params file: {e:#}"))
        }
    };

    let stdout = std::io::stdout();
    let mut emitter = FramedEmitter::new(stdout.lock());
    emit_result(&mut emitter, &result).context("failed to frame result on stdout")?;
    Ok(())
}

/// Frame the result, degrading when the payload itself would break framing.
/// A symbol or detail string carrying a marker literal must still end in a
/// well-formed framed result, not a silent nonzero exit.
fn emit_result<W: std::io::Write>(
    emitter: &mut FramedEmitter<W>,
    result: &ScreenResult,
) -> Result<(), FramingError> {
    match emitter.emit(result) {
        Err(FramingError::MarkerInPayload) => {
            tracing::warn!("Result contained a marker literal; emitting degraded result");
            emitter.emit(&ScreenResult::failed("result contained a marker literal"))
        }
        other => other,
    }
}

/// First argument that is not a flag or a flag value: the params file path.
fn positional_arg(args: &[String]) -> Option<String> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        match arg.as_str() {
            "--input" => skip_next = true,
            "--probe" => {}
            other if other.starts_with("--") => {
                tracing::warn!("Ignoring unknown flag {}", other);
            }
            other => return Some(other.to_string()),
        }
    }
    None
}

/// Absent path means an empty/default parameter set.
fn load_params(path: Option<&str>) -> anyhow::Result<ScreenerParams> {
    let Some(path) = path else {
        return Ok(ScreenerParams::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("decoding {path}"))
}

fn read_input(path: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("decoding data_dict")
}

/// Environment report, printed as plain JSON outside the marker protocol.
async fn run_probe() -> anyhow::Result<()> {
    let mut spec = env_probe::default_spec();
    for name in [
        "screener-core",
        "screener-rules",
        "screener-engine",
        "result-protocol",
    ] {
        spec.libraries.push(LibraryProbe {
            name: name.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        });
    }

    let client = reqwest::Client::new();
    let report = env_probe::run_probe(&spec, &client).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
