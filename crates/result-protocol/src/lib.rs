//! Marker framing for screen results.
//!
//! The primary output stream is shared with human-readable noise, so the one
//! machine-readable payload is bracketed by two literal marker lines. The
//! producer side ([`FramedEmitter`], [`write_framed`]) guarantees exactly one
//! framed document per invocation; the consumer side ([`parse_captured`])
//! recovers it from a captured stream and substitutes a degraded
//! [`ScreenResult`] when the framing is broken.

use std::io::Write;

use thiserror::Error;

use screener_core::ScreenResult;

pub const RESULT_JSON_START: &str = "RESULT_JSON_START";
pub const RESULT_JSON_END: &str = "RESULT_JSON_END";

#[derive(Error, Debug)]
pub enum FramingError {
    #[error("Result already emitted on this stream")]
    AlreadyEmitted,

    #[error("Start marker not found in captured stream")]
    MissingStartMarker,

    #[error("End marker not found after start marker")]
    MissingEndMarker,

    #[error("No payload between markers")]
    EmptyPayload,

    #[error("Payload between markers is not a well-formed JSON document: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Serialized payload contains a marker literal")]
    MarkerInPayload,

    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write one framed result: start marker line, single-line JSON document,
/// end marker line, flush.
pub fn write_framed<W: Write>(writer: &mut W, result: &ScreenResult) -> Result<(), FramingError> {
    let payload = serde_json::to_string(result)?;
    // serde_json escapes control characters, so the payload is one line; a
    // marker literal smuggled inside a string value must still never be
    // emitted into the stream.
    if payload.contains(RESULT_JSON_START) || payload.contains(RESULT_JSON_END) {
        return Err(FramingError::MarkerInPayload);
    }
    writeln!(writer, "{RESULT_JSON_START}")?;
    writeln!(writer, "{payload}")?;
    writeln!(writer, "{RESULT_JSON_END}")?;
    writer.flush()?;
    Ok(())
}

/// Producer-side state machine: BEFORE_RESULT until the one framed emission,
/// AFTER_RESULT (terminal) from then on.
pub struct FramedEmitter<W: Write> {
    writer: W,
    emitted: bool,
}

impl<W: Write> FramedEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            emitted: false,
        }
    }

    pub fn emit(&mut self, result: &ScreenResult) -> Result<(), FramingError> {
        if self.emitted {
            return Err(FramingError::AlreadyEmitted);
        }
        write_framed(&mut self.writer, result)?;
        self.emitted = true;
        Ok(())
    }

    pub fn has_emitted(&self) -> bool {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Text between the first start marker line and the first end marker line
/// after it. Marker lines must match exactly after trimming surrounding
/// whitespace; everything outside the pair is diagnostic noise and ignored.
pub fn extract_payload(stream: &str) -> Result<&str, FramingError> {
    let mut payload_start: Option<usize> = None;
    let mut pos = 0usize;

    for line in stream.split('\n') {
        let at = pos;
        pos += line.len() + 1;
        let trimmed = line.trim();

        match payload_start {
            None => {
                if trimmed == RESULT_JSON_START {
                    payload_start = Some(pos.min(stream.len()));
                }
            }
            Some(start) => {
                if trimmed == RESULT_JSON_END {
                    let payload = stream[start..at].trim();
                    if payload.is_empty() {
                        return Err(FramingError::EmptyPayload);
                    }
                    return Ok(payload);
                }
            }
        }
    }

    match payload_start {
        None => Err(FramingError::MissingStartMarker),
        Some(_) => Err(FramingError::MissingEndMarker),
    }
}

/// Strict parse of a captured stream into a result.
pub fn try_parse(stream: &str) -> Result<ScreenResult, FramingError> {
    let payload = extract_payload(stream)?;
    Ok(serde_json::from_str(payload)?)
}

/// Consumer-side recovery policy: any framing or decode failure substitutes
/// an empty result whose `errors` describes what went wrong.
pub fn parse_captured(stream: &str) -> ScreenResult {
    match try_parse(stream) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Framing failure in captured stream: {}", e);
            ScreenResult::failed(format!("framing failure: {e}"))
        }
    }
}
