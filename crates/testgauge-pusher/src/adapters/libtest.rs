//! libtest JSON lines (`--format json`, also emitted by nextest's
//! `NEXTEST_EXPERIMENTAL_LIBTEST_JSON`).
//!
//! Only `"type": "test"` lines carry outcomes:
//!
//! * `{ "type": "test", "event": "started", "name": "<name>" }` - skipped
//! * `{ "type": "test", "event": "ok", "name": "<name>", "exec_time": <f32> }`
//! * `{ "type": "test", "event": "failed", "name": "<name>", "stdout": "..." }`
//! * `{ "type": "test", "event": "ignored", "name": "<name>" }`
//! * `{ "type": "test", "event": "timeout", "name": "<name>" }`
//!
//! libtest has no fixtures, so every outcome is a call-phase outcome.

use serde::Deserialize;

use testgauge_core::outcome::{Outcome, OutcomeRecord, Phase, TestLocation};

const KIND_TEST: &str = "test";

#[derive(Debug, Deserialize)]
struct LibtestLine {
    #[serde(rename = "type")]
    kind: String,
    event: String,
    #[serde(default)]
    name: Option<String>,
}

/// Decode one line. `None` for anything that is not a finished test.
pub fn decode(line: &str) -> Option<OutcomeRecord> {
    let parsed: LibtestLine = serde_json::from_str(line).ok()?;
    if parsed.kind != KIND_TEST {
        return None;
    }

    let outcome = match parsed.event.as_str() {
        "ok" => Outcome::Passed,
        "failed" | "timeout" => Outcome::Failed,
        "ignored" => Outcome::Skipped,
        _ => return None,
    };

    Some(OutcomeRecord {
        location: parsed.name.map(location_for),
        phase: Phase::Call,
        outcome,
    })
}

/// The full libtest name is the identifier; the part before the last `::`
/// doubles as the path.
fn location_for(name: String) -> TestLocation {
    let path = name
        .rsplit_once("::")
        .map(|(path, _)| path.to_string())
        .unwrap_or_default();
    TestLocation {
        path,
        line: None,
        function: name,
    }
}
