//! Phase-aware JSON lines, one serialized [`OutcomeRecord`] per line:
//!
//! ```text
//! {"location":{"path":"tests/db.rs","function":"migrates"},"phase":"setup","outcome":"failed"}
//! ```
//!
//! Unlike libtest this can express fixture (setup/teardown) failures.

use testgauge_core::outcome::OutcomeRecord;

pub fn decode(line: &str) -> Option<OutcomeRecord> {
    serde_json::from_str(line).ok()
}
