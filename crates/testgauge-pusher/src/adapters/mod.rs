//! Host-runner event decoders.
//!
//! Each format turns one line of runner output into at most one
//! [`OutcomeRecord`]. Lines that do not decode are not events and are left
//! alone.

pub mod libtest;
pub mod outcomes;

use std::fmt;
use std::str::FromStr;

use testgauge_core::outcome::OutcomeRecord;

/// Event stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFormat {
    /// libtest / nextest JSON lines.
    #[default]
    Libtest,
    /// Serialized [`OutcomeRecord`]s.
    Outcomes,
}

impl EventFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            EventFormat::Libtest => "libtest",
            EventFormat::Outcomes => "outcomes",
        }
    }

    pub fn decode(self, line: &str) -> Option<OutcomeRecord> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        match self {
            EventFormat::Libtest => libtest::decode(line),
            EventFormat::Outcomes => outcomes::decode(line),
        }
    }
}

impl fmt::Display for EventFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "libtest" => Ok(EventFormat::Libtest),
            "outcomes" => Ok(EventFormat::Outcomes),
            other => Err(format!("unknown event format {other:?} (expected libtest or outcomes)")),
        }
    }
}
