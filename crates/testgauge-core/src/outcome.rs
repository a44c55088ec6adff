//! Test outcome model.
//!
//! One [`OutcomeRecord`] is produced per observed phase of a test. Records
//! are routed to exactly one [`Bucket`] (or none) by [`OutcomeRecord::bucket`].

use serde::{Deserialize, Serialize};

/// Phase of a single test's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

/// Result of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
    Errored,
}

/// Where a test lives. `function` is the identifier used for metric names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLocation {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u32>,
    pub function: String,
}

impl TestLocation {
    pub fn new(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            function: function.into(),
        }
    }
}

/// Aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Passed,
    Failed,
    Skipped,
    Errored,
}

/// One observed phase outcome.
///
/// `location` is optional because hosts occasionally report events without
/// one; such records are malformed and carry no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    #[serde(default)]
    pub location: Option<TestLocation>,
    pub phase: Phase,
    pub outcome: Outcome,
}

impl OutcomeRecord {
    pub fn new(location: TestLocation, phase: Phase, outcome: Outcome) -> Self {
        Self {
            location: Some(location),
            phase,
            outcome,
        }
    }

    /// Shorthand for a call-phase record.
    pub fn call(function: impl Into<String>, outcome: Outcome) -> Self {
        Self::new(TestLocation::new("", function), Phase::Call, outcome)
    }

    /// Identifier used for metric names, if the record has one.
    pub fn test_identifier(&self) -> Option<&str> {
        self.location
            .as_ref()
            .map(|l| l.function.as_str())
            .filter(|f| !f.is_empty())
    }

    /// Bucket this record lands in.
    ///
    /// Call-phase results map one to one. A failing setup or teardown is an
    /// error no matter how the call phase went. Everything else (passing or
    /// skipped fixtures) is not counted.
    pub fn bucket(&self) -> Option<Bucket> {
        match (self.phase, self.outcome) {
            (Phase::Call, Outcome::Passed) => Some(Bucket::Passed),
            (Phase::Call, Outcome::Failed) => Some(Bucket::Failed),
            (Phase::Call, Outcome::Skipped) => Some(Bucket::Skipped),
            (Phase::Call, Outcome::Errored) => Some(Bucket::Errored),
            (Phase::Setup | Phase::Teardown, Outcome::Failed | Outcome::Errored) => {
                Some(Bucket::Errored)
            }
            (Phase::Setup | Phase::Teardown, Outcome::Passed | Outcome::Skipped) => None,
        }
    }
}
