//! Session summary: per-bucket counts, overall status and the detail string.

use crate::labels::Labels;
use crate::outcome::Bucket;

/// Label key carrying the overall status on the info record.
pub const STATUS_LABEL: &str = "status";
/// Label key carrying the counts string on the info record.
pub const DETAIL_LABEL: &str = "detail";

/// Overall session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Succeeded,
    Failed,
    Errored,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
            SessionStatus::Errored => "errored",
        }
    }
}

/// Number of entries per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl OutcomeCounts {
    pub fn add(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::Passed => self.passed += 1,
            Bucket::Failed => self.failed += 1,
            Bucket::Skipped => self.skipped += 1,
            Bucket::Errored => self.errored += 1,
        }
    }

    /// Failures take precedence over errors.
    pub fn status(&self) -> SessionStatus {
        if self.failed > 0 {
            SessionStatus::Failed
        } else if self.errored > 0 {
            SessionStatus::Errored
        } else {
            SessionStatus::Succeeded
        }
    }

    /// `Passed=<n> Failed=<n> Skipped=<n> Error=<n>`
    pub fn detail(&self) -> String {
        format!(
            "Passed={} Failed={} Skipped={} Error={}",
            self.passed, self.failed, self.skipped, self.errored
        )
    }

    /// `status` and `detail` labels.
    pub fn summary_labels(&self) -> Labels {
        let mut labels = Labels::new();
        labels.insert(STATUS_LABEL.to_string(), self.status().as_str().to_string());
        labels.insert(DETAIL_LABEL.to_string(), self.detail());
        labels
    }
}
