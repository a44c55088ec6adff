//! Shared error type across testgauge crates.

use thiserror::Error;

/// Stable error codes, used in log fields and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing or invalid configuration.
    Config,
    /// The gateway could not be reached or the request failed in flight.
    PushFailed,
    /// The gateway answered with a non-success status.
    PushRejected,
    /// Local I/O (config file, child process, event stream).
    Io,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Config => "CONFIG",
            ErrorCode::PushFailed => "PUSH_FAILED",
            ErrorCode::PushRejected => "PUSH_REJECTED",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TestGaugeError>;

/// Unified error type used by core and pusher.
#[derive(Debug, Error)]
pub enum TestGaugeError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("push failed: {0}")]
    PushFailed(String),
    #[error("gateway rejected push with status {status}: {body}")]
    PushRejected { status: u16, body: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl TestGaugeError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TestGaugeError::Config(_) => ErrorCode::Config,
            TestGaugeError::PushFailed(_) => ErrorCode::PushFailed,
            TestGaugeError::PushRejected { .. } => ErrorCode::PushRejected,
            TestGaugeError::Io(_) => ErrorCode::Io,
            TestGaugeError::Internal(_) => ErrorCode::Internal,
        }
    }
}
