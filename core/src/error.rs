//! Error types for the OT core and the editor binding

use thiserror::Error;

/// Errors raised by operation algebra, the editor binding and the session layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtError {
    /// Base/target lengths of two operations (or an operation and a
    /// document) do not line up
    #[error("{context}: length mismatch (expected {expected}, got {actual})")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An index fell outside the current surface document
    #[error("index {index} out of bounds (length: {length})")]
    OutOfBounds { index: usize, length: usize },

    /// Inbound delta does not directly follow the local revision
    #[error("revision mismatch (expected {expected}, got {actual})")]
    RevisionMismatch { expected: u64, actual: u64 },

    /// Acknowledgement arrived with no operation in flight
    #[error("acknowledgement received with no outstanding operation")]
    UnexpectedAck,

    /// Remote selection colors must be six-digit hex
    #[error("only six-digit hex colors are allowed, got {0:?}")]
    InvalidColor(String),

    /// Malformed or unknown protocol message
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),
}

impl OtError {
    pub(crate) fn length_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        OtError::LengthMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Whether this error means local state has diverged from the
    /// authority and the session must reload a fresh snapshot.
    pub fn requires_resync(&self) -> bool {
        matches!(
            self,
            OtError::LengthMismatch { .. }
                | OtError::OutOfBounds { .. }
                | OtError::RevisionMismatch { .. }
                | OtError::UnexpectedAck
        )
    }
}

impl From<serde_json::Error> for OtError {
    fn from(err: serde_json::Error) -> Self {
        OtError::Protocol(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OtError>;
