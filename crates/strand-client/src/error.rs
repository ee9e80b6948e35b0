use std::fmt::{self, Display};

use thiserror::Error;

use crate::status::{classify, ErrorCategory, Status};
use crate::types::ConfigVersion;

/// Result alias for client operations.
pub type StrandResult<T> = Result<T, StrandError>;

/// The operation a failure belongs to, kept so generic retry wrappers can
/// act without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Append,
    AppendBatch,
    Read,
    ConfigGet,
    ConfigPut,
}

impl Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Append => write!(f, "append"),
            Op::AppendBatch => write!(f, "append batch"),
            Op::Read => write!(f, "read"),
            Op::ConfigGet => write!(f, "config get"),
            Op::ConfigPut => write!(f, "config put"),
        }
    }
}

/// Errors surfaced by the client layer.
///
/// Remote failures preserve the original wire code for diagnostics and carry
/// the category decided at the classification boundary. The version-conflict
/// variant carries the authoritative server-side state so a caller can
/// compare-and-retry without an extra read.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StrandError {
    /// Classified failure reported by the native store.
    #[error("{op} on {target} failed: status {code} ({category})")]
    Remote {
        op: Op,
        /// Log id or config key the operation addressed.
        target: String,
        /// Original wire code, preserved for diagnostics.
        code: u32,
        category: ErrorCategory,
    },

    /// Optimistic-concurrency conflict on a config store write. Carries the
    /// store's actual current version and value.
    #[error("config version mismatch: current version is {current}")]
    VersionConflict {
        current: ConfigVersion,
        value: Vec<u8>,
    },

    /// Log id outside the caller-visible range; rejected before any native
    /// call.
    #[error("log id {0} is outside the user range")]
    InvalidLogId(u64),

    /// Payload exceeds the configured append limit.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// A native completion payload could not be decoded.
    #[error("malformed completion payload: {0}")]
    Codec(String),

    /// Operation issued against a component in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The transport dropped the operation without delivering a completion.
    #[error("{op}: transport dropped the operation")]
    ChannelClosed { op: Op },

    /// The caller-specified deadline expired; the native operation was
    /// cancelled before this was returned.
    #[error("{op} timed out")]
    Timeout { op: Op },
}

impl StrandError {
    /// Build a classified error from a raw wire status. This is the single
    /// point where raw codes become categories.
    pub(crate) fn remote(op: Op, target: impl Display, code: u32) -> Self {
        StrandError::Remote {
            op,
            target: target.to_string(),
            code,
            category: classify(code),
        }
    }

    pub(crate) fn codec(msg: impl Display) -> Self {
        StrandError::Codec(msg.to_string())
    }

    /// The category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StrandError::Remote { category, .. } => *category,
            StrandError::VersionConflict { .. } => ErrorCategory::Conflict,
            StrandError::InvalidLogId(_) => ErrorCategory::Permanent,
            StrandError::PayloadTooLarge { .. } => ErrorCategory::Permanent,
            StrandError::Codec(_) => ErrorCategory::Fatal,
            StrandError::InvalidState(_) => ErrorCategory::Permanent,
            StrandError::ChannelClosed { .. } => ErrorCategory::Transient,
            StrandError::Timeout { .. } => ErrorCategory::Transient,
        }
    }

    /// The wire status, when this error originated remotely and the code is
    /// a defined one.
    pub fn status(&self) -> Option<Status> {
        match self {
            StrandError::Remote { code, .. } => Status::try_from(*code).ok(),
            StrandError::VersionConflict { .. } => Some(Status::VersionMismatch),
            _ => None,
        }
    }

    /// Whether a caller-side retry wrapper may re-issue the operation.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
