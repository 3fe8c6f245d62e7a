//! Error types for the whitelist store and the job serializer.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::serde::ActorId;

/// Rejections produced by whitelist mutations.
///
/// These are ordinary outcomes reported back to the caller; none of them is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhitelistError {
    /// The actor performing the operation has no whitelist entry.
    #[error("acting user not found")]
    ActingUserNotFound,
    /// The tier hierarchy forbids the operation.
    #[error("operation not permitted")]
    NotPermitted,
    /// The target of an `add` is already whitelisted.
    #[error("user already whitelisted")]
    AlreadyWhitelisted,
    /// The target of a `remove` is not whitelisted.
    #[error("user not whitelisted")]
    NotWhitelisted,
    /// The target of an `update` is not whitelisted.
    #[error("user not found")]
    UserNotFound,
    /// The mutation was valid but could not be written; nothing changed.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Failures of the persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("io error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The persisted document exists but cannot be parsed.
    #[error("whitelist document {path} is corrupt: {reason}")]
    Corrupt {
        /// Offending document.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// The persisted document lists the same actor twice.
    #[error("whitelist document holds more than one entry for actor {0}")]
    DuplicateEntry(ActorId),
    /// The entry set could not be encoded.
    #[error("failed to encode whitelist: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<StoreError> for WhitelistError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failures of a job submitted to the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The compute call raised; no partial result exists.
    #[error("compute failed: {0}")]
    ComputeFailed(String),
    /// The serializer was shut down before the job could run.
    #[error("job serializer has been shut down")]
    Shutdown,
    /// Worker setup or channel failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Opaque failure reported by a compute backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ComputeError(pub String);

impl ComputeError {
    /// Build a compute error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<ComputeError> for JobError {
    fn from(err: ComputeError) -> Self {
        Self::ComputeFailed(err.0)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
