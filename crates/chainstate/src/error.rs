//! Ledger error types and result alias.
//!
//! Every fallible operation in the engine returns [`LedgerResult`], and every
//! failure is one of the [`LedgerError`] variants below. The taxonomy is
//! deliberately small: each variant names a distinct caller-visible condition,
//! and no operation retries internally — failures propagate to the embedding
//! runtime, which maps them to its own failure signaling.
//!
//! # Variants
//!
//! - [`LedgerError::InvalidArgument`] - Rejected before any state mutation
//! - [`LedgerError::NotFound`] - Read or delete of an absent (or tombstoned) key
//! - [`LedgerError::AlreadyExists`] - Create on a live key
//! - [`LedgerError::MalformedValue`] - Stored value failed to decode; the key is named
//! - [`LedgerError::InvalidKeySegment`] - Composite-key segment carries a reserved code point
//! - [`LedgerError::MalformedKey`] - String is not a valid composite-key encoding
//! - [`LedgerError::SizeLimitExceeded`] - Key or value exceeds configured limits
//!
//! # Example
//!
//! ```
//! use chainstate::{LedgerError, LedgerResult};
//!
//! fn lookup(key: &str) -> LedgerResult<Vec<u8>> {
//!     Err(LedgerError::not_found(key))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors produced by the ledger engine.
///
/// Validation errors (`InvalidArgument`, `InvalidKeySegment`, `MalformedKey`,
/// `SizeLimitExceeded`) are raised before any state is touched: an operation
/// that fails with one of these has no partial effects. `MalformedValue`
/// preserves the offending key and leaves the stored bytes untouched.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// An argument failed validation before any state mutation.
    ///
    /// Wrong arity, empty required fields, non-numeric sizes, unknown
    /// operation tags, and corrupt bookmarks all land here.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// The requested key is absent or tombstoned.
    #[error("Key not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// A create targeted a key that is already live.
    #[error("Key already exists: {key}")]
    AlreadyExists {
        /// The key that already exists.
        key: String,
    },

    /// A stored value failed to decode as the expected structure.
    ///
    /// The stored bytes are left untouched; the key is named so the caller
    /// can inspect or repair the record.
    #[error("Malformed value at key {key}: {message}")]
    MalformedValue {
        /// The key holding the undecodable value.
        key: String,
        /// Description of the decode failure.
        message: String,
        /// The underlying decode error, when one exists.
        #[source]
        source: Option<BoxError>,
    },

    /// A composite-key segment is empty or contains a reserved code point.
    #[error("Invalid key segment: {segment:?}")]
    InvalidKeySegment {
        /// The offending segment.
        segment: String,
    },

    /// A string is not a valid composite-key encoding.
    #[error("Malformed composite key: {message}")]
    MalformedKey {
        /// Description of the inconsistency.
        message: String,
    },

    /// A key or value exceeds the configured size limits.
    #[error("{kind} size {actual} exceeds limit {limit}")]
    SizeLimitExceeded {
        /// Which limit was violated: `"key"` or `"value"`.
        kind: &'static str,
        /// The observed size in bytes.
        actual: usize,
        /// The configured limit in bytes.
        limit: usize,
    },
}

impl LedgerError {
    /// Creates a new `InvalidArgument` error with the given message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Creates a new `NotFound` error for the given key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `AlreadyExists` error for the given key.
    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Creates a new `MalformedValue` error naming the offending key.
    #[must_use]
    pub fn malformed_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedValue { key: key.into(), message: message.into(), source: None }
    }

    /// Creates a new `MalformedValue` error carrying the decode error as source.
    #[must_use]
    pub fn malformed_value_with_source(
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedValue {
            key: key.into(),
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a new `InvalidKeySegment` error for the given segment.
    #[must_use]
    pub fn invalid_key_segment(segment: impl Into<String>) -> Self {
        Self::InvalidKeySegment { segment: segment.into() }
    }

    /// Creates a new `MalformedKey` error with the given message.
    #[must_use]
    pub fn malformed_key(message: impl Into<String>) -> Self {
        Self::MalformedKey { message: message.into() }
    }

    /// Creates a new `SizeLimitExceeded` error.
    #[must_use]
    pub fn size_limit_exceeded(kind: &'static str, actual: usize, limit: usize) -> Self {
        Self::SizeLimitExceeded { kind, actual, limit }
    }
}
