//! Public types shared across engine operations.

use std::time::SystemTime;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A live record: key, opaque value, and per-key version.
///
/// The value is application-interpreted; the [`Ledger`](crate::Ledger) facade
/// stores JSON documents with a `docType` discriminant, but the store itself
/// never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The key identifying this record.
    pub key: String,

    /// The stored value. Cheap to clone; shared with the store's copy.
    pub value: Bytes,

    /// Per-key version: 1 on first write, strictly increasing and gapless
    /// across the key's lifetime, surviving tombstones.
    pub version: u64,
}

impl Record {
    /// Creates a new record.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>, version: u64) -> Self {
        Self { key: key.into(), value: value.into(), version }
    }
}

/// One entry in a key's append-only mutation history.
///
/// History entries are owned exclusively by the store: appended on every
/// mutation, never modified or removed, and retained after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Global mutation sequence number at the time of this mutation.
    /// Serves as a surrogate transaction id.
    pub tx_seq: u64,

    /// Wall-clock time of the mutation.
    pub timestamp: SystemTime,

    /// Whether this entry records a deletion (tombstone).
    pub is_delete: bool,

    /// Snapshot of the value written, or `None` for tombstones.
    pub value: Option<Bytes>,
}

/// Opaque resumption token for paginated scans.
///
/// A bookmark encodes the last key a page returned; resuming a scan with it
/// continues at that key's exact successor. The empty bookmark means "start
/// from the beginning". Tokens are hex-encoded so they stay printable and
/// order-preserving, but callers must treat them as opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmark(String);

impl Bookmark {
    /// The empty bookmark: resume from the beginning.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Builds the bookmark that resumes after `key`.
    #[must_use]
    pub fn after_key(key: &str) -> Self {
        Self(hex::encode(key))
    }

    /// Wraps a raw token received from a caller.
    ///
    /// The token is validated lazily, when the scan it resumes is issued.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty (start-from-beginning) bookmark.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the key this bookmark resumes after, or `None` when empty.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for tokens that are not valid
    /// bookmark encodings.
    pub fn resume_after(&self) -> LedgerResult<Option<String>> {
        if self.0.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(&self.0)
            .map_err(|e| LedgerError::invalid_argument(format!("malformed bookmark: {e}")))?;
        let key = String::from_utf8(bytes).map_err(|e| {
            LedgerError::invalid_argument(format!("malformed bookmark: {e}"))
        })?;
        Ok(Some(key))
    }
}

impl std::fmt::Display for Bookmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pagination metadata attached to every paginated result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Number of records in this page.
    pub records_count: u32,

    /// Bookmark resuming after the last record of this page. Empty when the
    /// page itself is empty.
    pub bookmark: Bookmark,
}

/// One page of a paginated scan or query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// The records of this page, in ascending key order.
    pub results: Vec<Record>,

    /// Pagination metadata for resuming the scan.
    pub metadata: ResponseMetadata,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn bookmark_round_trip() {
        let bookmark = Bookmark::after_key("marble1");
        assert!(!bookmark.is_empty());
        assert_eq!(bookmark.resume_after().unwrap(), Some("marble1".to_owned()));
    }

    #[test]
    fn empty_bookmark_resumes_from_start() {
        assert_eq!(Bookmark::empty().resume_after().unwrap(), None);
        assert_eq!(Bookmark::default().resume_after().unwrap(), None);
    }

    #[test]
    fn corrupt_bookmark_is_invalid_argument() {
        let err = Bookmark::from_token("not-hex!").resume_after().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn bookmark_token_is_printable() {
        let bookmark = Bookmark::after_key("\u{0}color~name\u{0}blue\u{1}");
        assert!(bookmark.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
