//! The versioned key-value store.
//!
//! [`VersionStore`] holds three things behind one lock: the live key space
//! (a [`BTreeMap`] for ordered range access), the append-only per-key history
//! log, and the per-key version counters. A global mutation counter numbers
//! every write and doubles as the engine's only concurrency signal — callers
//! running read-then-write flows compare it before and after to detect
//! interleaving (see [`mutation_count`](VersionStore::mutation_count)).
//!
//! # Cloning
//!
//! `VersionStore` is cheaply cloneable via [`Arc`]. All clones share the same
//! underlying state; lazy scans hold a clone so they never borrow the store.
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | get | O(log n) |
//! | put | O(log n) |
//! | delete | O(log n) |
//! | history | O(h) where h is the key's mutation count |
//! | scan step | O(log n) per yielded record |
//!
//! # Tombstones
//!
//! `delete` removes the key from the live map but retains its history and
//! its version counter. Re-creating a deleted key continues the version
//! sequence, keeping versions gapless across the key's whole lifetime.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::Arc,
    time::SystemTime,
};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
    config::SizeLimits,
    error::{LedgerError, LedgerResult},
    keys,
    query::{QueryScan, Selector},
    scan::RangeScan,
    types::{HistoryEntry, Record},
};

/// A value in the live map, paired with its current version.
#[derive(Debug, Clone)]
struct StoredValue {
    value: Bytes,
    version: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Live (non-tombstoned) records, ordered by key.
    live: BTreeMap<String, StoredValue>,
    /// Append-only mutation log per key, retained after deletion.
    history: HashMap<String, Vec<HistoryEntry>>,
    /// Per-key version counters, surviving tombstones.
    versions: HashMap<String, u64>,
    /// Global mutation counter; also the tx_seq source.
    mutations: u64,
}

/// Versioned key-value store with per-key history.
///
/// # Example
///
/// ```
/// use chainstate::VersionStore;
///
/// let store = VersionStore::new();
/// store.put("marble1", &b"{\"color\":\"blue\"}"[..]).unwrap();
/// let record = store.get("marble1").unwrap();
/// assert_eq!(record.version, 1);
/// ```
#[derive(Clone)]
pub struct VersionStore {
    limits: SizeLimits,
    inner: Arc<RwLock<StoreInner>>,
}

impl VersionStore {
    /// Creates an empty store with default [`SizeLimits`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(SizeLimits::default())
    }

    /// Creates an empty store with the given size limits.
    #[must_use]
    pub fn with_limits(limits: SizeLimits) -> Self {
        Self { limits, inner: Arc::new(RwLock::new(StoreInner::default())) }
    }

    /// The size limits every write is checked against.
    pub(crate) fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Retrieves the live record at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for absent or tombstoned keys.
    pub fn get(&self, key: &str) -> LedgerResult<Record> {
        let inner = self.inner.read();
        inner
            .live
            .get(key)
            .map(|stored| Record::new(key, stored.value.clone(), stored.version))
            .ok_or_else(|| LedgerError::not_found(key))
    }

    /// Creates or overwrites the record at `key`.
    ///
    /// Bumps the key's version, appends a [`HistoryEntry`], and advances the
    /// global mutation counter, all under one write lock.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for an empty key and
    /// [`LedgerError::SizeLimitExceeded`] when the key or value exceeds the
    /// configured limits. Neither leaves any trace in the store.
    pub fn put(&self, key: &str, value: impl Into<Bytes>) -> LedgerResult<Record> {
        if key.is_empty() {
            return Err(LedgerError::invalid_argument("key must not be empty"));
        }
        let value = value.into();
        self.limits.validate(key, &value)?;

        let mut inner = self.inner.write();
        inner.mutations += 1;
        let tx_seq = inner.mutations;

        let version = {
            let counter = inner.versions.entry(key.to_owned()).or_insert(0);
            *counter += 1;
            *counter
        };

        inner.history.entry(key.to_owned()).or_default().push(HistoryEntry {
            tx_seq,
            timestamp: SystemTime::now(),
            is_delete: false,
            value: Some(value.clone()),
        });
        inner.live.insert(key.to_owned(), StoredValue { value: value.clone(), version });

        Ok(Record::new(key, value, version))
    }

    /// Tombstones the record at `key`.
    ///
    /// The key leaves the live key space; its history gains a tombstone
    /// entry and is retained.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the key is absent or already
    /// tombstoned — deleting twice never succeeds twice.
    pub fn delete(&self, key: &str) -> LedgerResult<()> {
        let mut inner = self.inner.write();
        if inner.live.remove(key).is_none() {
            return Err(LedgerError::not_found(key));
        }
        inner.mutations += 1;
        let tx_seq = inner.mutations;
        inner.history.entry(key.to_owned()).or_default().push(HistoryEntry {
            tx_seq,
            timestamp: SystemTime::now(),
            is_delete: true,
            value: None,
        });
        Ok(())
    }

    /// Returns the full mutation history of `key`, oldest first.
    ///
    /// Tombstone entries are included. A key that never existed yields an
    /// empty vector, not an error.
    #[must_use]
    pub fn history(&self, key: &str) -> Vec<HistoryEntry> {
        self.inner.read().history.get(key).cloned().unwrap_or_default()
    }

    /// Returns the global mutation counter.
    ///
    /// Strictly increasing across all writes to the store. Callers that scan
    /// and then write can compare the counter before and after to detect
    /// concurrent mutation (the engine's only concurrency signal).
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.inner.read().mutations
    }

    /// Number of live (non-tombstoned) keys, index entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().live.len()
    }

    /// True when no live keys exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().live.is_empty()
    }

    /// Lazily scans live records in `[start, end)`, ascending key order.
    ///
    /// `None` bounds are unbounded. The composite-key namespace is skipped;
    /// use [`scan_prefix`](Self::scan_prefix) with a composite prefix to scan
    /// index entries. An inverted range (`start > end`) yields the empty
    /// sequence.
    #[must_use]
    pub fn scan(&self, start: Option<&str>, end: Option<&str>) -> RangeScan {
        RangeScan::over_range(self.clone(), start, end)
    }

    /// Lazily scans live records whose key starts with `prefix`.
    ///
    /// A prefix inside the composite-key namespace (as built by
    /// [`keys::composite_key_prefix`]) scans index entries.
    #[must_use]
    pub fn scan_prefix(&self, prefix: &str) -> RangeScan {
        RangeScan::over_prefix(self.clone(), prefix)
    }

    /// Lazily evaluates `selector` against every live record.
    #[must_use]
    pub fn query(&self, selector: Selector) -> QueryScan {
        QueryScan::new(self.clone(), selector)
    }

    /// Finds the first live record inside the given bounds.
    ///
    /// This is the single primitive every scan is built from: each iterator
    /// step re-acquires the read lock, finds one record, and releases the
    /// lock. Scans therefore observe live state at step time, not a frozen
    /// snapshot.
    pub(crate) fn next_live(
        &self,
        start: Bound<&str>,
        end: Bound<&str>,
        prefix: Option<&str>,
        skip_composite: bool,
    ) -> Option<Record> {
        // BTreeMap::range panics on inverted bounds; treat them as empty.
        if let (
            Bound::Included(s) | Bound::Excluded(s),
            Bound::Included(e) | Bound::Excluded(e),
        ) = (start, end)
        {
            if s > e {
                return None;
            }
            if s == e
                && (matches!(start, Bound::Excluded(_)) || matches!(end, Bound::Excluded(_)))
            {
                return None;
            }
        }

        let inner = self.inner.read();
        for (key, stored) in inner.live.range::<str, _>((start, end)) {
            if skip_composite && keys::is_composite_key(key) {
                continue;
            }
            if let Some(prefix) = prefix {
                // Keys are sorted, so the first non-matching key ends the block.
                if !key.starts_with(prefix) {
                    return None;
                }
            }
            return Some(Record::new(key.clone(), stored.value.clone(), stored.version));
        }
        None
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("VersionStore")
            .field("live_keys", &inner.live.len())
            .field("mutations", &inner.mutations)
            .finish()
    }
}
