//! Lazy range scans and bookmark pagination.
//!
//! [`RangeScan`] is a pull-based iterator over the live key space: every
//! [`next`](Iterator::next) re-acquires the store's read lock, fetches the
//! first live record past the internal cursor, and releases the lock. That
//! makes scans snapshot-unstable by design — they reflect live state at step
//! time, and concurrent mutations during iteration may or may not be
//! observed. Callers that scan and then write should compare
//! [`VersionStore::mutation_count`] before and after to detect interleaving.
//!
//! A scan is finite and not restartable: once exhausted it stays exhausted,
//! and re-scanning means issuing a new call. Dropping a scan early is always
//! safe; the only state it holds is its cursor.
//!
//! # Pagination
//!
//! [`RangeScan::page`] drains at most `page_size` records and returns them
//! with a [`Bookmark`] resuming after the last one. `page_size <= 0` means
//! unbounded. Chaining bookmarks over a static dataset reproduces the
//! unbounded scan exactly.

use std::ops::Bound;

use crate::{
    keys,
    store::VersionStore,
    types::{Bookmark, Page, Record, ResponseMetadata},
};

/// Lazy iterator over live records in ascending key order.
///
/// Created by [`VersionStore::scan`] or [`VersionStore::scan_prefix`].
pub struct RangeScan {
    store: VersionStore,
    /// Inclusive start bound; `None` is unbounded. Only consulted before the
    /// first record is yielded — after that the cursor takes over.
    start: Option<String>,
    /// Exclusive end bound; `None` is unbounded.
    end: Option<String>,
    /// When set, iteration ends at the first key not sharing this prefix.
    prefix: Option<String>,
    /// Last yielded key; the next step resumes at its exact successor.
    cursor: Option<String>,
    /// Plain scans skip the composite-key namespace.
    skip_composite: bool,
    done: bool,
}

impl RangeScan {
    pub(crate) fn over_range(
        store: VersionStore,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Self {
        Self {
            store,
            start: start.map(str::to_owned),
            end: end.map(str::to_owned),
            prefix: None,
            cursor: None,
            skip_composite: true,
            done: false,
        }
    }

    pub(crate) fn over_prefix(store: VersionStore, prefix: &str) -> Self {
        Self {
            store,
            start: Some(prefix.to_owned()),
            end: None,
            prefix: Some(prefix.to_owned()),
            cursor: None,
            // Index scans are the one place composite keys are visible.
            skip_composite: !keys::is_composite_key(prefix),
            done: false,
        }
    }

    /// Positions the scan to resume after `key` (bookmark resumption).
    ///
    /// Pair with [`Bookmark::resume_after`] to chain pages of a range or
    /// prefix scan. A resume key below the scan's start bound is clamped to
    /// the start, so a foreign bookmark can never widen the range.
    #[must_use]
    pub fn resuming_after(mut self, key: String) -> Self {
        self.cursor = Some(key);
        self
    }

    /// Drains up to `page_size` records into a [`Page`].
    ///
    /// `page_size <= 0` drains the entire scan. The returned bookmark resumes
    /// after the page's last record; it is empty when the page is empty.
    #[must_use]
    pub fn page(self, page_size: i32) -> Page {
        collect_page(self, page_size)
    }
}

impl Iterator for RangeScan {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done {
            return None;
        }
        let start = match (&self.cursor, &self.start) {
            // A cursor below the start bound must not widen the range.
            (Some(cursor), Some(start)) if cursor.as_str() < start.as_str() => {
                Bound::Included(start.as_str())
            },
            (Some(cursor), _) => Bound::Excluded(cursor.as_str()),
            (None, Some(start)) => Bound::Included(start.as_str()),
            (None, None) => Bound::Unbounded,
        };
        let end = match &self.end {
            Some(end) => Bound::Excluded(end.as_str()),
            None => Bound::Unbounded,
        };
        match self.store.next_live(start, end, self.prefix.as_deref(), self.skip_composite) {
            Some(record) => {
                self.cursor = Some(record.key.clone());
                Some(record)
            },
            None => {
                self.done = true;
                None
            },
        }
    }
}

/// Drains up to `page_size` records from any record iterator into a [`Page`].
pub(crate) fn collect_page<I>(iter: I, page_size: i32) -> Page
where
    I: Iterator<Item = Record>,
{
    let results: Vec<Record> = if page_size <= 0 {
        iter.collect()
    } else {
        iter.take(page_size as usize).collect()
    };
    let bookmark = match results.last() {
        Some(last) => Bookmark::after_key(&last.key),
        None => Bookmark::empty(),
    };
    let records_count = results.len() as u32;
    Page { results, metadata: ResponseMetadata { records_count, bookmark } }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn seeded() -> VersionStore {
        let store = VersionStore::new();
        for key in ["a", "b", "c", "d", "e"] {
            store.put(key, Bytes::from(format!("v{key}"))).unwrap();
        }
        store
    }

    #[test]
    fn scan_yields_ascending_half_open_range() {
        let store = seeded();
        let keys: Vec<String> =
            store.scan(Some("b"), Some("e")).map(|r| r.key).collect();
        assert_eq!(keys, vec!["b", "c", "d"]);
    }

    #[test]
    fn unbounded_scan_covers_everything() {
        let store = seeded();
        assert_eq!(store.scan(None, None).count(), 5);
    }

    #[test]
    fn inverted_range_is_empty_not_panic() {
        let store = seeded();
        assert_eq!(store.scan(Some("z"), Some("a")).count(), 0);
        assert_eq!(store.scan(Some("c"), Some("c")).count(), 0);
    }

    #[test]
    fn scan_excludes_tombstones() {
        let store = seeded();
        store.delete("c").unwrap();
        let keys: Vec<String> = store.scan(None, None).map(|r| r.key).collect();
        assert_eq!(keys, vec!["a", "b", "d", "e"]);
    }

    #[test]
    fn prefix_scan_stops_at_block_end() {
        let store = VersionStore::new();
        for key in ["app:a", "app:b", "apq:c", "zzz"] {
            store.put(key, &b"v"[..]).unwrap();
        }
        let keys: Vec<String> = store.scan_prefix("app:").map(|r| r.key).collect();
        assert_eq!(keys, vec!["app:a", "app:b"]);
    }

    #[test]
    fn exhausted_scan_stays_exhausted() {
        let store = seeded();
        let mut scan = store.scan(Some("a"), Some("b"));
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        // Insert a key inside the range after exhaustion; the scan is done.
        store.put("aa", &b"late"[..]).unwrap();
        assert!(scan.next().is_none());
    }

    #[test]
    fn scan_observes_insertions_past_the_cursor() {
        // Snapshot-unstable by contract: a key inserted after the cursor but
        // before the end bound is picked up by a later step.
        let store = seeded();
        let mut scan = store.scan(Some("a"), Some("e"));
        assert_eq!(scan.next().unwrap().key, "a");
        store.put("aa", &b"mid-scan"[..]).unwrap();
        assert_eq!(scan.next().unwrap().key, "aa");
    }

    #[test]
    fn resume_below_the_start_bound_clamps_to_start() {
        let store = seeded();
        let keys: Vec<String> = store
            .scan(Some("c"), None)
            .resuming_after("a".to_owned())
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["c", "d", "e"], "foreign cursor must not widen the range");
    }

    #[test]
    fn resume_at_the_start_bound_excludes_it() {
        let store = seeded();
        let keys: Vec<String> = store
            .scan(Some("c"), None)
            .resuming_after("c".to_owned())
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["d", "e"]);
    }

    #[test]
    fn page_bookmark_resumes_at_successor() {
        let store = seeded();
        let page = store.scan(None, None).page(2);
        assert_eq!(page.metadata.records_count, 2);
        let resume = page.metadata.bookmark.resume_after().unwrap().unwrap();
        assert_eq!(resume, "b");
    }

    #[test]
    fn nonpositive_page_size_is_unbounded() {
        let store = seeded();
        assert_eq!(store.scan(None, None).page(0).results.len(), 5);
        assert_eq!(store.scan(None, None).page(-1).results.len(), 5);
    }

    #[test]
    fn empty_page_has_empty_bookmark() {
        let store = VersionStore::new();
        let page = store.scan(None, None).page(10);
        assert!(page.results.is_empty());
        assert!(page.metadata.bookmark.is_empty());
    }
}
