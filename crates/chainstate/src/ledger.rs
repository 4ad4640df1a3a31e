//! The asset ledger facade.
//!
//! [`Ledger`] binds the version store, the index maintainer, and the query
//! engine into one embeddable surface with the asset lifecycle operations.
//! Assets are JSON documents with `docType = "asset"`; unknown fields are
//! carried through reads and rewrites untouched.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::SizeLimits,
    error::{LedgerError, LedgerResult},
    index::{IndexDefinition, IndexMaintainer, IndexRegistry},
    keys,
    query::Selector,
    scan::RangeScan,
    store::VersionStore,
    types::{Bookmark, HistoryEntry, Page, Record},
};

/// The `docType` discriminator carried by every asset document.
pub const ASSET_DOC_TYPE: &str = "asset";

/// Name of the stock color index.
pub const COLOR_NAME_INDEX: &str = "color~name";

/// An asset document.
///
/// Serialization is the storage format: field names are the wire names, and
/// fields this type does not model round-trip through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Always [`ASSET_DOC_TYPE`] for documents written by the ledger.
    #[serde(rename = "docType")]
    pub doc_type: String,
    /// The asset's name, also its record key.
    pub name: String,
    pub color: String,
    pub size: u32,
    pub owner: String,
    /// Fields not modeled above, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Asset {
    /// Builds an asset with the standard `docType` and no extra fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        size: u32,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: ASSET_DOC_TYPE.to_owned(),
            name: name.into(),
            color: color.into(),
            size,
            owner: owner.into(),
            extra: BTreeMap::new(),
        }
    }

    fn validate(&self) -> LedgerResult<()> {
        keys::validate_simple_key(&self.name)?;
        if self.color.is_empty() {
            return Err(LedgerError::invalid_argument("asset color must not be empty"));
        }
        if self.owner.is_empty() {
            return Err(LedgerError::invalid_argument("asset owner must not be empty"));
        }
        Ok(())
    }

    fn to_document(&self) -> LedgerResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| LedgerError::malformed_value_with_source(&self.name, e))
    }
}

fn decode_asset(record: &Record) -> LedgerResult<Asset> {
    serde_json::from_slice(&record.value)
        .map_err(|e| LedgerError::malformed_value_with_source(&record.key, e))
}

fn decode_document(record: &Record) -> LedgerResult<Value> {
    serde_json::from_slice(&record.value)
        .map_err(|e| LedgerError::malformed_value_with_source(&record.key, e))
}

/// The versioned asset ledger.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: VersionStore,
    indexes: IndexMaintainer,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates an empty ledger with default size limits and the stock
    /// `color~name` index.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(SizeLimits::default())
    }

    /// Creates an empty ledger with explicit size limits.
    #[must_use]
    pub fn with_limits(limits: SizeLimits) -> Self {
        let store = VersionStore::with_limits(limits);
        let registry = IndexRegistry::new(Self::stock_indexes());
        let indexes = IndexMaintainer::new(store.clone(), registry);
        Self { store, indexes }
    }

    fn stock_indexes() -> Vec<IndexDefinition> {
        // The definition is statically well-formed.
        IndexDefinition::new(COLOR_NAME_INDEX, ASSET_DOC_TYPE, ["color", "name"])
            .into_iter()
            .collect()
    }

    /// The underlying store, shared with this ledger.
    #[must_use]
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Global mutation counter; see [`VersionStore::mutation_count`].
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.store.mutation_count()
    }

    /// Creates `asset` under its name.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyExists`] if the name is live,
    /// [`LedgerError::InvalidKeySegment`] for a name carrying reserved code
    /// points, and [`LedgerError::InvalidArgument`] for empty fields.
    pub fn create_asset(&self, asset: &Asset) -> LedgerResult<Record> {
        asset.validate()?;
        if self.store.get(&asset.name).is_ok() {
            return Err(LedgerError::already_exists(&asset.name));
        }
        self.write_asset(asset, None)
    }

    /// Reads the asset named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an absent or deleted asset and
    /// [`LedgerError::MalformedValue`] when the stored bytes do not decode as
    /// an asset document.
    pub fn read_asset(&self, name: &str) -> LedgerResult<Asset> {
        let record = self.store.get(name)?;
        decode_asset(&record)
    }

    /// Overwrites the asset named by `asset.name`.
    ///
    /// Index entries tracking a changed field are refreshed in the same
    /// logical mutation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no live asset exists under that
    /// name, plus the validation errors of [`create_asset`](Self::create_asset).
    pub fn update_asset(&self, asset: &Asset) -> LedgerResult<Record> {
        asset.validate()?;
        let previous = self.store.get(&asset.name)?;
        let old_doc = decode_document(&previous)?;
        self.write_asset(asset, Some(&old_doc))
    }

    /// Deletes the asset named `name` and its index entries.
    ///
    /// History for the name is retained; only the live record goes away.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if the asset is absent.
    pub fn delete_asset(&self, name: &str) -> LedgerResult<()> {
        let record = self.store.get(name)?;
        // Pre-delete field values drive the index cleanup, planned before
        // the tombstone so a malformed document fails with no effects.
        let old_doc = decode_document(&record)?;
        let plan = self.indexes.plan_delete(&old_doc)?;
        self.store.delete(name)?;
        self.indexes.apply(plan)
    }

    /// Reassigns the asset named `name` to `new_owner`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an absent asset and
    /// [`LedgerError::InvalidArgument`] for an empty owner.
    pub fn transfer_asset(&self, name: &str, new_owner: &str) -> LedgerResult<Record> {
        if new_owner.is_empty() {
            return Err(LedgerError::invalid_argument("new owner must not be empty"));
        }
        let mut asset = self.read_asset(name)?;
        asset.owner = new_owner.to_owned();
        self.update_asset(&asset)
    }

    /// Reassigns every asset of `color` to `new_owner`, returning how many
    /// were transferred.
    ///
    /// Matching goes through the `color~name` index: a prefix scan over the
    /// color's entries, each decoding back to a record key. An entry whose
    /// record vanished mid-scan is skipped; zero matches is `Ok(0)`, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for empty arguments; aborts
    /// on the first transfer failure other than a vanished record.
    pub fn transfer_by_color(&self, color: &str, new_owner: &str) -> LedgerResult<u32> {
        if color.is_empty() {
            return Err(LedgerError::invalid_argument("color must not be empty"));
        }
        if new_owner.is_empty() {
            return Err(LedgerError::invalid_argument("new owner must not be empty"));
        }

        let prefix = keys::composite_key_prefix(COLOR_NAME_INDEX, &[color])?;
        let mut transferred = 0u32;
        for entry in self.store.scan_prefix(&prefix) {
            let (_, attributes) = keys::decode_composite_key(&entry.key)?;
            let name = attributes.last().ok_or_else(|| {
                LedgerError::malformed_key("index entry carries no record key")
            })?;
            match self.transfer_asset(name, new_owner) {
                Ok(_) => transferred += 1,
                Err(LedgerError::NotFound { .. }) => {
                    tracing::debug!(key = %name, "indexed record vanished mid-scan, skipping");
                },
                Err(e) => return Err(e),
            }
        }
        Ok(transferred)
    }

    /// Scans live records in `[start, end)`, ascending key order.
    ///
    /// Empty-string bounds are unbounded on that side. Index entries are
    /// never returned.
    #[must_use]
    pub fn range_query(&self, start: &str, end: &str) -> RangeScan {
        let start = (!start.is_empty()).then_some(start);
        let end = (!end.is_empty()).then_some(end);
        self.store.scan(start, end)
    }

    /// One page of [`range_query`](Self::range_query), resuming after
    /// `bookmark`.
    ///
    /// A non-positive `page_size` disables the size cap. The returned page's
    /// bookmark resumes the scan; an empty bookmark means the scan started
    /// from the beginning.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for an undecodable bookmark.
    pub fn range_query_paginated(
        &self,
        start: &str,
        end: &str,
        page_size: i32,
        bookmark: &Bookmark,
    ) -> LedgerResult<Page> {
        let mut scan = self.range_query(start, end);
        if let Some(resume) = bookmark.resume_after()? {
            scan = scan.resuming_after(resume);
        }
        Ok(scan.page(page_size))
    }

    /// Evaluates `selector` against every live JSON document.
    ///
    /// Records whose value is not JSON are skipped with a warning, never an
    /// error. Results come back in ascending key order, lazily.
    pub fn rich_query(&self, selector: Selector) -> impl Iterator<Item = Record> {
        self.store.query(selector)
    }

    /// One page of [`rich_query`](Self::rich_query), resuming after
    /// `bookmark`.
    ///
    /// The page size counts matching records only; skipped non-JSON values
    /// never consume the budget.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for an undecodable bookmark.
    pub fn rich_query_paginated(
        &self,
        selector: Selector,
        page_size: i32,
        bookmark: &Bookmark,
    ) -> LedgerResult<Page> {
        let mut scan = self.store.query(selector);
        if let Some(resume) = bookmark.resume_after()? {
            scan = scan.resuming_after(resume);
        }
        Ok(scan.page(page_size))
    }

    /// Full mutation history of the asset named `name`, oldest first.
    ///
    /// Tombstones appear as entries with no value. A name that never existed
    /// yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for an empty name.
    pub fn history_of(&self, name: &str) -> LedgerResult<Vec<HistoryEntry>> {
        if name.is_empty() {
            return Err(LedgerError::invalid_argument("asset name must not be empty"));
        }
        Ok(self.store.history(name))
    }

    fn write_asset(&self, asset: &Asset, old_doc: Option<&Value>) -> LedgerResult<Record> {
        let doc = asset.to_document()?;
        let bytes = serde_json::to_vec(&doc)
            .map_err(|e| LedgerError::malformed_value_with_source(&asset.name, e))?;
        // Entry keys are validated before the record is committed, so a
        // reserved code point in an indexed field fails the whole write with
        // no partial effects.
        let plan = self.indexes.plan_put(old_doc, &doc)?;
        let record = self.store.put(&asset.name, Bytes::from(bytes))?;
        self.indexes.apply(plan)?;
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seeded() -> Ledger {
        let ledger = Ledger::new();
        ledger.create_asset(&Asset::new("marble1", "blue", 35, "tom")).unwrap();
        ledger.create_asset(&Asset::new("marble2", "red", 50, "tom")).unwrap();
        ledger.create_asset(&Asset::new("marble3", "blue", 70, "jerry")).unwrap();
        ledger
    }

    #[test]
    fn create_then_read_round_trips() {
        let ledger = seeded();
        let asset = ledger.read_asset("marble1").unwrap();
        assert_eq!(asset, Asset::new("marble1", "blue", 35, "tom"));
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let ledger = seeded();
        let err = ledger.create_asset(&Asset::new("marble1", "green", 1, "sam")).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyExists { .. }));
        // The original is untouched.
        assert_eq!(ledger.read_asset("marble1").unwrap().color, "blue");
    }

    #[test]
    fn failed_create_with_reserved_indexed_field_has_no_effects() {
        let ledger = Ledger::new();
        let err = ledger.create_asset(&Asset::new("marble1", "a\u{0}b", 35, "tom")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidKeySegment { .. }));

        assert!(matches!(ledger.read_asset("marble1"), Err(LedgerError::NotFound { .. })));
        assert!(ledger.history_of("marble1").unwrap().is_empty());
        assert_eq!(ledger.mutation_count(), 0);
    }

    #[test]
    fn failed_update_with_reserved_indexed_field_keeps_index_in_lockstep() {
        let ledger = seeded();
        let mut asset = ledger.read_asset("marble1").unwrap();
        asset.color = "a\u{1}b".to_owned();
        let err = ledger.update_asset(&asset).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidKeySegment { .. }));

        // The record kept its old color and its old index entry; the blue
        // prefix scan still finds both blue marbles.
        assert_eq!(ledger.read_asset("marble1").unwrap().color, "blue");
        assert_eq!(ledger.transfer_by_color("blue", "sam").unwrap(), 2);
    }

    #[test]
    fn create_rejects_reserved_name() {
        let ledger = Ledger::new();
        let err = ledger.create_asset(&Asset::new("m\u{0}1", "blue", 1, "tom")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidKeySegment { .. }));
    }

    #[test]
    fn unknown_fields_survive_rewrite() {
        let ledger = Ledger::new();
        let mut asset = Asset::new("marble9", "blue", 1, "tom");
        asset.extra.insert("grade".to_owned(), json!("A"));
        ledger.create_asset(&asset).unwrap();

        ledger.transfer_asset("marble9", "jerry").unwrap();
        let read = ledger.read_asset("marble9").unwrap();
        assert_eq!(read.owner, "jerry");
        assert_eq!(read.extra.get("grade"), Some(&json!("A")));
    }

    #[test]
    fn transfer_bumps_version() {
        let ledger = seeded();
        let record = ledger.transfer_asset("marble1", "jerry").unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(ledger.read_asset("marble1").unwrap().owner, "jerry");
    }

    #[test]
    fn transfer_by_color_hits_every_match() {
        let ledger = seeded();
        let moved = ledger.transfer_by_color("blue", "sam").unwrap();
        assert_eq!(moved, 2);
        assert_eq!(ledger.read_asset("marble1").unwrap().owner, "sam");
        assert_eq!(ledger.read_asset("marble3").unwrap().owner, "sam");
        assert_eq!(ledger.read_asset("marble2").unwrap().owner, "tom");
    }

    #[test]
    fn transfer_by_color_with_no_matches_is_zero() {
        let ledger = seeded();
        assert_eq!(ledger.transfer_by_color("chartreuse", "sam").unwrap(), 0);
    }

    #[test]
    fn delete_removes_live_record_and_keeps_history() {
        let ledger = seeded();
        ledger.delete_asset("marble1").unwrap();

        assert!(matches!(ledger.read_asset("marble1"), Err(LedgerError::NotFound { .. })));
        let history = ledger.history_of("marble1").unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].is_delete);

        // Index entry went with it.
        assert_eq!(ledger.transfer_by_color("blue", "sam").unwrap(), 1);
    }

    #[test]
    fn recreated_asset_continues_versioning() {
        let ledger = seeded();
        ledger.delete_asset("marble1").unwrap();
        let record = ledger.create_asset(&Asset::new("marble1", "pink", 9, "sam")).unwrap();
        assert_eq!(record.version, 2);
    }

    #[test]
    fn range_query_excludes_index_entries() {
        let ledger = seeded();
        let keys: Vec<String> = ledger.range_query("", "").map(|r| r.key).collect();
        assert_eq!(keys, vec!["marble1", "marble2", "marble3"]);
    }

    #[test]
    fn range_query_honors_half_open_bounds() {
        let ledger = seeded();
        let keys: Vec<String> =
            ledger.range_query("marble1", "marble3").map(|r| r.key).collect();
        assert_eq!(keys, vec!["marble1", "marble2"]);
    }

    #[test]
    fn rich_query_filters_by_selector() {
        let ledger = seeded();
        let selector = Selector::and([
            Selector::eq("docType", ASSET_DOC_TYPE),
            Selector::eq("owner", "tom"),
        ]);
        let keys: Vec<String> = ledger.rich_query(selector).map(|r| r.key).collect();
        assert_eq!(keys, vec!["marble1", "marble2"]);
    }

    #[test]
    fn history_of_empty_name_is_invalid() {
        let ledger = Ledger::new();
        assert!(matches!(ledger.history_of(""), Err(LedgerError::InvalidArgument { .. })));
    }

    #[test]
    fn update_of_absent_asset_is_not_found() {
        let ledger = Ledger::new();
        let err = ledger.update_asset(&Asset::new("ghost", "blue", 1, "tom")).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
