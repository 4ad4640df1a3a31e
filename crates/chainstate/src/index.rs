//! Secondary index maintenance.
//!
//! An index is a set of sentinel records in the composite-key namespace: for
//! every indexed document there is one entry whose key is
//! `encode(index_name, [field_values…])` and whose value is a single
//! reserved byte. Lookups are prefix scans over that namespace. A definition
//! should end with a uniquely-identifying field — the stock `color~name`
//! index ends with `name`, the record's own key, so every match decodes
//! straight back to its primary record.
//!
//! [`IndexMaintainer`] keeps entries in lockstep with their records: created
//! or refreshed on every put of a matching document, removed on delete using
//! the pre-delete field values, and — when an update changes an indexed
//! field — the stale entry is removed and the new one written in the same
//! logical mutation. An index entry is never independently stale.
//!
//! Maintenance is split into plan and apply. [`IndexMaintainer::plan_put`]
//! and [`IndexMaintainer::plan_delete`] compute and validate every entry key
//! without touching the store, so a caller can fail before its record write;
//! [`IndexMaintainer::apply`] then performs the planned removals and writes.

use bytes::Bytes;
use serde_json::Value;

use crate::{
    error::{LedgerError, LedgerResult},
    keys,
    store::VersionStore,
};

/// The document field discriminating record types.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Sentinel value of every index entry: a single reserved byte, no payload.
pub const INDEX_SENTINEL: &[u8] = &[0x00];

/// One index: a name plus the ordered document fields it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    name: String,
    doc_type: String,
    fields: Vec<String>,
}

impl IndexDefinition {
    /// Defines an index over `fields` of documents whose `docType` equals
    /// `doc_type`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidKeySegment`] if the name carries a
    /// reserved code point, or [`LedgerError::InvalidArgument`] for an empty
    /// field list or empty field name.
    pub fn new(
        name: impl Into<String>,
        doc_type: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> LedgerResult<Self> {
        let name = name.into();
        keys::validate_segment(&name)?;
        let doc_type = doc_type.into();
        if doc_type.is_empty() {
            return Err(LedgerError::invalid_argument("index doc_type must not be empty"));
        }
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(LedgerError::invalid_argument("index must cover at least one field"));
        }
        if fields.iter().any(String::is_empty) {
            return Err(LedgerError::invalid_argument("index field names must not be empty"));
        }
        Ok(Self { name, doc_type, fields })
    }

    /// The index name, used as the composite-key object type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `docType` this index applies to.
    #[must_use]
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// The ordered fields this index covers.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Computes the entry key for `doc`.
    ///
    /// Returns `Ok(None)` when the document is not covered: wrong `docType`,
    /// or a covered field that is missing, non-string, or empty. Such a
    /// document is simply un-indexed, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidKeySegment`] if a field value carries a
    /// reserved code point.
    pub fn entry_key(&self, doc: &Value) -> LedgerResult<Option<String>> {
        if doc.get(DOC_TYPE_FIELD).and_then(Value::as_str) != Some(self.doc_type.as_str()) {
            return Ok(None);
        }
        let mut attributes: Vec<&str> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            match doc.get(field).and_then(Value::as_str) {
                Some(value) if !value.is_empty() => attributes.push(value),
                _ => return Ok(None),
            }
        }
        keys::encode_composite_key(&self.name, &attributes).map(Some)
    }
}

/// The static set of index definitions an engine instance maintains.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    definitions: Vec<IndexDefinition>,
}

impl IndexRegistry {
    /// Builds a registry from the given definitions.
    #[must_use]
    pub fn new(definitions: impl IntoIterator<Item = IndexDefinition>) -> Self {
        Self { definitions: definitions.into_iter().collect() }
    }

    /// Looks a definition up by name.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&IndexDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Iterates over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.definitions.iter()
    }
}

/// The validated entry removals and writes one record mutation entails.
///
/// Produced by [`IndexMaintainer::plan_put`] / [`IndexMaintainer::plan_delete`]
/// and consumed by [`IndexMaintainer::apply`]. Every key in a plan has
/// already passed segment and size validation, so applying one cannot fail
/// on a malformed entry.
#[derive(Debug, Default)]
pub struct IndexPlan {
    removals: Vec<String>,
    writes: Vec<String>,
}

/// Applies index definitions against a store in lockstep with record
/// mutations.
#[derive(Debug, Clone)]
pub struct IndexMaintainer {
    store: VersionStore,
    registry: IndexRegistry,
}

impl IndexMaintainer {
    /// Creates a maintainer writing entries into `store`.
    #[must_use]
    pub fn new(store: VersionStore, registry: IndexRegistry) -> Self {
        Self { store, registry }
    }

    /// The registry this maintainer applies.
    #[must_use]
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Plans the entry maintenance for a put of `new_doc`.
    ///
    /// `old_doc` carries the pre-update document for in-place updates; when
    /// the update moved an indexed field, the stale entry is scheduled for
    /// removal before the new one is written. The store is not touched, so a
    /// caller can raise validation failures before committing its record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidKeySegment`] if an indexed field value
    /// carries a reserved code point, or
    /// [`LedgerError::SizeLimitExceeded`](crate::error::LedgerError::SizeLimitExceeded)
    /// if an entry key would exceed the store's limits.
    pub fn plan_put(&self, old_doc: Option<&Value>, new_doc: &Value) -> LedgerResult<IndexPlan> {
        let mut plan = IndexPlan::default();
        for definition in self.registry.iter() {
            let old_key = match old_doc {
                Some(doc) => definition.entry_key(doc)?,
                None => None,
            };
            let new_key = definition.entry_key(new_doc)?;

            if let Some(stale) = old_key {
                if Some(&stale) != new_key.as_ref() {
                    plan.removals.push(stale);
                }
            }
            if let Some(entry) = new_key {
                self.store.limits().validate(&entry, INDEX_SENTINEL)?;
                plan.writes.push(entry);
            }
        }
        Ok(plan)
    }

    /// Plans the entry removals derived from the pre-delete document.
    ///
    /// # Errors
    ///
    /// Same validation failures as [`plan_put`](Self::plan_put).
    pub fn plan_delete(&self, old_doc: &Value) -> LedgerResult<IndexPlan> {
        let mut plan = IndexPlan::default();
        for definition in self.registry.iter() {
            if let Some(entry) = definition.entry_key(old_doc)? {
                plan.removals.push(entry);
            }
        }
        Ok(plan)
    }

    /// Performs a plan's removals and writes.
    ///
    /// # Errors
    ///
    /// Propagates store failures. A stale entry that is already gone is
    /// tolerated, not an error.
    pub fn apply(&self, plan: IndexPlan) -> LedgerResult<()> {
        for stale in &plan.removals {
            self.remove_entry(stale)?;
        }
        for entry in &plan.writes {
            self.store.put(entry, Bytes::from_static(INDEX_SENTINEL))?;
        }
        Ok(())
    }

    /// Plans and applies a put in one call.
    ///
    /// # Errors
    ///
    /// The union of [`plan_put`](Self::plan_put) and [`apply`](Self::apply).
    pub fn apply_put(&self, old_doc: Option<&Value>, new_doc: &Value) -> LedgerResult<()> {
        self.apply(self.plan_put(old_doc, new_doc)?)
    }

    /// Plans and applies a delete in one call.
    ///
    /// # Errors
    ///
    /// The union of [`plan_delete`](Self::plan_delete) and [`apply`](Self::apply).
    pub fn apply_delete(&self, old_doc: &Value) -> LedgerResult<()> {
        self.apply(self.plan_delete(old_doc)?)
    }

    fn remove_entry(&self, entry: &str) -> LedgerResult<()> {
        match self.store.delete(entry) {
            Ok(()) => Ok(()),
            Err(LedgerError::NotFound { .. }) => {
                tracing::debug!(entry, "index entry already absent");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }
}
