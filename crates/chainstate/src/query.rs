//! Rich queries: structural selectors over stored JSON documents.
//!
//! A [`Selector`] is a data-described predicate — equality and ordered
//! comparisons on named fields, plus conjunction — that the engine evaluates
//! against every live record's JSON document. Evaluation is a full scan of
//! the live key space (the composite-key namespace excluded); no index
//! planning happens here.
//!
//! Selectors are serde-enabled so they can travel as JSON arguments through
//! [`Operation::parse`](crate::dispatch::Operation::parse):
//!
//! ```
//! use chainstate::query::Selector;
//!
//! let selector: Selector = serde_json::from_str(
//!     r#"{"and": [
//!         {"compare": {"field": "color", "op": "eq", "value": "blue"}},
//!         {"compare": {"field": "size", "op": "gte", "value": 30}}
//!     ]}"#,
//! ).unwrap();
//! ```
//!
//! Results come back in ascending key order, which makes paginated queries
//! stable on a fixed snapshot: no record is duplicated or skipped across
//! bookmark-chained pages absent concurrent mutation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    scan::{collect_page, RangeScan},
    store::VersionStore,
    types::{Page, Record},
};

/// Comparison operator applied to a document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Field equals the value.
    Eq,
    /// Field is comparable to and differs from the value.
    Ne,
    /// Field is strictly greater than the value.
    Gt,
    /// Field is greater than or equal to the value.
    Gte,
    /// Field is strictly less than the value.
    Lt,
    /// Field is less than or equal to the value.
    Lte,
}

/// Structural predicate over a record's JSON document.
///
/// Comparison semantics: numbers compare numerically, strings
/// lexicographically, booleans by `false < true`, null equals null. Arrays
/// and objects support equality only. A comparison between values of
/// different types never matches, and neither does a missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Matches every document.
    All,
    /// Compares one named field against a literal value.
    Compare {
        /// The document field to inspect.
        field: String,
        /// The comparison operator.
        op: Comparison,
        /// The literal to compare against.
        value: Value,
    },
    /// Matches when every inner selector matches.
    And(Vec<Selector>),
}

impl Selector {
    /// Equality on a named field.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    /// Ordered comparison on a named field.
    #[must_use]
    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare { field: field.into(), op, value: value.into() }
    }

    /// Conjunction of selectors. An empty conjunction matches everything.
    #[must_use]
    pub fn and(selectors: impl IntoIterator<Item = Selector>) -> Self {
        Self::And(selectors.into_iter().collect())
    }

    /// Evaluates this selector against a document.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::All => true,
            Self::And(selectors) => selectors.iter().all(|s| s.matches(doc)),
            Self::Compare { field, op, value } => {
                let Some(actual) = doc.get(field) else {
                    return false;
                };
                let Some(ordering) = compare_values(actual, value) else {
                    return false;
                };
                match op {
                    Comparison::Eq => ordering == Ordering::Equal,
                    Comparison::Ne => ordering != Ordering::Equal,
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Gte => ordering != Ordering::Less,
                    Comparison::Lt => ordering == Ordering::Less,
                    Comparison::Lte => ordering != Ordering::Greater,
                }
            },
        }
    }
}

/// Orders two JSON values of the same kind; `None` when incomparable.
fn compare_values(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        // Arrays and objects: equality only.
        (a, b) if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

/// Lazy iterator over live records matching a [`Selector`].
///
/// Created by [`VersionStore::query`]. Records whose value is not valid JSON
/// are skipped with a warning naming the key — a rich query never fails on a
/// foreign document.
pub struct QueryScan {
    scan: RangeScan,
    selector: Selector,
}

impl QueryScan {
    pub(crate) fn new(store: VersionStore, selector: Selector) -> Self {
        Self { scan: RangeScan::over_range(store, None, None), selector }
    }

    /// Positions the query to resume after `key` (bookmark resumption).
    #[must_use]
    pub fn resuming_after(mut self, key: String) -> Self {
        self.scan = self.scan.resuming_after(key);
        self
    }

    /// Drains up to `page_size` matches into a [`Page`].
    ///
    /// Same contract as [`RangeScan::page`]: `page_size <= 0` is unbounded,
    /// and the bookmark resumes after the last match.
    #[must_use]
    pub fn page(self, page_size: i32) -> Page {
        collect_page(self, page_size)
    }
}

impl Iterator for QueryScan {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let record = self.scan.next()?;
            match serde_json::from_slice::<Value>(&record.value) {
                Ok(doc) if self.selector.matches(&doc) => return Some(record),
                Ok(_) => {},
                Err(e) => {
                    tracing::warn!(key = %record.key, "skipping undecodable document: {e}");
                },
            }
        }
    }
}
