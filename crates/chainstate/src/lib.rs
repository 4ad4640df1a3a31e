//! Embeddable versioned key-value ledger engine.
//!
//! This crate provides a single-process, in-memory ledger: every key carries
//! a monotonically increasing version and a full mutation history, deletes
//! are tombstones that keep the history alive, and reads over the live key
//! space come back as lazy, ascending-order scans. On top of the store sit a
//! composite-key codec, maintained secondary indexes, a JSON selector query
//! engine, and an asset lifecycle facade with a string-command dispatch
//! surface for hosts that drive the engine with `(name, args)` invocations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Host Application                       │
//! │              (direct API or string dispatch)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       Ledger facade                         │
//! │   create / read / update / delete / transfer / history      │
//! ├──────────────────┬──────────────────┬───────────────────────┤
//! │  IndexMaintainer │   QueryScan      │      RangeScan        │
//! │  (color~name)    │ (JSON selectors) │ (ranges, prefixes,    │
//! │                  │                  │  bookmark pagination) │
//! ├──────────────────┴──────────────────┴───────────────────────┤
//! │                       VersionStore                          │
//! │     live BTreeMap + per-key history + version counters      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use chainstate::{Asset, Ledger};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = Ledger::new();
//!
//!     // Create an asset and read it back.
//!     ledger.create_asset(&Asset::new("marble1", "blue", 35, "tom"))?;
//!     let asset = ledger.read_asset("marble1")?;
//!     assert_eq!(asset.owner, "tom");
//!
//!     // Transfer every blue asset through the color~name index.
//!     let moved = ledger.transfer_by_color("blue", "jerry")?;
//!     assert_eq!(moved, 1);
//!
//!     // History survives deletion.
//!     ledger.delete_asset("marble1")?;
//!     assert_eq!(ledger.history_of("marble1")?.len(), 3);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency Model
//!
//! The store is shared behind a read-write lock; clones of [`Ledger`] and
//! [`VersionStore`] share state. Scans are snapshot-unstable: each iterator
//! step reads the live map as it is at that moment, so writes interleaved
//! with a scan are observed. [`VersionStore::mutation_count`] is the global
//! counter callers can compare around a scan to detect interleaving.
//!
//! # Error Handling
//!
//! All fallible operations return [`LedgerResult<T>`] wrapping
//! [`LedgerError`]. Absence is always an explicit [`LedgerError::NotFound`],
//! never a silent no-op.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with shared test helpers (fixtures, key/value
//!   generators, assertion macros). Enable this in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod keys;
pub mod ledger;
pub mod query;
pub mod scan;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use config::{ConfigError, SizeLimits, DEFAULT_MAX_KEY_SIZE, DEFAULT_MAX_VALUE_SIZE};
pub use dispatch::{Operation, Response};
pub use error::{BoxError, LedgerError, LedgerResult};
pub use index::{
    IndexDefinition, IndexMaintainer, IndexPlan, IndexRegistry, DOC_TYPE_FIELD, INDEX_SENTINEL,
};
pub use keys::{
    composite_key_prefix, decode_composite_key, encode_composite_key, is_composite_key,
    validate_simple_key, COMPOSITE_SEPARATOR, COMPOSITE_TERMINATOR,
};
pub use ledger::{Asset, Ledger, ASSET_DOC_TYPE, COLOR_NAME_INDEX};
pub use query::{Comparison, QueryScan, Selector};
pub use scan::RangeScan;
pub use store::VersionStore;
pub use types::{Bookmark, HistoryEntry, Page, Record, ResponseMetadata};
