//! Shared test utilities for ledger testing.
//!
//! Common helpers for building seeded ledgers, generating deterministic test
//! data, and asserting on [`LedgerResult`] values. Feature-gated behind
//! `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! chainstate = { path = ".", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use chainstate::testutil::{make_key, populated_store, sample_assets};
//! ```

use bytes::Bytes;

use crate::{
    ledger::{Asset, Ledger},
    store::VersionStore,
};

/// Create a deterministic test key from a prefix and index.
///
/// Produces keys like `"prefix:000042"` (zero-padded to 6 digits). The
/// zero-padding keeps lexicographic ordering aligned with numeric ordering,
/// which range scan tests rely on.
#[must_use]
pub fn make_key(prefix: &str, idx: usize) -> String {
    format!("{prefix}:{idx:06}")
}

/// Create a test value tagged with an index.
///
/// Produces values like `"val042"`. Useful when a test needs to tell apart
/// which put produced which value.
#[must_use]
pub fn make_value(idx: usize) -> Bytes {
    Bytes::from(format!("val{idx:03}"))
}

/// Create a [`VersionStore`] pre-populated with `count` keys.
///
/// Keys are formatted as `"{prefix}:{idx:06}"` with values from
/// [`make_value`]. The store is ready for immediate use in tests.
///
/// # Panics
///
/// Panics if any put fails, which only happens when a generated key or value
/// exceeds the default size limits.
#[must_use]
pub fn populated_store(prefix: &str, count: usize) -> VersionStore {
    let store = VersionStore::new();
    for i in 0..count {
        store.put(&make_key(prefix, i), make_value(i)).expect("populate put failed");
    }
    store
}

/// The canonical three-marble fixture: two blue marbles owned by different
/// owners and one red marble.
#[must_use]
pub fn sample_assets() -> Vec<Asset> {
    vec![
        Asset::new("marble1", "blue", 35, "tom"),
        Asset::new("marble2", "red", 50, "tom"),
        Asset::new("marble3", "blue", 70, "jerry"),
    ]
}

/// Create a [`Ledger`] pre-populated with [`sample_assets`].
///
/// # Panics
///
/// Panics if any create fails, which the fixed fixture never does.
#[must_use]
pub fn seeded_ledger() -> Ledger {
    let ledger = Ledger::new();
    for asset in sample_assets() {
        ledger.create_asset(&asset).expect("seed create failed");
    }
    ledger
}

/// Assert that a [`LedgerResult`] is a [`LedgerError::NotFound`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use chainstate::assert_not_found;
/// use chainstate::error::{LedgerError, LedgerResult};
///
/// let result: LedgerResult<()> = Err(LedgerError::not_found("missing"));
/// assert_not_found!(result);
/// ```
///
/// [`LedgerResult`]: crate::error::LedgerResult
/// [`LedgerError::NotFound`]: crate::error::LedgerError::NotFound
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr) => {
        match $result {
            result => assert!(
                matches!(result, Err($crate::error::LedgerError::NotFound { .. })),
                "expected LedgerError::NotFound, got: {:?}",
                result,
            ),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            result => assert!(
                matches!(result, Err($crate::error::LedgerError::NotFound { .. })),
                "{}: expected LedgerError::NotFound, got: {:?}",
                $msg,
                result,
            ),
        }
    };
}

/// Assert that a [`LedgerResult`] is a [`LedgerError::AlreadyExists`].
///
/// [`LedgerResult`]: crate::error::LedgerResult
/// [`LedgerError::AlreadyExists`]: crate::error::LedgerError::AlreadyExists
#[macro_export]
macro_rules! assert_already_exists {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::LedgerError::AlreadyExists { .. })),
            "expected LedgerError::AlreadyExists, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::LedgerError::AlreadyExists { .. })),
            "{}: expected LedgerError::AlreadyExists, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`LedgerResult`] is a [`LedgerError::InvalidArgument`].
///
/// [`LedgerResult`]: crate::error::LedgerResult
/// [`LedgerError::InvalidArgument`]: crate::error::LedgerError::InvalidArgument
#[macro_export]
macro_rules! assert_invalid_argument {
    ($result:expr) => {
        match $result {
            result => assert!(
                matches!(result, Err($crate::error::LedgerError::InvalidArgument { .. })),
                "expected LedgerError::InvalidArgument, got: {:?}",
                result,
            ),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            result => assert!(
                matches!(result, Err($crate::error::LedgerError::InvalidArgument { .. })),
                "{}: expected LedgerError::InvalidArgument, got: {:?}",
                $msg,
                result,
            ),
        }
    };
}

/// Assert that a [`LedgerResult`] is `Ok`, returning the inner value.
///
/// [`LedgerResult`]: crate::error::LedgerResult
#[macro_export]
macro_rules! assert_ledger_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got LedgerError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got LedgerError: {e:?}", $msg),
        }
    };
}
