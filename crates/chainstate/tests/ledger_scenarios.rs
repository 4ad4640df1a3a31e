//! End-to-end asset lifecycle scenarios.
//!
//! Walks the ledger through realistic sequences: create, read, transfer,
//! transfer-by-color through the index, delete with retained history, and
//! recreation after deletion.

#![allow(clippy::expect_used, clippy::panic)]

use chainstate::{
    assert_already_exists, assert_invalid_argument, assert_not_found,
    testutil::seeded_ledger,
    Asset, Ledger,
};
use serde_json::json;

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn full_lifecycle_of_one_asset() {
    let ledger = Ledger::new();

    let record = ledger
        .create_asset(&Asset::new("marble1", "blue", 35, "tom"))
        .expect("create");
    assert_eq!(record.version, 1);

    ledger.transfer_asset("marble1", "jerry").expect("transfer");
    assert_eq!(ledger.read_asset("marble1").expect("read").owner, "jerry");

    ledger.delete_asset("marble1").expect("delete");
    assert_not_found!(ledger.read_asset("marble1"));

    let history = ledger.history_of("marble1").expect("history");
    assert_eq!(history.len(), 3, "create, transfer, tombstone");
    assert!(history[2].is_delete);
}

#[test]
fn create_is_rejected_while_the_name_is_live() {
    let ledger = seeded_ledger();
    assert_already_exists!(ledger.create_asset(&Asset::new("marble1", "green", 1, "sam")));
}

#[test]
fn recreation_after_delete_continues_the_version_chain() {
    let ledger = seeded_ledger();
    ledger.delete_asset("marble2").expect("delete");

    let record = ledger
        .create_asset(&Asset::new("marble2", "green", 5, "sam"))
        .expect("recreate");
    assert_eq!(record.version, 2);
    assert_eq!(ledger.history_of("marble2").expect("history").len(), 3);
}

#[test]
fn empty_fields_are_rejected_before_any_write() {
    let ledger = Ledger::new();
    let before = ledger.mutation_count();

    assert_invalid_argument!(ledger.create_asset(&Asset::new("m", "", 1, "tom")));
    assert_invalid_argument!(ledger.create_asset(&Asset::new("m", "blue", 1, "")));
    assert_invalid_argument!(ledger.transfer_asset("marble1", ""));

    assert_eq!(ledger.mutation_count(), before);
}

// ============================================================================
// Transfer by color
// ============================================================================

#[test]
fn transfer_by_color_moves_only_matching_assets() {
    let ledger = seeded_ledger();
    assert_eq!(ledger.transfer_by_color("blue", "sam").expect("transfer"), 2);

    assert_eq!(ledger.read_asset("marble1").expect("read").owner, "sam");
    assert_eq!(ledger.read_asset("marble3").expect("read").owner, "sam");
    assert_eq!(ledger.read_asset("marble2").expect("read").owner, "tom", "red untouched");
}

#[test]
fn transfer_by_color_of_unknown_color_is_zero() {
    let ledger = seeded_ledger();
    assert_eq!(ledger.transfer_by_color("mauve", "sam").expect("transfer"), 0);
}

#[test]
fn transfer_by_color_sees_recolored_assets() {
    let ledger = seeded_ledger();

    let mut asset = ledger.read_asset("marble2").expect("read");
    asset.color = "blue".to_owned();
    ledger.update_asset(&asset).expect("recolor");

    assert_eq!(ledger.transfer_by_color("blue", "sam").expect("transfer"), 3);
    assert_eq!(ledger.transfer_by_color("red", "sam").expect("transfer"), 0, "stale entry gone");
}

#[test]
fn deleted_assets_leave_the_color_index() {
    let ledger = seeded_ledger();
    ledger.delete_asset("marble3").expect("delete");
    assert_eq!(ledger.transfer_by_color("blue", "sam").expect("transfer"), 1);
}

#[test]
fn transfer_by_color_rejects_empty_arguments() {
    let ledger = seeded_ledger();
    assert_invalid_argument!(ledger.transfer_by_color("", "sam"));
    assert_invalid_argument!(ledger.transfer_by_color("blue", ""));
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn foreign_fields_round_trip_through_transfers() {
    let ledger = Ledger::new();
    let mut asset = Asset::new("marble1", "blue", 35, "tom");
    asset.extra.insert("origin".to_owned(), json!({"mine": "kimberley"}));
    ledger.create_asset(&asset).expect("create");

    ledger.transfer_by_color("blue", "jerry").expect("transfer");

    let read = ledger.read_asset("marble1").expect("read");
    assert_eq!(read.owner, "jerry");
    assert_eq!(read.extra.get("origin"), Some(&json!({"mine": "kimberley"})));
}

#[test]
fn read_of_non_asset_document_is_malformed_value() {
    let ledger = Ledger::new();
    ledger
        .store()
        .put("rogue", json!({"docType": "asset"}).to_string())
        .expect("put");

    let err = ledger.read_asset("rogue").expect_err("must fail");
    assert!(matches!(err, chainstate::LedgerError::MalformedValue { .. }));
}

// ============================================================================
// Ranges over assets
// ============================================================================

#[test]
fn range_query_returns_assets_not_index_entries() {
    let ledger = seeded_ledger();
    let keys: Vec<String> = ledger.range_query("", "").map(|r| r.key).collect();
    assert_eq!(keys, vec!["marble1", "marble2", "marble3"]);
}

#[test]
fn shared_state_across_clones() {
    let ledger = seeded_ledger();
    let clone = ledger.clone();
    clone.transfer_asset("marble1", "sam").expect("transfer");
    assert_eq!(ledger.read_asset("marble1").expect("read").owner, "sam");
}
