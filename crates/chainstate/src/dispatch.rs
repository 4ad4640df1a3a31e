//! String-command dispatch.
//!
//! Hosts that drive the ledger with `(name, args)` string invocations go
//! through [`Operation::parse`] and [`Ledger::execute`]. Parsing is strict:
//! unknown names, wrong arity, empty required arguments, and non-numeric
//! numbers all fail before any state is touched.

use crate::{
    error::{LedgerError, LedgerResult},
    ledger::{Asset, Ledger},
    query::Selector,
    types::{Bookmark, HistoryEntry, Page, Record},
};

/// A parsed ledger invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateAsset(Asset),
    ReadAsset { name: String },
    DeleteAsset { name: String },
    TransferAsset { name: String, new_owner: String },
    TransferAssetsByColor { color: String, new_owner: String },
    RangeQuery { start: String, end: String },
    RangeQueryPaginated { start: String, end: String, page_size: i32, bookmark: Bookmark },
    RichQuery { selector: Selector },
    RichQueryPaginated { selector: Selector, page_size: i32, bookmark: Bookmark },
    AssetHistory { name: String },
}

/// What an executed [`Operation`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Empty,
    Asset(Asset),
    Count(u32),
    Records(Vec<Record>),
    Page(Page),
    History(Vec<HistoryEntry>),
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> LedgerResult<&'a str> {
    let value = args
        .get(index)
        .ok_or_else(|| LedgerError::invalid_argument(format!("missing argument: {what}")))?;
    if value.is_empty() {
        return Err(LedgerError::invalid_argument(format!("{what} must not be empty")));
    }
    Ok(value)
}

/// Like [`arg`] but empty is allowed (unbounded range ends, empty bookmarks).
fn raw_arg<'a>(args: &'a [String], index: usize, what: &str) -> LedgerResult<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| LedgerError::invalid_argument(format!("missing argument: {what}")))
}

fn expect_arity(name: &str, args: &[String], expected: usize) -> LedgerResult<()> {
    if args.len() != expected {
        return Err(LedgerError::invalid_argument(format!(
            "{name} takes {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn parse_u32(value: &str, what: &str) -> LedgerResult<u32> {
    value
        .parse()
        .map_err(|_| LedgerError::invalid_argument(format!("{what} must be a number: {value:?}")))
}

fn parse_i32(value: &str, what: &str) -> LedgerResult<i32> {
    value
        .parse()
        .map_err(|_| LedgerError::invalid_argument(format!("{what} must be a number: {value:?}")))
}

fn parse_selector(value: &str) -> LedgerResult<Selector> {
    serde_json::from_str(value)
        .map_err(|e| LedgerError::invalid_argument(format!("undecodable selector: {e}")))
}

impl Operation {
    /// Parses a `(name, args)` invocation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidArgument`] for an unknown operation
    /// name, wrong arity, empty required arguments, non-numeric sizes, or an
    /// undecodable selector.
    pub fn parse(name: &str, args: &[String]) -> LedgerResult<Self> {
        match name {
            "createAsset" => {
                expect_arity(name, args, 4)?;
                Ok(Self::CreateAsset(Asset::new(
                    arg(args, 0, "name")?,
                    arg(args, 1, "color")?,
                    parse_u32(arg(args, 2, "size")?, "size")?,
                    arg(args, 3, "owner")?,
                )))
            },
            "readAsset" => {
                expect_arity(name, args, 1)?;
                Ok(Self::ReadAsset { name: arg(args, 0, "name")?.to_owned() })
            },
            "deleteAsset" => {
                expect_arity(name, args, 1)?;
                Ok(Self::DeleteAsset { name: arg(args, 0, "name")?.to_owned() })
            },
            "transferAsset" => {
                expect_arity(name, args, 2)?;
                Ok(Self::TransferAsset {
                    name: arg(args, 0, "name")?.to_owned(),
                    new_owner: arg(args, 1, "new owner")?.to_owned(),
                })
            },
            "transferAssetsByColor" => {
                expect_arity(name, args, 2)?;
                Ok(Self::TransferAssetsByColor {
                    color: arg(args, 0, "color")?.to_owned(),
                    new_owner: arg(args, 1, "new owner")?.to_owned(),
                })
            },
            "rangeQuery" => {
                expect_arity(name, args, 2)?;
                Ok(Self::RangeQuery {
                    start: raw_arg(args, 0, "start key")?.to_owned(),
                    end: raw_arg(args, 1, "end key")?.to_owned(),
                })
            },
            "rangeQueryPaginated" => {
                expect_arity(name, args, 4)?;
                Ok(Self::RangeQueryPaginated {
                    start: raw_arg(args, 0, "start key")?.to_owned(),
                    end: raw_arg(args, 1, "end key")?.to_owned(),
                    page_size: parse_i32(raw_arg(args, 2, "page size")?, "page size")?,
                    bookmark: Bookmark::from_token(raw_arg(args, 3, "bookmark")?),
                })
            },
            "richQuery" => {
                expect_arity(name, args, 1)?;
                Ok(Self::RichQuery { selector: parse_selector(arg(args, 0, "selector")?)? })
            },
            "richQueryPaginated" => {
                expect_arity(name, args, 3)?;
                Ok(Self::RichQueryPaginated {
                    selector: parse_selector(arg(args, 0, "selector")?)?,
                    page_size: parse_i32(raw_arg(args, 1, "page size")?, "page size")?,
                    bookmark: Bookmark::from_token(raw_arg(args, 2, "bookmark")?),
                })
            },
            "assetHistory" => {
                expect_arity(name, args, 1)?;
                Ok(Self::AssetHistory { name: arg(args, 0, "name")?.to_owned() })
            },
            other => Err(LedgerError::invalid_argument(format!("unknown operation: {other:?}"))),
        }
    }
}

impl Ledger {
    /// Executes a parsed [`Operation`] against this ledger.
    ///
    /// # Errors
    ///
    /// Propagates the underlying operation's errors unchanged.
    pub fn execute(&self, operation: Operation) -> LedgerResult<Response> {
        match operation {
            Operation::CreateAsset(asset) => {
                self.create_asset(&asset)?;
                Ok(Response::Empty)
            },
            Operation::ReadAsset { name } => Ok(Response::Asset(self.read_asset(&name)?)),
            Operation::DeleteAsset { name } => {
                self.delete_asset(&name)?;
                Ok(Response::Empty)
            },
            Operation::TransferAsset { name, new_owner } => {
                self.transfer_asset(&name, &new_owner)?;
                Ok(Response::Empty)
            },
            Operation::TransferAssetsByColor { color, new_owner } => {
                Ok(Response::Count(self.transfer_by_color(&color, &new_owner)?))
            },
            Operation::RangeQuery { start, end } => {
                Ok(Response::Records(self.range_query(&start, &end).collect()))
            },
            Operation::RangeQueryPaginated { start, end, page_size, bookmark } => Ok(
                Response::Page(self.range_query_paginated(&start, &end, page_size, &bookmark)?),
            ),
            Operation::RichQuery { selector } => {
                Ok(Response::Records(self.rich_query(selector).collect()))
            },
            Operation::RichQueryPaginated { selector, page_size, bookmark } => {
                Ok(Response::Page(self.rich_query_paginated(selector, page_size, &bookmark)?))
            },
            Operation::AssetHistory { name } => Ok(Response::History(self.history_of(&name)?)),
        }
    }
}
