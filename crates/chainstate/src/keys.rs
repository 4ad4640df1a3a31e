//! Composite key encoding and decoding.
//!
//! A composite key packs an object type and an ordered list of attribute
//! values into a single string whose lexicographic order groups all entries
//! of one type (and one attribute prefix) into a contiguous range. Secondary
//! indexes are built entirely out of this property: an index entry is just a
//! composite key in the store, and an index lookup is a prefix scan.
//!
//! # Encoding
//!
//! Two reserved code points drive the format: U+0000 separates segments and
//! U+0001 terminates the key. `encode(t, [a, b])` produces:
//!
//! ```text
//! \u{0000} t \u{0000} a \u{0000} b \u{0001}
//! ```
//!
//! The leading separator namespaces every composite key below all plain
//! application keys (which are validated to contain neither reserved code
//! point), so plain range scans and index scans can never collide. Because no
//! segment may contain a reserved code point, the encoding is injective and
//! [`decode_composite_key`] is its exact inverse.
//!
//! A partial-match prefix omits the terminator and keeps the trailing
//! separator, so it matches exactly the keys carrying additional attributes:
//!
//! ```
//! use chainstate::keys::{composite_key_prefix, encode_composite_key};
//!
//! let full = encode_composite_key("color~name", &["blue", "marble1"]).unwrap();
//! let prefix = composite_key_prefix("color~name", &["blue"]).unwrap();
//! assert!(full.starts_with(&prefix));
//! ```

use crate::error::{LedgerError, LedgerResult};

/// Reserved code point separating composite-key segments.
///
/// Also the namespace marker: every composite key starts with it, and no
/// plain key may contain it.
pub const COMPOSITE_SEPARATOR: char = '\u{0000}';

/// Reserved code point terminating a composite key.
pub const COMPOSITE_TERMINATOR: char = '\u{0001}';

/// Returns true when `key` lives in the composite-key namespace.
#[must_use]
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPOSITE_SEPARATOR)
}

/// Validates a segment (object type or attribute value).
///
/// # Errors
///
/// Returns [`LedgerError::InvalidKeySegment`] if the segment is empty or
/// contains a reserved code point.
pub(crate) fn validate_segment(segment: &str) -> LedgerResult<()> {
    if segment.is_empty()
        || segment.contains(COMPOSITE_SEPARATOR)
        || segment.contains(COMPOSITE_TERMINATOR)
    {
        return Err(LedgerError::invalid_key_segment(segment));
    }
    Ok(())
}

/// Validates a plain application key.
///
/// Plain keys must be non-empty and must not contain either reserved code
/// point; this is what keeps them disjoint from the composite namespace.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidArgument`] describing the violation.
pub fn validate_simple_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::invalid_argument("key must not be empty"));
    }
    if key.contains(COMPOSITE_SEPARATOR) || key.contains(COMPOSITE_TERMINATOR) {
        return Err(LedgerError::invalid_argument(format!(
            "key {key:?} contains a reserved code point"
        )));
    }
    Ok(())
}

/// Encodes an object type and ordered attributes into a composite key.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidKeySegment`] if the object type or any
/// attribute is empty or contains a reserved code point.
pub fn encode_composite_key(object_type: &str, attributes: &[&str]) -> LedgerResult<String> {
    validate_segment(object_type)?;
    let mut key = String::with_capacity(encoded_len(object_type, attributes));
    key.push(COMPOSITE_SEPARATOR);
    key.push_str(object_type);
    for attribute in attributes {
        validate_segment(attribute)?;
        key.push(COMPOSITE_SEPARATOR);
        key.push_str(attribute);
    }
    key.push(COMPOSITE_TERMINATOR);
    Ok(key)
}

/// Builds the scan prefix matching all composite keys of `object_type` that
/// start with `attributes` and carry at least one further attribute.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidKeySegment`] under the same rules as
/// [`encode_composite_key`].
pub fn composite_key_prefix(object_type: &str, attributes: &[&str]) -> LedgerResult<String> {
    validate_segment(object_type)?;
    let mut prefix = String::with_capacity(encoded_len(object_type, attributes));
    prefix.push(COMPOSITE_SEPARATOR);
    prefix.push_str(object_type);
    prefix.push(COMPOSITE_SEPARATOR);
    for attribute in attributes {
        validate_segment(attribute)?;
        prefix.push_str(attribute);
        prefix.push(COMPOSITE_SEPARATOR);
    }
    Ok(prefix)
}

fn encoded_len(object_type: &str, attributes: &[&str]) -> usize {
    2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>()
}

/// Decodes a composite key back into its object type and attributes.
///
/// Exact inverse of [`encode_composite_key`].
///
/// # Errors
///
/// Returns [`LedgerError::MalformedKey`] when the string is not a valid
/// encoding: missing leading separator, missing terminator, a terminator in
/// the interior, or an empty segment.
pub fn decode_composite_key(key: &str) -> LedgerResult<(String, Vec<String>)> {
    let body = key
        .strip_prefix(COMPOSITE_SEPARATOR)
        .ok_or_else(|| LedgerError::malformed_key("missing leading separator"))?;
    let body = body
        .strip_suffix(COMPOSITE_TERMINATOR)
        .ok_or_else(|| LedgerError::malformed_key("missing terminator"))?;
    if body.contains(COMPOSITE_TERMINATOR) {
        return Err(LedgerError::malformed_key("terminator inside key body"));
    }

    let mut segments = body.split(COMPOSITE_SEPARATOR);
    let object_type = match segments.next() {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => return Err(LedgerError::malformed_key("empty object type")),
    };
    let mut attributes = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            return Err(LedgerError::malformed_key("empty attribute segment"));
        }
        attributes.push(segment.to_owned());
    }
    Ok((object_type, attributes))
}
