//! Size limits and configuration validation.
//!
//! The store accepts an optional [`SizeLimits`] at construction time and
//! checks every write against it, so oversized payloads are rejected before
//! they reach the live map or the history log.
//!
//! # Defaults
//!
//! | Limit | Default |
//! |-------|---------|
//! | `max_key_size` | 256 bytes |
//! | `max_value_size` | 1 048 576 bytes (1 MiB) |

use thiserror::Error;

use crate::error::LedgerError;

/// Default maximum key size in bytes (256 B).
///
/// Keys are UTF-8 strings; 256 bytes comfortably covers application keys and
/// composite index encodings over them.
pub const DEFAULT_MAX_KEY_SIZE: usize = 256;

/// Default maximum value size in bytes (1 MiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Configuration validation error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric field is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// The field that failed validation.
        field: &'static str,
        /// The minimum allowed value.
        min: String,
        /// The rejected value.
        value: String,
    },
}

/// Configurable size limits for keys and values.
///
/// Both limits must be at least 1. Use [`SizeLimits::default`] for the
/// standard limits, or construct with custom values.
///
/// # Example
///
/// ```
/// use chainstate::SizeLimits;
///
/// let limits = SizeLimits::new(64, 4096).unwrap();
/// assert_eq!(limits.max_key_size(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    max_key_size: usize,
    max_value_size: usize,
}

impl SizeLimits {
    /// Creates size limits with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either limit is zero.
    pub fn new(max_key_size: usize, max_value_size: usize) -> Result<Self, ConfigError> {
        if max_key_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_key_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if max_value_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_value_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        Ok(Self { max_key_size, max_value_size })
    }

    /// Returns the maximum allowed key size in bytes.
    #[must_use]
    pub fn max_key_size(&self) -> usize {
        self.max_key_size
    }

    /// Returns the maximum allowed value size in bytes.
    #[must_use]
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    /// Validates a key/value pair against these limits.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SizeLimitExceeded`] naming which limit was
    /// violated.
    pub fn validate(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        if key.len() > self.max_key_size {
            return Err(LedgerError::size_limit_exceeded("key", key.len(), self.max_key_size));
        }
        if value.len() > self.max_value_size {
            return Err(LedgerError::size_limit_exceeded(
                "value",
                value.len(),
                self.max_value_size,
            ));
        }
        Ok(())
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_key_size: DEFAULT_MAX_KEY_SIZE, max_value_size: DEFAULT_MAX_VALUE_SIZE }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_limits() {
        let limits = SizeLimits::default();
        assert_eq!(limits.max_key_size(), DEFAULT_MAX_KEY_SIZE);
        assert_eq!(limits.max_value_size(), DEFAULT_MAX_VALUE_SIZE);
    }

    #[test]
    fn zero_key_size_rejected() {
        let err = SizeLimits::new(0, 1024).unwrap_err();
        assert!(err.to_string().contains("max_key_size"), "error should name the field: {err}");
    }

    #[test]
    fn zero_value_size_rejected() {
        let err = SizeLimits::new(1, 0).unwrap_err();
        assert!(err.to_string().contains("max_value_size"), "error should name the field: {err}");
    }

    #[rstest]
    #[case::within_limits(10, 20, 5, 10, true)]
    #[case::at_exact_limit(5, 10, 5, 10, true)]
    #[case::key_one_byte_over(5, 10, 6, 10, false)]
    #[case::value_one_byte_over(5, 10, 5, 11, false)]
    fn validate_parametric(
        #[case] max_key: usize,
        #[case] max_val: usize,
        #[case] key_len: usize,
        #[case] val_len: usize,
        #[case] should_pass: bool,
    ) {
        let limits = SizeLimits::new(max_key, max_val).unwrap();
        let key = "k".repeat(key_len);
        let result = limits.validate(&key, &vec![0u8; val_len]);
        assert_eq!(result.is_ok(), should_pass);
    }

    #[test]
    fn validate_error_names_the_limit() {
        let limits = SizeLimits::new(4, 8).unwrap();
        let err = limits.validate("toolong", b"v").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SizeLimitExceeded { kind: "key", actual: 7, limit: 4 }
        ));
    }
}
