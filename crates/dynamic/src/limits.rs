//! Configurable limits for property access and document decoding.
//!
//! Paths and documents often come from configuration or external drivers,
//! so the accessor refuses absurdly long paths and oversized documents
//! instead of walking them.

use serde::{Deserialize, Serialize};

use crate::error::{DynamicError, Result};

/// Limits applied by the accessor and the map constructors
///
/// # Example
///
/// ```
/// use nebula_dynamic::AccessLimits;
///
/// let limits = AccessLimits::default();
/// assert_eq!(limits.max_path_segments, 100);
///
/// let strict = AccessLimits::strict();
/// assert_eq!(strict.max_path_segments, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessLimits {
    /// Maximum number of segments in a `$.`-rooted path
    pub max_path_segments: usize,

    /// Maximum size of a single decoded document in bytes
    pub max_document_bytes: usize,
}

impl Default for AccessLimits {
    fn default() -> Self {
        Self {
            max_path_segments: 100,
            max_document_bytes: 64 * 1024 * 1024,
        }
    }
}

impl AccessLimits {
    /// Permissive limits for trusted environments
    pub fn permissive() -> Self {
        Self {
            max_path_segments: 1_000,
            max_document_bytes: 1024 * 1024 * 1024,
        }
    }

    /// Strict limits for untrusted input
    pub fn strict() -> Self {
        Self {
            max_path_segments: 16,
            max_document_bytes: 1024 * 1024,
        }
    }

    /// No limits (use with caution!)
    pub const fn unlimited() -> Self {
        Self {
            max_path_segments: usize::MAX,
            max_document_bytes: usize::MAX,
        }
    }

    /// Validate path segment count
    #[inline]
    pub fn check_path_segments(&self, count: usize) -> Result<()> {
        if count > self.max_path_segments {
            Err(DynamicError::limit_exceeded(
                "path segments",
                self.max_path_segments,
                count,
            ))
        } else {
            Ok(())
        }
    }

    /// Validate document size
    #[inline]
    pub fn check_document_bytes(&self, len: usize) -> Result<()> {
        if len > self.max_document_bytes {
            Err(DynamicError::limit_exceeded(
                "document bytes",
                self.max_document_bytes,
                len,
            ))
        } else {
            Ok(())
        }
    }
}
