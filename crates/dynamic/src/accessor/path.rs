//! Property keys and root-anchored paths.
//!
//! `"$.a.b.c"` is the path `a` → `b` → `c`. A key without the `$.` marker is a
//! single segment even if it contains dots.

use crate::error::{DynamicError, Result};
use crate::limits::AccessLimits;

/// Marker that turns a key into a dotted path
pub const ROOT: &str = "$.";

/// A parsed key: one segment for a bare key, several for a `$.` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path<'a> {
    source: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> Path<'a> {
    /// Parse `key`, enforcing the segment limit
    pub fn parse(key: &'a str, limits: &AccessLimits) -> Result<Self> {
        let segments: Vec<&str> = match key.strip_prefix(ROOT) {
            Some(rest) => rest.split('.').collect(),
            None => vec![key],
        };
        limits.check_path_segments(segments.len())?;
        Ok(Self {
            source: key,
            segments,
        })
    }

    /// Whether `key` uses the `$.` path syntax
    pub fn is_rooted(key: &str) -> bool {
        key.starts_with(ROOT)
    }

    /// The key as given
    pub fn as_str(&self) -> &'a str {
        self.source
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Segment at `depth`
    pub(crate) fn segment(&self, depth: usize) -> &'a str {
        self.segments[depth]
    }

    pub(crate) fn is_last(&self, depth: usize) -> bool {
        depth + 1 == self.segments.len()
    }

    /// Not-found error naming the whole key
    pub(crate) fn not_found(&self) -> DynamicError {
        DynamicError::not_found(self.source)
    }

    /// Widen a not-found error from one segment to the whole key
    pub(crate) fn widen(&self, error: DynamicError) -> DynamicError {
        if error.is_not_found() {
            self.not_found()
        } else {
            error
        }
    }
}
