//! Error taxonomy for coercion and property access.
//!
//! Callers mostly care about one distinction: [`DynamicError::NotFound`]
//! ("the key is absent, substitute a default") versus everything else ("the
//! key is there but something went wrong"). Use [`DynamicError::is_not_found`]
//! rather than matching the variant directly, since context wrapping hides it.

use thiserror::Error;

// ============================================================================
// MAIN ERROR TYPE
// ============================================================================

/// Errors raised by the coercion engine, the property accessor and
/// [`DynamicMap`](crate::DynamicMap).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DynamicError {
    /// Absent key or path. `key` carries the full original path.
    #[error("key {key:?} not found")]
    NotFound { key: String },

    /// The value is present but cannot be represented by the destination.
    #[error("cannot convert {from} ({literal:?}) to {to}: {reason}")]
    Conversion {
        from: String,
        to: String,
        literal: String,
        reason: String,
    },

    /// No conversion rule exists for this pair of kinds.
    #[error("unsupported conversion, storing {from} into {to}")]
    Unsupported { from: String, to: String },

    /// Destination is absent, read-only or otherwise not writable.
    #[error("invalid destination: {reason}")]
    InvalidDestination { reason: String },

    /// A path write hit an intermediate segment that is not a mapping.
    #[error("path {path:?}: segment {segment:?} holds a non-mapping value")]
    PathConflict { path: String, segment: String },

    /// A panic raised inside a capability implementation, caught at the
    /// accessor boundary.
    #[error("fault recovered during {operation}: {payload}")]
    FaultRecovered { operation: String, payload: String },

    /// A configured limit was exceeded.
    #[error("{limit} exceeded: {actual} > {max}")]
    LimitExceeded {
        limit: String,
        max: usize,
        actual: usize,
    },

    /// Document could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Value could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Filesystem error while loading or saving a document.
    #[error("io error ({kind:?}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },

    /// Nested error with additional info.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        #[source]
        source: Box<DynamicError>,
    },
}

// ============================================================================
// CONVENIENCE CONSTRUCTORS
// ============================================================================

impl DynamicError {
    /// Create a not-found error for a key or full path
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a conversion error
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        literal: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
            literal: literal.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-conversion error
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Unsupported {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an invalid destination error
    pub fn invalid_destination(reason: impl Into<String>) -> Self {
        Self::InvalidDestination {
            reason: reason.into(),
        }
    }

    /// Create a path conflict error
    pub fn path_conflict(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::PathConflict {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Create a recovered fault error
    pub fn fault(operation: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::FaultRecovered {
            operation: operation.into(),
            payload: payload.into(),
        }
    }

    /// Create a limit exceeded error
    pub fn limit_exceeded(limit: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::LimitExceeded {
            limit: limit.into(),
            max,
            actual,
        }
    }

    /// Add context to an error
    pub fn with_context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Add key context
    pub fn at_key(self, key: impl AsRef<str>) -> Self {
        self.with_context(format!("at key {:?}", key.as_ref()))
    }
}

// ============================================================================
// ERROR CLASSIFICATION
// ============================================================================

impl DynamicError {
    /// Get error code for monitoring
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "DYNAMIC_NOT_FOUND",
            Self::Conversion { .. } => "DYNAMIC_CONVERSION",
            Self::Unsupported { .. } => "DYNAMIC_UNSUPPORTED",
            Self::InvalidDestination { .. } => "DYNAMIC_INVALID_DESTINATION",
            Self::PathConflict { .. } => "DYNAMIC_PATH_CONFLICT",
            Self::FaultRecovered { .. } => "DYNAMIC_FAULT_RECOVERED",
            Self::LimitExceeded { .. } => "DYNAMIC_LIMIT_EXCEEDED",
            Self::Decode(_) => "DYNAMIC_DECODE",
            Self::Encode(_) => "DYNAMIC_ENCODE",
            Self::Io { .. } => "DYNAMIC_IO",
            Self::WithContext { source, .. } => source.code(),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the key or path is absent (looks through context layers)
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// True for a present-but-unconvertible value
    pub fn is_conversion(&self) -> bool {
        matches!(
            self.root(),
            Self::Conversion { .. } | Self::Unsupported { .. }
        )
    }
}

// ============================================================================
// EXTERNAL ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for DynamicError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            Self::Io {
                kind: error.io_error_kind().unwrap_or(std::io::ErrorKind::Other),
                message: error.to_string(),
            }
        } else {
            Self::Decode(error.to_string())
        }
    }
}

impl From<std::io::Error> for DynamicError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result type alias for dynamic operations
pub type Result<T> = std::result::Result<T, DynamicError>;
