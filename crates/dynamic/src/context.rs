//! Call context threaded through capability operations.
//!
//! The context exists so that capability implementations written by callers
//! can see a deadline or a tracing span. Nothing in this crate aborts a
//! conversion or traversal because of it; every operation is bounded by the
//! size of its input.

use std::time::Instant;

use crate::limits::AccessLimits;

/// Context passed to getters, setters and typed accessors
#[derive(Debug, Clone, Default)]
pub struct Context {
    limits: AccessLimits,
    deadline: Option<Instant>,
    span: Option<tracing::Span>,
}

impl Context {
    /// Empty context with default limits
    pub fn background() -> Self {
        Self::default()
    }

    /// Replace the access limits
    pub fn with_limits(mut self, limits: AccessLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach a caller-side deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a tracing span that capability implementations may enter
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Limits in effect for this call
    pub fn limits(&self) -> &AccessLimits {
        &self.limits
    }

    /// Caller-side deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Caller-supplied span, if any
    pub fn span(&self) -> Option<&tracing::Span> {
        self.span.as_ref()
    }
}
