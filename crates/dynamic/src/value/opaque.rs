//! Values that carry their own conversion capability.

use std::fmt;
use std::sync::Arc;

use super::{Value, ValueKind};

/// A foreign value that knows how to present itself as plain values
///
/// Drivers use this to hand over values whose representation the engine does
/// not understand (a database enum, a money type). The coercer asks the value
/// for the destination kind and continues with whatever it returns.
pub trait Convertible: fmt::Debug + Send + Sync {
    /// Name used in diagnostics
    fn type_name(&self) -> &'static str;

    /// Produce a plain value suited to `kind`, or `None` when unsupported.
    /// Returning another opaque value is treated as unsupported.
    fn convert(&self, kind: ValueKind) -> Option<Value>;
}

/// Shared handle to a [`Convertible`]; equality is identity
#[derive(Clone)]
pub struct OpaqueValue(Arc<dyn Convertible>);

impl OpaqueValue {
    pub fn new(value: impl Convertible + 'static) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Ask the value for a plain representation of `kind`
    pub fn convert(&self, kind: ValueKind) -> Option<Value> {
        match self.0.convert(kind) {
            Some(Value::Opaque(_)) | None => None,
            plain => plain,
        }
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T: Convertible + 'static> From<Arc<T>> for OpaqueValue {
    fn from(value: Arc<T>) -> Self {
        Self(value)
    }
}
