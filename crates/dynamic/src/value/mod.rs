//! The closed set of values the coercion engine understands.
//!
//! Document decoding, configuration loading and external drivers all produce
//! [`Value`]s. Numbers decoded from documents arrive as [`Value::Number`],
//! which keeps the literal text so that large integers never pass through
//! `f64`.

mod json;
mod kind;
mod opaque;
mod raw;

use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::map::DynamicMap;

pub use json::canonical_json;
pub(crate) use json::canonical_map;
pub use kind::ValueKind;
pub use opaque::{Convertible, OpaqueValue};
pub use raw::RawDocument;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent / null
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Decoded numeric literal of arbitrary precision
    Number(serde_json::Number),
    Text(String),
    Bytes(Vec<u8>),
    /// Instant in UTC
    Time(DateTime<Utc>),
    /// Signed span with nanosecond resolution
    Duration(TimeDelta),
    /// Un-decoded document
    Raw(RawDocument),
    Map(DynamicMap),
    Seq(Vec<Value>),
    Opaque(OpaqueValue),
}

impl Value {
    // ==================== Constructors ====================

    /// Create a text value
    pub fn text(v: impl Into<String>) -> Self {
        Self::Text(v.into())
    }

    /// Create a number from its literal, e.g. `"12345678901234567890"`
    ///
    /// Returns `None` when the literal is not a valid JSON number.
    pub fn number(literal: &str) -> Option<Self> {
        serde_json::Number::from_str(literal).ok().map(Self::Number)
    }

    /// Create an empty map value
    pub fn map() -> Self {
        Self::Map(DynamicMap::new())
    }

    /// Wrap a value with its own conversion capability
    pub fn opaque(v: impl Convertible + 'static) -> Self {
        Self::Opaque(OpaqueValue::new(v))
    }

    // ==================== Type queries ====================

    /// Get the kind of this value
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::I16(_) => ValueKind::I16,
            Self::I32(_) => ValueKind::I32,
            Self::I64(_) => ValueKind::I64,
            Self::U8(_) => ValueKind::U8,
            Self::U16(_) => ValueKind::U16,
            Self::U32(_) => ValueKind::U32,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Time(_) => ValueKind::Time,
            Self::Duration(_) => ValueKind::Duration,
            Self::Raw(_) => ValueKind::Raw,
            Self::Map(_) => ValueKind::Map,
            Self::Seq(_) => ValueKind::Seq,
            Self::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Runtime type name for diagnostics; opaque values report their own
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Opaque(o) => o.type_name(),
            other => other.kind().name(),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    // ==================== Borrowing accessors ====================

    pub fn as_map(&self) -> Option<&DynamicMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut DynamicMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ==================== From implementations ====================

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    serde_json::Number => Number,
    String => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Time,
    TimeDelta => Duration,
    RawDocument => Raw,
    DynamicMap => Map,
    Vec<Value> => Seq,
    OpaqueValue => Opaque,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}
