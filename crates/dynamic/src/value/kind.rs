//! Value kinds.
//!
//! `ValueKind` is the fieldless mirror of [`Value`](crate::Value). It names
//! sources and destinations in conversion errors and drives the coarse
//! `is` classification of the type registry.

use core::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Represents the kind of a [`Value`](crate::Value)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Number,
    Text,
    Bytes,
    Time,
    Duration,
    Raw,
    Map,
    Seq,
    Opaque,
}

impl ValueKind {
    /// Lower-case name used in diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Number => "number",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Raw => "raw",
            Self::Map => "map",
            Self::Seq => "seq",
            Self::Opaque => "opaque",
        }
    }

    /// Signed or unsigned integer of a fixed width
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    /// Single or double precision float
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Any numeric kind, including decoded number literals
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || matches!(self, Self::Number)
    }

    /// Mapping or sequence
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Map | Self::Seq)
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
