//! Typed destinations for [`convert_assign`](super::convert_assign).
//!
//! A [`Slot`] is a mutable reference tagged with the destination's static
//! type. The coercer matches on `(source variant, slot variant)` pairs, so the
//! set of destinations is closed and every pairing is decided at compile time.

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::Result;
use crate::map::DynamicMap;
use crate::value::{RawDocument, Value};

/// Destination capable of accepting any value on its own terms
pub trait Scan {
    /// Store `src` into `self`, or explain why it cannot be stored
    fn scan(&mut self, src: &Value) -> Result<()>;
}

/// An `Option<T>` destination: cleared by null, otherwise filled with a
/// freshly converted `T`
pub trait OptionalSlot {
    /// Set to `None`
    fn clear(&mut self);

    /// Convert `src` into a fresh default `T` and store it on success.
    /// On failure the previous contents are left untouched.
    fn assign_fresh(&mut self, src: &Value) -> Result<()>;

    /// Kind name of the wrapped destination
    fn target_name(&self) -> &'static str;
}

/// A typed, mutable destination
pub enum Slot<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Text(&'a mut String),
    Bytes(&'a mut Vec<u8>),
    Time(&'a mut DateTime<Utc>),
    Duration(&'a mut TimeDelta),
    Raw(&'a mut RawDocument),
    Map(&'a mut DynamicMap),
    Seq(&'a mut Vec<Value>),
    /// Accepts any value as-is
    Any(&'a mut Value),
    /// Delegates to the destination's own [`Scan`] capability
    Scan(&'a mut dyn Scan),
    /// `Option<T>` destination
    Optional(&'a mut dyn OptionalSlot),
}

impl Slot<'_> {
    /// Destination kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Time(_) => "time",
            Self::Duration(_) => "duration",
            Self::Raw(_) => "raw",
            Self::Map(_) => "map",
            Self::Seq(_) => "seq",
            Self::Any(_) => "any",
            Self::Scan(_) => "scanner",
            Self::Optional(o) => o.target_name(),
        }
    }
}

/// A type that can be used as a conversion destination
pub trait Assignable {
    fn slot(&mut self) -> Slot<'_>;
}

macro_rules! impl_assignable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Assignable for $ty {
                #[inline]
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$variant(self)
                }
            }
        )*
    };
}

impl_assignable! {
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
    String => Text,
    Vec<u8> => Bytes,
    DateTime<Utc> => Time,
    TimeDelta => Duration,
    RawDocument => Raw,
    DynamicMap => Map,
    Vec<Value> => Seq,
    Value => Any,
}

impl<T: Assignable + Default> OptionalSlot for Option<T> {
    fn clear(&mut self) {
        *self = None;
    }

    fn assign_fresh(&mut self, src: &Value) -> Result<()> {
        let mut fresh = T::default();
        super::convert_assign(&mut fresh, src)?;
        *self = Some(fresh);
        Ok(())
    }

    fn target_name(&self) -> &'static str {
        // a throwaway default is the only way to ask T for its slot kind
        T::default().slot().kind_name()
    }
}

impl<T: Assignable + Default> Assignable for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Optional(self)
    }
}
