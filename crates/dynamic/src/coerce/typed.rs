//! Total, never-failing conversions to one primitive type each.
//!
//! Every function answers `Some(value)` when the source converts and `None`
//! otherwise. Sources are considered in a fixed order: integer widths, float
//! widths, booleans, text, decoded number literals, raw documents, instants,
//! opaque values, and finally [`convert_assign`] into a zero-valued
//! destination.

use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use tracing::trace;

use super::assign::{convert_assign, float_integer, integer_of};
use super::slot::Assignable;
use super::text::{
    format_exponent, format_time, narrow_float, parse_bool, parse_duration, parse_float, parse_time,
};
use crate::value::{RawDocument, Value, ValueKind};

/// Last resort: the generic assignment into a default destination
fn fallback<T: Assignable + Default>(value: &Value) -> Option<T> {
    let mut out = T::default();
    match convert_assign(&mut out, value) {
        Ok(()) => Some(out),
        Err(error) => {
            trace!(from = value.type_name(), %error, "typed conversion fell through");
            None
        }
    }
}

/// Integer destinations share one precedence list
trait IntegerTarget: Assignable + Default + Copy + TryFrom<i128> + FromStr + DeserializeOwned {
    const KIND: ValueKind;
}

macro_rules! integer_targets {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl IntegerTarget for $ty {
                const KIND: ValueKind = ValueKind::$kind;
            }
        )*
    };
}

integer_targets! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

fn to_integer<T: IntegerTarget>(value: &Value) -> Option<T> {
    if let Some(n) = integer_of(value) {
        return T::try_from(n).ok();
    }
    match value {
        Value::F32(v) => float_integer(f64::from(*v)).and_then(|n| T::try_from(n).ok()),
        Value::F64(v) => float_integer(*v).and_then(|n| T::try_from(n).ok()),
        Value::Bool(b) => T::try_from(i128::from(*b)).ok(),
        Value::Text(s) => s.parse().ok(),
        // number literals must be integral; "7.0" is not an integer literal
        Value::Number(n) => n.as_str().parse().ok(),
        Value::Raw(raw) => raw.decode().ok(),
        Value::Time(t) => T::try_from(i128::from(t.timestamp())).ok(),
        Value::Opaque(o) => o.convert(T::KIND).and_then(|plain| to_integer(&plain)),
        other => fallback(other),
    }
}

macro_rules! integer_functions {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Convert to `", stringify!($ty), "`; out-of-range values and inexact floats yield `None`")]
            pub fn $name(value: &Value) -> Option<$ty> {
                to_integer(value)
            }
        )*
    };
}

integer_functions! {
    to_i8 => i8,
    to_i16 => i16,
    to_i32 => i32,
    to_i64 => i64,
    to_u8 => u8,
    to_u16 => u16,
    to_u32 => u32,
    to_u64 => u64,
}

/// Convert to `f64`
pub fn to_f64(value: &Value) -> Option<f64> {
    if let Some(n) = integer_of(value) {
        return Some(n as f64);
    }
    match value {
        Value::F32(v) => Some(f64::from(*v)),
        Value::F64(v) => Some(*v),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => parse_float(s).ok(),
        Value::Number(n) => parse_float(n.as_str()).ok(),
        Value::Raw(raw) => raw.decode().ok(),
        Value::Time(t) => Some(t.timestamp() as f64),
        Value::Opaque(o) => o.convert(ValueKind::F64).and_then(|plain| to_f64(&plain)),
        other => fallback(other),
    }
}

/// Convert to `f32`
pub fn to_f32(value: &Value) -> Option<f32> {
    if let Some(n) = integer_of(value) {
        return Some(n as f32);
    }
    match value {
        Value::F32(v) => Some(*v),
        Value::F64(v) => narrow_float(*v),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Text(s) => parse_float(s).ok(),
        Value::Number(n) => parse_float(n.as_str()).ok(),
        Value::Raw(raw) => raw.decode().ok(),
        Value::Time(t) => Some(t.timestamp() as f32),
        Value::Opaque(o) => o.convert(ValueKind::F32).and_then(|plain| to_f32(&plain)),
        other => fallback(other),
    }
}

/// Convert to `bool`; numbers are true when non-zero, text must be a boolean
/// literal
pub fn to_bool(value: &Value) -> Option<bool> {
    if let Some(n) = integer_of(value) {
        return Some(n != 0);
    }
    match value {
        Value::F32(v) => Some(*v != 0.0),
        Value::F64(v) => Some(*v != 0.0),
        Value::Bool(b) => Some(*b),
        Value::Text(s) => parse_bool(s),
        Value::Number(n) => n.as_str().parse::<f64>().ok().map(|v| v != 0.0),
        Value::Raw(raw) => raw.decode().ok(),
        Value::Opaque(o) => o.convert(ValueKind::Bool).and_then(|plain| to_bool(&plain)),
        other => fallback(other),
    }
}

/// Convert to text
///
/// Integers render in base 10, floats in exponent form with eight fractional
/// digits, booleans as `1`/`0`, instants as RFC3339 with nanoseconds.
///
/// ```
/// use nebula_dynamic::{Value, coerce};
///
/// assert_eq!(coerce::to_string(&Value::I64(777)).as_deref(), Some("777"));
/// assert_eq!(coerce::to_string(&Value::F64(777.0)).as_deref(), Some("7.77000000e+02"));
/// assert_eq!(coerce::to_string(&Value::Bool(true)).as_deref(), Some("1"));
/// ```
pub fn to_string(value: &Value) -> Option<String> {
    if let Some(n) = integer_of(value) {
        return Some(n.to_string());
    }
    match value {
        Value::F32(v) => Some(format_exponent(f64::from(*v))),
        Value::F64(v) => Some(format_exponent(*v)),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_owned()),
        Value::Text(s) => Some(s.clone()),
        Value::Bytes(b) => String::from_utf8(b.clone()).ok(),
        Value::Number(n) => Some(n.to_string()),
        Value::Raw(raw) => raw.decode().ok(),
        Value::Time(t) => Some(format_time(t)),
        Value::Opaque(o) => o.convert(ValueKind::Text).and_then(|plain| to_string(&plain)),
        other => fallback(other),
    }
}

/// Convert to an instant
///
/// Numbers are epoch seconds; text is `YYYY-MM-DD HH:MM:SS` (UTC) or RFC3339.
pub fn to_time(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(n) = integer_of(value) {
        return i64::try_from(n)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
    }
    match value {
        Value::Time(t) => Some(*t),
        Value::Text(s) => parse_time(s),
        Value::Number(n) => n
            .as_str()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::Raw(raw) => raw.decode::<String>().ok().and_then(|s| parse_time(&s)),
        Value::Opaque(o) => o.convert(ValueKind::Time).and_then(|plain| to_time(&plain)),
        other => fallback(other),
    }
}

/// Convert to a duration
///
/// Numbers are nanoseconds; text is either a nanosecond count or a duration
/// such as `1h30m` or `1.5s`.
pub fn to_duration(value: &Value) -> Option<TimeDelta> {
    if let Some(n) = integer_of(value) {
        return i64::try_from(n).ok().map(TimeDelta::nanoseconds);
    }
    match value {
        Value::F32(v) => nanos_of_float(f64::from(*v)),
        Value::F64(v) => nanos_of_float(*v),
        Value::Duration(d) => Some(*d),
        Value::Text(s) => s
            .parse::<i64>()
            .ok()
            .map(TimeDelta::nanoseconds)
            .or_else(|| parse_duration(s)),
        Value::Number(n) => n.as_str().parse::<i64>().ok().map(TimeDelta::nanoseconds),
        // decoding never yields another raw document, so this recursion ends
        Value::Raw(raw) => raw
            .decode::<Value>()
            .ok()
            .and_then(|decoded| to_duration(&decoded)),
        Value::Opaque(o) => o
            .convert(ValueKind::Duration)
            .and_then(|plain| to_duration(&plain)),
        other => fallback(other),
    }
}

fn nanos_of_float(v: f64) -> Option<TimeDelta> {
    float_integer(v)
        .and_then(|n| i64::try_from(n).ok())
        .map(TimeDelta::nanoseconds)
}

/// Convert to a raw document
///
/// Text must itself be a valid document; everything else is encoded.
pub fn to_raw(value: &Value) -> Option<RawDocument> {
    match value {
        Value::Raw(raw) => Some(raw.clone()),
        Value::Text(s) => RawDocument::new(s.as_str()).ok(),
        Value::Number(n) => RawDocument::new(n.to_string()).ok(),
        Value::F32(v) if !v.is_finite() => None,
        Value::F64(v) if !v.is_finite() => None,
        Value::Opaque(o) => match o.convert(ValueKind::Raw) {
            Some(plain) => to_raw(&plain),
            None => RawDocument::encode(value).ok(),
        },
        other => RawDocument::encode(other).ok(),
    }
}
