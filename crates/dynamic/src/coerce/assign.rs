//! Best-effort assignment between a [`Value`] and a typed destination.
//!
//! Rules are tried in a fixed order and the first one that applies decides
//! the outcome:
//!
//! 1. direct fast path for text, bytes, instants and every numeric width
//! 2. the destination's own [`Scan`](super::Scan) capability
//! 3. direct assignment of a same-kind source, or any source into `Value`
//! 4. `Option<T>` destinations: null clears, anything else recurses into a
//!    fresh `T`
//! 5. stringify the source and parse it at the destination's width
//! 6. otherwise the pairing is unsupported

use std::fmt::Display;
use std::str::FromStr;

use tracing::trace;

use super::slot::{Assignable, Slot};
use super::text::{format_time, narrow_float, parse_bool, parse_float};
use crate::error::{DynamicError, Result};
use crate::value::Value;

/// Outcome of one rule: either it decided, or it hands the slot on
enum Step<'a> {
    Done(Result<()>),
    Next(Slot<'a>),
}

/// Store `src` into `dest`, converting as needed
///
/// ```
/// use nebula_dynamic::{Value, coerce::convert_assign};
///
/// let mut port = 0u16;
/// convert_assign(&mut port, &Value::text("8080")).unwrap();
/// assert_eq!(port, 8080);
///
/// let mut small = 0i8;
/// assert!(convert_assign(&mut small, &Value::I64(300)).is_err());
/// ```
pub fn convert_assign<T: Assignable + ?Sized>(dest: &mut T, src: &Value) -> Result<()> {
    assign(dest.slot(), src)
}

/// Slot-level entry point used by field introspection
pub fn assign(slot: Slot<'_>, src: &Value) -> Result<()> {
    let rules: [for<'a> fn(Slot<'a>, &Value) -> Step<'a>; 5] =
        [fast_path, delegate, direct, optional, reparse];

    let mut slot = slot;
    for rule in rules {
        match rule(slot, src) {
            Step::Done(outcome) => return outcome,
            Step::Next(rest) => slot = rest,
        }
    }
    Err(DynamicError::unsupported(src.type_name(), slot.kind_name()))
}

// ==================== Numeric helpers ====================

/// Integer payload of any integer-width source
pub(crate) fn integer_of(value: &Value) -> Option<i128> {
    Some(match value {
        Value::I8(v) => i128::from(*v),
        Value::I16(v) => i128::from(*v),
        Value::I32(v) => i128::from(*v),
        Value::I64(v) => i128::from(*v),
        Value::U8(v) => i128::from(*v),
        Value::U16(v) => i128::from(*v),
        Value::U32(v) => i128::from(*v),
        Value::U64(v) => i128::from(*v),
        _ => return None,
    })
}

/// Exact integer value of a float, if it has one
///
/// Any integer produced here widens back to exactly `v`, which is the
/// round-trip condition for float narrowing.
pub(crate) fn float_integer(v: f64) -> Option<i128> {
    // 2^127 bounds the exactly-representable i128 range
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    (v.is_finite() && v.trunc() == v && v.abs() < LIMIT).then(|| v as i128)
}

fn narrow<T: TryFrom<i128>>(dest: &mut T, n: i128, src: &Value, to: &str) -> Result<()> {
    *dest = T::try_from(n).map_err(|_| {
        DynamicError::conversion(src.type_name(), to, n.to_string(), "value out of range")
    })?;
    Ok(())
}

/// Store an exact integer into a numeric slot
fn store_integer<'a>(slot: Slot<'a>, n: i128, src: &Value) -> Step<'a> {
    let to = slot.kind_name();
    Step::Done(match slot {
        Slot::I8(d) => narrow(d, n, src, to),
        Slot::I16(d) => narrow(d, n, src, to),
        Slot::I32(d) => narrow(d, n, src, to),
        Slot::I64(d) => narrow(d, n, src, to),
        Slot::U8(d) => narrow(d, n, src, to),
        Slot::U16(d) => narrow(d, n, src, to),
        Slot::U32(d) => narrow(d, n, src, to),
        Slot::U64(d) => narrow(d, n, src, to),
        Slot::F32(d) => {
            *d = n as f32;
            Ok(())
        }
        Slot::F64(d) => {
            *d = n as f64;
            Ok(())
        }
        other => return Step::Next(other),
    })
}

fn is_integer_slot(slot: &Slot<'_>) -> bool {
    matches!(
        slot,
        Slot::I8(_)
            | Slot::I16(_)
            | Slot::I32(_)
            | Slot::I64(_)
            | Slot::U8(_)
            | Slot::U16(_)
            | Slot::U32(_)
            | Slot::U64(_)
    )
}

// ==================== Rule 1: fast path ====================

fn fast_path<'a>(slot: Slot<'a>, src: &Value) -> Step<'a> {
    if let Some(n) = integer_of(src) {
        return store_integer(slot, n, src);
    }

    let float = match src {
        Value::F32(v) => Some(f64::from(*v)),
        Value::F64(v) => Some(*v),
        _ => None,
    };
    if let Some(v) = float {
        return match slot {
            Slot::F32(d) => Step::Done(match narrow_float(v) {
                Some(n) => {
                    *d = n;
                    Ok(())
                }
                None => Err(DynamicError::conversion(
                    src.type_name(),
                    "f32",
                    v.to_string(),
                    "value out of range",
                )),
            }),
            Slot::F64(d) => {
                *d = v;
                Step::Done(Ok(()))
            }
            s if is_integer_slot(&s) => match float_integer(v) {
                Some(n) => store_integer(s, n, src),
                None => Step::Done(Err(DynamicError::conversion(
                    src.type_name(),
                    s.kind_name(),
                    v.to_string(),
                    "not exactly representable as an integer",
                ))),
            },
            other => Step::Next(other),
        };
    }

    match (src, slot) {
        (Value::Text(s), Slot::Text(d)) => d.clone_from(s),
        (Value::Text(s), Slot::Bytes(d)) => *d = s.as_bytes().to_vec(),
        (Value::Bytes(b), Slot::Text(d)) => match std::str::from_utf8(b) {
            Ok(s) => *d = s.to_owned(),
            Err(e) => {
                return Step::Done(Err(DynamicError::conversion(
                    "bytes",
                    "text",
                    String::from_utf8_lossy(b),
                    e.to_string(),
                )));
            }
        },
        (Value::Bytes(b), Slot::Bytes(d)) => d.clone_from(b),
        (Value::Bytes(b), Slot::Any(d)) => *d = Value::Bytes(b.clone()),
        (Value::Time(t), Slot::Text(d)) => *d = format_time(t),
        (Value::Time(t), Slot::Bytes(d)) => *d = format_time(t).into_bytes(),
        (Value::Null, Slot::Any(d)) => *d = Value::Null,
        (Value::Null, Slot::Bytes(d)) => d.clear(),
        (_, other) => return Step::Next(other),
    }
    Step::Done(Ok(()))
}

// ==================== Rule 2: scan capability ====================

fn delegate<'a>(slot: Slot<'a>, src: &Value) -> Step<'a> {
    match slot {
        Slot::Scan(scanner) => Step::Done(scanner.scan(src)),
        other => Step::Next(other),
    }
}

// ==================== Rule 3: direct assignment ====================

fn direct<'a>(slot: Slot<'a>, src: &Value) -> Step<'a> {
    match (src, slot) {
        (_, Slot::Any(d)) => *d = src.clone(),
        (Value::Bool(v), Slot::Bool(d)) => *d = *v,
        (Value::Time(v), Slot::Time(d)) => *d = *v,
        (Value::Duration(v), Slot::Duration(d)) => *d = *v,
        (Value::Raw(v), Slot::Raw(d)) => d.clone_from(v),
        (Value::Map(v), Slot::Map(d)) => d.clone_from(v),
        (Value::Seq(v), Slot::Seq(d)) => d.clone_from(v),
        (_, other) => return Step::Next(other),
    }
    Step::Done(Ok(()))
}

// ==================== Rule 4: optional destination ====================

fn optional<'a>(slot: Slot<'a>, src: &Value) -> Step<'a> {
    match slot {
        Slot::Optional(target) if src.is_null() => {
            target.clear();
            Step::Done(Ok(()))
        }
        Slot::Optional(target) => Step::Done(target.assign_fresh(src)),
        other => Step::Next(other),
    }
}

// ==================== Rule 5: stringify and parse ====================

/// Canonical text of a scalar source, if it has one
fn render(src: &Value) -> Option<String> {
    if let Some(n) = integer_of(src) {
        return Some(n.to_string());
    }
    Some(match src {
        Value::Bool(b) => b.to_string(),
        // Display for floats is the shortest text that parses back exactly
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Text(s) => s.clone(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Duration(d) => d.num_nanoseconds()?.to_string(),
        _ => return None,
    })
}

/// Sources that may be rendered into a text or bytes destination
fn renders_as_text(src: &Value) -> bool {
    integer_of(src).is_some()
        || matches!(
            src,
            Value::Bool(_) | Value::F32(_) | Value::F64(_) | Value::Number(_) | Value::Duration(_)
        )
}

fn reparse<'a>(slot: Slot<'a>, src: &Value) -> Step<'a> {
    let parses = matches!(
        slot,
        Slot::Bool(_) | Slot::F32(_) | Slot::F64(_) | Slot::Duration(_)
    ) || is_integer_slot(&slot);
    let textual = matches!(slot, Slot::Text(_) | Slot::Bytes(_)) && renders_as_text(src);
    if !parses && !textual {
        return Step::Next(slot);
    }
    let Some(literal) = render(src) else {
        return Step::Next(slot);
    };

    trace!(from = src.type_name(), to = slot.kind_name(), %literal, "stringify-and-parse");

    let to = slot.kind_name();
    let failed =
        |reason: String| DynamicError::conversion(src.type_name(), to, literal.clone(), reason);

    Step::Done(match slot {
        Slot::Bool(d) => match parse_bool(&literal) {
            Some(v) => {
                *d = v;
                Ok(())
            }
            None => Err(failed("invalid boolean literal".to_owned())),
        },
        Slot::I8(d) => parse_at(d, &literal).map_err(failed),
        Slot::I16(d) => parse_at(d, &literal).map_err(failed),
        Slot::I32(d) => parse_at(d, &literal).map_err(failed),
        Slot::I64(d) => parse_at(d, &literal).map_err(failed),
        Slot::U8(d) => parse_at(d, &literal).map_err(failed),
        Slot::U16(d) => parse_at(d, &literal).map_err(failed),
        Slot::U32(d) => parse_at(d, &literal).map_err(failed),
        Slot::U64(d) => parse_at(d, &literal).map_err(failed),
        Slot::F32(d) => parse_float(&literal).map(|v| *d = v).map_err(failed),
        Slot::F64(d) => parse_float(&literal).map(|v| *d = v).map_err(failed),
        Slot::Duration(d) => {
            let mut nanos = 0i64;
            parse_at(&mut nanos, &literal).map_err(failed).map(|()| {
                *d = chrono::TimeDelta::nanoseconds(nanos);
            })
        }
        Slot::Text(d) => {
            d.clone_from(&literal);
            Ok(())
        }
        Slot::Bytes(d) => {
            *d = literal.as_bytes().to_vec();
            Ok(())
        }
        other => return Step::Next(other),
    })
}

/// Parse base-10 text at the destination's width
fn parse_at<T>(dest: &mut T, literal: &str) -> std::result::Result<(), String>
where
    T: FromStr,
    T::Err: Display,
{
    *dest = literal.parse().map_err(|e: T::Err| e.to_string())?;
    Ok(())
}
