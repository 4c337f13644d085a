//! Serde serialization and the bridge to `serde_json::Value`.
//!
//! Encoding rules: bytes become standard base64 text, instants RFC3339 text
//! with nanoseconds, durations an integer count of nanoseconds, non-finite
//! floats `null`. Raw documents are embedded verbatim.

use std::collections::BTreeMap;
use std::str::FromStr;

use base64::Engine;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Value;
use crate::coerce::text::format_time;
use crate::error::{DynamicError, Result};
use crate::map::DynamicMap;
use crate::value::ValueKind;

fn duration_nanos(d: &chrono::TimeDelta) -> i64 {
    d.num_nanoseconds()
        .unwrap_or(if *d < chrono::TimeDelta::zero() { i64::MIN } else { i64::MAX })
}

fn f32_number(v: f32) -> Option<serde_json::Number> {
    if v.is_finite() {
        // shortest f32 rendering; widening to f64 first would print noise digits
        serde_json::Number::from_str(&v.to_string()).ok()
    } else {
        None
    }
}

/// Plain representation an opaque value offers for encoding
fn opaque_plain(value: &super::OpaqueValue) -> Option<Value> {
    value
        .convert(ValueKind::Raw)
        .or_else(|| value.convert(ValueKind::Text))
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => match f32_number(*v) {
                Some(n) => n.serialize(serializer),
                None => serializer.serialize_none(),
            },
            Value::F64(v) => {
                if v.is_finite() {
                    serializer.serialize_f64(*v)
                } else {
                    serializer.serialize_none()
                }
            }
            Value::Number(n) => n.serialize(serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                serializer.serialize_str(&encoded)
            }
            Value::Time(t) => serializer.serialize_str(&format_time(t)),
            Value::Duration(d) => serializer.serialize_i64(duration_nanos(d)),
            Value::Raw(raw) => raw.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Opaque(o) => match opaque_plain(o) {
                Some(plain) => plain.serialize(serializer),
                None => serializer.serialize_none(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(DynamicMap::from(map)),
        }
    }
}

impl Value {
    /// Convert into a `serde_json::Value`, keeping map insertion order as far
    /// as `serde_json::Map` allows
    pub fn to_json(&self) -> Result<serde_json::Value> {
        encode(self, false)
    }
}

/// Key-sorted JSON form used for equality and fingerprints
pub fn canonical_json(value: &Value) -> Result<serde_json::Value> {
    encode(value, true)
}

fn encode(value: &Value, sorted: bool) -> Result<serde_json::Value> {
    use serde_json::Value as Json;

    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::I8(v) => Json::from(*v),
        Value::I16(v) => Json::from(*v),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::U8(v) => Json::from(*v),
        Value::U16(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::U64(v) => Json::from(*v),
        Value::F32(v) => f32_number(*v).map_or(Json::Null, Json::Number),
        Value::F64(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Number(n) => Json::Number(n.clone()),
        Value::Text(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::Time(t) => Json::String(format_time(t)),
        Value::Duration(d) => Json::from(duration_nanos(d)),
        Value::Raw(raw) if sorted => encode(&raw.decode::<Value>()?, true)?,
        Value::Raw(raw) => raw.decode::<Json>()?,
        Value::Map(map) => encode_map(map, sorted)?,
        Value::Seq(items) => Json::Array(
            items
                .iter()
                .map(|v| encode(v, sorted))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Opaque(o) => match opaque_plain(o) {
            Some(plain) => encode(&plain, sorted)?,
            None => {
                return Err(DynamicError::Encode(format!(
                    "opaque value {} has no document form",
                    o.type_name()
                )));
            }
        },
    })
}

/// Key-sorted JSON form of a map
pub(crate) fn canonical_map(map: &DynamicMap) -> Result<serde_json::Value> {
    encode_map(map, true)
}

fn encode_map(map: &DynamicMap, sorted: bool) -> Result<serde_json::Value> {
    let object = if sorted {
        map.iter()
            .map(|(k, v)| Ok((k.clone(), encode(v, true)?)))
            .collect::<Result<BTreeMap<_, _>>>()?
            .into_iter()
            .collect()
    } else {
        map.iter()
            .map(|(k, v)| Ok((k.clone(), encode(v, false)?)))
            .collect::<Result<serde_json::Map<_, _>>>()?
    };
    Ok(serde_json::Value::Object(object))
}
