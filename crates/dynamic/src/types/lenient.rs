//! Document scalars that tolerate loosely typed producers.
//!
//! Hand-written documents and older services encode booleans as `"1"`, leave
//! them empty, send a bare `true` or `42` where a string is expected, or send a
//! single string where a list is expected. These types
//! accept those shapes both through serde and as [`convert_assign`]
//! destinations.
//!
//! [`convert_assign`]: crate::coerce::convert_assign

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coerce::{self, Assignable, Scan, Slot};
use crate::error::{DynamicError, Result};
use crate::value::Value;

fn literal(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s),
        Value::Number(n) => Some(n.as_str()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::I8(v) => Some(i64::from(*v)),
        Value::I16(v) => Some(i64::from(*v)),
        Value::I32(v) => Some(i64::from(*v)),
        Value::I64(v) => Some(*v),
        Value::U8(v) => Some(i64::from(*v)),
        Value::U16(v) => Some(i64::from(*v)),
        Value::U32(v) => Some(i64::from(*v)),
        Value::U64(v) => i64::try_from(*v).ok(),
        Value::Number(n) => n.as_str().parse().ok(),
        _ => None,
    }
}

/// Decode a raw document so its contents can be judged like any other value
fn decoded(value: &Value) -> Option<Value> {
    match value {
        Value::Raw(raw) => raw.decode().ok(),
        _ => None,
    }
}

// ==================== Boolean ====================

/// Boolean accepting `true`/`false`, `"true"`/`"false"`, `1`/`0`,
/// `"1"`/`"0"` and `""` (false)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boolean(pub bool);

impl Boolean {
    fn from_value(value: &Value) -> Option<bool> {
        if let Some(inner) = decoded(value) {
            return Self::from_value(&inner);
        }
        match value {
            Value::Bool(b) => Some(*b),
            Value::Text(s) if s.is_empty() => Some(false),
            _ => match (literal(value), integer(value)) {
                (Some("true" | "1"), _) | (_, Some(1)) => Some(true),
                (Some("false" | "0"), _) | (_, Some(0)) => Some(false),
                _ => None,
            },
        }
    }
}

impl From<Boolean> for bool {
    fn from(b: Boolean) -> Self {
        b.0
    }
}

impl From<Boolean> for Value {
    fn from(b: Boolean) -> Self {
        Value::Bool(b.0)
    }
}

impl Scan for Boolean {
    fn scan(&mut self, src: &Value) -> Result<()> {
        self.0 = Self::from_value(src)
            .ok_or_else(|| DynamicError::unsupported(src.type_name(), "lenient boolean"))?;
        Ok(())
    }
}

impl Serialize for Boolean {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl<'de> Deserialize<'de> for Boolean {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .map(Self)
            .ok_or_else(|| D::Error::custom(format!("unknown boolean value {value:?}")))
    }
}

// ==================== Logical ====================

/// Tri-state boolean: anything that is not recognisably true or false is
/// [`Logical::Unknown`]
///
/// Encodes as `1`, `-1` and `0`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logical {
    False = -1,
    #[default]
    Unknown = 0,
    True = 1,
}

impl Logical {
    fn from_value(value: &Value) -> Self {
        if let Some(inner) = decoded(value) {
            return Self::from_value(&inner);
        }
        match value {
            Value::Bool(true) => Self::True,
            Value::Bool(false) => Self::False,
            _ => match (literal(value), integer(value)) {
                (Some("true" | "1"), _) | (_, Some(1)) => Self::True,
                (Some("false" | "0"), _) | (_, Some(0)) => Self::False,
                _ => Self::Unknown,
            },
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    /// `None` when unknown
    pub fn to_option(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Unknown becomes null
impl From<Logical> for Value {
    fn from(l: Logical) -> Self {
        Value::from(l.to_option())
    }
}

impl Scan for Logical {
    fn scan(&mut self, src: &Value) -> Result<()> {
        *self = Self::from_value(src);
        Ok(())
    }
}

impl Serialize for Logical {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i8(*self as i8)
    }
}

impl<'de> Deserialize<'de> for Logical {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

// ==================== Text ====================

/// String that also accepts booleans (`"true"`/`"false"`) and numbers (by
/// their literal); null reads as `""`
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Text(pub String);

impl Text {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<String> {
        if let Some(inner) = decoded(value) {
            return Self::from_value(&inner);
        }
        match value {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) => Some(n.as_str().to_owned()),
            Value::Map(_) | Value::Seq(_) => None,
            other => coerce::to_string(other),
        }
    }
}

impl From<Text> for String {
    fn from(t: Text) -> Self {
        t.0
    }
}

impl From<Text> for Value {
    fn from(t: Text) -> Self {
        Value::Text(t.0)
    }
}

impl Scan for Text {
    fn scan(&mut self, src: &Value) -> Result<()> {
        self.0 = Self::from_value(src)
            .ok_or_else(|| DynamicError::unsupported(src.type_name(), "lenient string"))?;
        Ok(())
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .map(Self)
            .ok_or_else(|| D::Error::custom(format!("unknown string value {value:?}")))
    }
}

// ==================== Strings ====================

/// A list of strings that also accepts a single string
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Strings(Vec<String>);

impl Strings {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// The first string, or `""` when empty
    pub fn first(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    fn from_value(value: &Value) -> Option<Vec<String>> {
        if let Some(inner) = decoded(value) {
            return Self::from_value(&inner);
        }
        match value {
            Value::Text(s) => Some(vec![s.clone()]),
            Value::Seq(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect(),
            _ => None,
        }
    }
}

impl From<Strings> for Value {
    fn from(s: Strings) -> Self {
        Value::Seq(s.0.into_iter().map(Value::Text).collect())
    }
}

impl Scan for Strings {
    fn scan(&mut self, src: &Value) -> Result<()> {
        self.0 = Self::from_value(src)
            .ok_or_else(|| DynamicError::unsupported(src.type_name(), "strings"))?;
        Ok(())
    }
}

impl Serialize for Strings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Strings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .map(Self)
            .ok_or_else(|| D::Error::custom("expected a string or a list of strings"))
    }
}

macro_rules! scan_slot {
    ($($ty:ty),*) => {
        $(
            impl Assignable for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Scan(self)
                }
            }
        )*
    };
}

scan_slot!(Boolean, Logical, Text, Strings);
