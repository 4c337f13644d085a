//! Raw (un-decoded) JSON documents.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::error::{DynamicError, Result};

/// A syntactically valid JSON document kept in its encoded form
///
/// Decoding is deferred until a typed conversion asks for it; numbers are then
/// decoded with arbitrary precision, so a 20-digit integer survives intact.
#[derive(Clone)]
pub struct RawDocument(Box<RawValue>);

impl RawDocument {
    /// Validate and wrap an encoded document
    pub fn new(json: impl Into<String>) -> Result<Self> {
        RawValue::from_string(json.into())
            .map(Self)
            .map_err(DynamicError::from)
    }

    /// Encode any serializable value
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::value::to_raw_value(value)
            .map(Self)
            .map_err(|e| DynamicError::Encode(e.to_string()))
    }

    /// The `null` document
    pub fn null() -> Self {
        Self(RawValue::NULL.to_owned())
    }

    /// Encoded text
    pub fn get(&self) -> &str {
        self.0.get()
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.get().as_bytes()
    }

    /// Decode into `T`; numbers keep their literal precision
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(self.get()).map_err(DynamicError::from)
    }
}

impl Default for RawDocument {
    fn default() -> Self {
        Self::null()
    }
}

impl PartialEq for RawDocument {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawDocument").field(&self.get()).finish()
    }
}

impl fmt::Display for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl Serialize for RawDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Self)
    }
}
