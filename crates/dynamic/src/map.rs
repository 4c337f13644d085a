//! `DynamicMap`: a nested, string-keyed document container.
//!
//! Values keep their insertion order for iteration and encoding, but order
//! never matters for equality or fingerprints: both go through the
//! key-sorted canonical encoding.
//!
//! ```
//! use nebula_dynamic::{Context, DynamicMap};
//!
//! let mut defaults = DynamicMap::from_slice(br#"{"http":{"port":80,"tls":false}}"#).unwrap();
//! let site = DynamicMap::from_slice(br#"{"http":{"port":"8443"}}"#).unwrap();
//!
//! let mut merged = site.clone();
//! merged.expand_by(&defaults);
//!
//! let ctx = Context::background();
//! assert_eq!(merged.to_integer(&ctx, "$.http.port", 0), 8443);
//! assert!(!merged.to_boolean(&ctx, "$.http.tls", true));
//!
//! defaults.set_integer(&ctx, "$.http.port", 8080).unwrap();
//! assert_eq!(defaults.get_integer(&ctx, "$.http.port", 0).unwrap(), 8080);
//! ```

use std::fs;
use std::path::Path;

use chrono::TimeDelta;
use indexmap::map::{self, IndexMap};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::accessor::{self, Getter, Object, Setter};
use crate::context::Context;
use crate::error::{DynamicError, Result};
use crate::limits::AccessLimits;
use crate::types::TYPES;
use crate::value::{canonical_map, RawDocument, Value};

/// Nested string-keyed value container
#[derive(Debug, Clone, Default)]
pub struct DynamicMap {
    entries: IndexMap<String, Value>,
}

// ============================================================================
// BASIC ACCESS
// ============================================================================

impl DynamicMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value stored directly under `key` (no path syntax)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Whether `key` is stored directly in this map
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove `key`, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> map::IterMut<'_, String, Value> {
        self.entries.iter_mut()
    }

    pub(crate) fn entry(&mut self, key: &str) -> map::Entry<'_, String, Value> {
        self.entries.entry(key.to_owned())
    }
}

// ============================================================================
// MERGING AND SCOPES
// ============================================================================

impl DynamicMap {
    /// Deep merge `other` into `self`
    ///
    /// Keys missing from `self` are copied in. Where both sides hold maps the
    /// merge recurses; any other conflict keeps the receiver's value.
    pub fn expand_by(&mut self, other: &DynamicMap) {
        for (key, incoming) in &other.entries {
            match self.entries.get_mut(key) {
                Some(Value::Map(mine)) => match incoming {
                    Value::Map(theirs) => mine.expand_by(theirs),
                    _ => trace!(key = key.as_str(), "keeping map over incoming scalar"),
                },
                Some(_) => trace!(key = key.as_str(), "keeping receiver value"),
                None => {
                    self.entries.insert(key.clone(), incoming.clone());
                }
            }
        }
    }

    /// Nested map stored directly under `name`
    pub fn scope(&self, name: &str) -> Option<&DynamicMap> {
        self.get(name).and_then(Value::as_map)
    }

    pub fn scope_mut(&mut self, name: &str) -> Option<&mut DynamicMap> {
        self.get_mut(name).and_then(Value::as_map_mut)
    }

    /// Nested map under `name`, created when missing
    ///
    /// A value of any other kind stored under `name` is replaced.
    pub fn new_scope(&mut self, name: &str) -> &mut DynamicMap {
        let slot = self.entries.entry(name.to_owned()).or_insert_with(Value::map);
        scope_in(name, slot)
    }
}

/// The map held by `slot`; any other value is replaced with an empty map
fn scope_in<'a>(name: &str, slot: &'a mut Value) -> &'a mut DynamicMap {
    match slot {
        Value::Map(scope) => scope,
        other => {
            debug!(key = name, from = other.type_name(), "replacing value with a new scope");
            *other = Value::map();
            scope_in(name, other)
        }
    }
}

// ============================================================================
// TYPED ACCESS
// ============================================================================

/// Property value, or `None` when it is absent, null or unreadable
fn lookup_lenient(ctx: &Context, map: &DynamicMap, name: &str) -> Option<Value> {
    match accessor::get_property(ctx, map, name) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            trace!(key = name, error = %e, "lenient lookup falls back to default");
            None
        }
    }
}

macro_rules! typed_access {
    ($($to:ident, $get:ident, $set:ident, $field:ident: $ty:ty;)*) => {
        impl DynamicMap {
            $(
                #[doc = concat!("Property `name` as ", stringify!($ty), "; `default` when absent, null or unconvertible")]
                pub fn $to(&self, ctx: &Context, name: &str, default: $ty) -> $ty {
                    match lookup_lenient(ctx, self, name) {
                        Some(value) => TYPES.$field.cast(&value, default),
                        None => default,
                    }
                }

                #[doc = concat!("Property `name` as ", stringify!($ty), "; `default` when absent or null, an error when unconvertible")]
                pub fn $get(&self, ctx: &Context, name: &str, default: $ty) -> Result<$ty> {
                    TYPES.$field.get(ctx, self, name, default)
                }

                #[doc = concat!("Store a ", stringify!($ty), " under `name`")]
                pub fn $set(&mut self, ctx: &Context, name: &str, value: $ty) -> Result<()> {
                    accessor::set_property(ctx, self, name, Value::from(value))
                }
            )*
        }
    };
}

typed_access! {
    to_boolean, get_boolean, set_boolean, boolean: bool;
    to_integer, get_integer, set_integer, integer: i64;
    to_float, get_float, set_float, float: f64;
    to_string, get_string, set_string, string: String;
    to_duration, get_duration, set_duration, duration: TimeDelta;
    to_json, get_json, set_json, json: RawDocument;
}

impl DynamicMap {
    /// Nested map at `name`, copied out
    pub fn to_map(&self, ctx: &Context, name: &str) -> Option<DynamicMap> {
        match lookup_lenient(ctx, self, name)? {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The maps inside the sequence at `name`; other elements are skipped
    pub fn to_maps(&self, ctx: &Context, name: &str) -> Vec<DynamicMap> {
        self.to_slice(ctx, name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match item {
                Value::Map(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    /// The sequence at `name`
    ///
    /// A raw document holding an array is decoded.
    pub fn to_slice(&self, ctx: &Context, name: &str) -> Option<Vec<Value>> {
        match lookup_lenient(ctx, self, name)? {
            Value::Seq(items) => Some(items),
            Value::Raw(raw) => match raw.decode::<Value>() {
                Ok(Value::Seq(items)) => Some(items),
                _ => None,
            },
            _ => None,
        }
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl DynamicMap {
    /// Decode a JSON object; empty input and `null` give an empty map
    pub fn from_slice(doc: &[u8]) -> Result<Self> {
        Self::from_slice_limited(doc, &AccessLimits::default())
    }

    /// [`from_slice`](Self::from_slice) with an explicit document size bound
    pub fn from_slice_limited(doc: &[u8], limits: &AccessLimits) -> Result<Self> {
        if doc.is_empty() {
            return Ok(Self::new());
        }
        limits.check_document_bytes(doc.len())?;
        match serde_json::from_slice::<Value>(doc)? {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(Self::new()),
            other => Err(DynamicError::Decode(format!(
                "expected a JSON object, found {}",
                other.type_name()
            ))),
        }
    }

    /// Decode a JSON array of objects
    pub fn from_documents(doc: &[u8]) -> Result<Vec<Self>> {
        AccessLimits::default().check_document_bytes(doc.len())?;
        let documents: Vec<RawDocument> = serde_json::from_slice(doc)?;
        documents
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                Self::from_slice(raw.as_bytes()).map_err(|e| e.with_context(format!("document {i}")))
            })
            .collect()
    }

    /// Read and decode one JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = fs::read(path)
            .map_err(|e| DynamicError::from(e).with_context(format!("file {}", path.display())))?;
        debug!(path = %path.display(), bytes = doc.len(), "loaded document");
        Self::from_slice(&doc).map_err(|e| e.with_context(format!("file {}", path.display())))
    }

    /// Merge several JSON files, earlier files taking precedence
    ///
    /// Files that do not exist are skipped; any other failure aborts.
    pub fn from_files<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut merged = Self::new();
        for path in paths {
            let path = path.as_ref();
            match Self::from_file(path) {
                Ok(doc) => merged.expand_by(&doc),
                Err(e) if is_missing_file(&e) => {
                    debug!(path = %path.display(), "skipping missing document");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(merged)
    }

    /// Map of the visible properties of `node`
    pub fn from_fields(ctx: &Context, node: &dyn Object) -> Result<Self> {
        match accessor::export(ctx, node)? {
            Value::Map(map) => Ok(map),
            other => Err(DynamicError::unsupported(other.type_name(), "map")),
        }
    }
}

fn is_missing_file(error: &DynamicError) -> bool {
    matches!(error.root(), DynamicError::Io { kind, .. } if *kind == std::io::ErrorKind::NotFound)
}

impl From<serde_json::Map<String, serde_json::Value>> for DynamicMap {
    fn from(object: serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DynamicMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for DynamicMap {
    type Item = (String, Value);
    type IntoIter = map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DynamicMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// ENCODING
// ============================================================================

impl DynamicMap {
    /// Compact JSON in insertion order
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DynamicError::Encode(e.to_string()))
    }

    /// Two-space indented JSON in insertion order
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DynamicError::Encode(e.to_string()))
    }

    /// Indented JSON with keys sorted at every level
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let canonical = canonical_map(self)?;
        serde_json::to_vec_pretty(&canonical).map_err(|e| DynamicError::Encode(e.to_string()))
    }

    /// Hex SHA-256 of the canonical encoding
    pub fn fingerprint(&self) -> Result<String> {
        let digest = Sha256::digest(self.canonical_bytes()?);
        Ok(hex::encode(digest))
    }

    /// Write the canonical encoding to `path`
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.canonical_bytes()?;
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "saved document");
        Ok(())
    }
}

/// Equal when the canonical encodings match; maps that cannot be encoded
/// are never equal
/// Maps are equal when their canonical documents are; maps without a
/// document form compare entry by entry, ignoring order
impl PartialEq for DynamicMap {
    fn eq(&self, other: &Self) -> bool {
        match (self.canonical_bytes(), other.canonical_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => {
                self.len() == other.len()
                    && self.iter().all(|(key, value)| other.get(key) == Some(value))
            }
        }
    }
}

impl Serialize for DynamicMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in &self.entries {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for DynamicMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(Self::new()),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, found {}",
                other.type_name()
            ))),
        }
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

impl Object for DynamicMap {
    fn as_map(&self) -> Option<&DynamicMap> {
        Some(self)
    }

    fn as_map_mut(&mut self) -> Option<&mut DynamicMap> {
        Some(self)
    }

    fn object_name(&self) -> &'static str {
        "DynamicMap"
    }
}

impl Getter for DynamicMap {
    fn get_property(&self, ctx: &Context, name: &str) -> Result<Value> {
        accessor::get_property(ctx, self, name)
    }
}

impl Setter for DynamicMap {
    fn set_property(&mut self, ctx: &Context, name: &str, value: Value) -> Result<()> {
        accessor::set_property(ctx, self, name, value)
    }
}
