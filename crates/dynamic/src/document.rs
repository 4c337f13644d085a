//! Helpers for whole JSON documents held as bytes.

use crate::context::Context;
use crate::error::{DynamicError, Result};
use crate::map::DynamicMap;

/// The empty object document
pub const EMPTY: &[u8] = b"{}";

/// Top-level shape of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Object,
    Array,
}

/// Shape of `doc`, judged by its first token
///
/// Scalars, closing delimiters and blank input are errors.
pub fn kind_of(doc: &[u8]) -> Result<DocumentKind> {
    match doc.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(DocumentKind::Object),
        Some(b'[') => Ok(DocumentKind::Array),
        Some(b'}' | b']') => Err(DynamicError::Decode("unexpected delimiter".to_owned())),
        _ => Err(DynamicError::Decode(
            "input does not represent a JSON object or array".to_owned(),
        )),
    }
}

/// Whether `doc` is an array; empty input is not
pub fn is_array(doc: &[u8]) -> Result<bool> {
    if doc.is_empty() {
        return Ok(false);
    }
    Ok(kind_of(doc)? == DocumentKind::Array)
}

/// Whether `doc` is an object; empty input is not
pub fn is_object(doc: &[u8]) -> Result<bool> {
    if doc.is_empty() {
        return Ok(false);
    }
    Ok(kind_of(doc)? == DocumentKind::Object)
}

/// `doc` itself when it is an array, otherwise `doc` wrapped in one
pub fn as_array(doc: &[u8]) -> Result<Vec<u8>> {
    if is_array(doc)? {
        return Ok(doc.to_vec());
    }
    let mut wrapped = Vec::with_capacity(doc.len() + 2);
    wrapped.push(b'[');
    wrapped.extend_from_slice(doc);
    wrapped.push(b']');
    Ok(wrapped)
}

/// Whether `doc` carries no content: blank, `{}` or `[]`
pub fn is_empty(doc: &[u8]) -> bool {
    doc.trim_ascii().len() <= 2
}

/// `doc`, or `{}` when it is empty
pub fn ensure(doc: &[u8]) -> &[u8] {
    if is_empty(doc) {
        EMPTY
    } else {
        doc
    }
}

/// Deep merge of object documents, earlier documents taking precedence
pub fn merge<D: AsRef<[u8]>>(docs: &[D]) -> Result<Vec<u8>> {
    let mut merged = DynamicMap::new();
    for (i, doc) in docs.iter().enumerate() {
        let map = DynamicMap::from_slice(doc.as_ref()).map_err(|e| e.with_context(format!("document {i}")))?;
        if i == 0 {
            merged = map;
        } else {
            merged.expand_by(&map);
        }
    }
    merged.to_json_string().map(String::into_bytes)
}

/// Indented, key-sorted re-encoding of an object document
pub fn normalize(doc: &[u8]) -> Result<Vec<u8>> {
    DynamicMap::from_slice(doc)?.canonical_bytes()
}

/// Whether two object documents normalize to the same bytes
///
/// A document that fails to decode equals nothing.
pub fn is_equal(a: &[u8], b: &[u8]) -> bool {
    match (normalize(a), normalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// First non-empty string at `path` across `maps`, else `default`
///
/// A value that exists but is not a string stops the search with an error.
pub fn coalesce_string<'a, I>(ctx: &Context, path: &str, default: &str, maps: I) -> Result<String>
where
    I: IntoIterator<Item = &'a DynamicMap>,
{
    for map in maps {
        let value = map.get_string(ctx, path, String::new())?;
        if !value.is_empty() {
            return Ok(value);
        }
    }
    Ok(default.to_owned())
}

/// Fill `path` in `target` from the first of `target` and `fallbacks` that
/// holds a non-empty string there
pub fn restore_string(
    ctx: &Context,
    path: &str,
    target: &mut DynamicMap,
    fallbacks: &[&DynamicMap],
) -> Result<()> {
    let value = coalesce_string(ctx, path, "", std::iter::once(&*target).chain(fallbacks.iter().copied()))?;
    if value.is_empty() {
        return Ok(());
    }
    target.set_string(ctx, path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(b"{\"a\":1}", Some(DocumentKind::Object))]
    #[case(b"  [1,2]", Some(DocumentKind::Array))]
    #[case(b"\n{}", Some(DocumentKind::Object))]
    #[case(b"]", None)]
    #[case(b"42", None)]
    #[case(b"", None)]
    fn kinds(#[case] doc: &[u8], #[case] expected: Option<DocumentKind>) {
        assert_eq!(kind_of(doc).ok(), expected);
    }

    #[test]
    fn shape_predicates() {
        assert!(is_array(b"[]").unwrap());
        assert!(!is_array(b"").unwrap());
        assert!(is_object(b"{}").unwrap());
        assert!(is_object(b"7").is_err());
        assert_eq!(as_array(b"{\"a\":1}").unwrap(), b"[{\"a\":1}]");
        assert_eq!(as_array(b"[1]").unwrap(), b"[1]");
    }

    #[test]
    fn emptiness() {
        assert!(is_empty(b""));
        assert!(is_empty(b"{}"));
        assert!(is_empty(b" [] "));
        assert!(!is_empty(b"{\"a\":1}"));
        assert_eq!(ensure(b""), b"{}");
        assert_eq!(ensure(b"[1]"), b"[1]");
    }

    #[test]
    fn merge_prefers_earlier_documents() {
        let merged = merge(&[
            r#"{"a":1,"n":{"x":1}}"#,
            r#"{"a":2,"b":2,"n":{"y":2}}"#,
            "",
        ])
        .unwrap();
        assert!(is_equal(&merged, br#"{"b":2,"a":1,"n":{"y":2,"x":1}}"#));
        assert!(merge(&["{}", "[1]"]).unwrap_err().to_string().contains("document 1"));
        assert_eq!(merge::<&str>(&[]).unwrap(), b"{}");
    }

    #[test]
    fn normalized_equality() {
        assert!(is_equal(br#"{"a":1,"b":[1,2]}"#, b"{ \"b\": [1, 2], \"a\": 1 }"));
        assert!(!is_equal(br#"{"a":1}"#, br#"{"a":"1"}"#));
        assert!(!is_equal(b"not json", b"not json"));
        assert_eq!(
            String::from_utf8(normalize(br#"{"b":1,"a":2}"#).unwrap()).unwrap(),
            "{\n  \"a\": 2,\n  \"b\": 1\n}"
        );
    }

    #[test]
    fn coalesce_and_restore() {
        let ctx = Context::background();
        let empty = DynamicMap::from_slice(br#"{"user":{"name":""}}"#).unwrap();
        let named = DynamicMap::from_slice(br#"{"user":{"name":"ada"}}"#).unwrap();
        let wrong = DynamicMap::from_slice(br#"{"user":{"name":{"first":"ada"}}}"#).unwrap();

        assert_eq!(coalesce_string(&ctx, "$.user.name", "anon", [&empty, &named]).unwrap(), "ada");
        assert_eq!(coalesce_string(&ctx, "$.user.name", "anon", [&empty]).unwrap(), "anon");
        assert!(coalesce_string(&ctx, "$.user.name", "anon", [&wrong, &named]).is_err());

        let mut target = empty.clone();
        restore_string(&ctx, "$.user.name", &mut target, &[&named]).unwrap();
        assert_eq!(target.to_string(&ctx, "$.user.name", String::new()), "ada");

        let mut untouched = DynamicMap::new();
        restore_string(&ctx, "$.user.name", &mut untouched, &[&empty]).unwrap();
        assert!(untouched.is_empty());
    }
}
