//! Property access by key or path over heterogeneous nodes.
//!
//! A node is anything implementing [`Object`]. Lookups try, in order:
//!
//! 1. the node's native map ([`Object::as_map`])
//! 2. its [`Getter`] / [`Setter`] capability; a not-found answer falls
//!    through to the next step
//! 3. field introspection ([`Fields`], usually generated by
//!    [`impl_fields!`](crate::impl_fields))
//!
//! Keys starting with `$.` are paths. Reads walk every segment; writes
//! create missing intermediate maps but refuse to replace an existing
//! non-map value. Every public function here runs under a panic boundary:
//! a panic raised by capability code comes back as
//! [`DynamicError::FaultRecovered`].

mod fields;
mod path;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

pub use fields::{FieldInfo, FieldMut, FieldRef, Fields};
pub use path::{Path, ROOT};

use crate::coerce::{self, Slot};
use crate::context::Context;
use crate::error::{DynamicError, Result};
use crate::map::DynamicMap;
use crate::value::Value;

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Read a named property
pub trait Getter {
    /// Value of `name`, or [`DynamicError::NotFound`] when absent
    fn get_property(&self, ctx: &Context, name: &str) -> Result<Value>;
}

/// Write a named property
pub trait Setter {
    /// Store `value` under `name`; [`DynamicError::NotFound`] when the node
    /// has no such property
    fn set_property(&mut self, ctx: &Context, name: &str, value: Value) -> Result<()>;
}

/// A field that produces its own value
pub trait AtomGetter {
    fn get(&self, ctx: &Context) -> Result<Value>;
}

/// A field that accepts values on its own terms
pub trait AtomSetter {
    fn set(&mut self, ctx: &Context, value: Value) -> Result<()>;
}

/// A capability-bearing node
///
/// Every method defaults to "not supported"; implement the ones that apply.
pub trait Object {
    /// Native map storage
    fn as_map(&self) -> Option<&DynamicMap> {
        None
    }

    fn as_map_mut(&mut self) -> Option<&mut DynamicMap> {
        None
    }

    fn as_getter(&self) -> Option<&dyn Getter> {
        None
    }

    fn as_setter(&mut self) -> Option<&mut dyn Setter> {
        None
    }

    /// Introspectable fields
    fn as_fields(&self) -> Option<&dyn Fields> {
        None
    }

    fn as_fields_mut(&mut self) -> Option<&mut dyn Fields> {
        None
    }

    /// Name used in diagnostics
    fn object_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// PUBLIC ENTRY POINTS
// ============================================================================

/// Read property `key` (a bare key or a `$.` path)
pub fn get_property(ctx: &Context, node: &dyn Object, key: &str) -> Result<Value> {
    guarded("get_property", || {
        let path = Path::parse(key, ctx.limits())?;
        get_at(ctx, node, &path, 0)
    })
}

/// Write property `key` (a bare key or a `$.` path)
pub fn set_property(ctx: &Context, node: &mut dyn Object, key: &str, value: Value) -> Result<()> {
    guarded("set_property", || {
        let path = Path::parse(key, ctx.limits())?;
        set_at(ctx, node, &path, 0, value)
    })
}

/// Copy every tagged property of `dest` from `source`
///
/// Keys missing from the source, or holding null, are skipped. A map
/// destination receives every property of the source.
pub fn import_properties(ctx: &Context, dest: &mut dyn Object, source: &dyn Object) -> Result<()> {
    guarded("import_properties", || import(ctx, dest, source))
}

/// Property keys of a node in declaration (or insertion) order
pub fn enum_properties(node: &dyn Object) -> Result<Vec<String>> {
    guarded("enum_properties", || {
        if let Some(map) = node.as_map() {
            return Ok(map.keys().cloned().collect());
        }
        if let Some(fields) = node.as_fields() {
            return Ok(fields::field_keys(fields).map(str::to_owned).collect());
        }
        Err(DynamicError::unsupported(node.object_name(), "enumerable object"))
    })
}

/// Snapshot of a node as a plain value
///
/// Maps are cloned; introspected structures become maps of their tagged
/// fields, nested nodes included.
pub fn export(ctx: &Context, node: &dyn Object) -> Result<Value> {
    guarded("export", || snapshot(ctx, node))
}

// ============================================================================
// FAULT CONTAINMENT
// ============================================================================

fn panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

fn guarded<T>(operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let payload = panic_payload(payload.as_ref());
        warn!(operation, %payload, "recovered panic raised by capability code");
        Err(DynamicError::fault(operation, payload))
    })
}

// ============================================================================
// READ
// ============================================================================

/// Result of resolving one segment
enum Resolved<'a> {
    Borrowed(&'a Value),
    Owned(Value),
    Node(&'a dyn Object),
}

impl Resolved<'_> {
    fn into_value(self, ctx: &Context) -> Result<Value> {
        match self {
            Resolved::Borrowed(v) => Ok(v.clone()),
            Resolved::Owned(v) => Ok(v),
            Resolved::Node(node) => snapshot(ctx, node),
        }
    }
}

/// Resolve a single key against one node
fn lookup<'a>(ctx: &Context, node: &'a dyn Object, key: &str) -> Result<Resolved<'a>> {
    if let Some(map) = node.as_map() {
        return map
            .get(key)
            .map(Resolved::Borrowed)
            .ok_or_else(|| DynamicError::not_found(key));
    }

    if let Some(getter) = node.as_getter() {
        match getter.get_property(ctx, key) {
            Err(e) if e.is_not_found() => {
                trace!(key, node = node.object_name(), "getter has no such property");
            }
            other => return other.map(Resolved::Owned),
        }
    }

    if let Some(fields) = node.as_fields() {
        let field = fields::field_name(fields, key).and_then(|name| fields.field(name));
        return match field {
            Some(FieldRef::Value(v)) => Ok(Resolved::Owned(v)),
            Some(FieldRef::Atom(atom)) => atom.get(ctx).map(Resolved::Owned),
            Some(FieldRef::Node(child)) => Ok(Resolved::Node(child)),
            None => Err(DynamicError::not_found(key)),
        };
    }

    Err(DynamicError::not_found(key))
}

fn get_at(ctx: &Context, node: &dyn Object, path: &Path<'_>, depth: usize) -> Result<Value> {
    let found = lookup(ctx, node, path.segment(depth)).map_err(|e| path.widen(e))?;
    if path.is_last(depth) {
        return found.into_value(ctx);
    }
    match found {
        Resolved::Node(child) => get_at(ctx, child, path, depth + 1),
        Resolved::Borrowed(Value::Map(child)) => get_at(ctx, child, path, depth + 1),
        Resolved::Owned(Value::Map(child)) => get_at(ctx, &child, path, depth + 1),
        _ => Err(path.not_found()),
    }
}

fn snapshot(ctx: &Context, node: &dyn Object) -> Result<Value> {
    if let Some(map) = node.as_map() {
        return Ok(Value::Map(map.clone()));
    }
    if let Some(fields) = node.as_fields() {
        let mut out = DynamicMap::new();
        for info in fields.field_infos() {
            let Some(key) = info.key() else { continue };
            let value = match fields.field(info.name) {
                Some(FieldRef::Value(v)) => v,
                Some(FieldRef::Atom(atom)) => atom.get(ctx)?,
                Some(FieldRef::Node(child)) => snapshot(ctx, child)?,
                None => continue,
            };
            out.insert(key, value);
        }
        return Ok(Value::Map(out));
    }
    Err(DynamicError::unsupported(node.object_name(), "map"))
}

// ============================================================================
// WRITE
// ============================================================================

fn read_only(node: &dyn Object) -> DynamicError {
    DynamicError::invalid_destination(format!("{} is not writable", node.object_name()))
}

/// Store `value` under a single key of one node
fn store(ctx: &Context, node: &mut dyn Object, key: &str, value: Value) -> Result<()> {
    if let Some(map) = node.as_map_mut() {
        map.insert(key, value);
        return Ok(());
    }

    if let Some(setter) = node.as_setter() {
        match setter.set_property(ctx, key, value.clone()) {
            Err(e) if e.is_not_found() => {
                trace!(key, "setter has no such property");
            }
            other => return other,
        }
    }

    let name = node.object_name();
    if let Some(fields) = node.as_fields_mut() {
        let Some(field) = fields::field_name(fields, key) else {
            return Err(DynamicError::not_found(key));
        };
        return match fields.field_mut(field) {
            Some(FieldMut::Slot(slot)) => coerce::assign(slot, &value).map_err(|e| e.at_key(key)),
            Some(FieldMut::Atom(atom)) => atom.set(ctx, value),
            Some(FieldMut::Node(child)) => match &value {
                Value::Map(source) => import(ctx, child, source),
                other => Err(DynamicError::unsupported(other.type_name(), child.object_name())),
            },
            Some(FieldMut::ReadOnly) => Err(DynamicError::invalid_destination(format!(
                "field {key:?} of {name} is read-only"
            ))),
            None => Err(DynamicError::not_found(key)),
        };
    }

    if node.as_setter().is_some() {
        return Err(DynamicError::not_found(key));
    }
    Err(read_only(node))
}

fn set_at(
    ctx: &Context,
    node: &mut dyn Object,
    path: &Path<'_>,
    depth: usize,
    value: Value,
) -> Result<()> {
    let key = path.segment(depth);
    if path.is_last(depth) {
        return store(ctx, node, key, value).map_err(|e| path.widen(e));
    }

    if let Some(map) = node.as_map_mut() {
        let entry = map.entry(key).or_insert_with(|| {
            trace!(segment = key, path = path.as_str(), "creating intermediate map");
            Value::map()
        });
        return descend(ctx, entry, path, depth, value);
    }

    if node.as_setter().is_some() {
        return set_through_capability(ctx, node, path, depth, value);
    }

    if let Some(fields) = node.as_fields_mut() {
        let Some(field) = fields::field_name(fields, key) else {
            return Err(path.not_found());
        };
        return match fields.field_mut(field) {
            Some(FieldMut::Node(child)) => set_at(ctx, child, path, depth + 1, value),
            Some(FieldMut::Slot(Slot::Map(child))) => set_at(ctx, child, path, depth + 1, value),
            Some(FieldMut::Slot(Slot::Any(slot))) => {
                if slot.is_null() {
                    *slot = Value::map();
                }
                descend(ctx, slot, path, depth, value)
            }
            Some(_) => Err(DynamicError::path_conflict(path.as_str(), key)),
            None => Err(path.not_found()),
        };
    }

    Err(read_only(node))
}

/// Continue below `slot`, which must hold a map
fn descend(
    ctx: &Context,
    slot: &mut Value,
    path: &Path<'_>,
    depth: usize,
    value: Value,
) -> Result<()> {
    match slot {
        Value::Map(child) => set_at(ctx, child, path, depth + 1, value),
        _ => Err(DynamicError::path_conflict(path.as_str(), path.segment(depth))),
    }
}

/// Intermediate node behind a getter/setter pair: read the child, write
/// below it, then store it back
fn set_through_capability(
    ctx: &Context,
    node: &mut dyn Object,
    path: &Path<'_>,
    depth: usize,
    value: Value,
) -> Result<()> {
    let key = path.segment(depth);
    let current = match node.as_getter() {
        Some(getter) => match getter.get_property(ctx, key) {
            Ok(v) => v,
            Err(e) if e.is_not_found() => Value::Null,
            Err(e) => return Err(e),
        },
        None => return Err(read_only(node)),
    };

    let mut child = match current {
        Value::Map(m) => m,
        Value::Null => DynamicMap::new(),
        _ => return Err(DynamicError::path_conflict(path.as_str(), key)),
    };
    set_at(ctx, &mut child, path, depth + 1, value)?;

    match node.as_setter() {
        Some(setter) => setter.set_property(ctx, key, Value::Map(child)),
        None => Err(read_only(node)),
    }
}

// ============================================================================
// BULK
// ============================================================================

fn import(ctx: &Context, dest: &mut dyn Object, source: &dyn Object) -> Result<()> {
    if let Some(map) = dest.as_map_mut() {
        let Value::Map(incoming) = snapshot(ctx, source)? else {
            return Err(DynamicError::unsupported(source.object_name(), "map"));
        };
        for (key, value) in incoming {
            map.insert(key, value);
        }
        return Ok(());
    }

    let keys: Vec<&'static str> = match dest.as_fields() {
        Some(fields) => fields::field_keys(fields).collect(),
        None => return Err(read_only(dest)),
    };

    for key in keys {
        let value = match lookup(ctx, source, key) {
            Ok(found) => found.into_value(ctx)?,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        };
        if value.is_null() {
            continue;
        }
        store(ctx, dest, key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_fields;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Limits {
        retries: u8,
        verbose: bool,
    }

    impl_fields! {
        Limits {
            retries: value = "retries",
            verbose: value = "verbose,omitempty",
        }
    }

    #[derive(Debug, Default)]
    struct Service {
        name: String,
        port: u16,
        limits: Limits,
        labels: DynamicMap,
        extra: Value,
        id: u64,
        internal: String,
    }

    impl_fields! {
        Service {
            name: value = "name",
            port: value = "port",
            limits: node = "limits",
            labels: value = "labels",
            extra: value = "extra",
            id: readonly = "id",
            internal: value,
        }
    }

    fn ctx() -> Context {
        Context::background()
    }

    #[test]
    fn map_path_round_trip() {
        let mut map = DynamicMap::new();
        set_property(&ctx(), &mut map, "$.a.b.c", Value::I64(5)).unwrap();
        assert_eq!(get_property(&ctx(), &map, "$.a.b.c").unwrap(), Value::I64(5));
        assert!(map.get("a").and_then(Value::as_map).is_some());
    }

    #[test]
    fn map_path_refuses_to_overwrite_scalars() {
        let mut map = DynamicMap::new();
        set_property(&ctx(), &mut map, "$.a.b", Value::I64(1)).unwrap();
        let err = set_property(&ctx(), &mut map, "$.a.b.c", Value::I64(2)).unwrap_err();
        assert_eq!(err, DynamicError::path_conflict("$.a.b.c", "b"));
        assert_eq!(get_property(&ctx(), &map, "$.a.b").unwrap(), Value::I64(1));
    }

    #[test]
    fn missing_path_names_full_key() {
        let mut map = DynamicMap::new();
        map.insert("a", 1i64);
        let err = get_property(&ctx(), &map, "$.a.b").unwrap_err();
        assert_eq!(err, DynamicError::not_found("$.a.b"));
        let err = get_property(&ctx(), &map, "$.x.y").unwrap_err();
        assert_eq!(err, DynamicError::not_found("$.x.y"));
    }

    #[test]
    fn bare_key_skips_path_logic() {
        let mut map = DynamicMap::new();
        set_property(&ctx(), &mut map, "a.b", Value::Bool(true)).unwrap();
        assert_eq!(map.get("a.b"), Some(&Value::Bool(true)));
    }

    #[test]
    fn struct_fields_by_tag() {
        let mut svc = Service::default();
        set_property(&ctx(), &mut svc, "name", "api".into()).unwrap();
        set_property(&ctx(), &mut svc, "port", Value::number("8080").unwrap()).unwrap();
        assert_eq!(svc.name, "api");
        assert_eq!(svc.port, 8080);
        assert_eq!(get_property(&ctx(), &svc, "port").unwrap(), Value::U16(8080));

        let err = get_property(&ctx(), &svc, "internal").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn struct_conversion_failure_is_not_not_found() {
        let mut svc = Service::default();
        let err = set_property(&ctx(), &mut svc, "port", Value::I64(70_000)).unwrap_err();
        assert!(err.is_conversion());
        assert!(!err.is_not_found());
    }

    #[test]
    fn nested_nodes_are_walked_in_place() {
        let mut svc = Service::default();
        set_property(&ctx(), &mut svc, "$.limits.retries", Value::text("3")).unwrap();
        assert_eq!(svc.limits.retries, 3);
        assert_eq!(get_property(&ctx(), &svc, "$.limits.retries").unwrap(), Value::U8(3));

        set_property(&ctx(), &mut svc, "$.labels.team", "core".into()).unwrap();
        assert_eq!(svc.labels.get("team"), Some(&Value::text("core")));

        set_property(&ctx(), &mut svc, "$.extra.deep.er", Value::I32(1)).unwrap();
        assert_eq!(get_property(&ctx(), &svc, "$.extra.deep.er").unwrap(), Value::I32(1));

        let err = set_property(&ctx(), &mut svc, "$.name.x", Value::Null).unwrap_err();
        assert_eq!(err.code(), "DYNAMIC_PATH_CONFLICT");
    }

    #[test]
    fn node_field_from_map_imports() {
        let mut svc = Service::default();
        let mut incoming = DynamicMap::new();
        incoming.insert("retries", 9i64);
        incoming.insert("verbose", "true");
        set_property(&ctx(), &mut svc, "limits", Value::Map(incoming)).unwrap();
        assert_eq!(svc.limits.retries, 9);
        assert!(svc.limits.verbose);

        let snapshot = get_property(&ctx(), &svc, "limits").unwrap();
        let map = snapshot.as_map().unwrap();
        assert_eq!(map.get("retries"), Some(&Value::U8(9)));
    }

    #[test]
    fn read_only_field() {
        let mut svc = Service::default();
        let err = set_property(&ctx(), &mut svc, "id", Value::I64(1)).unwrap_err();
        assert_eq!(err.code(), "DYNAMIC_INVALID_DESTINATION");
    }

    #[test]
    fn enumerate_and_import() {
        let svc = Service::default();
        assert_eq!(
            enum_properties(&svc).unwrap(),
            ["name", "port", "limits", "labels", "extra", "id"]
        );

        let mut source = DynamicMap::new();
        source.insert("name", "billing");
        source.insert("port", Value::Null);
        let mut limits = DynamicMap::new();
        limits.insert("retries", 2i64);
        source.insert("limits", limits);

        let mut svc = Service {
            port: 1,
            ..Service::default()
        };
        import_properties(&ctx(), &mut svc, &source).unwrap();
        assert_eq!(svc.name, "billing");
        assert_eq!(svc.port, 1);
        assert_eq!(svc.limits.retries, 2);
    }

    #[test]
    fn export_struct() {
        let svc = Service {
            name: "x".to_owned(),
            ..Service::default()
        };
        let value = export(&ctx(), &svc).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Value::text("x")));
        assert!(map.get("limits").and_then(Value::as_map).is_some());
        assert!(map.get("internal").is_none());
    }

    /// Properties backed by a plain vector, exposed through Getter/Setter
    #[derive(Default)]
    struct Registry(Vec<(String, Value)>);

    impl Getter for Registry {
        fn get_property(&self, _ctx: &Context, name: &str) -> Result<Value> {
            self.0
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| DynamicError::not_found(name))
        }
    }

    impl Setter for Registry {
        fn set_property(&mut self, _ctx: &Context, name: &str, value: Value) -> Result<()> {
            self.0.retain(|(k, _)| k != name);
            self.0.push((name.to_owned(), value));
            Ok(())
        }
    }

    impl Object for Registry {
        fn as_getter(&self) -> Option<&dyn Getter> {
            Some(self)
        }

        fn as_setter(&mut self) -> Option<&mut dyn Setter> {
            Some(self)
        }
    }

    #[test]
    fn getter_setter_nodes() {
        let mut reg = Registry::default();
        set_property(&ctx(), &mut reg, "$.db.pool.size", Value::I64(4)).unwrap();
        assert_eq!(get_property(&ctx(), &reg, "$.db.pool.size").unwrap(), Value::I64(4));
        assert!(get_property(&ctx(), &reg, "nope").unwrap_err().is_not_found());
    }

    #[derive(Default)]
    struct Exploding;

    impl AtomGetter for Exploding {
        fn get(&self, _ctx: &Context) -> Result<Value> {
            panic!("sensor offline")
        }
    }

    impl AtomSetter for Exploding {
        fn set(&mut self, _ctx: &Context, _value: Value) -> Result<()> {
            panic!("{}", String::from("sensor is read-only"))
        }
    }

    #[derive(Default)]
    struct Probe {
        sensor: Exploding,
    }

    impl_fields! {
        Probe {
            sensor: atom = "sensor",
        }
    }

    #[test]
    fn panics_become_errors() {
        let mut probe = Probe::default();
        let err = get_property(&ctx(), &probe, "sensor").unwrap_err();
        assert_eq!(err, DynamicError::fault("get_property", "sensor offline"));

        let err = set_property(&ctx(), &mut probe, "sensor", Value::Null).unwrap_err();
        assert_eq!(err.code(), "DYNAMIC_FAULT_RECOVERED");
        assert!(err.to_string().contains("sensor is read-only"));
    }

    #[test]
    fn plain_object_is_not_writable() {
        struct Inert;
        impl Object for Inert {}
        let err = set_property(&ctx(), &mut Inert, "k", Value::Null).unwrap_err();
        assert_eq!(err.code(), "DYNAMIC_INVALID_DESTINATION");
        assert!(get_property(&ctx(), &Inert, "k").unwrap_err().is_not_found());
    }
}
