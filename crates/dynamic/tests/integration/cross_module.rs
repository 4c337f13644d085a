//! Cross-module behaviour: coercer, type table, accessor, map and document
//! helpers working on the same data

use std::collections::BTreeMap;

use chrono::TimeDelta;
use nebula_dynamic::accessor::{self, get_property, set_property, AtomGetter, AtomSetter};
use nebula_dynamic::{
    coerce, document, impl_fields, AccessLimits, Context, Convertible, DynamicError, DynamicMap,
    Getter, Object, RawDocument, Result, Setter, Value, ValueKind, TYPES,
};
use pretty_assertions::assert_eq;

use crate::init_tracing;

// ==================== fixtures ====================

/// Environment variables exposed through getter/setter capabilities
#[derive(Debug, Default)]
struct Env(BTreeMap<String, String>);

impl Getter for Env {
    fn get_property(&self, _ctx: &Context, name: &str) -> Result<Value> {
        self.0
            .get(name)
            .map(|v| Value::text(v.as_str()))
            .ok_or_else(|| DynamicError::not_found(name))
    }
}

impl Setter for Env {
    fn set_property(&mut self, _ctx: &Context, name: &str, value: Value) -> Result<()> {
        let text = coerce::to_string(&value)
            .ok_or_else(|| DynamicError::unsupported(value.type_name(), "environment variable"))?;
        self.0.insert(name.to_owned(), text);
        Ok(())
    }
}

impl Object for Env {
    fn as_getter(&self) -> Option<&dyn Getter> {
        Some(self)
    }

    fn as_setter(&mut self) -> Option<&mut dyn Setter> {
        Some(self)
    }
}

/// Reading in tenths of a degree, exposed as a float
#[derive(Debug, Default)]
struct Thermometer {
    tenths: i64,
}

impl AtomGetter for Thermometer {
    fn get(&self, _ctx: &Context) -> Result<Value> {
        Ok(Value::F64(self.tenths as f64 / 10.0))
    }
}

impl AtomSetter for Thermometer {
    fn set(&mut self, _ctx: &Context, value: Value) -> Result<()> {
        let degrees = coerce::to_f64(&value)
            .ok_or_else(|| DynamicError::unsupported(value.type_name(), "temperature"))?;
        self.tenths = (degrees * 10.0).round() as i64;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Fuse;

impl AtomGetter for Fuse {
    fn get(&self, _ctx: &Context) -> Result<Value> {
        panic!("fuse blown")
    }
}

impl AtomSetter for Fuse {
    fn set(&mut self, _ctx: &Context, _value: Value) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Sensors {
    temp: Thermometer,
    fuse: Fuse,
}

impl_fields! {
    Sensors {
        temp: atom = "temp",
        fuse: atom = "fuse",
    }
}

#[derive(Debug, Default)]
struct Job {
    name: String,
    env: Env,
    sensors: Sensors,
    payload: RawDocument,
    attempts: Option<u8>,
}

impl_fields! {
    Job {
        name: value = "name",
        env: node = "env",
        sensors: node = "sensors",
        payload: value = "payload",
        attempts: value = "attempts,omitempty",
    }
}

/// Currency amount in cents that presents itself as text or a float
#[derive(Debug)]
struct Price(i64);

impl Convertible for Price {
    fn type_name(&self) -> &'static str {
        "price"
    }

    fn convert(&self, kind: ValueKind) -> Option<Value> {
        match kind {
            ValueKind::Text => Some(Value::text(format!("{}.{:02}", self.0 / 100, self.0 % 100))),
            ValueKind::F64 => Some(Value::F64(self.0 as f64 / 100.0)),
            _ => None,
        }
    }
}

fn ctx() -> Context {
    Context::background()
}

// ==================== laws ====================

#[test]
fn canonical_text() {
    assert_eq!(coerce::to_string(&Value::I64(777)).unwrap(), "777");
    assert_eq!(coerce::to_string(&Value::F64(777.0)).unwrap(), "7.77000000e+02");
    assert_eq!(coerce::to_string(&Value::Bool(true)).unwrap(), "1");
}

#[test]
fn float_round_trip() {
    assert_eq!(coerce::to_i64(&Value::F64(7.0)), Some(7));
    assert_eq!(coerce::to_i64(&Value::F64(7.5)), None);

    let mut n = 0i64;
    assert!(coerce::convert_assign(&mut n, &Value::F64(7.5)).is_err());
    coerce::convert_assign(&mut n, &Value::F64(-7.0)).unwrap();
    assert_eq!(n, -7);
}

#[test]
fn narrowing_is_range_checked() {
    assert_eq!(coerce::to_i8(&Value::I64(300)), None);
    assert_eq!(coerce::to_i8(&Value::I64(-128)), Some(-128));
    assert_eq!(coerce::to_u8(&Value::I64(-1)), None);
    assert_eq!(coerce::to_u64(&Value::text("18446744073709551615")), Some(u64::MAX));

    let mut small = 0i8;
    let err = coerce::convert_assign(&mut small, &Value::I64(300)).unwrap_err();
    assert!(err.is_conversion());
    assert_eq!(small, 0);
}

#[test]
fn path_round_trip_and_conflict() {
    init_tracing();
    let mut map = DynamicMap::new();
    set_property(&ctx(), &mut map, "$.a.b.c", Value::I64(5)).unwrap();
    assert_eq!(get_property(&ctx(), &map, "$.a.b.c").unwrap(), Value::I64(5));

    let b = map.scope("a").and_then(|a| a.scope("b")).unwrap();
    assert_eq!(b.keys().collect::<Vec<_>>(), ["c"]);

    set_property(&ctx(), &mut map, "$.a.b", Value::text("leaf")).unwrap();
    let err = set_property(&ctx(), &mut map, "$.a.b.c", Value::I64(6)).unwrap_err();
    assert_eq!(err.code(), "DYNAMIC_PATH_CONFLICT");
    assert_eq!(map.to_string(&ctx(), "$.a.b", String::new()), "leaf");
}

#[test]
fn missing_key_default() {
    let mut map = DynamicMap::new();
    map.new_scope("nested").insert("k", 1i64);

    let fallback = "fallback".to_owned();
    assert_eq!(TYPES.string.get(&ctx(), &map, "missing", fallback.clone()).unwrap(), "fallback");

    let err = TYPES.string.get(&ctx(), &map, "nested", fallback.clone()).unwrap_err();
    assert!(err.is_conversion());
    assert!(!err.is_not_found());
    assert_eq!(map.to_string(&ctx(), "nested", fallback), "fallback");
}

// ==================== mixed nodes ====================

#[test]
fn paths_cross_structs_capabilities_and_atoms() {
    init_tracing();
    let mut job = Job::default();
    set_property(&ctx(), &mut job, "$.env.HOME", "/srv".into()).unwrap();
    set_property(&ctx(), &mut job, "$.env.WORKERS", Value::U8(4)).unwrap();
    set_property(&ctx(), &mut job, "$.sensors.temp", "21.5".into()).unwrap();

    assert_eq!(job.env.0.get("WORKERS").map(String::as_str), Some("4"));
    assert_eq!(job.sensors.temp.tenths, 215);
    assert_eq!(get_property(&ctx(), &job, "$.env.HOME").unwrap(), Value::text("/srv"));
    assert_eq!(TYPES.float.get(&ctx(), &job, "$.sensors.temp", 0.0).unwrap(), 21.5);
    assert_eq!(TYPES.integer.get(&ctx(), &job, "$.env.WORKERS", 0).unwrap(), 4);
    assert!(get_property(&ctx(), &job, "$.env.PATH").unwrap_err().is_not_found());
}

#[test]
fn a_panicking_atom_deep_in_a_path_is_contained() {
    init_tracing();
    let job = Job::default();
    let err = get_property(&ctx(), &job, "$.sensors.fuse").unwrap_err();
    assert_eq!(err, DynamicError::fault("get_property", "fuse blown"));

    // a snapshot of the sensors reads the fuse too
    let err = accessor::export(&ctx(), &job.sensors).unwrap_err();
    assert_eq!(err.code(), "DYNAMIC_FAULT_RECOVERED");
}

#[test]
fn raw_and_optional_fields() {
    let mut job = Job::default();
    let raw = RawDocument::new(r#"{"ids":[1,2,3]}"#).unwrap();
    set_property(&ctx(), &mut job, "payload", Value::Raw(raw.clone())).unwrap();
    set_property(&ctx(), &mut job, "attempts", "3".into()).unwrap();
    assert_eq!(job.payload, raw);
    assert_eq!(job.attempts, Some(3));

    set_property(&ctx(), &mut job, "attempts", Value::Null).unwrap();
    assert_eq!(job.attempts, None);

    let err = set_property(&ctx(), &mut job, "attempts", Value::I64(1000)).unwrap_err();
    assert!(err.is_conversion());
    assert_eq!(job.attempts, None);
}

#[test]
fn opaque_values_convert_on_request() {
    let mut map = DynamicMap::new();
    map.insert("price", Value::opaque(Price(1999)));
    assert_eq!(map.to_string(&ctx(), "price", String::new()), "19.99");
    assert_eq!(map.to_float(&ctx(), "price", 0.0), 19.99);
    assert_eq!(map.to_integer(&ctx(), "price", -1), -1);
    assert!(map.get_integer(&ctx(), "price", 0).unwrap_err().is_conversion());
    assert!(TYPES.string.is(&Value::text("x")));
    assert!(!TYPES.string.is(map.get("price").unwrap()));
}

#[test]
fn strict_limits_bound_paths_and_documents() {
    let strict = Context::background().with_limits(AccessLimits::strict());
    let deep = format!("$.{}", vec!["k"; 20].join("."));

    let mut map = DynamicMap::new();
    let err = set_property(&strict, &mut map, &deep, Value::Null).unwrap_err();
    assert_eq!(err.code(), "DYNAMIC_LIMIT_EXCEEDED");
    assert!(map.is_empty());

    set_property(&ctx(), &mut map, &deep, Value::Bool(true)).unwrap();
    assert!(map.to_boolean(&ctx(), &deep, false));
    assert!(!map.to_boolean(&strict, &deep, false));

    let large = format!(r#"{{"blob":"{}"}}"#, "x".repeat(1 << 20));
    assert!(DynamicMap::from_slice_limited(large.as_bytes(), strict.limits()).is_err());
    assert!(DynamicMap::from_slice(large.as_bytes()).is_ok());
}

// ==================== maps and documents ====================

#[test]
fn document_merge_agrees_with_expand_by() {
    let site = br#"{"server":{"port":8443},"name":"edge"}"#;
    let defaults = br#"{"server":{"port":80,"host":"0.0.0.0"},"region":"eu"}"#;

    let merged = document::merge(&[&site[..], &defaults[..]]).unwrap();

    let mut expected = DynamicMap::from_slice(site).unwrap();
    expected.expand_by(&DynamicMap::from_slice(defaults).unwrap());
    assert!(document::is_equal(&merged, &expected.canonical_bytes().unwrap()));
    assert_eq!(DynamicMap::from_slice(&merged).unwrap().fingerprint().unwrap(), expected.fingerprint().unwrap());
}

#[test]
fn typed_round_trip_through_a_map() {
    let mut map = DynamicMap::new();
    map.set_float(&ctx(), "$.limits.ratio", 0.75).unwrap();
    map.set_duration(&ctx(), "$.limits.window", TimeDelta::minutes(5)).unwrap();
    map.set_json(&ctx(), "$.limits.extra", RawDocument::new("[true]").unwrap()).unwrap();

    let json = map.to_json_string().unwrap();
    let reloaded = DynamicMap::from_slice(json.as_bytes()).unwrap();

    assert_eq!(reloaded.get_float(&ctx(), "$.limits.ratio", 0.0).unwrap(), 0.75);
    // durations encode as nanoseconds
    assert_eq!(
        reloaded.get_duration(&ctx(), "$.limits.window", TimeDelta::zero()).unwrap(),
        TimeDelta::minutes(5)
    );
    assert_eq!(reloaded.get_json(&ctx(), "$.limits.extra", RawDocument::null()).unwrap().get(), "[true]");
    assert_eq!(reloaded.to_maps(&ctx(), "limits").len(), 0);
}
