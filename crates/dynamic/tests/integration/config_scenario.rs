//! Layered configuration: defaults and site files merged, then bound to a
//! typed structure

use std::fs;

use chrono::TimeDelta;
use nebula_dynamic::accessor::{self, import_properties};
use nebula_dynamic::{impl_fields, Boolean, Context, DynamicMap, Logical, Strings, Value};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::init_tracing;

#[derive(Debug, Default)]
struct Server {
    host: String,
    port: u16,
    tls: Boolean,
    debug: Logical,
    timeout: TimeDelta,
    tags: Strings,
    workers: Option<u32>,
}

impl_fields! {
    Server {
        host: value = "host",
        port: value = "port",
        tls: value = "tls",
        debug: value = "debug",
        timeout: value = "timeout_ns",
        tags: value = "tags",
        workers: value = "workers,omitempty",
    }
}

const DEFAULTS: &str = r#"{
    "server": {
        "host": "0.0.0.0",
        "port": 80,
        "tls": false,
        "timeout_ns": 30000000000,
        "tags": ["default"]
    },
    "log": {"level": "info"}
}"#;

const SITE: &str = r#"{
    "server": {
        "port": "8443",
        "tls": "1",
        "debug": "0",
        "tags": "edge",
        "workers": 4
    },
    "log": {"level": "debug", "format": "json"}
}"#;

fn write_layers() -> (TempDir, Vec<std::path::PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site.json");
    let defaults = dir.path().join("defaults.json");
    fs::write(&site, SITE).unwrap();
    fs::write(&defaults, DEFAULTS).unwrap();
    let missing = dir.path().join("local.json");
    (dir, vec![site, missing, defaults])
}

#[test]
fn layered_files_bind_to_a_struct() {
    init_tracing();
    let (_dir, paths) = write_layers();
    let merged = DynamicMap::from_files(&paths).unwrap();

    let ctx = Context::background();
    assert_eq!(merged.to_string(&ctx, "$.log.level", String::new()), "debug");
    assert_eq!(merged.to_string(&ctx, "$.log.format", String::new()), "json");

    let mut server = Server::default();
    let section = merged.scope("server").unwrap();
    import_properties(&ctx, &mut server, section).unwrap();

    assert_eq!(server.host, "0.0.0.0");
    assert_eq!(server.port, 8443);
    assert_eq!(server.tls, Boolean(true));
    assert_eq!(server.debug, Logical::False);
    assert_eq!(server.timeout, TimeDelta::seconds(30));
    assert_eq!(server.tags.values(), ["edge"]);
    assert_eq!(server.workers, Some(4));
}

#[test]
fn bound_struct_exports_back_to_a_map() {
    init_tracing();
    let ctx = Context::background();
    let server = Server {
        host: "localhost".to_owned(),
        port: 8080,
        tags: Strings::new(vec!["a".to_owned(), "b".to_owned()]),
        ..Server::default()
    };

    let map = DynamicMap::from_fields(&ctx, &server).unwrap();
    assert_eq!(
        map.keys().map(String::as_str).collect::<Vec<_>>(),
        ["host", "port", "tls", "debug", "timeout_ns", "tags", "workers"]
    );
    assert_eq!(map.get_integer(&ctx, "port", 0).unwrap(), 8080);
    assert!(!map.get_boolean(&ctx, "tls", true).unwrap());
    // unknown tri-state and unset option export as null, so the default wins
    assert!(map.get_boolean(&ctx, "debug", true).unwrap());
    assert_eq!(map.get_integer(&ctx, "workers", 2).unwrap(), 2);
    assert_eq!(map.to_slice(&ctx, "tags").unwrap().len(), 2);
}

#[test]
fn a_broken_layer_aborts_the_load() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");
    fs::write(&good, r#"{"a":1}"#).unwrap();
    fs::write(&bad, r#"{"a":"#).unwrap();

    let err = DynamicMap::from_files([&good, &bad]).unwrap_err();
    assert_eq!(err.code(), "DYNAMIC_DECODE");
    assert!(err.to_string().contains("bad.json"));
}

#[test]
fn a_missing_single_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DynamicMap::from_file(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.code(), "DYNAMIC_IO");
}

#[test]
fn saved_documents_reload_with_the_same_fingerprint() {
    init_tracing();
    let (dir, paths) = write_layers();
    let merged = DynamicMap::from_files(&paths).unwrap();

    let out = dir.path().join("effective.json");
    merged.save_to_file(&out).unwrap();
    let reloaded = DynamicMap::from_file(&out).unwrap();

    assert_eq!(reloaded, merged);
    assert_eq!(reloaded.fingerprint().unwrap(), merged.fingerprint().unwrap());
    assert_eq!(fs::read(&out).unwrap(), merged.canonical_bytes().unwrap());
}

#[test]
fn settings_are_edited_through_paths() {
    let (_dir, paths) = write_layers();
    let mut merged = DynamicMap::from_files(&paths).unwrap();
    let ctx = Context::background();
    let before = merged.fingerprint().unwrap();

    merged.set_integer(&ctx, "$.server.port", 9000).unwrap();
    accessor::set_property(&ctx, &mut merged, "$.server.limits.rps", Value::U32(100)).unwrap();

    assert_ne!(merged.fingerprint().unwrap(), before);
    assert_eq!(merged.get_integer(&ctx, "$.server.limits.rps", 0).unwrap(), 100);
    assert!(merged.scope("server").unwrap().scope("limits").is_some());
}
