//! Semantic type capabilities.
//!
//! One capability object per semantic type, collected in the process-wide
//! [`TYPES`] table. Each pairs a coarse classifier ([`TypeChecker::is`]) with
//! the coercer and the property accessor:
//!
//! ```
//! use nebula_dynamic::{Context, DynamicMap, TYPES, Typer};
//!
//! let mut map = DynamicMap::new();
//! map.insert("port", "8080");
//!
//! let ctx = Context::background();
//! assert_eq!(TYPES.integer.get(&ctx, &map, "port", 80).unwrap(), 8080);
//! assert_eq!(TYPES.integer.get(&ctx, &map, "missing", 80).unwrap(), 80);
//! ```

pub mod lenient;

use chrono::TimeDelta;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::accessor::{self, Object};
use crate::coerce;
use crate::context::Context;
use crate::error::{DynamicError, Result};
use crate::value::{RawDocument, Value};

/// Coarse classification, independent of actual convertibility
pub trait TypeChecker: Send + Sync {
    /// Whether `value` is plausibly drawn from this semantic domain
    fn is(&self, value: &Value) -> bool;
}

/// A semantic type: classification, conversion and property lookup
pub trait Typer<T>: TypeChecker {
    /// Name used in error messages
    fn name(&self) -> &'static str;

    /// Convert, reporting failure as `None`
    fn try_cast(&self, value: &Value) -> Option<T>;

    /// Convert, substituting `default` on failure
    fn cast(&self, value: &Value, default: T) -> T {
        self.try_cast(value).unwrap_or(default)
    }

    /// Read property `name` from `node` and convert it
    ///
    /// An absent key or a null value yields `default`. A present value that
    /// does not convert is an error, never the default.
    fn get(&self, ctx: &Context, node: &dyn Object, name: &str, default: T) -> Result<T> {
        let value = match accessor::get_property(ctx, node, name) {
            Ok(value) => value,
            Err(e) if e.is_not_found() => return Ok(default),
            Err(e) => return Err(e),
        };
        if value.is_null() {
            return Ok(default);
        }
        self.try_cast(&value).ok_or_else(|| {
            debug!(key = name, to = self.name(), from = value.type_name(), "property does not convert");
            DynamicError::conversion(
                value.type_name(),
                self.name(),
                literal_of(&value),
                format!("cannot convert value into {} with key {name:?}", self.name()),
            )
        })
    }
}

/// Compact rendering of a value for diagnostics
fn literal_of(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}

// ==================== Capability objects ====================

macro_rules! typer {
    ($ty:ident, $target:ty, $name:literal, $convert:path, |$v:ident| $is:expr) => {
        #[doc = concat!("The `", $name, "` semantic type")]
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $ty;

        impl TypeChecker for $ty {
            fn is(&self, $v: &Value) -> bool {
                $is
            }
        }

        impl Typer<$target> for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn try_cast(&self, value: &Value) -> Option<$target> {
                $convert(value)
            }
        }
    };
}

typer!(BooleanType, bool, "boolean", coerce::to_bool, |v| matches!(v, Value::Bool(_)));

typer!(IntegerType, i64, "integer", coerce::to_i64, |v| matches!(
    v,
    Value::I8(_)
        | Value::I16(_)
        | Value::I32(_)
        | Value::I64(_)
        | Value::U8(_)
        | Value::U16(_)
        | Value::U32(_)
        | Value::U64(_)
        | Value::Number(_)
));

typer!(FloatType, f64, "float", coerce::to_f64, |v| matches!(
    v,
    Value::F32(_) | Value::F64(_) | Value::Number(_)
));

typer!(StringType, String, "string", coerce::to_string, |v| matches!(
    v,
    Value::Text(_) | Value::Number(_)
));

typer!(DurationType, TimeDelta, "duration", coerce::to_duration, |v| matches!(
    v,
    Value::Duration(_)
));

typer!(JsonType, RawDocument, "json", coerce::to_raw, |v| matches!(v, Value::Raw(_)));

// ==================== Registry ====================

/// The table of semantic types
pub struct Types {
    pub boolean: Box<dyn Typer<bool>>,
    pub integer: Box<dyn Typer<i64>>,
    pub float: Box<dyn Typer<f64>>,
    pub string: Box<dyn Typer<String>>,
    pub duration: Box<dyn Typer<TimeDelta>>,
    pub json: Box<dyn Typer<RawDocument>>,
}

impl Types {
    fn new() -> Self {
        Self {
            boolean: Box::new(BooleanType),
            integer: Box::new(IntegerType),
            float: Box::new(FloatType),
            string: Box::new(StringType),
            duration: Box::new(DurationType),
            json: Box::new(JsonType),
        }
    }
}

impl std::fmt::Debug for Types {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries([
                self.boolean.name(),
                self.integer.name(),
                self.float.name(),
                self.string.name(),
                self.duration.name(),
                self.json.name(),
            ])
            .finish()
    }
}

/// Process-wide semantic type table, built on first use
pub static TYPES: Lazy<Types> = Lazy::new(Types::new);
