//! Dynamic value coercion and generic property access.
//!
//! - [`coerce`]: best-effort conversion of a runtime [`Value`] into a typed
//!   destination, and total `to_*` conversions that report failure as `None`
//! - [`types`]: one capability object per semantic type, in the [`TYPES`]
//!   table
//! - [`accessor`]: get, set, import and enumerate properties over maps,
//!   getter/setter capabilities and tagged structures, with `$.a.b` paths
//! - [`DynamicMap`]: nested document container with deep merge, typed
//!   accessors, file loading and content fingerprints
//!
//! ```
//! use nebula_dynamic::prelude::*;
//!
//! let ctx = Context::background();
//! let mut settings = DynamicMap::from_slice(br#"{"retries":"3"}"#).unwrap();
//!
//! let mut retries = 0u8;
//! coerce::convert_assign(&mut retries, settings.get("retries").unwrap()).unwrap();
//! assert_eq!(retries, 3);
//!
//! accessor::set_property(&ctx, &mut settings, "$.backoff.base", "250ms".into()).unwrap();
//! assert_eq!(settings.to_duration(&ctx, "$.backoff.base", TimeDelta::zero()).num_milliseconds(), 250);
//! ```

#![warn(clippy::all)]

pub mod accessor;
pub mod coerce;
pub mod context;
pub mod document;
pub mod error;
pub mod limits;
pub mod map;
pub mod types;
pub mod value;

pub use accessor::{AtomGetter, AtomSetter, Getter, Object, Setter};
pub use context::Context;
pub use error::{DynamicError, Result};
pub use limits::AccessLimits;
pub use map::DynamicMap;
pub use types::lenient::{Boolean, Logical, Strings, Text};
pub use types::{TypeChecker, Typer, Types, TYPES};
pub use value::{Convertible, OpaqueValue, RawDocument, Value, ValueKind};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{accessor, coerce, impl_fields};
    pub use crate::{Context, DynamicError, DynamicMap, Object, Result, Value};
    pub use crate::{TypeChecker, Typer, TYPES};

    pub use chrono::TimeDelta;
}
