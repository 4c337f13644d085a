//! Field introspection for plain structures.
//!
//! Rust has no runtime reflection, so a structure describes its fields once,
//! statically, through [`Fields`]. The [`impl_fields!`](crate::impl_fields)
//! macro writes that description (and the [`Object`](super::Object) impl) from
//! a field list with serialization-style tags:
//!
//! ```
//! use nebula_dynamic::{Context, impl_fields, accessor};
//!
//! #[derive(Default)]
//! struct Listener {
//!     host: String,
//!     port: u16,
//!     scratch: Vec<u8>,
//! }
//!
//! impl_fields! {
//!     Listener {
//!         host: value = "host",
//!         port: value = "port,omitempty",
//!         scratch: value = "-",
//!     }
//! }
//!
//! let ctx = Context::background();
//! let mut listener = Listener::default();
//! accessor::set_property(&ctx, &mut listener, "port", "8443".into()).unwrap();
//! assert_eq!(listener.port, 8443);
//! assert_eq!(accessor::enum_properties(&listener).unwrap(), ["host", "port"]);
//! ```

use super::{AtomGetter, AtomSetter, Object};
use crate::coerce::Slot;
use crate::value::Value;

/// Static description of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Serialization tag, e.g. `"port,omitempty"`; empty when untagged
    pub tag: &'static str,
}

impl FieldInfo {
    pub const fn new(name: &'static str, tag: &'static str) -> Self {
        Self { name, tag }
    }

    /// Property key: the first comma-separated token of the tag
    ///
    /// `None` for untagged fields and fields tagged `-`.
    pub fn key(&self) -> Option<&'static str> {
        let key = self.tag.split(',').next().unwrap_or_default();
        match key {
            "" | "-" => None,
            key => Some(key),
        }
    }
}

/// Read access to one field
pub enum FieldRef<'a> {
    /// Plain value, copied out
    Value(Value),
    /// Field with its own read capability
    Atom(&'a dyn AtomGetter),
    /// Nested capability-bearing node
    Node(&'a dyn Object),
}

/// Write access to one field
pub enum FieldMut<'a> {
    /// Plain value, written through the coercer
    Slot(Slot<'a>),
    /// Field with its own write capability
    Atom(&'a mut dyn AtomSetter),
    /// Nested capability-bearing node
    Node(&'a mut dyn Object),
    /// Field that cannot be written
    ReadOnly,
}

/// Static field table plus per-field access
pub trait Fields {
    /// Fields in declaration order
    fn field_infos(&self) -> &'static [FieldInfo];

    /// Read the field with Rust name `name`
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Write the field with Rust name `name`
    fn field_mut(&mut self, name: &str) -> Option<FieldMut<'_>>;
}

/// Rust name of the field whose tag key is `key`
pub(crate) fn field_name(fields: &dyn Fields, key: &str) -> Option<&'static str> {
    fields
        .field_infos()
        .iter()
        .find(|info| info.key() == Some(key))
        .map(|info| info.name)
}

/// Tag keys in declaration order, skipping untagged and `-` fields
pub(crate) fn field_keys(fields: &dyn Fields) -> impl Iterator<Item = &'static str> {
    fields.field_infos().iter().filter_map(FieldInfo::key)
}

/// Implement [`Fields`] and [`Object`] for a struct
///
/// Each entry is `field: kind` or `field: kind = "tag"`, where `kind` is one of
///
/// - `value`: a plain field. Reads clone it into a [`Value`] (`Clone +
///   Into<Value>`), writes go through the coercer (`Assignable`).
/// - `readonly`: like `value`, but writes fail.
/// - `node`: a nested [`Object`], walked by paths and written in place.
/// - `atom`: a field implementing [`AtomGetter`] and [`AtomSetter`].
///
/// Untagged fields and fields tagged `"-"` are invisible to property access.
///
/// [`Object`]: crate::accessor::Object
/// [`AtomGetter`]: crate::accessor::AtomGetter
/// [`AtomSetter`]: crate::accessor::AtomSetter
#[macro_export]
macro_rules! impl_fields {
    // internal rules first: a failed `$ty:ty` parse would not fall through
    (@tag $tag:literal) => { $tag };
    (@tag) => { "" };

    (@ref value, $place:expr) => {
        $crate::accessor::FieldRef::Value($crate::Value::from(::core::clone::Clone::clone(&$place)))
    };
    (@ref readonly, $place:expr) => { $crate::impl_fields!(@ref value, $place) };
    (@ref node, $place:expr) => { $crate::accessor::FieldRef::Node(&$place) };
    (@ref atom, $place:expr) => { $crate::accessor::FieldRef::Atom(&$place) };

    (@mut value, $place:expr) => {
        $crate::accessor::FieldMut::Slot($crate::coerce::Assignable::slot(&mut $place))
    };
    (@mut readonly, $place:expr) => { $crate::accessor::FieldMut::ReadOnly };
    (@mut node, $place:expr) => { $crate::accessor::FieldMut::Node(&mut $place) };
    (@mut atom, $place:expr) => { $crate::accessor::FieldMut::Atom(&mut $place) };

    ($ty:ty { $($field:ident : $kind:ident $(= $tag:literal)?),* $(,)? }) => {
        impl $crate::accessor::Fields for $ty {
            fn field_infos(&self) -> &'static [$crate::accessor::FieldInfo] {
                const INFOS: &[$crate::accessor::FieldInfo] = &[
                    $($crate::accessor::FieldInfo::new(
                        stringify!($field),
                        $crate::impl_fields!(@tag $($tag)?),
                    )),*
                ];
                INFOS
            }

            fn field(&self, name: &str) -> Option<$crate::accessor::FieldRef<'_>> {
                $(
                    if name == stringify!($field) {
                        return Some($crate::impl_fields!(@ref $kind, self.$field));
                    }
                )*
                None
            }

            fn field_mut(&mut self, name: &str) -> Option<$crate::accessor::FieldMut<'_>> {
                $(
                    if name == stringify!($field) {
                        return Some($crate::impl_fields!(@mut $kind, self.$field));
                    }
                )*
                None
            }
        }

        impl $crate::accessor::Object for $ty {
            fn as_fields(&self) -> Option<&dyn $crate::accessor::Fields> {
                Some(self)
            }

            fn as_fields_mut(&mut self) -> Option<&mut dyn $crate::accessor::Fields> {
                Some(self)
            }
        }
    };
}
