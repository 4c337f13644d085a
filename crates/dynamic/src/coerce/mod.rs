//! Value coercion.
//!
//! Two surfaces over the same rules:
//!
//! - [`convert_assign`] stores a [`Value`](crate::Value) into any
//!   [`Assignable`] destination and explains failures with a
//!   [`DynamicError`](crate::DynamicError).
//! - The typed family (`to_bool`, `to_i64`, `to_string`, ...) answers
//!   `Option<T>` and never fails.
//!
//! Narrowing into an integer is always checked: the value must fit the
//! destination width, and a float must widen back to exactly itself. A double
//! stored as single precision rounds to nearest but must lie within the
//! single range.

mod assign;
mod slot;
pub(crate) mod text;
mod typed;

pub use assign::{assign, convert_assign};
pub use slot::{Assignable, OptionalSlot, Scan, Slot};
pub use text::{format_exponent, format_time, parse_bool, parse_duration, parse_time};
pub use typed::{
    to_bool, to_duration, to_f32, to_f64, to_i8, to_i16, to_i32, to_i64, to_raw, to_string,
    to_time, to_u8, to_u16, to_u32, to_u64,
};
