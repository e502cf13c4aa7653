//! Core crate of psxvm. This crate contains the small, self contained primitives that translated
//! PSX game code is built upon: hardware exact shifts, fixed point math, bit flags, sparse index
//! sets and interpolated values. It knows nothing about the emulated memory itself, that lives in
//! the `psxvm` crate.

pub mod fixed;
pub mod flags;
pub mod index_set;
pub mod interp;
pub mod shift;

mod util;

pub use fixed::{Angle, Fixed};
pub use flags::{Flags, Flags8, Flags16, Flags32, Flags64};
pub use index_set::FixedIndexSet;
pub use interp::{Clock, Interp, InterpAngle, InterpFixed};
pub use shift::Shift;
