//! Derived stores built from other stores, static values and initializers.

mod compose;

pub(crate) use compose::Composition;
pub use compose::{compose, Compose, Definition, Entry, Transform};
