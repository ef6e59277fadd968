//! Form domain layer
//!
//! Components with their conditional properties, and the flattened state a
//! renderer works against.

mod component;
mod form_state;

pub use component::{Component, Property, VALUE_PROPERTY};
pub use form_state::{ComponentKey, FormState};
