//! The canonical workflow graph model.
//!
//! [`FlowModel`] is the shared currency of the whole crate: the serializer
//! reads it, the deserializer produces it, and the normalizer and layout
//! engine map it to a new value. Nothing in this module is ever mutated in
//! place.

pub mod kind;
pub mod model;

pub use kind::*;
pub use model::*;
