//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and functions so callers can
//! bring the whole surface in with one `use`.
//!
//! # Example
//!
//! ```rust
//! use flowdl::prelude::*;
//!
//! let outcome = deserialize("flow:\n  name: demo\n");
//! assert!(outcome.error.is_none());
//! let text = serialize(&outcome.flow).unwrap();
//! assert!(text.contains("demo"));
//! ```

// Core transforms
pub use crate::deserializer::{DeserializeOutcome, deserialize, infer_node_type};
pub use crate::layout::auto_layout;
pub use crate::normalizer::normalize;
pub use crate::serializer::serialize;

// Graph model
pub use crate::flow::{
    EdgeData, EdgeKind, FlowArgs, FlowEdge, FlowMeta, FlowModel, FlowNode, NodeData, NodeKind,
    NodeType, Parameter, Position, SwitchCase, TypeDef, sniff_scheme,
};

// Type-string codec
pub use crate::typestr::TypeAnnotation;

// Error types
pub use crate::error::{ParseError, SerializeError};
