//! # flowdl - FlowModel / FDL Workflow Compiler
//!
//! **flowdl** converts between an in-memory directed-graph workflow
//! representation ([`FlowModel`](flow::FlowModel)) and FDL, a YAML-shaped
//! declarative workflow definition language, in both directions. It also
//! computes a 2-D layered diagram layout for the graph and heals stale
//! node-type tags.
//!
//! ## Core Workflow
//!
//! 1.  **Deserialize**: [`deserialize`] parses FDL text (current or legacy
//!     shape) into a `FlowModel`, inferring node kinds from record fields and
//!     URI schemes, synthesizing the start node, and laying out the graph.
//! 2.  **Edit**: canvas and property-panel editors work on the `FlowModel`
//!     directly. Every transform here is a pure function; no value is
//!     mutated in place.
//! 3.  **Serialize**: [`serialize`] emits FDL text in best-effort
//!     topological order for export or persistence.
//! 4.  **Normalize**: [`normalize`] reconciles declared node kinds with URI
//!     schemes when loading flows written before a kind existed.
//!
//! ## Quick Start
//!
//! ```rust
//! use flowdl::prelude::*;
//!
//! # fn main() -> std::result::Result<(), SerializeError> {
//! let doc = r#"
//! flow:
//!   name: fetch-report
//!   args:
//!     in:
//!       userId: string
//!       limit: "number? = 10"
//!   node:
//!     pull:
//!       exec: "oss://reports/daily"
//!       next: render
//!     render:
//!       with: "{ body: item.html }"
//! "#;
//!
//! let outcome = deserialize(doc);
//! assert!(outcome.error.is_none());
//! assert_eq!(outcome.flow.meta.name, "fetch-report");
//!
//! // The graph round-trips back into a document.
//! let text = serialize(&outcome.flow)?;
//! assert!(text.contains("oss://reports/daily"));
//! # Ok(())
//! # }
//! ```
//!
//! Deserialization never fails past its boundary: malformed documents come
//! back as an empty flow plus a diagnostic string in
//! [`DeserializeOutcome::error`](deserializer::DeserializeOutcome), so an
//! editor can keep its previous state.

pub mod deserializer;
pub mod error;
pub mod flow;
pub mod layout;
pub mod normalizer;
pub mod prelude;
pub mod serializer;
pub mod typestr;

pub use deserializer::{DeserializeOutcome, deserialize};
pub use error::{ParseError, SerializeError};
pub use normalizer::normalize;
pub use serializer::serialize;
