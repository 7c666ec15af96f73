use std::fmt;

use serde::{Deserialize, Serialize};

use super::kind::{NodeKind, NodeType};
use crate::typestr::TypeAnnotation;

/// Stored top-left position of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Flow-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named, typed argument slot.
///
/// The array marker of a type annotation is folded into `ty` (`"string[]"`)
/// so a parameter can carry it without a dedicated flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub required: bool,
    #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Parameter {
    /// Lowers a parsed type annotation into a parameter slot.
    pub fn from_annotation(name: impl Into<String>, annotation: TypeAnnotation) -> Self {
        let mut ty = annotation.ty;
        if annotation.is_array {
            ty.push_str("[]");
        }
        Parameter {
            name: name.into(),
            ty,
            required: !annotation.nullable,
            default_value: annotation.default_value,
        }
    }

    /// Formats the slot back into its compact `type['?'][' = 'default]` form.
    pub fn type_string(&self) -> String {
        let mut out = self.ty.clone();
        if !self.required {
            out.push('?');
        }
        if let Some(default) = &self.default_value {
            out.push_str(" = ");
            out.push_str(default);
        }
        out
    }
}

/// A named record type declared under `args.defs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub fields: Vec<Parameter>,
}

/// Declared flow arguments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowArgs {
    #[serde(default)]
    pub defs: Vec<TypeDef>,
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    #[serde(default)]
    pub outputs: Vec<Parameter>,
    #[serde(default)]
    pub entry: Vec<String>,
}

/// Payload shared by every node: display fields plus the tagged variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl NodeData {
    pub fn from_kind(kind: NodeKind) -> Self {
        NodeData {
            label: None,
            description: None,
            only: None,
            kind,
        }
    }
}

/// A single node of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        FlowNode {
            id: id.into(),
            position: Position::default(),
            data: NodeData::from_kind(kind),
        }
    }
}

/// The relation an edge expresses, matching the FDL record fields
/// `next`/`then`/`else`/`fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Next,
    Then,
    Else,
    Fail,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Next => "next",
            EdgeKind::Then => "then",
            EdgeKind::Else => "else",
            EdgeKind::Fail => "fail",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(rename = "edgeType")]
    pub edge_type: EdgeKind,
}

/// A directed connection between two nodes.
///
/// Endpoints are plain ids; an edge referencing an id absent from the node
/// set is tolerated everywhere in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceHandle", default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(rename = "targetHandle", default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    pub data: EdgeData,
}

impl FlowEdge {
    /// Builds an edge with the conventional `source-kind-target` id.
    pub fn link(
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: EdgeKind,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        FlowEdge {
            id: format!("{}-{}-{}", source, edge_type, target),
            source,
            target,
            source_handle: None,
            target_handle: None,
            data: EdgeData { edge_type },
        }
    }
}

/// The in-memory directed-graph representation of a workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowModel {
    #[serde(default)]
    pub meta: FlowMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<FlowArgs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<String>,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowModel {
    /// The default flow returned when a document cannot be read.
    pub fn empty() -> Self {
        FlowModel::default()
    }

    /// The flow's `start` node, if it has one.
    pub fn start_node(&self) -> Option<&FlowNode> {
        self.nodes
            .iter()
            .find(|n| n.data.kind.node_type() == NodeType::Start)
    }
}
