//! Common test utilities for building flows and edges.
use flowdl::prelude::*;

#[allow(dead_code)]
pub fn parameter(name: &str, ty: &str, required: bool, default: Option<&str>) -> Parameter {
    Parameter {
        name: name.to_string(),
        ty: ty.to_string(),
        required,
        default_value: default.map(str::to_string),
    }
}

#[allow(dead_code)]
pub fn start_node(id: &str, parameters: Vec<Parameter>) -> FlowNode {
    FlowNode::new(id, NodeKind::Start { parameters })
}

#[allow(dead_code)]
pub fn exec_node(id: &str, uri: &str) -> FlowNode {
    FlowNode::new(
        id,
        NodeKind::Exec {
            exec: uri.to_string(),
            args: None,
            with: None,
            sets: None,
        },
    )
}

#[allow(dead_code)]
pub fn mail_node(id: &str, uri: &str) -> FlowNode {
    FlowNode::new(
        id,
        NodeKind::Mail {
            mail: uri.to_string(),
            args: None,
            with: None,
            sets: None,
        },
    )
}

#[allow(dead_code)]
pub fn condition_node(id: &str, when: &str) -> FlowNode {
    FlowNode::new(
        id,
        NodeKind::Condition {
            when: when.to_string(),
        },
    )
}

#[allow(dead_code)]
pub fn plain_node(id: &str) -> FlowNode {
    exec_node(id, "echo ok")
}

#[allow(dead_code)]
pub fn edge(source: &str, target: &str, kind: EdgeKind) -> FlowEdge {
    FlowEdge::link(source, target, kind)
}

/// `start -> fetch (exec) -> notify (mail)`, with one start parameter.
#[allow(dead_code)]
pub fn simple_flow() -> FlowModel {
    FlowModel {
        meta: FlowMeta {
            name: "demo".to_string(),
            description: None,
        },
        args: None,
        vars: None,
        nodes: vec![
            start_node("start-1", vec![parameter("userId", "string", true, None)]),
            exec_node("fetch", "https://api.example.com/items"),
            mail_node("notify", "mail://ops@example.com"),
        ],
        edges: vec![
            edge("start-1", "fetch", EdgeKind::Next),
            edge("fetch", "notify", EdgeKind::Next),
        ],
    }
}

/// Extracts `(source, target, kind)` triples for every edge not touching the
/// start node, sorted for comparison.
#[allow(dead_code)]
pub fn edge_triples(flow: &FlowModel) -> Vec<(String, String, EdgeKind)> {
    let start_id = flow.start_node().map(|n| n.id.clone());
    let mut triples: Vec<(String, String, EdgeKind)> = flow
        .edges
        .iter()
        .filter(|e| Some(&e.source) != start_id.as_ref())
        .map(|e| (e.source.clone(), e.target.clone(), e.data.edge_type))
        .collect();
    triples.sort_by(|a, b| (&a.0, &a.1, a.2.as_str()).cmp(&(&b.0, &b.1, b.2.as_str())));
    triples
}
