//! FDL document -> [`FlowModel`].
//!
//! Two document shapes are understood: the current `flow.node` map shape and
//! the legacy `flow: [...]` array shape. The entry point never fails past its
//! boundary: every structural problem degrades to an empty flow plus a
//! diagnostic message so the caller keeps its previous state.

pub mod infer;
mod legacy;

use ahash::AHashSet;
use serde_yaml::{Mapping, Value};

use crate::error::ParseError;
use crate::flow::{
    EdgeKind, FlowArgs, FlowEdge, FlowMeta, FlowModel, FlowNode, NodeKind, NodeType, Parameter,
    SwitchCase, TypeDef,
};
use crate::layout::auto_layout;
use crate::typestr::TypeAnnotation;

pub use infer::infer_node_type;

/// Result of reading an FDL document. `error` is set when the document could
/// not be read and `flow` is the empty default.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializeOutcome {
    pub flow: FlowModel,
    pub error: Option<String>,
}

/// Parses FDL document text into a flow.
///
/// Failures are reported through [`DeserializeOutcome::error`]; this function
/// never panics and never returns `Err`.
pub fn deserialize(text: &str) -> DeserializeOutcome {
    match parse_document(text) {
        Ok(flow) => DeserializeOutcome { flow, error: None },
        Err(err) => {
            log::debug!("FDL parse failed: {err}");
            DeserializeOutcome {
                flow: FlowModel::empty(),
                error: Some(err.to_string()),
            }
        }
    }
}

fn parse_document(text: &str) -> Result<FlowModel, ParseError> {
    let document: Value = serde_yaml::from_str(text)?;
    let root = document.as_mapping().ok_or(ParseError::NotAMapping)?;
    match root.get("flow") {
        Some(Value::Mapping(flow)) => Ok(parse_flow(flow)),
        Some(Value::Sequence(steps)) => Ok(legacy::parse_legacy(steps)),
        _ => Err(ParseError::MissingFlow),
    }
}

/// Parses the current `flow` mapping shape.
fn parse_flow(flow: &Mapping) -> FlowModel {
    let empty_record = Mapping::new();
    let mut nodes: Vec<FlowNode> = Vec::new();
    let mut edges: Vec<FlowEdge> = Vec::new();

    if let Some(node_map) = flow.get("node").and_then(Value::as_mapping) {
        for (id, record) in node_map {
            let Some(id) = id.as_str() else { continue };
            let record = record.as_mapping().unwrap_or(&empty_record);
            let kind = build_kind(infer::infer_node_type(record), record);
            let mut node = FlowNode::new(id, kind);
            node.data.label = get_str(record, "name");
            node.data.description = get_str(record, "desp");
            node.data.only = get_str(record, "only");
            nodes.push(node);
            collect_edges(id, record, &mut edges);
        }
    }

    let args_map = flow.get("args").and_then(Value::as_mapping);
    let mut args = args_map.map(parse_args).unwrap_or_default();

    // Synthesize the start node; its parameters mirror `args.in`.
    let start_id = format!("start-{}", unix_millis());
    let start = FlowNode::new(
        start_id.clone(),
        NodeKind::Start {
            parameters: args.inputs.clone(),
        },
    );

    let entries: Vec<String> = {
        let present: AHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let declared: Option<Vec<String>> = args_map
            .and_then(|a| a.get("entry"))
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(scalar_string).collect());
        match declared {
            Some(declared) => declared
                .into_iter()
                .filter(|id| present.contains(id.as_str()))
                .collect(),
            None => {
                // No declared entries: every node nothing points at is one.
                let targets: AHashSet<&str> = edges.iter().map(|e| e.target.as_str()).collect();
                nodes
                    .iter()
                    .filter(|n| !targets.contains(n.id.as_str()))
                    .map(|n| n.id.clone())
                    .collect()
            }
        }
    };
    for entry in &entries {
        edges.push(FlowEdge::link(start_id.clone(), entry.clone(), EdgeKind::Next));
    }
    args.entry = entries;

    let mut all_nodes = Vec::with_capacity(nodes.len() + 1);
    all_nodes.push(start);
    all_nodes.extend(nodes);
    let nodes = auto_layout(all_nodes, &edges);

    FlowModel {
        meta: FlowMeta {
            name: flow.get("name").and_then(scalar_string).unwrap_or_default(),
            description: get_str(flow, "desp"),
        },
        args: Some(args),
        vars: get_str(flow, "vars"),
        nodes,
        edges,
    }
}

/// Builds the typed node payload for an already-inferred kind.
pub(super) fn build_kind(kind: NodeType, record: &Mapping) -> NodeKind {
    match kind {
        // Start nodes are never spelled out in a document; they are
        // synthesized by the caller.
        NodeType::Start => NodeKind::Start {
            parameters: Vec::new(),
        },
        NodeType::Exec => NodeKind::Exec {
            exec: get_str(record, "exec").unwrap_or_default(),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Oss => NodeKind::Oss {
            oss: get_str(record, "exec").unwrap_or_default(),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Mq => NodeKind::Mq {
            mq: get_str(record, "exec").unwrap_or_default(),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Mail => NodeKind::Mail {
            mail: get_str(record, "exec").unwrap_or_default(),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Sms => NodeKind::Sms {
            sms: get_str(record, "exec").unwrap_or_default(),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Service => NodeKind::Service {
            service: get_str(record, "exec").unwrap_or_default(),
            operation: get_str(record, "operation"),
            method: get_str(record, "method"),
            args: opt_value(record, "args"),
            with: opt_value(record, "with"),
            sets: opt_value(record, "sets"),
        },
        NodeType::Mapping => NodeKind::Mapping {
            with: opt_value(record, "with").unwrap_or(Value::Null),
            sets: opt_value(record, "sets"),
        },
        NodeType::Condition => NodeKind::Condition {
            when: get_str(record, "when").unwrap_or_default(),
        },
        NodeType::Switch => NodeKind::Switch {
            cases: record
                .get("case")
                .and_then(Value::as_sequence)
                .map(|cases| {
                    cases
                        .iter()
                        .filter_map(Value::as_mapping)
                        .map(|case| SwitchCase {
                            when: get_str(case, "when").unwrap_or_default(),
                            then: get_str(case, "then").unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        },
        NodeType::Delay => NodeKind::Delay {
            wait: get_str(record, "wait").unwrap_or_default(),
        },
        NodeType::Each => NodeKind::Each {
            each: get_str(record, "each").unwrap_or_default(),
            vars: get_str(record, "vars"),
        },
        NodeType::Loop => NodeKind::Loop {
            vars: get_str(record, "loop").unwrap_or_default(),
            when: get_str(record, "when").unwrap_or_default(),
        },
        NodeType::Agent => {
            let block = record.get("agent").and_then(Value::as_mapping);
            NodeKind::Agent {
                model: block.and_then(|b| get_str(b, "model")),
                instructions: block.and_then(|b| get_str(b, "instructions")),
                tools: block.and_then(|b| b.get("tools")).map(string_list),
                output_format: block.and_then(|b| get_str(b, "outputFormat")),
                temperature: block.and_then(|b| b.get("temperature")).and_then(Value::as_f64),
            }
        }
        NodeType::Guard => {
            let block = record.get("guard").and_then(Value::as_mapping);
            NodeKind::Guard {
                guard_types: block
                    .and_then(|b| b.get("guardTypes"))
                    .map(string_list)
                    .unwrap_or_default(),
                action: block.and_then(|b| get_str(b, "action")).unwrap_or_default(),
                schema: block.and_then(|b| opt_value(b, "schema")),
                custom_expression: block.and_then(|b| get_str(b, "customExpression")),
            }
        }
        NodeType::Approval => {
            let block = record.get("approval").and_then(Value::as_mapping);
            NodeKind::Approval {
                title: block.and_then(|b| get_str(b, "title")).unwrap_or_default(),
                timeout: block.and_then(|b| get_str(b, "timeout")),
                timeout_action: block.and_then(|b| get_str(b, "timeoutAction")),
            }
        }
        NodeType::Mcp => {
            let block = record.get("mcp").and_then(Value::as_mapping);
            NodeKind::Mcp {
                server: block.and_then(|b| get_str(b, "server")).unwrap_or_default(),
                tool: block.and_then(|b| get_str(b, "tool")).unwrap_or_default(),
                auth_type: block.and_then(|b| get_str(b, "authType")),
                auth_key: block.and_then(|b| get_str(b, "authKey")),
            }
        }
        NodeType::Handoff => {
            let block = record.get("handoff").and_then(Value::as_mapping);
            NodeKind::Handoff {
                target: block.and_then(|b| get_str(b, "target")).unwrap_or_default(),
                context: block.and_then(|b| b.get("context")).map(string_list),
                resume_on: block.and_then(|b| get_str(b, "resumeOn")),
            }
        }
    }
}

/// Emits the edges a record declares.
///
/// `next` may be a comma-separated list of targets; `then`/`else`/`fail` each
/// reference a single target; every `case` entry adds a `then` edge.
pub(super) fn collect_edges(node_id: &str, record: &Mapping, edges: &mut Vec<FlowEdge>) {
    if let Some(next) = get_str(record, "next") {
        for target in next.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            edges.push(FlowEdge::link(node_id, target, EdgeKind::Next));
        }
    }
    for (field, kind) in [
        ("then", EdgeKind::Then),
        ("else", EdgeKind::Else),
        ("fail", EdgeKind::Fail),
    ] {
        if let Some(target) = get_str(record, field) {
            edges.push(FlowEdge::link(node_id, target, kind));
        }
    }
    if let Some(cases) = record.get("case").and_then(Value::as_sequence) {
        for case in cases.iter().filter_map(Value::as_mapping) {
            if let Some(target) = get_str(case, "then") {
                edges.push(FlowEdge::link(node_id, target, EdgeKind::Then));
            }
        }
    }
}

fn parse_args(args: &Mapping) -> FlowArgs {
    let mut flow_args = FlowArgs::default();

    if let Some(defs) = args.get("defs").and_then(Value::as_mapping) {
        for (name, fields) in defs {
            let Some(name) = name.as_str() else { continue };
            let Some(fields) = fields.as_mapping() else { continue };
            flow_args.defs.push(TypeDef {
                name: name.to_string(),
                fields: typed_fields(fields),
            });
        }
    }

    if let Some(inputs) = args.get("in").and_then(Value::as_mapping) {
        flow_args.inputs = typed_fields(inputs);
    }

    flow_args.outputs = parse_outputs(args.get("out"));
    flow_args
}

/// `{name: typeString}` pairs in declaration order.
fn typed_fields(fields: &Mapping) -> Vec<Parameter> {
    fields
        .iter()
        .filter_map(|(name, annotation)| {
            let name = name.as_str()?;
            let annotation = scalar_string(annotation)?;
            Some(Parameter::from_annotation(
                name,
                TypeAnnotation::parse(&annotation),
            ))
        })
        .collect()
}

/// `out` accepts a bare type string, an array of `{name, type}` records, or a
/// `{name: typeString}` mapping.
fn parse_outputs(out: Option<&Value>) -> Vec<Parameter> {
    match out {
        Some(Value::String(annotation)) => vec![Parameter::from_annotation(
            "",
            TypeAnnotation::parse(annotation),
        )],
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_mapping)
            .filter_map(|item| {
                let name = item.get("name").and_then(Value::as_str)?;
                let annotation = item.get("type").and_then(scalar_string)?;
                Some(Parameter::from_annotation(
                    name,
                    TypeAnnotation::parse(&annotation),
                ))
            })
            .collect(),
        Some(Value::Mapping(fields)) => typed_fields(fields),
        _ => Vec::new(),
    }
}

/// Renders a YAML scalar as a string; mappings and sequences yield `None`.
pub(super) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(super) fn get_str(record: &Mapping, field: &str) -> Option<String> {
    record.get(field).and_then(scalar_string)
}

fn opt_value(record: &Mapping, field: &str) -> Option<Value> {
    record.get(field).filter(|v| !v.is_null()).cloned()
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        _ => Vec::new(),
    }
}

fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}
