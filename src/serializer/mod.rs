//! [`FlowModel`] -> FDL document text.
//!
//! Nodes are emitted in a best-effort topological order: a depth-first walk
//! from every root (non-start node with no incoming non-start edge), with
//! disconnected nodes appended in their original order. The start node is
//! never emitted; it surfaces as `args.in` and `args.entry` instead.

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use crate::error::SerializeError;
use crate::flow::{
    EdgeKind, FlowEdge, FlowModel, FlowNode, NodeKind, NodeType, Parameter,
};

/// Renders a flow into FDL text with stable indentation and no forced
/// quoting.
pub fn serialize(flow: &FlowModel) -> Result<String, SerializeError> {
    let start = flow.start_node();
    let start_id = start.map(|n| n.id.as_str());
    let entry_ids: Vec<&str> = flow
        .edges
        .iter()
        .filter(|e| Some(e.source.as_str()) == start_id && e.data.edge_type == EdgeKind::Next)
        .map(|e| e.target.as_str())
        .collect();

    let mut flow_map = Mapping::new();
    put_str(&mut flow_map, "name", &flow.meta.name);
    if let Some(description) = &flow.meta.description {
        if !description.is_empty() {
            put_str(&mut flow_map, "desp", description);
        }
    }

    let args = build_args(flow, start, &entry_ids);
    if !args.is_empty() {
        put(&mut flow_map, "args", Value::Mapping(args));
    }

    if let Some(vars) = &flow.vars {
        if !vars.is_empty() {
            put(&mut flow_map, "vars", vars.clone().into());
        }
    }

    let node_map = emit_nodes(flow, start_id);
    if !node_map.is_empty() {
        put(&mut flow_map, "node", Value::Mapping(node_map));
    }

    let mut root = Mapping::new();
    put(&mut root, "flow", Value::Mapping(flow_map));
    Ok(serde_yaml::to_string(&Value::Mapping(root))?)
}

fn build_args(flow: &FlowModel, start: Option<&FlowNode>, entry_ids: &[&str]) -> Mapping {
    let mut args = Mapping::new();
    let flow_args = flow.args.as_ref();

    if let Some(defs) = flow_args.map(|a| &a.defs) {
        if !defs.is_empty() {
            let mut defs_map = Mapping::new();
            for def in defs {
                let mut fields = Mapping::new();
                for field in &def.fields {
                    put_str(&mut fields, &field.name, &field.type_string());
                }
                put(&mut defs_map, &def.name, Value::Mapping(fields));
            }
            put(&mut args, "defs", Value::Mapping(defs_map));
        }
    }

    // `in` comes from the start node's parameters; flows without a start
    // node fall back to the declared inputs.
    let start_parameters = start.and_then(|node| match &node.data.kind {
        NodeKind::Start { parameters } => Some(parameters),
        _ => None,
    });
    let inputs = start_parameters.or(flow_args.map(|a| &a.inputs));
    if let Some(inputs) = inputs {
        if !inputs.is_empty() {
            let mut in_map = Mapping::new();
            for input in inputs {
                put_str(&mut in_map, &input.name, &input.type_string());
            }
            put(&mut args, "in", Value::Mapping(in_map));
        }
    }

    if let Some(outputs) = flow_args.map(|a| &a.outputs) {
        if let Some(out) = outputs_value(outputs) {
            put(&mut args, "out", out);
        }
    }

    if !entry_ids.is_empty() {
        let entries: Vec<Value> = entry_ids.iter().map(|id| Value::from(*id)).collect();
        put(&mut args, "entry", Value::Sequence(entries));
    }

    args
}

/// A single unnamed output keeps the bare string shape; anything else is a
/// `{name: typeString}` mapping.
fn outputs_value(outputs: &[Parameter]) -> Option<Value> {
    match outputs {
        [] => None,
        [only] if only.name.is_empty() => Some(only.type_string().into()),
        _ => {
            let mut out = Mapping::new();
            for output in outputs {
                put_str(&mut out, &output.name, &output.type_string());
            }
            Some(Value::Mapping(out))
        }
    }
}

fn emit_nodes(flow: &FlowModel, start_id: Option<&str>) -> Mapping {
    let order: Vec<&FlowNode> = flow
        .nodes
        .iter()
        .filter(|n| Some(n.id.as_str()) != start_id)
        .collect();
    let index: AHashMap<&str, &FlowNode> =
        order.iter().map(|n| (n.id.as_str(), *n)).collect();
    let outgoing: HashMap<&str, Vec<&FlowEdge>> = flow
        .edges
        .iter()
        .filter(|e| Some(e.source.as_str()) != start_id)
        .map(|e| (e.source.as_str(), e))
        .into_group_map();
    let has_incoming: AHashSet<&str> = flow
        .edges
        .iter()
        .filter(|e| Some(e.source.as_str()) != start_id)
        .map(|e| e.target.as_str())
        .collect();

    let mut emitted = Mapping::new();
    let mut visited: AHashSet<&str> = AHashSet::new();

    for root in order.iter().filter(|n| !has_incoming.contains(n.id.as_str())) {
        emit_subtree(root.id.as_str(), &index, &outgoing, &mut visited, &mut emitted);
    }

    // Whatever the walk never reached (disconnected parts, pure cycles)
    // lands at the end in original order.
    for node in &order {
        if visited.insert(node.id.as_str()) {
            let edges = outgoing.get(node.id.as_str()).map_or(&[][..], Vec::as_slice);
            put(&mut emitted, &node.id, Value::Mapping(node_record(node, edges)));
        }
    }

    emitted
}

/// Depth-first emission with an explicit stack; deep chains must not grow
/// the call stack.
fn emit_subtree<'a>(
    root: &'a str,
    index: &AHashMap<&str, &FlowNode>,
    outgoing: &'a HashMap<&str, Vec<&'a FlowEdge>>,
    visited: &mut AHashSet<&'a str>,
    emitted: &mut Mapping,
) {
    let mut stack: Vec<&str> = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        // Edge targets pointing outside the node set are tolerated and
        // simply not emitted.
        let Some(node) = index.get(id) else { continue };
        let edges = outgoing.get(id).map_or(&[][..], Vec::as_slice);
        put(emitted, id, Value::Mapping(node_record(node, edges)));
        for edge in edges.iter().rev() {
            if !visited.contains(edge.target.as_str()) {
                stack.push(edge.target.as_str());
            }
        }
    }
}

/// Builds one FDL record: display fields, variant fields, then one
/// `next`/`then`/`else`/`fail` field per outgoing edge. Multiple edges of the
/// same kind each set the field independently, so the last one wins.
fn node_record(node: &FlowNode, edges: &[&FlowEdge]) -> Mapping {
    let mut record = Mapping::new();
    if let Some(label) = &node.data.label {
        if !label.is_empty() {
            put_str(&mut record, "name", label);
        }
    }
    if let Some(description) = &node.data.description {
        if !description.is_empty() {
            put_str(&mut record, "desp", description);
        }
    }
    if let Some(only) = &node.data.only {
        if !only.is_empty() {
            put_str(&mut record, "only", only);
        }
    }

    match &node.data.kind {
        // The start node is excluded from emission by the caller.
        NodeKind::Start { .. } => {}
        NodeKind::Exec { exec, args, with, sets } => {
            put_str(&mut record, "exec", exec);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Oss { oss, args, with, sets } => {
            put_str(&mut record, "exec", oss);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Mq { mq, args, with, sets } => {
            put_str(&mut record, "exec", mq);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Mail { mail, args, with, sets } => {
            put_str(&mut record, "exec", mail);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Sms { sms, args, with, sets } => {
            put_str(&mut record, "exec", sms);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Service {
            service,
            operation,
            method,
            args,
            with,
            sets,
        } => {
            put_str(&mut record, "exec", service);
            put_opt_str(&mut record, "operation", operation);
            put_opt_str(&mut record, "method", method);
            put_opt(&mut record, "args", args);
            put_opt(&mut record, "with", with);
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Mapping { with, sets } => {
            put(&mut record, "with", with.clone());
            put_opt(&mut record, "sets", sets);
        }
        NodeKind::Condition { when } => {
            put_str(&mut record, "when", when);
        }
        NodeKind::Switch { cases } => {
            let cases: Vec<Value> = cases
                .iter()
                .map(|case| {
                    let mut entry = Mapping::new();
                    put_str(&mut entry, "when", &case.when);
                    put_str(&mut entry, "then", &case.then);
                    Value::Mapping(entry)
                })
                .collect();
            put(&mut record, "case", Value::Sequence(cases));
        }
        NodeKind::Delay { wait } => {
            put_str(&mut record, "wait", wait);
        }
        NodeKind::Each { each, vars } => {
            put_str(&mut record, "each", each);
            put_opt_str(&mut record, "vars", vars);
        }
        NodeKind::Loop { vars, when } => {
            put_str(&mut record, "loop", vars);
            put_str(&mut record, "when", when);
        }
        NodeKind::Agent {
            model,
            instructions,
            tools,
            output_format,
            temperature,
        } => {
            let mut block = Mapping::new();
            put_opt_str(&mut block, "model", model);
            put_opt_str(&mut block, "instructions", instructions);
            if let Some(tools) = tools {
                put(&mut block, "tools", string_sequence(tools));
            }
            put_opt_str(&mut block, "outputFormat", output_format);
            if let Some(temperature) = temperature {
                put(&mut block, "temperature", Value::from(*temperature));
            }
            put(&mut record, "agent", Value::Mapping(block));
        }
        NodeKind::Guard {
            guard_types,
            action,
            schema,
            custom_expression,
        } => {
            let mut block = Mapping::new();
            put(&mut block, "guardTypes", string_sequence(guard_types));
            put_str(&mut block, "action", action);
            put_opt(&mut block, "schema", schema);
            put_opt_str(&mut block, "customExpression", custom_expression);
            put(&mut record, "guard", Value::Mapping(block));
        }
        NodeKind::Approval {
            title,
            timeout,
            timeout_action,
        } => {
            let mut block = Mapping::new();
            put_str(&mut block, "title", title);
            put_opt_str(&mut block, "timeout", timeout);
            put_opt_str(&mut block, "timeoutAction", timeout_action);
            put(&mut record, "approval", Value::Mapping(block));
        }
        NodeKind::Mcp {
            server,
            tool,
            auth_type,
            auth_key,
        } => {
            let mut block = Mapping::new();
            put_str(&mut block, "server", server);
            put_str(&mut block, "tool", tool);
            put_opt_str(&mut block, "authType", auth_type);
            put_opt_str(&mut block, "authKey", auth_key);
            put(&mut record, "mcp", Value::Mapping(block));
        }
        NodeKind::Handoff {
            target,
            context,
            resume_on,
        } => {
            let mut block = Mapping::new();
            put_str(&mut block, "target", target);
            if let Some(context) = context {
                put(&mut block, "context", string_sequence(context));
            }
            put_opt_str(&mut block, "resumeOn", resume_on);
            put(&mut record, "handoff", Value::Mapping(block));
        }
    }

    // Switch targets already live in the case list; a generic `then` field
    // would re-emit them as extra edges on the way back in.
    let is_switch = node.data.kind.node_type() == NodeType::Switch;
    for edge in edges {
        if is_switch && edge.data.edge_type == EdgeKind::Then {
            continue;
        }
        put_str(&mut record, edge.data.edge_type.as_str(), &edge.target);
    }

    record
}

fn string_sequence(items: &[String]) -> Value {
    Value::Sequence(items.iter().map(|item| Value::from(item.as_str())).collect())
}

fn put(map: &mut Mapping, field: &str, value: Value) {
    map.insert(Value::from(field), value);
}

fn put_str(map: &mut Mapping, field: &str, value: &str) {
    put(map, field, Value::from(value));
}

fn put_opt_str(map: &mut Mapping, field: &str, value: &Option<String>) {
    if let Some(value) = value {
        put_str(map, field, value);
    }
}

fn put_opt(map: &mut Mapping, field: &str, value: &Option<Value>) {
    if let Some(value) = value {
        put(map, field, value.clone());
    }
}
