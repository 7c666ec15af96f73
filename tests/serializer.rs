//! Tests for FDL document emission.
mod common;
use common::*;
use flowdl::prelude::*;
use serde_yaml::Value;

fn emit(flow: &FlowModel) -> Value {
    let text = serialize(flow).unwrap();
    serde_yaml::from_str(&text).unwrap()
}

fn flow_section(doc: &Value) -> &serde_yaml::Mapping {
    doc.as_mapping()
        .and_then(|root| root.get("flow"))
        .and_then(Value::as_mapping)
        .unwrap()
}

fn node_section(doc: &Value) -> &serde_yaml::Mapping {
    flow_section(doc).get("node").and_then(Value::as_mapping).unwrap()
}

#[test]
fn test_start_node_becomes_args() {
    let doc = emit(&simple_flow());
    let flow = flow_section(&doc);

    assert_eq!(flow.get("name").and_then(Value::as_str), Some("demo"));

    let args = flow.get("args").and_then(Value::as_mapping).unwrap();
    let inputs = args.get("in").and_then(Value::as_mapping).unwrap();
    assert_eq!(inputs.get("userId").and_then(Value::as_str), Some("string"));

    let entry = args.get("entry").and_then(Value::as_sequence).unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry[0].as_str(), Some("fetch"));

    // The start node itself is never emitted.
    assert!(node_section(&doc).get("start-1").is_none());
}

#[test]
fn test_optional_inputs_keep_markers_and_defaults() {
    let mut flow = simple_flow();
    flow.nodes[0] = start_node(
        "start-1",
        vec![
            parameter("userId", "string", true, None),
            parameter("limit", "number", false, Some("10")),
            parameter("tags", "string[]", true, None),
        ],
    );
    let doc = emit(&flow);
    let args = flow_section(&doc).get("args").and_then(Value::as_mapping).unwrap();
    let inputs = args.get("in").and_then(Value::as_mapping).unwrap();
    assert_eq!(inputs.get("limit").and_then(Value::as_str), Some("number? = 10"));
    assert_eq!(inputs.get("tags").and_then(Value::as_str), Some("string[]"));
}

#[test]
fn test_uri_kinds_all_emit_under_exec() {
    let doc = emit(&simple_flow());
    let nodes = node_section(&doc);
    let notify = nodes.get("notify").and_then(Value::as_mapping).unwrap();
    assert_eq!(
        notify.get("exec").and_then(Value::as_str),
        Some("mail://ops@example.com")
    );
}

#[test]
fn test_edges_map_to_record_fields() {
    let doc = emit(&simple_flow());
    let nodes = node_section(&doc);
    let fetch = nodes.get("fetch").and_then(Value::as_mapping).unwrap();
    assert_eq!(fetch.get("next").and_then(Value::as_str), Some("notify"));
    // Terminal node carries no successor field.
    let notify = nodes.get("notify").and_then(Value::as_mapping).unwrap();
    assert!(notify.get("next").is_none());
}

#[test]
fn test_emission_follows_depth_first_order() {
    // Stored order is b, a, c but the graph roots are a and c.
    let flow = FlowModel {
        nodes: vec![plain_node("b"), plain_node("a"), plain_node("c")],
        edges: vec![edge("a", "b", EdgeKind::Next)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let keys: Vec<&str> = node_section(&doc)
        .iter()
        .filter_map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn test_disconnected_nodes_are_appended() {
    let flow = FlowModel {
        nodes: vec![plain_node("a"), plain_node("island"), plain_node("b")],
        edges: vec![edge("a", "b", EdgeKind::Next)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let keys: Vec<&str> = node_section(&doc)
        .iter()
        .filter_map(|(k, _)| k.as_str())
        .collect();
    // `island` has no incoming edge, so it is a root and keeps array order
    // relative to the other root's subtree.
    assert_eq!(keys, vec!["a", "b", "island"]);
}

#[test]
fn test_cyclic_remainder_still_emitted() {
    // Pure cycle: no roots at all, both nodes land in the appendix pass.
    let flow = FlowModel {
        nodes: vec![plain_node("x"), plain_node("y")],
        edges: vec![edge("x", "y", EdgeKind::Next), edge("y", "x", EdgeKind::Next)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let nodes = node_section(&doc);
    assert_eq!(nodes.len(), 2);
}

#[test]
fn test_multiple_next_edges_last_one_wins() {
    let flow = FlowModel {
        nodes: vec![plain_node("x"), plain_node("y"), plain_node("z")],
        edges: vec![edge("x", "y", EdgeKind::Next), edge("x", "z", EdgeKind::Next)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let nodes = node_section(&doc);
    let x = nodes.get("x").and_then(Value::as_mapping).unwrap();
    assert_eq!(x.get("next").and_then(Value::as_str), Some("z"));
    // Both targets are still emitted.
    assert!(nodes.get("y").is_some());
    assert!(nodes.get("z").is_some());
}

#[test]
fn test_switch_emits_cases_without_stray_then() {
    let switch = FlowNode::new(
        "route",
        NodeKind::Switch {
            cases: vec![
                SwitchCase {
                    when: "x > 1".to_string(),
                    then: "n1".to_string(),
                },
                SwitchCase {
                    when: "x > 2".to_string(),
                    then: "n2".to_string(),
                },
            ],
        },
    );
    let flow = FlowModel {
        nodes: vec![switch, plain_node("n1"), plain_node("n2")],
        edges: vec![edge("route", "n1", EdgeKind::Then), edge("route", "n2", EdgeKind::Then)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let route = node_section(&doc).get("route").and_then(Value::as_mapping).unwrap();
    let cases = route.get("case").and_then(Value::as_sequence).unwrap();
    assert_eq!(cases.len(), 2);
    assert!(route.get("then").is_none());
}

#[test]
fn test_condition_then_else_fields() {
    let flow = FlowModel {
        nodes: vec![
            condition_node("route", "x > 0"),
            plain_node("yes"),
            plain_node("no"),
        ],
        edges: vec![
            edge("route", "yes", EdgeKind::Then),
            edge("route", "no", EdgeKind::Else),
        ],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let route = node_section(&doc).get("route").and_then(Value::as_mapping).unwrap();
    assert_eq!(route.get("when").and_then(Value::as_str), Some("x > 0"));
    assert_eq!(route.get("then").and_then(Value::as_str), Some("yes"));
    assert_eq!(route.get("else").and_then(Value::as_str), Some("no"));
}

#[test]
fn test_outputs_string_and_mapping_shapes() {
    let mut flow = simple_flow();
    flow.args = Some(FlowArgs {
        outputs: vec![parameter("", "Order[]", true, None)],
        ..FlowArgs::default()
    });
    let doc = emit(&flow);
    let args = flow_section(&doc).get("args").and_then(Value::as_mapping).unwrap();
    assert_eq!(args.get("out").and_then(Value::as_str), Some("Order[]"));

    flow.args = Some(FlowArgs {
        outputs: vec![
            parameter("total", "number", true, None),
            parameter("items", "Order[]", false, None),
        ],
        ..FlowArgs::default()
    });
    let doc = emit(&flow);
    let args = flow_section(&doc).get("args").and_then(Value::as_mapping).unwrap();
    let out = args.get("out").and_then(Value::as_mapping).unwrap();
    assert_eq!(out.get("total").and_then(Value::as_str), Some("number"));
    assert_eq!(out.get("items").and_then(Value::as_str), Some("Order[]?"));
}

#[test]
fn test_defs_vars_and_display_fields() {
    let mut flow = simple_flow();
    flow.meta.description = Some("daily report".to_string());
    flow.vars = Some("count = 0".to_string());
    flow.args = Some(FlowArgs {
        defs: vec![TypeDef {
            name: "Order".to_string(),
            fields: vec![
                parameter("id", "string", true, None),
                parameter("total", "number", false, None),
            ],
        }],
        ..FlowArgs::default()
    });
    flow.nodes[1].data.label = Some("Fetch items".to_string());
    flow.nodes[1].data.only = Some("env == 'prod'".to_string());

    let doc = emit(&flow);
    let section = flow_section(&doc);
    assert_eq!(section.get("desp").and_then(Value::as_str), Some("daily report"));
    assert_eq!(section.get("vars").and_then(Value::as_str), Some("count = 0"));

    let defs = section
        .get("args")
        .and_then(Value::as_mapping)
        .and_then(|a| a.get("defs"))
        .and_then(Value::as_mapping)
        .unwrap();
    let order = defs.get("Order").and_then(Value::as_mapping).unwrap();
    assert_eq!(order.get("total").and_then(Value::as_str), Some("number?"));

    let fetch = node_section(&doc).get("fetch").and_then(Value::as_mapping).unwrap();
    assert_eq!(fetch.get("name").and_then(Value::as_str), Some("Fetch items"));
    assert_eq!(fetch.get("only").and_then(Value::as_str), Some("env == 'prod'"));
}

#[test]
fn test_flow_without_start_uses_declared_inputs() {
    let flow = FlowModel {
        args: Some(FlowArgs {
            inputs: vec![parameter("id", "string", true, None)],
            ..FlowArgs::default()
        }),
        nodes: vec![plain_node("only")],
        edges: vec![],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let args = flow_section(&doc).get("args").and_then(Value::as_mapping).unwrap();
    let inputs = args.get("in").and_then(Value::as_mapping).unwrap();
    assert_eq!(inputs.get("id").and_then(Value::as_str), Some("string"));
    // No start node means no entry list.
    assert!(args.get("entry").is_none());
}

#[test]
fn test_dangling_edge_target_is_tolerated() {
    let flow = FlowModel {
        nodes: vec![plain_node("a")],
        edges: vec![edge("a", "ghost", EdgeKind::Next)],
        ..FlowModel::empty()
    };
    let doc = emit(&flow);
    let a = node_section(&doc).get("a").and_then(Value::as_mapping).unwrap();
    // The field still points at the missing id; no record is emitted for it.
    assert_eq!(a.get("next").and_then(Value::as_str), Some("ghost"));
    assert!(node_section(&doc).get("ghost").is_none());
}
