//! Legacy `flow: [...]` array documents.
//!
//! The array shape predates both the `node` map and the start-node
//! convention: steps are listed in execution order, reference each other by
//! declared id, and the flow has no synthesized start node or entry wiring.

use serde_yaml::{Mapping, Sequence};

use super::{build_kind, get_str, infer};
use crate::flow::{EdgeKind, FlowEdge, FlowModel, FlowNode};
use crate::layout::auto_layout;

pub(super) fn parse_legacy(steps: &Sequence) -> FlowModel {
    let records: Vec<(String, &Mapping)> = steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| {
            let record = step.as_mapping()?;
            let id = get_str(record, "id")
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("step-{index}"));
            Some((id, record))
        })
        .collect();

    let mut nodes: Vec<FlowNode> = Vec::new();
    let mut edges: Vec<FlowEdge> = Vec::new();

    for (id, record) in &records {
        let kind = build_kind(infer::infer_node_type(record), record);
        let mut node = FlowNode::new(id.clone(), kind);
        node.data.label = get_str(record, "label");
        node.data.description = get_str(record, "description");
        node.data.only = get_str(record, "only");
        nodes.push(node);

        for (field, edge_kind) in [
            ("next", EdgeKind::Next),
            ("then", EdgeKind::Then),
            ("else", EdgeKind::Else),
            ("fail", EdgeKind::Fail),
        ] {
            if let Some(target) = get_str(record, field) {
                // References name declared step ids. A target matching no
                // step (even one matching another step's label) stays as
                // written; downstream consumers filter dangling edges if
                // they care.
                edges.push(FlowEdge::link(id.clone(), target, edge_kind));
            }
        }
    }

    let nodes = auto_layout(nodes, &edges);

    FlowModel {
        nodes,
        edges,
        ..FlowModel::empty()
    }
}
