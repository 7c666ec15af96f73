//! Type-tag migration for integration nodes.
//!
//! Older flows tagged every integration node `exec` and kept the real kind
//! only in the URI scheme. Normalization recomputes the canonical kind from
//! the URI and rewrites the node when the tag disagrees, moving the URI into
//! the canonical field name. A second pass over normalized output is a no-op.

use serde_yaml::Value;

use crate::flow::{FlowModel, FlowNode, NodeData, NodeKind, NodeType, sniff_scheme};

/// Reconciles every node's declared kind with its URI scheme.
pub fn normalize(flow: FlowModel) -> FlowModel {
    FlowModel {
        nodes: flow.nodes.into_iter().map(normalize_node).collect(),
        ..flow
    }
}

fn normalize_node(node: FlowNode) -> FlowNode {
    let canonical = match node.data.kind.uri() {
        Some(uri) if !uri.is_empty() => sniff_scheme(uri),
        // Nodes without a URI field are left untouched.
        _ => return node,
    };
    if canonical == node.data.kind.node_type() {
        return node;
    }

    log::debug!(
        "retagging node '{}' from {} to {}",
        node.id,
        node.data.kind.node_type(),
        canonical
    );

    let FlowNode { id, position, data } = node;
    let NodeData {
        label,
        description,
        only,
        kind,
    } = data;
    let kind = match take_uri_fields(kind) {
        Ok(fields) => retag(canonical, fields),
        Err(kind) => kind,
    };

    FlowNode {
        id,
        position,
        data: NodeData {
            label,
            description,
            only,
            kind,
        },
    }
}

/// Fields shared by the URI-bearing kinds.
struct UriFields {
    uri: String,
    args: Option<Value>,
    with: Option<Value>,
    sets: Option<Value>,
    operation: Option<String>,
    method: Option<String>,
}

fn take_uri_fields(kind: NodeKind) -> Result<UriFields, NodeKind> {
    match kind {
        NodeKind::Exec { exec, args, with, sets } => Ok(UriFields {
            uri: exec,
            args,
            with,
            sets,
            operation: None,
            method: None,
        }),
        NodeKind::Oss { oss, args, with, sets } => Ok(UriFields {
            uri: oss,
            args,
            with,
            sets,
            operation: None,
            method: None,
        }),
        NodeKind::Mq { mq, args, with, sets } => Ok(UriFields {
            uri: mq,
            args,
            with,
            sets,
            operation: None,
            method: None,
        }),
        NodeKind::Mail { mail, args, with, sets } => Ok(UriFields {
            uri: mail,
            args,
            with,
            sets,
            operation: None,
            method: None,
        }),
        NodeKind::Sms { sms, args, with, sets } => Ok(UriFields {
            uri: sms,
            args,
            with,
            sets,
            operation: None,
            method: None,
        }),
        NodeKind::Service {
            service,
            operation,
            method,
            args,
            with,
            sets,
        } => Ok(UriFields {
            uri: service,
            args,
            with,
            sets,
            operation,
            method,
        }),
        other => Err(other),
    }
}

fn retag(canonical: NodeType, fields: UriFields) -> NodeKind {
    let UriFields {
        uri,
        args,
        with,
        sets,
        operation,
        method,
    } = fields;
    match canonical {
        NodeType::Oss => NodeKind::Oss { oss: uri, args, with, sets },
        NodeType::Mq => NodeKind::Mq { mq: uri, args, with, sets },
        NodeType::Mail => NodeKind::Mail { mail: uri, args, with, sets },
        NodeType::Sms => NodeKind::Sms { sms: uri, args, with, sets },
        NodeType::Service => NodeKind::Service {
            service: uri,
            operation,
            method,
            args,
            with,
            sets,
        },
        // Scheme sniffing only produces integration kinds; everything else
        // falls back to exec.
        _ => NodeKind::Exec { exec: uri, args, with, sets },
    }
}
