//! Node-kind inference for FDL records.
//!
//! FDL records carry no explicit kind tag; the kind is recovered from which
//! fields a record carries, with URI schemes taking precedence. The rules are
//! ordered, and the order is part of the format's observable behavior.

use serde_yaml::{Mapping, Value};

use crate::flow::{NodeType, sniff_scheme};

/// Infers the node kind of a single FDL record.
///
/// A record that matches no rule is an `exec` node; there is no error case.
pub fn infer_node_type(record: &Mapping) -> NodeType {
    if let Some(exec) = record.get("exec").and_then(Value::as_str) {
        if !exec.is_empty() {
            return sniff_scheme(exec);
        }
    }

    for (field, kind) in [
        ("agent", NodeType::Agent),
        ("guard", NodeType::Guard),
        ("approval", NodeType::Approval),
        ("mcp", NodeType::Mcp),
        ("handoff", NodeType::Handoff),
    ] {
        if has(record, field) {
            return kind;
        }
    }

    if has(record, "when") && (has(record, "then") || has(record, "else")) {
        return NodeType::Condition;
    }
    if has(record, "case") {
        return NodeType::Switch;
    }
    if has(record, "wait") {
        return NodeType::Delay;
    }
    if has(record, "each") {
        return NodeType::Each;
    }
    if has(record, "loop") {
        return NodeType::Loop;
    }
    if has(record, "with") {
        return NodeType::Mapping;
    }

    NodeType::Exec
}

/// Field presence means present and not null, never truthiness.
fn has(record: &Mapping, field: &str) -> bool {
    matches!(record.get(field), Some(value) if !value.is_null())
}
