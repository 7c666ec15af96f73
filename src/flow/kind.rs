use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::Parameter;

/// The closed set of node kinds a flow can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    Exec,
    Mapping,
    Condition,
    Switch,
    Delay,
    Each,
    Loop,
    Agent,
    Guard,
    Approval,
    Mcp,
    Handoff,
    Oss,
    Mq,
    Mail,
    Sms,
    Service,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Exec => "exec",
            NodeType::Mapping => "mapping",
            NodeType::Condition => "condition",
            NodeType::Switch => "switch",
            NodeType::Delay => "delay",
            NodeType::Each => "each",
            NodeType::Loop => "loop",
            NodeType::Agent => "agent",
            NodeType::Guard => "guard",
            NodeType::Approval => "approval",
            NodeType::Mcp => "mcp",
            NodeType::Handoff => "handoff",
            NodeType::Oss => "oss",
            NodeType::Mq => "mq",
            NodeType::Mail => "mail",
            NodeType::Sms => "sms",
            NodeType::Service => "service",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a URI-style prefix to the integration kind it denotes.
///
/// This table is the single source of truth for scheme sniffing; the
/// deserializer and the normalizer both go through it. Anything without a
/// recognized scheme (including `http://` and scheme-less commands) is a
/// plain `exec`.
pub fn sniff_scheme(uri: &str) -> NodeType {
    if uri.starts_with("oss://") {
        NodeType::Oss
    } else if uri.starts_with("mq://") {
        NodeType::Mq
    } else if uri.starts_with("svc://") {
        NodeType::Service
    } else if uri.starts_with("mail://") {
        NodeType::Mail
    } else if uri.starts_with("sms://") {
        NodeType::Sms
    } else {
        NodeType::Exec
    }
}

/// One branch of a `switch` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub when: String,
    pub then: String,
}

/// Variant-specific node payload, tagged by `nodeType`.
///
/// Expression strings (`when`, `only`, mapping bodies) are carried verbatim
/// and never interpreted here. `args`/`with`/`sets` payloads are kept as
/// opaque [`serde_yaml::Value`]s for the same reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Start {
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    Exec {
        exec: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Mapping {
        with: serde_yaml::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Condition {
        when: String,
    },
    Switch {
        #[serde(default)]
        cases: Vec<SwitchCase>,
    },
    Delay {
        wait: String,
    },
    Each {
        each: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vars: Option<String>,
    },
    Loop {
        vars: String,
        when: String,
    },
    Agent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instructions: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tools: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
    },
    Guard {
        #[serde(default)]
        guard_types: Vec<String>,
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_expression: Option<String>,
    },
    Approval {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_action: Option<String>,
    },
    Mcp {
        server: String,
        tool: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_key: Option<String>,
    },
    Handoff {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_on: Option<String>,
    },
    Oss {
        oss: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Mq {
        mq: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Mail {
        mail: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Sms {
        sms: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
    Service {
        service: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<serde_yaml::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sets: Option<serde_yaml::Value>,
    },
}

impl NodeKind {
    /// The discriminant of this payload.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Start { .. } => NodeType::Start,
            NodeKind::Exec { .. } => NodeType::Exec,
            NodeKind::Mapping { .. } => NodeType::Mapping,
            NodeKind::Condition { .. } => NodeType::Condition,
            NodeKind::Switch { .. } => NodeType::Switch,
            NodeKind::Delay { .. } => NodeType::Delay,
            NodeKind::Each { .. } => NodeType::Each,
            NodeKind::Loop { .. } => NodeType::Loop,
            NodeKind::Agent { .. } => NodeType::Agent,
            NodeKind::Guard { .. } => NodeType::Guard,
            NodeKind::Approval { .. } => NodeType::Approval,
            NodeKind::Mcp { .. } => NodeType::Mcp,
            NodeKind::Handoff { .. } => NodeType::Handoff,
            NodeKind::Oss { .. } => NodeType::Oss,
            NodeKind::Mq { .. } => NodeType::Mq,
            NodeKind::Mail { .. } => NodeType::Mail,
            NodeKind::Sms { .. } => NodeType::Sms,
            NodeKind::Service { .. } => NodeType::Service,
        }
    }

    /// The URI field of an integration kind, if this kind carries one.
    pub fn uri(&self) -> Option<&str> {
        match self {
            NodeKind::Exec { exec, .. } => Some(exec),
            NodeKind::Oss { oss, .. } => Some(oss),
            NodeKind::Mq { mq, .. } => Some(mq),
            NodeKind::Mail { mail, .. } => Some(mail),
            NodeKind::Sms { sms, .. } => Some(sms),
            NodeKind::Service { service, .. } => Some(service),
            _ => None,
        }
    }
}
