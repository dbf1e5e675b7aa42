//! Serializable views of query and comparison results

use crate::node::Node;
use serde::{Deserialize, Serialize};
use xml_adapter_traits::{NodeKind, XmlAdapter};

/// Information about a node, detached from its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub kind: NodeKind,
    pub name: String,
    pub namespace_uri: Option<String>,
    /// Element ancestors; 0 for the root element
    pub depth: usize,
    pub value: Option<String>,
}

impl NodeInfo {
    pub fn from_node<A: XmlAdapter>(node: &Node<'_, A>) -> Self {
        Self {
            kind: node.kind(),
            name: node.name(),
            namespace_uri: node.namespace_uri(),
            depth: node.depth(),
            value: node.value(),
        }
    }
}

/// Output of one backend in a cross-backend comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOutput {
    pub backend: String,
    pub xml: String,
}

/// Whether every backend produced the same serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub agree: bool,
    pub outputs: Vec<BackendOutput>,
}

impl CheckReport {
    pub fn new(outputs: Vec<BackendOutput>) -> Self {
        let agree = outputs.windows(2).all(|pair| pair[0].xml == pair[1].xml);
        Self { agree, outputs }
    }
}
