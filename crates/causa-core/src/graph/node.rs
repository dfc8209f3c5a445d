//! Graph nodes.
//!
//! A [`Node`] is a light handle: a shared name plus a [`NodeType`]. Identity,
//! equality, ordering and hashing are by name only, so two graphs built
//! independently over the same variables agree on their nodes without any
//! reconciliation step. Layout coordinates and attribute maps are owned by the
//! graph that contains the node (see [`NodeData`]).

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The role a variable plays in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeType {
    #[default]
    Measured,
    Latent,
    Error,
    Selection,
}

/// A named graph node.
#[derive(Clone)]
pub struct Node {
    name: Arc<str>,
    node_type: NodeType,
}

impl Node {
    /// Creates a measured node.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            node_type: NodeType::Measured,
        }
    }

    /// Creates a latent node.
    pub fn latent(name: impl AsRef<str>) -> Self {
        Self::new(name).with_type(NodeType::Latent)
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_latent(&self) -> bool {
        self.node_type == NodeType::Latent
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `str`'s Hash so `Borrow<str>` lookups work.
        self.name.as_ref().hash(state);
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Borrow<str> for Node {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Node {
    fn from(name: &str) -> Self {
        Node::new(name)
    }
}

/// A value stored in a node's attribute map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Flag(bool),
}

/// Per-node data owned by a graph: display position and attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    pub center_x: i32,
    pub center_y: i32,
    pub attributes: BTreeMap<String, AttributeValue>,
}
