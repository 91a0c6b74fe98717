//! Node and plug identifier types.

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier for a node in a [`Graph`](crate::Graph).
///
/// Identifiers are arena indices: they stay valid for the life of the graph
/// and are never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("node#{_0}")]
#[display("node#{_0}")]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identifier for a plug in a [`Graph`](crate::Graph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("plug#{_0}")]
#[display("plug#{_0}")]
#[serde(transparent)]
pub struct PlugId(usize);

impl PlugId {
    /// Returns the arena index of this plug.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Parent of a plug: either a node or another plug.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display)]
pub enum Parent {
    /// The plug is a top-level plug of a node.
    #[debug("{_0:?}")]
    Node(NodeId),
    /// The plug is a child of a compound or array plug.
    #[debug("{_0:?}")]
    Plug(PlugId),
}

impl Parent {
    /// Returns the parent plug, if the parent is a plug.
    #[inline]
    pub fn plug(self) -> Option<PlugId> {
        match self {
            Self::Plug(plug) => Some(plug),
            Self::Node(_) => None,
        }
    }

    /// Returns the parent node, if the parent is a node.
    #[inline]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(node) => Some(node),
            Self::Plug(_) => None,
        }
    }
}
