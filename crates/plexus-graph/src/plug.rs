//! Plug kinds, flags and templates.
//!
//! Plugs form a tree below each node. Leaves are usually value plugs;
//! interior plugs are compound plugs (fixed named children) or array plugs
//! (a growable list of elements that share one shape).

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::id::{NodeId, Parent, PlugId};
use crate::value::{Value, ValueType};

/// Direction of data flow through a plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The plug receives data from upstream.
    In,
    /// The plug provides data downstream.
    Out,
}

/// Behavioural markers attached to a plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlugFlags {
    /// The plug was created at runtime rather than by the node's
    /// constructor, and must be recreated when the node is rebuilt.
    pub dynamic: bool,
    /// The plug's value and connections are saved with the graph.
    pub serializable: bool,
}

impl PlugFlags {
    /// Both `dynamic` and `serializable`: created at runtime and saved with
    /// the graph.
    pub const DYNAMIC_SERIALIZABLE: Self = Self {
        dynamic: true,
        serializable: true,
    };
}

impl Default for PlugFlags {
    fn default() -> Self {
        Self {
            dynamic: false,
            serializable: true,
        }
    }
}

/// Kind of a plug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlugKind {
    /// Leaf plug holding a typed value.
    Value {
        /// Declared type of the value.
        value_type: ValueType,
        /// Value used until one is set.
        default: Value,
    },
    /// Plug with a fixed set of named children.
    Compound,
    /// Plug with a growable list of identically shaped elements.
    Array {
        /// Shape of each element.
        element: Box<PlugTemplate>,
        /// Minimum number of elements, at least one.
        min_size: usize,
        /// Maximum number of elements.
        max_size: usize,
    },
}

/// Detached description of a plug subtree.
///
/// Templates are used to create plugs and to mirror the shape of an
/// existing plug elsewhere in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlugTemplate {
    /// Name of the plug.
    pub name: String,
    /// Kind of the plug.
    pub kind: PlugKind,
    /// Flags of the plug.
    pub flags: PlugFlags,
    /// Children of a compound plug. Ignored for other kinds.
    pub children: Vec<PlugTemplate>,
}

impl PlugTemplate {
    /// Creates a value plug template.
    pub fn value(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            kind: PlugKind::Value {
                value_type: default.value_type(),
                default,
            },
            flags: PlugFlags::default(),
            children: Vec::new(),
        }
    }

    /// Creates a compound plug template.
    pub fn compound(name: impl Into<String>, children: Vec<PlugTemplate>) -> Self {
        Self {
            name: name.into(),
            kind: PlugKind::Compound,
            flags: PlugFlags::default(),
            children,
        }
    }

    /// Creates an array plug template.
    ///
    /// The element template's name, minus any trailing digits, is used as
    /// the prefix for element names (`in0`, `in1`, ...).
    pub fn array(
        name: impl Into<String>,
        element: PlugTemplate,
        min_size: usize,
        max_size: usize,
    ) -> Self {
        let min_size = min_size.max(1);
        Self {
            name: name.into(),
            kind: PlugKind::Array {
                element: Box::new(element),
                min_size,
                max_size: max_size.max(min_size),
            },
            flags: PlugFlags::default(),
            children: Vec::new(),
        }
    }

    /// Returns a copy of this template with a different name.
    pub fn counterpart(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns this template with `flags` applied to the plug itself.
    pub fn with_flags(mut self, flags: PlugFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns whether a plug created from this template has children.
    pub fn is_leaf(&self) -> bool {
        match &self.kind {
            PlugKind::Value { .. } => true,
            PlugKind::Compound => self.children.is_empty(),
            PlugKind::Array { .. } => false,
        }
    }
}

/// Returns the element name prefix for an array whose element template is
/// named `element_name`.
pub(crate) fn element_prefix(element_name: &str) -> &str {
    element_name.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Arena record for a live plug.
#[derive(Debug, Clone)]
pub(crate) struct PlugData {
    pub name: String,
    pub direction: Direction,
    pub node: NodeId,
    pub parent: Parent,
    pub kind: PlugKind,
    pub flags: PlugFlags,
    pub children: Vec<PlugId>,
    pub value: Option<Value>,
    /// Vertex of this plug in the connection graph.
    pub vertex: NodeIndex,
}

impl PlugData {
    pub fn value_type(&self) -> Option<ValueType> {
        match &self.kind {
            PlugKind::Value { value_type, .. } => Some(*value_type),
            _ => None,
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        match &self.kind {
            PlugKind::Value { default, .. } => Some(default),
            _ => None,
        }
    }
}
