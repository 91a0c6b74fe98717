//! Switch error types.

use plexus_graph::{GraphError, NodeId, PlugId};
use thiserror::Error;

/// Result type for switch operations.
pub type SwitchResult<T> = Result<T, SwitchError>;

/// Errors raised by the switch node.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Setup was requested for a switch that already has its plugs.
    #[error("switch already has an \"{plug}\" plug")]
    AlreadySetUp {
        /// Name of the existing plug.
        plug: &'static str,
    },

    /// A plug has no same-named counterpart on the other side of the
    /// switch.
    #[error("plug {plug} has no counterpart named {name:?} on the opposite side of the switch")]
    ShapeMismatch {
        /// Plug being resolved.
        plug: PlugId,
        /// Child name missing on the opposite side.
        name: String,
    },

    /// The underlying graph operation failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl SwitchError {
    /// Converts this error for reporting through the graph, attributing
    /// switch-specific failures to `node`.
    pub fn into_graph_error(self, node: NodeId) -> GraphError {
        match self {
            Self::Graph(error) => error,
            other => GraphError::node_failed(node, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_set_up_message() {
        let error = SwitchError::AlreadySetUp { plug: "in" };
        assert_eq!(error.to_string(), "switch already has an \"in\" plug");
    }

    #[test]
    fn test_graph_errors_pass_through() {
        let plug = PlugId::from(4);
        let error = SwitchError::from(GraphError::UnknownPlug(plug));
        let converted = error.into_graph_error(NodeId::from(0));
        assert!(matches!(converted, GraphError::UnknownPlug(p) if p == plug));
    }

    #[test]
    fn test_shape_mismatch_becomes_node_failure() {
        let error = SwitchError::ShapeMismatch {
            plug: PlugId::from(2),
            name: "x".into(),
        };
        let converted = error.into_graph_error(NodeId::from(1));
        assert!(matches!(converted, GraphError::NodeFailed { node, .. } if node == NodeId::from(1)));
    }
}
