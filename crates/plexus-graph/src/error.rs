//! Graph error types.

use thiserror::Error;

use crate::id::{NodeId, PlugId};
use crate::value::ValueType;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Node behaviours report their own failures through this type so the
/// evaluator can surface them without knowing their concrete error enums.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while editing or evaluating a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node ID does not refer to a node in this graph.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// A plug ID does not refer to a live plug in this graph.
    #[error("unknown plug {0}")]
    UnknownPlug(PlugId),

    /// A sibling with the same name already exists.
    #[error("{parent} already has a child named {name:?}")]
    DuplicateName {
        /// Description of the parent.
        parent: String,
        /// Conflicting name.
        name: String,
    },

    /// The plug is not a value plug.
    #[error("plug {0} does not hold a value")]
    NotAValuePlug(PlugId),

    /// A value could not be converted to the plug's type.
    #[error("plug {plug} expects {expected} but got {actual}")]
    TypeMismatch {
        /// Receiving plug.
        plug: PlugId,
        /// Declared type of the receiving plug.
        expected: ValueType,
        /// Type of the rejected value.
        actual: ValueType,
    },

    /// A value was set on a plug that takes its value from an input.
    #[error("cannot set the value of {0} while it has an input")]
    HasInput(PlugId),

    /// A structural connection was refused.
    #[error("plug {dst} does not accept input from {src}: {reason}")]
    InputRejected {
        /// Plug that would receive the connection.
        dst: PlugId,
        /// Proposed upstream plug.
        src: PlugId,
        /// Why the connection was refused.
        reason: String,
    },

    /// Evaluation re-entered a plug under the same context.
    #[error("dependency cycle detected while evaluating {plug}")]
    Cycle {
        /// Plug whose evaluation re-entered itself.
        plug: PlugId,
    },

    /// Evaluation recursed deeper than the configured limit.
    #[error("evaluation of {plug} exceeded the maximum depth of {limit}")]
    RecursionLimit {
        /// Plug being evaluated when the limit was hit.
        plug: PlugId,
        /// Configured maximum depth.
        limit: usize,
    },

    /// Event handlers kept producing events past the configured limit.
    #[error("event cascade exceeded {limit} events")]
    EventCascade {
        /// Configured maximum number of events per edit.
        limit: usize,
    },

    /// A node behaviour failed.
    #[error("node {node} failed: {source}")]
    NodeFailed {
        /// Node whose behaviour failed.
        node: NodeId,
        /// Underlying failure.
        #[source]
        source: BoxedError,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GraphError {
    /// Wraps a behaviour failure for `node`.
    pub fn node_failed(
        node: NodeId,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::NodeFailed {
            node,
            source: Box::new(source),
        }
    }
}
