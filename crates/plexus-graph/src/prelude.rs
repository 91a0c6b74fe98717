//! Convenient re-exports for common use.

pub use crate::nodes::{Add, ContextQuery};
pub use crate::{
    BoxedError, CacheStatistics, ContentHash, ContentHasher, Context, ContextScope, Direction,
    Evaluator, Graph, GraphConfig, GraphEdit, GraphError, GraphEvent, GraphObserver, GraphResult,
    GraphView, NodeBehavior, NodeId, Parent, PlugFlags, PlugId, PlugKind, PlugTemplate, Value,
    ValueType,
};
