#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod cache;
mod config;
mod context;
mod dependency;
mod edit;
mod error;
mod eval;
mod event;
mod graph;
mod hash;
mod id;
mod node;
pub mod nodes;
mod plug;
mod value;
mod view;

#[doc(hidden)]
pub mod prelude;

pub use cache::CacheStatistics;
pub use config::{GraphConfig, GraphConfigBuilder, GraphConfigBuilderError};
pub use context::{Context, ContextScope};
pub use edit::GraphEdit;
pub use error::{BoxedError, GraphError, GraphResult};
pub use eval::Evaluator;
pub use event::{GraphEvent, GraphObserver};
pub use graph::Graph;
pub use hash::{ContentHash, ContentHasher};
pub use id::{NodeId, Parent, PlugId};
pub use node::NodeBehavior;
pub use plug::{Direction, PlugFlags, PlugKind, PlugTemplate};
pub use value::{Value, ValueType};
pub use view::GraphView;

/// Tracing target for graph mutations and event dispatch.
pub const TRACING_TARGET_EDIT: &str = "plexus_graph::edit";

/// Tracing target for plug evaluation.
pub const TRACING_TARGET_EVAL: &str = "plexus_graph::eval";

/// Tracing target for hash and value caching.
pub const TRACING_TARGET_CACHE: &str = "plexus_graph::cache";
