//! Built-in nodes.
//!
//! Each node type comes as a handle struct holding the identifiers of the
//! plugs it created, and a [`NodeBehavior`](crate::NodeBehavior)
//! implementation the graph calls back into.

mod add;
mod context_query;

pub use add::{Add, AddBehavior};
pub use context_query::{ContextQuery, ContextQueryBehavior};
