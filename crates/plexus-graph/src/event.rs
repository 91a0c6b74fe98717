//! Graph notifications.
//!
//! Every mutation made through a [`GraphEdit`](crate::GraphEdit) is
//! announced as a [`GraphEvent`]. Node behaviours receive the events that
//! concern their own node while the edit is in progress; external
//! [`GraphObserver`]s receive every event once the edit has completed and
//! the graph is readable again.

use derive_more::Display;

use crate::id::{Parent, PlugId};

/// A change to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GraphEvent {
    /// A plug was attached to a node or to another plug.
    #[display("child_added({parent}, {child})")]
    ChildAdded {
        /// New parent of the plug.
        parent: Parent,
        /// The attached plug.
        child: PlugId,
    },
    /// A plug was detached and destroyed.
    #[display("child_removed({parent}, {child})")]
    ChildRemoved {
        /// Former parent of the plug.
        parent: Parent,
        /// The destroyed plug. It no longer resolves in the graph.
        child: PlugId,
    },
    /// A value was stored on a plug.
    #[display("plug_set({_0})")]
    PlugSet(PlugId),
    /// The structural input of a plug changed.
    #[display("input_changed({_0})")]
    InputChanged(PlugId),
    /// The value of a plug may have changed.
    #[display("plug_dirtied({_0})")]
    PlugDirtied(PlugId),
}

impl GraphEvent {
    /// Returns the plug the event is about.
    pub fn plug(&self) -> PlugId {
        match self {
            Self::ChildAdded { child, .. } | Self::ChildRemoved { child, .. } => *child,
            Self::PlugSet(plug) | Self::InputChanged(plug) | Self::PlugDirtied(plug) => *plug,
        }
    }
}

/// Receives graph events after each edit completes.
///
/// Observers are notified after the graph's write lock is released.
pub trait GraphObserver: Send + Sync {
    /// Called once per event, in dispatch order.
    fn on_event(&self, event: &GraphEvent);
}
