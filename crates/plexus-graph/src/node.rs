//! Node behaviours.
//!
//! A node is a named owner of a plug tree. Nodes that compute values carry a
//! [`NodeBehavior`], which the framework consults for dependency
//! propagation, hashing, computation, connection validation and event
//! handling. Nodes without a behaviour only hold plugs.

use std::fmt;

use crate::context::Context;
use crate::edit::GraphEdit;
use crate::error::GraphResult;
use crate::eval::Evaluator;
use crate::event::GraphEvent;
use crate::hash::ContentHash;
use crate::id::{NodeId, PlugId};
use crate::value::Value;
use crate::view::GraphView;

/// Node-specific logic plugged into the graph framework.
///
/// Every method has a default implementation matching what the framework
/// does for a node that does not override it.
pub trait NodeBehavior: Send + Sync + fmt::Debug {
    /// Name identifying the kind of node. Part of the default hash.
    fn type_name(&self) -> &'static str;

    /// Whether the node performs real computation.
    ///
    /// Outputs of computing nodes are evaluated through [`hash`] and
    /// [`compute`]; their values may vary with the evaluation context.
    ///
    /// [`hash`]: NodeBehavior::hash
    /// [`compute`]: NodeBehavior::compute
    fn is_compute(&self) -> bool {
        true
    }

    /// Appends to `outputs` the plugs affected by a change to `input`.
    ///
    /// `outputs` already holds whatever the framework computed.
    fn affects(
        &self,
        view: &GraphView<'_>,
        node: NodeId,
        input: PlugId,
        outputs: &mut Vec<PlugId>,
    ) {
        let _ = (view, node, input, outputs);
    }

    /// Returns the hash of `output` under `context`.
    fn hash(
        &self,
        eval: &Evaluator<'_, '_>,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<ContentHash> {
        let _ = context;
        eval.default_hash(output)
    }

    /// Returns the value of `output` under `context`.
    fn compute(
        &self,
        eval: &Evaluator<'_, '_>,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<Value> {
        let _ = context;
        eval.default_value(output)
    }

    /// Returns whether `dst` may take `src` as its structural input.
    ///
    /// Called for plugs owned by this node, after the framework's own
    /// shape and type checks have passed.
    fn accepts_input(
        &self,
        view: &GraphView<'_>,
        node: NodeId,
        dst: PlugId,
        src: PlugId,
    ) -> bool {
        let _ = (view, node, dst, src);
        true
    }

    /// Reacts to an event concerning this node.
    ///
    /// The handler may edit the graph; resulting events are queued and
    /// dispatched after it returns.
    fn on_event(
        &self,
        edit: &mut GraphEdit<'_>,
        node: NodeId,
        event: &GraphEvent,
    ) -> GraphResult<()> {
        let _ = (edit, node, event);
        Ok(())
    }
}
