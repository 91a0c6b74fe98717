//! Read access to a graph.

use std::ops::Deref;
use std::sync::{Arc, RwLockReadGuard};

use petgraph::Direction as EdgeDirection;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::NodeIndex;

use crate::config::GraphConfig;
use crate::context::Context;
use crate::dependency;
use crate::error::{GraphError, GraphResult};
use crate::eval::Evaluator;
use crate::graph::{GraphState, NodeData, Shared};
use crate::hash::ContentHash;
use crate::id::{NodeId, Parent, PlugId};
use crate::node::NodeBehavior;
use crate::plug::{Direction, PlugData, PlugFlags, PlugKind, PlugTemplate};
use crate::value::{Value, ValueType};

pub(crate) enum StateRef<'a> {
    Read(RwLockReadGuard<'a, GraphState>),
    Borrowed(&'a GraphState),
}

impl Deref for StateRef<'_> {
    type Target = GraphState;

    fn deref(&self) -> &GraphState {
        match self {
            Self::Read(guard) => guard,
            Self::Borrowed(state) => state,
        }
    }
}

/// Read-only view of a graph.
///
/// Obtained from [`Graph::read`](crate::Graph::read), which holds a shared
/// lock for the lifetime of the view, or from
/// [`GraphEdit::view`](crate::GraphEdit::view) during an edit. Navigation
/// methods return `None` or an empty slice for plugs and nodes that do not
/// exist rather than failing.
pub struct GraphView<'a> {
    state: StateRef<'a>,
    shared: &'a Shared,
}

impl<'a> GraphView<'a> {
    pub(crate) fn new(state: StateRef<'a>, shared: &'a Shared) -> Self {
        Self { state, shared }
    }

    pub(crate) fn shared(&self) -> &Shared {
        self.shared
    }

    pub(crate) fn plug_data(&self, plug: PlugId) -> Option<&PlugData> {
        self.state.plugs.get(plug.index()).and_then(Option::as_ref)
    }

    pub(crate) fn require(&self, plug: PlugId) -> GraphResult<&PlugData> {
        self.plug_data(plug).ok_or(GraphError::UnknownPlug(plug))
    }

    pub(crate) fn node_data(&self, node: NodeId) -> Option<&NodeData> {
        self.state.nodes.get(node.index())
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.generation
    }

    pub(crate) fn plug_watchers(&self, plug: PlugId) -> &[NodeId] {
        self.state
            .plug_watchers
            .get(&plug)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn child_watchers(&self, plug: PlugId) -> &[NodeId] {
        self.state
            .child_watchers
            .get(&plug)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the graph configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.shared.config
    }

    /// Returns whether `plug` refers to a live plug.
    pub fn contains_plug(&self, plug: PlugId) -> bool {
        self.plug_data(plug).is_some()
    }

    /// Returns the name of a node.
    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node_data(node).map(|data| data.name.as_str())
    }

    /// Returns the top-level plugs of a node, in creation order.
    pub fn node_plugs(&self, node: NodeId) -> &[PlugId] {
        self.node_data(node)
            .map(|data| data.plugs.as_slice())
            .unwrap_or_default()
    }

    /// Returns the behaviour of a node, if it has one.
    pub fn behavior(&self, node: NodeId) -> Option<&Arc<dyn NodeBehavior>> {
        self.node_data(node).and_then(|data| data.behavior.as_ref())
    }

    /// Returns whether a node performs real computation.
    pub fn is_compute_node(&self, node: NodeId) -> bool {
        self.behavior(node).is_some_and(|behavior| behavior.is_compute())
    }

    /// Returns the name of a plug.
    pub fn name(&self, plug: PlugId) -> Option<&str> {
        self.plug_data(plug).map(|data| data.name.as_str())
    }

    /// Returns the direction of a plug.
    pub fn direction(&self, plug: PlugId) -> Option<Direction> {
        self.plug_data(plug).map(|data| data.direction)
    }

    /// Returns the node owning a plug.
    pub fn node_of(&self, plug: PlugId) -> Option<NodeId> {
        self.plug_data(plug).map(|data| data.node)
    }

    /// Returns the parent of a plug.
    pub fn parent(&self, plug: PlugId) -> Option<Parent> {
        self.plug_data(plug).map(|data| data.parent)
    }

    /// Returns the parent of a plug when that parent is itself a plug.
    pub fn parent_plug(&self, plug: PlugId) -> Option<PlugId> {
        self.parent(plug).and_then(Parent::plug)
    }

    /// Returns the children of a plug, in order.
    pub fn children(&self, plug: PlugId) -> &[PlugId] {
        self.plug_data(plug)
            .map(|data| data.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the child of `plug` named `name`.
    pub fn child(&self, plug: PlugId, name: &str) -> Option<PlugId> {
        self.children(plug)
            .iter()
            .copied()
            .find(|child| self.name(*child) == Some(name))
    }

    /// Returns the top-level plug of `node` named `name`.
    pub fn node_child(&self, node: NodeId, name: &str) -> Option<PlugId> {
        self.node_plugs(node)
            .iter()
            .copied()
            .find(|plug| self.name(*plug) == Some(name))
    }

    /// Returns the child of `parent` named `name`.
    pub fn child_of(&self, parent: Parent, name: &str) -> Option<PlugId> {
        match parent {
            Parent::Node(node) => self.node_child(node, name),
            Parent::Plug(plug) => self.child(plug, name),
        }
    }

    /// Returns the kind of a plug.
    pub fn kind(&self, plug: PlugId) -> Option<&PlugKind> {
        self.plug_data(plug).map(|data| &data.kind)
    }

    /// Returns the flags of a plug.
    pub fn flags(&self, plug: PlugId) -> Option<PlugFlags> {
        self.plug_data(plug).map(|data| data.flags)
    }

    /// Returns the declared type of a value plug.
    pub fn value_type(&self, plug: PlugId) -> Option<ValueType> {
        self.plug_data(plug).and_then(PlugData::value_type)
    }

    /// Returns the default value of a value plug.
    pub fn default_value(&self, plug: PlugId) -> Option<&Value> {
        self.plug_data(plug).and_then(PlugData::default_value)
    }

    /// Returns the value stored on a value plug, falling back to its
    /// default. Does not evaluate inputs.
    pub fn stored_value(&self, plug: PlugId) -> Option<&Value> {
        let data = self.plug_data(plug)?;
        data.value.as_ref().or_else(|| data.default_value())
    }

    /// Returns the structural input of a plug.
    pub fn input(&self, plug: PlugId) -> Option<PlugId> {
        let vertex = self.plug_data(plug)?.vertex;
        self.neighbors(vertex, EdgeDirection::Incoming).next()
    }

    /// Returns the plugs taking `plug` as their input.
    pub fn outputs(&self, plug: PlugId) -> Vec<PlugId> {
        self.plug_data(plug)
            .map(|data| self.neighbors(data.vertex, EdgeDirection::Outgoing).collect())
            .unwrap_or_default()
    }

    fn neighbors(
        &self,
        vertex: NodeIndex,
        direction: EdgeDirection,
    ) -> impl Iterator<Item = PlugId> + '_ {
        let connections = &self.state.connections;
        connections
            .neighbors_directed(vertex, direction)
            .filter_map(move |neighbor| connections.node_weight(neighbor).copied())
    }

    /// Returns whether data already flows from `upstream` to `downstream`
    /// through structural connections. A plug reaches itself.
    pub(crate) fn reaches(&self, upstream: PlugId, downstream: PlugId) -> bool {
        let (Some(from), Some(to)) = (self.plug_data(upstream), self.plug_data(downstream)) else {
            return false;
        };
        has_path_connecting(&self.state.connections, from.vertex, to.vertex, None)
    }

    /// Follows structural inputs from `plug` to its ultimate source.
    ///
    /// Returns `plug` itself when it has no input.
    pub fn source(&self, plug: PlugId) -> PlugId {
        let mut current = plug;
        // Connections are acyclic, so the chain is bounded by the arena size.
        for _ in 0..self.state.plugs.len() {
            match self.input(current) {
                Some(input) => current = input,
                None => break,
            }
        }
        current
    }

    /// Returns whether `ancestor` is a strict ancestor of `plug`.
    pub fn is_ancestor(&self, ancestor: PlugId, plug: PlugId) -> bool {
        let mut current = self.parent_plug(plug);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent_plug(parent);
        }
        false
    }

    /// Returns the dotted path of `plug` relative to its node, for example
    /// `out.x`.
    pub fn relative_name(&self, plug: PlugId) -> String {
        let mut names = Vec::new();
        let mut current = Some(plug);
        while let Some(id) = current {
            let Some(data) = self.plug_data(id) else {
                break;
            };
            names.push(data.name.as_str());
            current = data.parent.plug();
        }
        names.reverse();
        names.join(".")
    }

    /// Returns the descendants of `plug` that have no children, in
    /// depth-first order, or `plug` itself when it has no children.
    pub fn leaves(&self, plug: PlugId) -> Vec<PlugId> {
        let mut leaves = Vec::new();
        let mut stack = vec![plug];
        while let Some(current) = stack.pop() {
            let children = self.children(current);
            if children.is_empty() {
                if self.contains_plug(current) {
                    leaves.push(current);
                }
            } else {
                stack.extend(children.iter().rev().copied());
            }
        }
        leaves
    }

    /// Returns `plug` and all of its descendants, parents before children.
    pub fn subtree(&self, plug: PlugId) -> Vec<PlugId> {
        let mut plugs = Vec::new();
        let mut stack = vec![plug];
        while let Some(current) = stack.pop() {
            if !self.contains_plug(current) {
                continue;
            }
            plugs.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        plugs
    }

    /// Returns whether the value of `plug` can differ between contexts.
    ///
    /// True when the plug's ultimate source is an output of a node that
    /// performs real computation; false for stored constants.
    pub fn varies_with_context(&self, plug: PlugId) -> bool {
        let source = self.source(plug);
        match self.plug_data(source) {
            Some(data) => data.direction == Direction::Out && self.is_compute_node(data.node),
            None => false,
        }
    }

    /// Captures the shape of `plug` as a template.
    pub fn template_of(&self, plug: PlugId) -> Option<PlugTemplate> {
        let data = self.plug_data(plug)?;
        let children = match data.kind {
            PlugKind::Compound => data
                .children
                .iter()
                .filter_map(|child| self.template_of(*child))
                .collect(),
            _ => Vec::new(),
        };

        Some(PlugTemplate {
            name: data.name.clone(),
            kind: data.kind.clone(),
            flags: data.flags,
            children,
        })
    }

    /// Checks that `src` has a shape and value types that `dst` can take as
    /// its input, ignoring directions and node rules.
    pub fn check_compatible(&self, dst: PlugId, src: PlugId) -> Result<(), String> {
        let mut pairs = vec![(dst, src)];
        while let Some((dst, src)) = pairs.pop() {
            let (Some(dst_data), Some(src_data)) = (self.plug_data(dst), self.plug_data(src))
            else {
                return Err("plug does not exist".into());
            };

            match (dst_data.value_type(), src_data.value_type()) {
                (Some(expected), Some(actual)) => {
                    if !actual.converts_to(expected) {
                        return Err(format!("cannot convert {actual} to {expected}"));
                    }
                }
                (None, None) => {
                    if dst_data.children.len() != src_data.children.len() {
                        return Err(format!(
                            "{} has {} children but {} has {}",
                            self.relative_name(dst),
                            dst_data.children.len(),
                            self.relative_name(src),
                            src_data.children.len(),
                        ));
                    }
                    pairs.extend(
                        dst_data
                            .children
                            .iter()
                            .copied()
                            .zip(src_data.children.iter().copied()),
                    );
                }
                _ => return Err("cannot connect a value plug to a compound plug".into()),
            }
        }
        Ok(())
    }

    /// Returns the plugs directly affected by a change to `plug`: plugs
    /// connected downstream of it, and for input plugs, whatever the owning
    /// node (and any node watching the plug) declares as affected.
    pub fn affected_by(&self, plug: PlugId) -> Vec<PlugId> {
        let Some(data) = self.plug_data(plug) else {
            return Vec::new();
        };

        let mut affected = self.outputs(plug);
        if data.direction == Direction::In {
            let owner = std::iter::once(data.node);
            for node in owner.chain(self.plug_watchers(plug).iter().copied()) {
                if let Some(behavior) = self.behavior(node) {
                    behavior.affects(self, node, plug, &mut affected);
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        affected.retain(|p| self.contains_plug(*p) && seen.insert(*p));
        affected
    }

    /// Returns every plug dirtied by a change to `plug`, including `plug`.
    pub fn dirtied_by(&self, plug: PlugId) -> Vec<PlugId> {
        dependency::dirty_closure(self, plug)
    }

    /// Returns a fresh evaluator over this view.
    pub fn evaluator(&self) -> Evaluator<'_, 'a> {
        Evaluator::new(self)
    }

    /// Returns the hash of `plug` under `context`.
    pub fn hash(&self, plug: PlugId, context: &Context) -> GraphResult<ContentHash> {
        self.evaluator().hash(plug, context)
    }

    /// Returns the value of `plug` under `context`.
    pub fn value(&self, plug: PlugId, context: &Context) -> GraphResult<Value> {
        self.evaluator().value(plug, context)
    }
}
