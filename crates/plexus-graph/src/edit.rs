//! Exclusive edit sessions.
//!
//! Every mutation queues one or more [`GraphEvent`]s. Events are dispatched
//! in order once the mutating call has applied its change: the framework
//! maintains array sizes and dirty state, then hands the event to every
//! node behaviour concerned with it. Handlers may themselves edit the
//! graph; their events join the same queue, so a handler never observes a
//! half-applied change and the outermost call returns only once the queue
//! is empty.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLockWriteGuard};

use petgraph::Direction as EdgeDirection;
use petgraph::visit::EdgeRef;

use crate::TRACING_TARGET_EDIT;
use crate::error::{GraphError, GraphResult};
use crate::event::GraphEvent;
use crate::graph::{GraphState, NodeData, Shared};
use crate::id::{NodeId, Parent, PlugId};
use crate::node::NodeBehavior;
use crate::plug::{Direction, PlugData, PlugFlags, PlugKind, PlugTemplate, element_prefix};
use crate::value::Value;
use crate::view::{GraphView, StateRef};

type Connection = (PlugId, Option<PlugId>);

/// Exclusive access to a graph during [`Graph::edit`](crate::Graph::edit).
pub struct GraphEdit<'a> {
    state: RwLockWriteGuard<'a, GraphState>,
    shared: &'a Shared,
    pending: VecDeque<GraphEvent>,
    delivered: Vec<GraphEvent>,
    dirtied: HashSet<PlugId>,
    dispatching: bool,
    dispatched: usize,
}

impl<'a> GraphEdit<'a> {
    pub(crate) fn new(state: RwLockWriteGuard<'a, GraphState>, shared: &'a Shared) -> Self {
        Self {
            state,
            shared,
            pending: VecDeque::new(),
            delivered: Vec::new(),
            dirtied: HashSet::new(),
            dispatching: false,
            dispatched: 0,
        }
    }

    /// Returns a read-only view of the graph in its current state.
    pub fn view(&self) -> GraphView<'_> {
        GraphView::new(StateRef::Borrowed(&*self.state), self.shared)
    }

    fn data(&self, plug: PlugId) -> GraphResult<&PlugData> {
        self.state
            .plugs
            .get(plug.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::UnknownPlug(plug))
    }

    fn data_mut(&mut self, plug: PlugId) -> GraphResult<&mut PlugData> {
        self.state
            .plugs
            .get_mut(plug.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownPlug(plug))
    }

    fn node_mut(&mut self, node: NodeId) -> GraphResult<&mut NodeData> {
        self.state
            .nodes
            .get_mut(node.index())
            .ok_or(GraphError::UnknownNode(node))
    }

    fn touch(&mut self) {
        self.state.generation += 1;
    }

    /// Adds a node.
    ///
    /// Nodes without a behaviour only hold plugs; their outputs never vary
    /// with context.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        behavior: Option<Arc<dyn NodeBehavior>>,
    ) -> NodeId {
        let id = NodeId::from(self.state.nodes.len());
        let name = name.into();

        tracing::debug!(
            target: TRACING_TARGET_EDIT,
            node = %id,
            name = %name,
            kind = behavior.as_ref().map_or("plain", |b| b.type_name()),
            "Added node"
        );

        self.state.nodes.push(NodeData {
            name,
            plugs: Vec::new(),
            behavior,
        });
        self.touch();
        id
    }

    /// Creates a plug tree from `template` and attaches it to `parent`.
    ///
    /// Plugs added below another plug take that plug's direction and
    /// `direction` is ignored. Array plugs are created with their minimum
    /// number of elements.
    pub fn add_plug(
        &mut self,
        parent: Parent,
        direction: Direction,
        template: &PlugTemplate,
    ) -> GraphResult<PlugId> {
        let (node, direction) = match parent {
            Parent::Node(node) => {
                self.node_mut(node)?;
                (node, direction)
            }
            Parent::Plug(plug) => {
                let data = self.data(plug)?;
                (data.node, data.direction)
            }
        };

        if self.view().child_of(parent, &template.name).is_some() {
            return Err(GraphError::DuplicateName {
                parent: self.describe(parent),
                name: template.name.clone(),
            });
        }

        let id = self.create(parent, node, direction, template);
        match parent {
            Parent::Node(node) => self.node_mut(node)?.plugs.push(id),
            Parent::Plug(plug) => self.data_mut(plug)?.children.push(id),
        }
        self.touch();

        tracing::debug!(
            target: TRACING_TARGET_EDIT,
            plug = %id,
            name = %self.view().relative_name(id),
            direction = %direction,
            "Added plug"
        );

        self.pending.push_back(GraphEvent::ChildAdded { parent, child: id });
        self.flush()?;
        Ok(id)
    }

    fn create(
        &mut self,
        parent: Parent,
        node: NodeId,
        direction: Direction,
        template: &PlugTemplate,
    ) -> PlugId {
        let id = PlugId::from(self.state.plugs.len());
        let vertex = self.state.connections.add_node(id);
        self.state.plugs.push(Some(PlugData {
            name: template.name.clone(),
            direction,
            node,
            parent,
            kind: template.kind.clone(),
            flags: template.flags,
            children: Vec::new(),
            value: None,
            vertex,
        }));

        let children = match &template.kind {
            PlugKind::Value { .. } => Vec::new(),
            PlugKind::Compound => template.children.clone(),
            PlugKind::Array {
                element, min_size, ..
            } => {
                let prefix = element_prefix(&element.name);
                (0..*min_size)
                    .map(|i| element.counterpart(format!("{prefix}{i}")))
                    .collect()
            }
        };

        let ids: Vec<PlugId> = children
            .iter()
            .map(|child| self.create(Parent::Plug(id), node, direction, child))
            .collect();
        if let Some(Some(data)) = self.state.plugs.get_mut(id.index()) {
            data.children = ids;
        }
        id
    }

    fn describe(&self, parent: Parent) -> String {
        let view = self.view();
        match parent {
            Parent::Node(node) => view.node_name(node).unwrap_or_default().to_owned(),
            Parent::Plug(plug) => view.relative_name(plug),
        }
    }

    /// Detaches and destroys `plug` and its descendants.
    ///
    /// Connections into and out of the removed plugs are broken first;
    /// downstream plugs that lose their input receive
    /// [`GraphEvent::InputChanged`].
    pub fn remove_plug(&mut self, plug: PlugId) -> GraphResult<()> {
        let parent = self.data(plug)?.parent;
        let subtree = self.view().subtree(plug);
        let members: HashSet<PlugId> = subtree.iter().copied().collect();

        let disconnected: Vec<PlugId> = {
            let view = self.view();
            subtree
                .iter()
                .flat_map(|member| view.outputs(*member))
                .filter(|output| !members.contains(output))
                .collect()
        };

        match parent {
            Parent::Node(node) => self.node_mut(node)?.plugs.retain(|p| *p != plug),
            Parent::Plug(parent) => self.data_mut(parent)?.children.retain(|p| *p != plug),
        }

        tracing::debug!(
            target: TRACING_TARGET_EDIT,
            plug = %plug,
            name = %self.view().relative_name(plug),
            removed = subtree.len(),
            disconnected = disconnected.len(),
            "Removing plug"
        );

        for member in &subtree {
            if let Some(data) = self.state.plugs[member.index()].take() {
                self.state.connections.remove_node(data.vertex);
            }
            self.state.child_watchers.remove(member);
            self.state.plug_watchers.remove(member);
        }
        self.touch();

        self.pending
            .extend(disconnected.into_iter().map(GraphEvent::InputChanged));
        self.pending
            .push_back(GraphEvent::ChildRemoved { parent, child: plug });
        self.flush()
    }

    /// Stores a value on a value plug.
    ///
    /// The value is converted to the plug's declared type. Setting the
    /// value the plug already holds is a no-op.
    pub fn set_value(&mut self, plug: PlugId, value: impl Into<Value>) -> GraphResult<()> {
        let value = value.into();
        let data = self.data(plug)?;
        let expected = data.value_type().ok_or(GraphError::NotAValuePlug(plug))?;
        if self.view().input(plug).is_some() {
            return Err(GraphError::HasInput(plug));
        }

        let actual = value.value_type();
        let value = value.convert_to(expected).ok_or(GraphError::TypeMismatch {
            plug,
            expected,
            actual,
        })?;
        if data.value.as_ref().or_else(|| data.default_value()) == Some(&value) {
            return Ok(());
        }

        tracing::trace!(
            target: TRACING_TARGET_EDIT,
            plug = %plug,
            value = ?value,
            "Set value"
        );

        self.data_mut(plug)?.value = Some(value);
        self.touch();
        self.pending.push_back(GraphEvent::PlugSet(plug));
        self.flush()
    }

    /// Sets or clears the structural input of `dst`.
    ///
    /// Compound plugs are connected child by child. A connection is refused
    /// when the plugs' shapes or value types are incompatible, when an
    /// output would take input from another node, when it would close a
    /// loop of connections, or when the owning node rejects it. Nothing is
    /// changed when a connection is refused.
    pub fn set_input(&mut self, dst: PlugId, src: Option<PlugId>) -> GraphResult<()> {
        let connections = match src {
            Some(src) => self.connections(dst, src)?,
            None => {
                self.data(dst)?;
                let view = self.view();
                view.subtree(dst)
                    .into_iter()
                    .filter(|plug| view.input(*plug).is_some())
                    .map(|plug| (plug, None))
                    .collect()
            }
        };

        let changed: Vec<PlugId> = connections
            .into_iter()
            .filter_map(|(dst, src)| self.connect(dst, src).then_some(dst))
            .collect();
        if changed.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            target: TRACING_TARGET_EDIT,
            dst = %dst,
            src = ?src,
            plugs = changed.len(),
            "Input changed"
        );

        self.touch();
        self.pending
            .extend(changed.into_iter().map(GraphEvent::InputChanged));
        self.flush()
    }

    fn connections(&self, dst: PlugId, src: PlugId) -> GraphResult<Vec<Connection>> {
        let view = self.view();
        view.require(dst)?;
        view.require(src)?;
        let reject = |reason: String| GraphError::InputRejected { dst, src, reason };

        if dst == src || view.is_ancestor(dst, src) || view.is_ancestor(src, dst) {
            return Err(reject("a plug cannot take input from its own hierarchy".into()));
        }
        let node = view.node_of(dst).ok_or(GraphError::UnknownPlug(dst))?;
        if view.direction(dst) == Some(Direction::Out) && view.node_of(src) != Some(node) {
            return Err(reject(
                "an output only takes input from its own node".into(),
            ));
        }
        view.check_compatible(dst, src).map_err(reject)?;

        let mut pairs = Vec::new();
        let mut queue = VecDeque::from([(dst, src)]);
        while let Some((d, s)) = queue.pop_front() {
            pairs.push((d, s));
            queue.extend(
                view.children(d)
                    .iter()
                    .copied()
                    .zip(view.children(s).iter().copied()),
            );
        }

        for &(d, s) in &pairs {
            if view.reaches(d, s) {
                return Err(reject(format!(
                    "connecting {} would create a cycle",
                    view.relative_name(d)
                )));
            }
        }

        if let Some(behavior) = view.behavior(node) {
            for &(d, s) in &pairs {
                if !behavior.accepts_input(&view, node, d, s) {
                    return Err(reject(format!(
                        "{} refuses input to {}",
                        behavior.type_name(),
                        view.relative_name(d)
                    )));
                }
            }
        }

        Ok(pairs.into_iter().map(|(d, s)| (d, Some(s))).collect())
    }

    fn connect(&mut self, dst: PlugId, src: Option<PlugId>) -> bool {
        let (dst_vertex, src_vertex) = {
            let view = self.view();
            if view.input(dst) == src {
                return false;
            }
            let Ok(data) = view.require(dst) else {
                return false;
            };
            let src_vertex = match src.map(|src| view.require(src)) {
                Some(Ok(upstream)) => Some(upstream.vertex),
                Some(Err(_)) => return false,
                None => None,
            };
            (data.vertex, src_vertex)
        };

        let connections = &mut self.state.connections;
        let previous: Vec<_> = connections
            .edges_directed(dst_vertex, EdgeDirection::Incoming)
            .map(|edge| edge.id())
            .collect();
        for edge in previous {
            connections.remove_edge(edge);
        }
        if let Some(src_vertex) = src_vertex {
            connections.add_edge(src_vertex, dst_vertex, ());
        }
        true
    }

    /// Replaces the flags of a plug.
    pub fn set_flags(&mut self, plug: PlugId, flags: PlugFlags) -> GraphResult<()> {
        self.data_mut(plug)?.flags = flags;
        self.touch();
        Ok(())
    }

    /// Delivers child events of `plug` to `node`.
    pub fn watch_children(&mut self, plug: PlugId, node: NodeId) -> GraphResult<()> {
        self.data(plug)?;
        self.node_mut(node)?;
        let watchers = self.state.child_watchers.entry(plug).or_default();
        if !watchers.contains(&node) {
            watchers.push(node);
        }
        Ok(())
    }

    /// Delivers value and input events of `plug` to `node`, and lets `node`
    /// declare what a change to `plug` affects.
    pub fn watch_plug(&mut self, plug: PlugId, node: NodeId) -> GraphResult<()> {
        self.data(plug)?;
        self.node_mut(node)?;
        let watchers = self.state.plug_watchers.entry(plug).or_default();
        if !watchers.contains(&node) {
            watchers.push(node);
        }
        Ok(())
    }

    /// Dispatches queued events until the queue is empty.
    ///
    /// Calls made while events are already being dispatched return at once;
    /// the outermost call drains what they queued.
    pub(crate) fn flush(&mut self) -> GraphResult<()> {
        if self.dispatching {
            return Ok(());
        }

        self.dispatching = true;
        let result = self.drain();
        self.dispatching = false;
        self.dispatched = 0;
        self.dirtied.clear();
        if result.is_err() {
            self.pending.clear();
        }
        result
    }

    fn drain(&mut self) -> GraphResult<()> {
        let limit = self.shared.config.max_event_cascade;
        while let Some(event) = self.pending.pop_front() {
            self.dispatched += 1;
            if self.dispatched > limit {
                return Err(GraphError::EventCascade { limit });
            }

            tracing::trace!(target: TRACING_TARGET_EDIT, event = %event, "Dispatching event");
            self.delivered.push(event);

            match event {
                GraphEvent::InputChanged(plug) => {
                    self.maintain_array(plug)?;
                    self.mark_dirty(plug);
                }
                GraphEvent::PlugSet(plug) => self.mark_dirty(plug),
                _ => {}
            }

            for node in self.recipients(&event) {
                let behavior = self
                    .state
                    .nodes
                    .get(node.index())
                    .and_then(|data| data.behavior.clone());
                if let Some(behavior) = behavior {
                    behavior.on_event(self, node, &event)?;
                }
            }
        }
        Ok(())
    }

    fn mark_dirty(&mut self, plug: PlugId) {
        let closure = self.view().dirtied_by(plug);
        for plug in closure {
            if self.dirtied.insert(plug) {
                self.delivered.push(GraphEvent::PlugDirtied(plug));
            }
        }
    }

    fn recipients(&self, event: &GraphEvent) -> Vec<NodeId> {
        match *event {
            GraphEvent::ChildAdded { parent, .. } | GraphEvent::ChildRemoved { parent, .. } => {
                match parent {
                    Parent::Node(node) => vec![node],
                    Parent::Plug(plug) => self.view().child_watchers(plug).to_vec(),
                }
            }
            GraphEvent::PlugSet(plug) | GraphEvent::InputChanged(plug) => {
                let view = self.view();
                let mut nodes: Vec<NodeId> = view.node_of(plug).into_iter().collect();
                for watcher in view.plug_watchers(plug) {
                    if !nodes.contains(watcher) {
                        nodes.push(*watcher);
                    }
                }
                nodes
            }
            GraphEvent::PlugDirtied(_) => Vec::new(),
        }
    }

    /// Returns the array enclosing `plug` and the element of that array
    /// containing it.
    fn enclosing_array(&self, plug: PlugId) -> Option<(PlugId, PlugId)> {
        let view = self.view();
        let mut current = plug;
        while let Some(parent) = view.parent_plug(current) {
            if matches!(view.kind(parent), Some(PlugKind::Array { .. })) {
                return Some((parent, current));
            }
            current = parent;
        }
        None
    }

    /// Keeps exactly one unconnected element at the end of an array after
    /// a connection inside one of its elements changes.
    fn maintain_array(&mut self, plug: PlugId) -> GraphResult<()> {
        let Some((array, element)) = self.enclosing_array(plug) else {
            return Ok(());
        };
        let PlugKind::Array {
            element: template,
            min_size,
            max_size,
        } = self.data(array)?.kind.clone()
        else {
            return Ok(());
        };

        let children = self.data(array)?.children.clone();
        let connected: Vec<bool> = {
            let view = self.view();
            children
                .iter()
                .map(|child| view.subtree(*child).iter().any(|p| view.input(*p).is_some()))
                .collect()
        };

        if children.last() == Some(&element) && connected.last() == Some(&true) {
            if children.len() < max_size {
                let prefix = element_prefix(&template.name).to_owned();
                let view = self.view();
                let name = (children.len()..)
                    .map(|i| format!("{prefix}{i}"))
                    .find(|name| view.child(array, name).is_none())
                    .unwrap_or_default();
                drop(view);

                tracing::debug!(
                    target: TRACING_TARGET_EDIT,
                    array = %array,
                    element = %name,
                    "Growing array"
                );
                self.add_plug(Parent::Plug(array), Direction::In, &template.counterpart(name))?;
            }
            return Ok(());
        }

        let keep = connected
            .iter()
            .rposition(|connected| *connected)
            .map_or(0, |last| last + 1)
            + 1;
        for child in children.iter().skip(keep.max(min_size)).rev() {
            tracing::debug!(
                target: TRACING_TARGET_EDIT,
                array = %array,
                element = %child,
                "Shrinking array"
            );
            self.remove_plug(*child)?;
        }
        Ok(())
    }

    /// Consumes the edit, releasing the graph and returning every event it
    /// produced.
    pub(crate) fn finish(self) -> Vec<GraphEvent> {
        self.delivered
    }
}
