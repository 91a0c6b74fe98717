//! The switch node.

use std::sync::Arc;

use plexus_graph::{
    Context, ContentHash, Direction, Evaluator, GraphEdit, GraphError, GraphEvent, GraphResult,
    GraphView, NodeBehavior, NodeId, Parent, PlugFlags, PlugId, PlugTemplate, Value, ValueType,
};

use crate::TRACING_TARGET_WIRING;
use crate::config::{EnabledSource, SwitchConfig};
use crate::error::{SwitchError, SwitchResult};
use crate::plugs::{ENABLED_PLUG, IN_PLUG, INDEX_PLUG, OUT_PLUG, SwitchPlugs};
use crate::wiring::WiringState;
use crate::{dependency, index, resolve, router, topology, wiring};

/// Handle to a switch node.
///
/// A switch passes one of its inputs through to its output. Which input is
/// chosen depends on the `index` and enabled controls, and may differ per
/// evaluation context when either control is driven by a computation.
///
/// The handle is cheap to clone and holds no graph state: every query reads
/// the graph through the view it is given.
#[derive(Debug, Clone)]
pub struct Switch {
    node: NodeId,
    behavior: Arc<SwitchBehavior>,
}

impl Switch {
    /// Adds a switch node with its `index` control and, unless the
    /// configuration supplies one, its own `enabled` control.
    ///
    /// The input array and output are added by [`Switch::setup`]. A shared
    /// enabled plug must exist and hold a value convertible to a boolean.
    pub fn create(edit: &mut GraphEdit<'_>, config: SwitchConfig) -> SwitchResult<Self> {
        if let EnabledSource::Shared(plug) = config.enabled {
            let view = edit.view();
            if !view.contains_plug(plug) {
                return Err(GraphError::UnknownPlug(plug).into());
            }
            let actual = view.value_type(plug).ok_or(GraphError::NotAValuePlug(plug))?;
            if !actual.converts_to(ValueType::Bool) {
                return Err(GraphError::TypeMismatch {
                    plug,
                    expected: ValueType::Bool,
                    actual,
                }
                .into());
            }
        }

        let name = config.name.clone();
        let default_index = config.default_index;
        let enabled = config.enabled;
        let behavior = Arc::new(SwitchBehavior { config });

        let node = edit.add_node(name, Some(behavior.clone()));
        let parent = Parent::Node(node);
        edit.add_plug(parent, Direction::In, &PlugTemplate::value(INDEX_PLUG, default_index))?;
        match enabled {
            EnabledSource::Own { default } => {
                edit.add_plug(parent, Direction::In, &PlugTemplate::value(ENABLED_PLUG, default))?;
            }
            EnabledSource::Shared(plug) => edit.watch_plug(plug, node)?,
        }

        Ok(Self { node, behavior })
    }

    /// Adds the input array and output, both shaped like `template`.
    ///
    /// Fails without changing anything when the switch already has either.
    pub fn setup(&self, edit: &mut GraphEdit<'_>, template: PlugId) -> SwitchResult<()> {
        let shape = {
            let view = edit.view();
            if view.node_child(self.node, IN_PLUG).is_some() {
                return Err(SwitchError::AlreadySetUp { plug: IN_PLUG });
            }
            if view.node_child(self.node, OUT_PLUG).is_some() {
                return Err(SwitchError::AlreadySetUp { plug: OUT_PLUG });
            }
            view.template_of(template)
                .ok_or(GraphError::UnknownPlug(template))?
        };

        tracing::debug!(
            target: TRACING_TARGET_WIRING,
            node = %self.node,
            template = %template,
            "Setting up switch"
        );

        let element = shape
            .counterpart(format!("{IN_PLUG}0"))
            .with_flags(PlugFlags::DYNAMIC_SERIALIZABLE);
        let in_plugs = PlugTemplate::array(IN_PLUG, element, 1, usize::MAX)
            .with_flags(PlugFlags::DYNAMIC_SERIALIZABLE);
        let out = shape.counterpart(OUT_PLUG).with_flags(PlugFlags::DYNAMIC_SERIALIZABLE);

        let parent = Parent::Node(self.node);
        edit.add_plug(parent, Direction::In, &in_plugs)?;
        edit.add_plug(parent, Direction::Out, &out)?;
        Ok(())
    }

    /// Returns the switch node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the configuration the switch was created with.
    pub fn config(&self) -> &SwitchConfig {
        &self.behavior.config
    }

    fn plugs(&self, view: &GraphView<'_>) -> SwitchPlugs {
        SwitchPlugs::locate(view, self.node, &self.behavior.config)
    }

    /// Returns the input array, once set up.
    pub fn in_plugs(&self, view: &GraphView<'_>) -> Option<PlugId> {
        self.plugs(view).in_plugs
    }

    /// Returns the output, once set up.
    pub fn out_plug(&self, view: &GraphView<'_>) -> Option<PlugId> {
        self.plugs(view).out
    }

    /// Returns the index control.
    pub fn index_plug(&self, view: &GraphView<'_>) -> Option<PlugId> {
        self.plugs(view).index
    }

    /// Returns the enabled control, whether owned or shared.
    pub fn enabled_plug(&self, view: &GraphView<'_>) -> Option<PlugId> {
        self.plugs(view).enabled
    }

    /// Returns the index of the input element selected under `context`.
    pub fn active_index(&self, view: &GraphView<'_>, context: &Context) -> GraphResult<usize> {
        let plugs = self.plugs(view);
        index::active_index(
            &view.evaluator(),
            &plugs,
            &self.behavior.config.local_context_keys,
            context,
        )
    }

    /// Returns the input element selected under the current context of
    /// this thread.
    pub fn active_in_plug(&self, view: &GraphView<'_>) -> GraphResult<Option<PlugId>> {
        self.active_in_plug_in(view, &Context::current())
    }

    /// Returns the input element selected under `context`.
    pub fn active_in_plug_in(
        &self,
        view: &GraphView<'_>,
        context: &Context,
    ) -> GraphResult<Option<PlugId>> {
        let Some(in_plugs) = self.in_plugs(view) else {
            return Ok(None);
        };
        let slot = self.active_index(view, context)?;
        Ok(view.children(in_plugs).get(slot).copied())
    }

    /// Returns the plug corresponding to `plug` on the other side of the
    /// switch, looking below input element `slot` for output-side plugs.
    pub fn opposite_plug(
        &self,
        view: &GraphView<'_>,
        plug: PlugId,
        slot: usize,
    ) -> SwitchResult<Option<PlugId>> {
        resolve::opposite_plug(view, &self.plugs(view), plug, slot)
    }

    /// Returns the input plug corresponding to an output plug under the
    /// default mapping onto the first input.
    pub fn corresponding_input(
        &self,
        view: &GraphView<'_>,
        output: PlugId,
    ) -> SwitchResult<Option<PlugId>> {
        self.opposite_plug(view, output, 0)
    }

    /// Returns how the output currently obtains its value.
    pub fn wiring(&self, view: &GraphView<'_>) -> WiringState {
        wiring::wiring(view, &self.plugs(view))
    }

    /// Re-derives the output connection from the current controls and
    /// inputs.
    ///
    /// The switch does this itself whenever a relevant plug changes.
    pub fn update_wiring(&self, edit: &mut GraphEdit<'_>) -> GraphResult<()> {
        let plugs = self.plugs(&edit.view());
        wiring::update_internal_connection(edit, &plugs, &self.behavior.config)
    }
}

/// Behaviour of switch nodes.
#[derive(Debug)]
pub struct SwitchBehavior {
    config: SwitchConfig,
}

impl SwitchBehavior {
    fn plugs(&self, view: &GraphView<'_>, node: NodeId) -> SwitchPlugs {
        SwitchPlugs::locate(view, node, &self.config)
    }

    fn plugs_of(&self, view: &GraphView<'_>, output: PlugId) -> GraphResult<SwitchPlugs> {
        let node = view.node_of(output).ok_or(GraphError::UnknownPlug(output))?;
        Ok(self.plugs(view, node))
    }
}

impl NodeBehavior for SwitchBehavior {
    fn type_name(&self) -> &'static str {
        "Switch"
    }

    fn affects(
        &self,
        view: &GraphView<'_>,
        node: NodeId,
        input: PlugId,
        outputs: &mut Vec<PlugId>,
    ) {
        dependency::affects(view, &self.plugs(view, node), input, outputs);
    }

    fn hash(
        &self,
        eval: &Evaluator<'_, '_>,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<ContentHash> {
        let plugs = self.plugs_of(eval.view(), output)?;
        router::hash(eval, &plugs, &self.config.local_context_keys, output, context)
    }

    fn compute(
        &self,
        eval: &Evaluator<'_, '_>,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<Value> {
        let plugs = self.plugs_of(eval.view(), output)?;
        router::compute(eval, &plugs, &self.config.local_context_keys, output, context)
    }

    fn accepts_input(&self, view: &GraphView<'_>, node: NodeId, dst: PlugId, src: PlugId) -> bool {
        if view.direction(dst) != Some(Direction::In) {
            return true;
        }

        match resolve::opposite_plug(view, &self.plugs(view, node), dst, 0) {
            Ok(Some(opposite)) => view.check_compatible(opposite, src).is_ok(),
            _ => true,
        }
    }

    fn on_event(
        &self,
        edit: &mut GraphEdit<'_>,
        node: NodeId,
        event: &GraphEvent,
    ) -> GraphResult<()> {
        topology::handle_event(edit, node, &self.config, event)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plexus_graph::prelude::*;

    use super::*;
    use crate::fixture::Fixture;

    /// Drives the index from `frame - 1`.
    fn index_from_frame(fixture: &Fixture) {
        let index = fixture.index();
        fixture
            .graph
            .edit(|edit| {
                let query = ContextQuery::create(edit, "frame", "frame", 0)?;
                let add = Add::create(edit, "offset")?;
                edit.set_input(add.a, Some(query.out))?;
                edit.set_value(add.b, -1)?;
                edit.set_input(index, Some(add.out))
            })
            .unwrap();
    }

    fn frame(frame: i64) -> Context {
        Context::new().with("frame", frame)
    }

    #[test]
    fn test_scenario_a_index_wraps_over_real_inputs() {
        let fixture = Fixture::ints(3);
        assert_eq!(fixture.slot_count(), 4);

        fixture.set_index(5);
        let out = fixture.out();
        let view = fixture.graph.read();
        for context in [Context::new(), frame(1), frame(9)] {
            assert_eq!(fixture.switch.active_index(&view, &context).unwrap(), 2);
            assert_eq!(view.value(out, &context).unwrap(), Value::Int(102));
        }
        assert_eq!(fixture.switch.wiring(&view), WiringState::DirectWired { slot: 2 });
    }

    #[test]
    fn test_scenario_b_disabled_selects_first_input() {
        let fixture = Fixture::ints(3);
        fixture.set_index(5);
        fixture.set_enabled(false);

        let out = fixture.out();
        let view = fixture.graph.read();
        assert_eq!(fixture.switch.active_index(&view, &Context::new()).unwrap(), 0);
        assert_eq!(view.value(out, &Context::new()).unwrap(), Value::Int(100));
        assert_eq!(fixture.switch.wiring(&view), WiringState::DirectWired { slot: 0 });
    }

    #[test]
    fn test_scenario_c_context_varying_index_routes() {
        let fixture = Fixture::ints(2);
        index_from_frame(&fixture);

        let out = fixture.out();
        let one = fixture.hash(out, &frame(1));
        let two = fixture.hash(out, &frame(2));

        assert_ne!(one, two);
        assert_eq!(one, fixture.hash(fixture.slot(0), &frame(1)));
        assert_eq!(two, fixture.hash(fixture.slot(1), &frame(2)));
        assert_eq!(fixture.value(out, &frame(1)), Value::Int(100));
        assert_eq!(fixture.value(out, &frame(2)), Value::Int(101));
        assert_eq!(fixture.switch.wiring(&fixture.graph.read()), WiringState::Routed);
    }

    #[test]
    fn test_scenario_d_setup_twice_fails_without_changes() {
        let fixture = Fixture::ints(2);
        let out = fixture.out();
        let (in_plugs, slots) = {
            let view = fixture.graph.read();
            let in_plugs = fixture.switch.in_plugs(&view).unwrap();
            (in_plugs, view.children(in_plugs).to_vec())
        };

        let template = fixture.sources[0];
        let switch = fixture.switch.clone();
        let result = fixture.graph.edit(|edit| {
            switch
                .setup(edit, template)
                .map_err(|e| e.into_graph_error(switch.node()))
        });

        let Err(GraphError::NodeFailed { source, .. }) = result else {
            panic!("expected setup to fail");
        };
        assert_eq!(source.to_string(), "switch already has an \"in\" plug");

        let view = fixture.graph.read();
        assert_eq!(fixture.switch.in_plugs(&view), Some(in_plugs));
        assert_eq!(fixture.switch.out_plug(&view), Some(out));
        assert_eq!(view.children(in_plugs), slots.as_slice());
    }

    #[test]
    fn test_setup_reports_precondition_directly() {
        let fixture = Fixture::ints(1);
        let template = fixture.sources[0];
        let switch = fixture.switch.clone();

        let mut outcome = None;
        fixture
            .graph
            .edit(|edit| {
                outcome = Some(switch.setup(edit, template));
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            outcome,
            Some(Err(SwitchError::AlreadySetUp { plug: "in" }))
        ));
    }

    #[test]
    fn test_scenario_e_enabled_dirties_every_output_leaf() {
        let fixture = Fixture::points(2);
        let (out, enabled) = (fixture.out(), fixture.enabled());
        let view = fixture.graph.read();
        let x = view.child(out, "x").unwrap();
        let y = view.child(out, "y").unwrap();

        let affected = view.affected_by(enabled);
        assert!(affected.contains(&x));
        assert!(affected.contains(&y));

        let dirtied = view.dirtied_by(enabled);
        assert!(dirtied.contains(&x));
        assert!(dirtied.contains(&y));
        assert!(dirtied.contains(&out));
    }

    #[test]
    fn test_input_leaf_dirties_its_counterpart_only() {
        let fixture = Fixture::points(2);
        let (slot, out) = (fixture.slot(1), fixture.out());
        let view = fixture.graph.read();
        let slot_x = view.child(slot, "x").unwrap();

        let affected = view.affected_by(slot_x);
        assert!(affected.contains(&view.child(out, "x").unwrap()));
        assert!(!affected.contains(&view.child(out, "y").unwrap()));
    }

    #[test]
    fn test_disabled_or_unconnected_selects_first_input() {
        let empty = Fixture::ints(0);
        assert_eq!(empty.slot_count(), 1);
        empty.set_index(3);

        let disabled = Fixture::ints(3);
        disabled.set_index(2);
        disabled.set_enabled(false);

        for fixture in [&empty, &disabled] {
            let view = fixture.graph.read();
            for context in [Context::new(), frame(4)] {
                assert_eq!(fixture.switch.active_index(&view, &context).unwrap(), 0);
            }
        }
    }

    #[test]
    fn test_index_wraps_modulo_connected_inputs() {
        let fixture = Fixture::ints(3);
        for index in -4..10i64 {
            fixture.set_index(index);
            let view = fixture.graph.read();
            let expected = index.rem_euclid(3) as usize;
            for context in [Context::new(), frame(7)] {
                assert_eq!(fixture.switch.active_index(&view, &context).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_output_hash_is_selected_input_hash() {
        let fixture = Fixture::points(3);
        index_from_frame(&fixture);

        let out = fixture.out();
        let view = fixture.graph.read();
        for frame_number in 1..=4 {
            let context = frame(frame_number);
            let slot = fixture.switch.active_index(&view, &context).unwrap();
            assert_eq!(slot, (frame_number as usize - 1) % 3);

            for leaf in view.leaves(out) {
                let input = fixture.switch.opposite_plug(&view, leaf, slot).unwrap().unwrap();
                assert_eq!(
                    view.hash(leaf, &context).unwrap(),
                    view.hash(input, &context).unwrap()
                );
                assert_eq!(
                    view.value(leaf, &context).unwrap(),
                    view.value(input, &context).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_growth_selects_new_input_without_update() {
        let fixture = Fixture::ints(2);
        assert_eq!(fixture.slot_count(), 3);

        let source = fixture
            .graph
            .edit(|edit| {
                let node = edit.add_node("late", None);
                let source = edit.add_plug(Parent::Node(node), Direction::Out, &PlugTemplate::value("s", 0))?;
                edit.set_value(source, 999)?;
                Ok(source)
            })
            .unwrap();
        fixture.connect(2, source);
        assert_eq!(fixture.slot_count(), 4);

        fixture.set_index(2);
        let out = fixture.out();
        let view = fixture.graph.read();
        assert_eq!(fixture.switch.active_index(&view, &Context::new()).unwrap(), 2);
        assert_eq!(view.value(out, &Context::new()).unwrap(), Value::Int(999));
    }

    #[test]
    fn test_active_in_plug_uses_current_context() {
        let fixture = Fixture::ints(2);
        index_from_frame(&fixture);

        let slots = [fixture.slot(0), fixture.slot(1)];
        let view = fixture.graph.read();
        let _scope = ContextScope::enter(frame(2));
        assert_eq!(fixture.switch.active_in_plug(&view).unwrap(), Some(slots[1]));
        assert_eq!(
            fixture.switch.active_in_plug_in(&view, &frame(1)).unwrap(),
            Some(slots[0])
        );
    }

    #[test]
    fn test_missing_topology_is_not_an_error() {
        let graph = Graph::new();
        let switch = graph
            .edit(|edit| {
                Switch::create(edit, SwitchConfig::default())
                    .map_err(|e| e.into_graph_error(NodeId::from(0)))
            })
            .unwrap();

        let view = graph.read();
        assert_eq!(switch.in_plugs(&view), None);
        assert_eq!(switch.out_plug(&view), None);
        assert_eq!(switch.active_in_plug_in(&view, &Context::new()).unwrap(), None);
        assert_eq!(switch.wiring(&view), WiringState::Uninitialized);
        let index = switch.index_plug(&view).unwrap();
        assert_eq!(switch.opposite_plug(&view, index, 0).unwrap(), None);
    }

    #[test]
    fn test_corresponding_input_uses_first_slot() {
        let fixture = Fixture::points(2);
        let (out, slot) = (fixture.out(), fixture.slot(0));
        let view = fixture.graph.read();
        let out_y = view.child(out, "y").unwrap();

        assert_eq!(
            fixture.switch.corresponding_input(&view, out_y).unwrap(),
            view.child(slot, "y")
        );
    }

    #[test]
    fn test_shared_enabled_plug_controls_switch() {
        let graph = Graph::new();
        let (switch, enabled, sources) = graph
            .edit(|edit| {
                let parent = edit.add_node("box", None);
                let enabled = edit.add_plug(Parent::Node(parent), Direction::In, &PlugTemplate::value("enabled", true))?;
                let config = SwitchConfig::builder()
                    .enabled(EnabledSource::Shared(enabled))
                    .default_index(1i64)
                    .build()
                    .unwrap();
                let switch = Switch::create(edit, config).map_err(|e| e.into_graph_error(parent))?;
                let template = edit.add_plug(Parent::Node(parent), Direction::In, &PlugTemplate::value("t", 0))?;
                switch.setup(edit, template).map_err(|e| e.into_graph_error(parent))?;

                let mut sources = Vec::new();
                for i in 0..2 {
                    let source = edit.add_plug(Parent::Node(parent), Direction::Out, &PlugTemplate::value(format!("s{i}"), i))?;
                    let slot = edit.view().children(switch.in_plugs(&edit.view()).unwrap())[i as usize];
                    edit.set_input(slot, Some(source))?;
                    sources.push(source);
                }
                Ok((switch, enabled, sources))
            })
            .unwrap();

        {
            let view = graph.read();
            assert_eq!(switch.enabled_plug(&view), Some(enabled));
            assert_eq!(view.node_child(switch.node(), ENABLED_PLUG), None);
            assert_eq!(switch.wiring(&view), WiringState::DirectWired { slot: 1 });
            let out = switch.out_plug(&view).unwrap();
            assert!(view.dirtied_by(enabled).contains(&out));
        }

        graph.edit(|edit| edit.set_value(enabled, false)).unwrap();
        let view = graph.read();
        assert_eq!(switch.wiring(&view), WiringState::DirectWired { slot: 0 });
        let out = switch.out_plug(&view).unwrap();
        assert_eq!(view.source(out), sources[0]);
    }

    #[test]
    fn test_inputs_refuse_sources_their_output_would_refuse() {
        let fixture = Fixture::points(1);
        let slot = fixture.slot(0);
        let out = fixture.out();

        let result = fixture.graph.edit(|edit| {
            edit.add_plug(Parent::Plug(slot), Direction::In, &PlugTemplate::value("label", 0))?;
            edit.add_plug(Parent::Plug(out), Direction::Out, &PlugTemplate::value("label", ""))?;
            let node = edit.add_node("labels", None);
            let source = edit.add_plug(Parent::Node(node), Direction::Out, &PlugTemplate::value("id", 3))?;
            let label = edit.view().child(slot, "label").unwrap();
            edit.set_input(label, Some(source))
        });

        assert!(matches!(result, Err(GraphError::InputRejected { .. })));
    }

    #[test]
    fn test_cycle_through_index_is_reported() {
        let fixture = Fixture::ints(2);
        let index = fixture.index();
        let out = fixture.out();
        fixture
            .graph
            .edit(|edit| {
                let add = Add::create(edit, "feedback")?;
                edit.set_input(index, Some(add.out))?;
                edit.set_input(add.a, Some(out))
            })
            .unwrap();

        let view = fixture.graph.read();
        assert_eq!(fixture.switch.wiring(&view), WiringState::Routed);
        let result = view.value(out, &Context::new());
        assert!(matches!(result, Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn test_concurrent_evaluation_under_different_contexts() {
        let fixture = Fixture::ints(3);
        index_from_frame(&fixture);
        let out = fixture.out();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=12)
                .map(|frame_number| {
                    let graph = &fixture.graph;
                    scope.spawn(move || {
                        let view = graph.read();
                        let value = view.value(out, &frame(frame_number)).unwrap();
                        (frame_number, value)
                    })
                })
                .collect();

            for handle in handles {
                let (frame_number, value) = handle.join().unwrap();
                let expected = 100 + (frame_number - 1).rem_euclid(3);
                assert_eq!(value, Value::Int(expected));
            }
        });
    }

    #[test]
    fn test_switch_behavior_is_shared_with_graph() {
        let fixture = Fixture::ints(1);
        let view = fixture.graph.read();
        let behavior = view.behavior(fixture.switch.node()).unwrap();
        assert_eq!(behavior.type_name(), "Switch");
        assert!(Arc::strong_count(&fixture.switch.behavior) >= 2);
    }

    /// Adds a switch shaped like `shape` whose first input is `source` and
    /// whose index follows `pick`. Returns its first input and its output.
    fn routed_switch(
        edit: &mut GraphEdit<'_>,
        name: &str,
        shape: PlugId,
        source: PlugId,
        pick: PlugId,
    ) -> GraphResult<(PlugId, PlugId)> {
        let holder = edit.view().node_of(shape).unwrap();
        let config = SwitchConfig::builder().name(name).build().unwrap();
        let switch = Switch::create(edit, config).map_err(|e| e.into_graph_error(holder))?;
        switch.setup(edit, shape).map_err(|e| e.into_graph_error(holder))?;

        let (index, slot, out) = {
            let view = edit.view();
            let in_plugs = switch.in_plugs(&view).unwrap();
            (
                switch.index_plug(&view).unwrap(),
                view.children(in_plugs)[0],
                switch.out_plug(&view).unwrap(),
            )
        };
        edit.set_input(slot, Some(source))?;
        edit.set_input(index, Some(pick))?;
        Ok((slot, out))
    }

    #[test]
    fn test_switches_of_different_types_share_a_source() {
        let graph = Graph::new();
        let ((a_slot, a_out), (b_slot, b_out)) = graph
            .edit(|edit| {
                let holder = edit.add_node("shapes", None);
                let int_shape = edit.add_plug(Parent::Node(holder), Direction::In, &PlugTemplate::value("int", 0))?;
                let float_shape = edit.add_plug(Parent::Node(holder), Direction::In, &PlugTemplate::value("float", 0.0))?;
                let constants = edit.add_node("constants", None);
                let source = edit.add_plug(Parent::Node(constants), Direction::Out, &PlugTemplate::value("source", 3.5))?;
                let pick = ContextQuery::create(edit, "pick", "pick", 0)?;

                let a = routed_switch(edit, "a", int_shape, source, pick.out)?;
                let b = routed_switch(edit, "b", float_shape, source, pick.out)?;
                Ok((a, b))
            })
            .unwrap();

        let view = graph.read();
        let context = Context::new();
        assert_eq!(view.input(a_out), None);
        assert_eq!(view.hash(a_out, &context).unwrap(), view.hash(b_out, &context).unwrap());

        assert_eq!(view.value(a_out, &context).unwrap(), Value::Int(3));
        assert_eq!(view.value(b_out, &context).unwrap(), Value::Float(3.5));
        assert_eq!(view.value(a_out, &context).unwrap(), view.value(a_slot, &context).unwrap());
        assert_eq!(view.value(b_out, &context).unwrap(), view.value(b_slot, &context).unwrap());
    }

    #[test]
    fn test_shrinking_inputs_rewires_output() {
        let fixture = Fixture::ints(3);
        fixture.set_index(2);
        assert_eq!(fixture.switch.wiring(&fixture.graph.read()), WiringState::DirectWired { slot: 2 });

        let last = fixture.slot(2);
        fixture.graph.edit(|edit| edit.set_input(last, None)).unwrap();

        assert_eq!(fixture.slot_count(), 3);
        let out = fixture.out();
        let view = fixture.graph.read();
        assert_eq!(fixture.switch.wiring(&view), WiringState::DirectWired { slot: 0 });
        assert_eq!(view.value(out, &Context::new()).unwrap(), Value::Int(100));
    }

    #[test]
    fn test_removing_output_uninitializes_wiring() {
        let fixture = Fixture::ints(2);
        let (slot, out) = (fixture.slot(0), fixture.out());
        assert_eq!(fixture.graph.read().outputs(slot), vec![out]);
        fixture.graph.edit(|edit| edit.remove_plug(out)).unwrap();

        let view = fixture.graph.read();
        assert_eq!(fixture.switch.out_plug(&view), None);
        assert_eq!(fixture.switch.wiring(&view), WiringState::Uninitialized);
        assert!(view.outputs(slot).is_empty());
    }

    #[test]
    fn test_numeric_shared_enabled_plug_disables_switch() {
        let graph = Graph::new();
        let (switch, enabled) = graph
            .edit(|edit| {
                let parent = edit.add_node("box", None);
                let enabled = edit.add_plug(Parent::Node(parent), Direction::In, &PlugTemplate::value("enabled", 1))?;
                let config = SwitchConfig::builder()
                    .enabled(EnabledSource::Shared(enabled))
                    .default_index(1i64)
                    .build()
                    .unwrap();
                let switch = Switch::create(edit, config).map_err(|e| e.into_graph_error(parent))?;
                let template = edit.add_plug(Parent::Node(parent), Direction::In, &PlugTemplate::value("t", 0))?;
                switch.setup(edit, template).map_err(|e| e.into_graph_error(parent))?;

                for i in 0..2 {
                    let source = edit.add_plug(Parent::Node(parent), Direction::Out, &PlugTemplate::value(format!("s{i}"), i))?;
                    let slot = edit.view().children(switch.in_plugs(&edit.view()).unwrap())[i as usize];
                    edit.set_input(slot, Some(source))?;
                }
                Ok((switch, enabled))
            })
            .unwrap();
        assert_eq!(switch.wiring(&graph.read()), WiringState::DirectWired { slot: 1 });

        graph.edit(|edit| edit.set_value(enabled, 0)).unwrap();
        let view = graph.read();
        assert_eq!(switch.active_index(&view, &Context::new()).unwrap(), 0);
        assert_eq!(switch.wiring(&view), WiringState::DirectWired { slot: 0 });
    }

    #[test]
    fn test_string_shared_enabled_plug_is_rejected() {
        let graph = Graph::new();
        let result = graph.edit(|edit| {
            let parent = edit.add_node("box", None);
            let enabled = edit.add_plug(Parent::Node(parent), Direction::In, &PlugTemplate::value("enabled", "on"))?;
            let config = SwitchConfig::builder()
                .enabled(EnabledSource::Shared(enabled))
                .build()
                .unwrap();
            Switch::create(edit, config).map(|_| ()).map_err(|e| e.into_graph_error(parent))
        });

        assert!(matches!(
            result,
            Err(GraphError::TypeMismatch {
                expected: ValueType::Bool,
                actual: ValueType::String,
                ..
            })
        ));
    }

    #[test]
    fn test_setup_marks_inputs_and_output_dynamic_and_serializable() {
        let fixture = Fixture::ints(1);
        let (slot, out) = (fixture.slot(0), fixture.out());
        let view = fixture.graph.read();
        let in_plugs = fixture.switch.in_plugs(&view).unwrap();

        for plug in [in_plugs, slot, out] {
            let flags = view.flags(plug).unwrap();
            assert!(flags.dynamic && flags.serializable);
        }
    }
}
