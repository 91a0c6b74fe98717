//! Switches wired to constant sources, for tests.

use plexus_graph::prelude::*;

use crate::{Switch, SwitchConfig};

pub(crate) struct Fixture {
    pub graph: Graph,
    pub switch: Switch,
    pub sources: Vec<PlugId>,
}

impl Fixture {
    /// A switch over integer inputs with `count` sources holding
    /// `100`, `101`, ... connected to successive inputs.
    pub fn ints(count: usize) -> Self {
        Self::build(SwitchConfig::default(), PlugTemplate::value("value", 0), count, |edit, plug, i| {
            edit.set_value(plug, 100 + i as i64)
        })
    }

    /// A switch over `{x, y}` float inputs with `count` sources holding
    /// `(i, -i)`.
    pub fn points(count: usize) -> Self {
        let shape = PlugTemplate::compound(
            "point",
            vec![PlugTemplate::value("x", 0.0), PlugTemplate::value("y", 0.0)],
        );
        Self::build(SwitchConfig::default(), shape, count, |edit, plug, i| {
            let view = edit.view();
            let (x, y) = (view.child(plug, "x").unwrap(), view.child(plug, "y").unwrap());
            drop(view);
            edit.set_value(x, i as f64)?;
            edit.set_value(y, -(i as f64))
        })
    }

    pub fn build(
        config: SwitchConfig,
        shape: PlugTemplate,
        count: usize,
        init: impl Fn(&mut GraphEdit<'_>, PlugId, usize) -> GraphResult<()>,
    ) -> Self {
        let graph = Graph::new();
        let (switch, sources) = graph
            .edit(|edit| {
                let holder = edit.add_node("template", None);
                let template = edit.add_plug(Parent::Node(holder), Direction::In, &shape)?;

                let switch = Switch::create(edit, config).map_err(|e| e.into_graph_error(holder))?;
                switch.setup(edit, template).map_err(|e| e.into_graph_error(holder))?;

                let constants = edit.add_node("sources", None);
                let mut sources = Vec::new();
                for i in 0..count {
                    let source = edit.add_plug(
                        Parent::Node(constants),
                        Direction::Out,
                        &shape.counterpart(format!("s{i}")),
                    )?;
                    init(edit, source, i)?;
                    sources.push(source);
                }
                Ok((switch, sources))
            })
            .unwrap();

        let fixture = Self {
            graph,
            switch,
            sources,
        };
        for (slot, source) in fixture.sources.clone().into_iter().enumerate() {
            fixture.connect(slot, source);
        }
        fixture
    }

    pub fn slot(&self, slot: usize) -> PlugId {
        let view = self.graph.read();
        view.children(self.switch.in_plugs(&view).unwrap())[slot]
    }

    pub fn slot_count(&self) -> usize {
        let view = self.graph.read();
        view.children(self.switch.in_plugs(&view).unwrap()).len()
    }

    pub fn out(&self) -> PlugId {
        self.switch.out_plug(&self.graph.read()).unwrap()
    }

    pub fn index(&self) -> PlugId {
        self.switch.index_plug(&self.graph.read()).unwrap()
    }

    pub fn enabled(&self) -> PlugId {
        self.switch.enabled_plug(&self.graph.read()).unwrap()
    }

    pub fn connect(&self, slot: usize, source: PlugId) {
        let dst = self.slot(slot);
        self.graph.edit(|edit| edit.set_input(dst, Some(source))).unwrap();
    }

    pub fn set_index(&self, index: i64) {
        let plug = self.index();
        self.graph.edit(|edit| edit.set_value(plug, index)).unwrap();
    }

    pub fn set_enabled(&self, enabled: bool) {
        let plug = self.enabled();
        self.graph.edit(|edit| edit.set_value(plug, enabled)).unwrap();
    }

    pub fn value(&self, plug: PlugId, context: &Context) -> Value {
        self.graph.read().value(plug, context).unwrap()
    }

    pub fn hash(&self, plug: PlugId, context: &Context) -> ContentHash {
        self.graph.read().hash(plug, context).unwrap()
    }
}
