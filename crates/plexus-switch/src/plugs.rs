//! Locating the plugs a switch works with.

use plexus_graph::{Direction, GraphView, NodeId, PlugId, PlugKind};

use crate::config::{EnabledSource, SwitchConfig};

/// Name of the input array plug.
pub const IN_PLUG: &str = "in";
/// Name of the output plug.
pub const OUT_PLUG: &str = "out";
/// Name of the index control.
pub const INDEX_PLUG: &str = "index";
/// Name of the switch's own enabled control.
pub const ENABLED_PLUG: &str = "enabled";

/// The plugs of one switch, as currently present in the graph.
///
/// `in_plugs` and `out` are `None` until setup has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SwitchPlugs {
    pub node: NodeId,
    pub in_plugs: Option<PlugId>,
    pub out: Option<PlugId>,
    pub index: Option<PlugId>,
    pub enabled: Option<PlugId>,
}

impl SwitchPlugs {
    pub fn locate(view: &GraphView<'_>, node: NodeId, config: &SwitchConfig) -> Self {
        let in_plugs = view
            .node_child(node, IN_PLUG)
            .filter(|plug| matches!(view.kind(*plug), Some(PlugKind::Array { .. })));
        let out = view
            .node_child(node, OUT_PLUG)
            .filter(|plug| view.direction(*plug) == Some(Direction::Out));
        let enabled = match config.enabled {
            EnabledSource::Own { .. } => view.node_child(node, ENABLED_PLUG),
            EnabledSource::Shared(plug) => Some(plug).filter(|plug| view.contains_plug(*plug)),
        };

        Self {
            node,
            in_plugs,
            out,
            index: view.node_child(node, INDEX_PLUG),
            enabled,
        }
    }

    /// Returns the number of elements in the input array, zero before setup.
    pub fn slot_count(&self, view: &GraphView<'_>) -> usize {
        self.in_plugs.map_or(0, |plugs| view.children(plugs).len())
    }

    /// Returns whether `plug` is one of the two controls.
    pub fn is_control(&self, plug: PlugId) -> bool {
        Some(plug) == self.index || Some(plug) == self.enabled
    }
}
