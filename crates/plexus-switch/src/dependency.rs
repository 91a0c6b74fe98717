//! Dirty propagation through a switch.

use plexus_graph::{Direction, GraphView, PlugId};

use crate::TRACING_TARGET_ROUTE;
use crate::plugs::SwitchPlugs;
use crate::resolve::opposite_plug;

/// Appends to `outputs` the output plugs affected by a change to `input`.
///
/// A control change affects every leaf of the output. A change below an
/// input element affects its counterpart below the output.
pub(crate) fn affects(
    view: &GraphView<'_>,
    plugs: &SwitchPlugs,
    input: PlugId,
    outputs: &mut Vec<PlugId>,
) {
    if plugs.is_control(input) {
        if let Some(out) = plugs.out {
            outputs.extend(view.leaves(out));
        }
        return;
    }

    if view.direction(input) != Some(Direction::In) {
        return;
    }

    match opposite_plug(view, plugs, input, 0) {
        Ok(Some(output)) => outputs.push(output),
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_ROUTE,
                node = %plugs.node,
                plug = %input,
                error = %error,
                "Input has no counterpart on the output"
            );
        }
    }
}
