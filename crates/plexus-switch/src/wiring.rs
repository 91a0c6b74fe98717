//! Direct wiring of the output to a fixed input.
//!
//! While neither control varies with context, every context selects the
//! same input, so the output is connected straight to it and evaluation
//! never reaches the switch. Otherwise the output is left unconnected and
//! the switch routes each evaluation itself.

use plexus_graph::{Context, GraphEdit, GraphResult, GraphView};
use strum::{AsRefStr, Display};

use crate::TRACING_TARGET_WIRING;
use crate::config::SwitchConfig;
use crate::index::active_index;
use crate::plugs::SwitchPlugs;
use crate::resolve::opposite_plug;

/// How a switch's output currently obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WiringState {
    /// The switch has not been set up.
    Uninitialized,
    /// The output is connected to input element `slot`.
    DirectWired {
        /// Index of the connected input element.
        slot: usize,
    },
    /// The output is unconnected and evaluated per context.
    Routed,
}

/// Reads the wiring state from the output's current connection.
pub(crate) fn wiring(view: &GraphView<'_>, plugs: &SwitchPlugs) -> WiringState {
    let (Some(in_plugs), Some(out)) = (plugs.in_plugs, plugs.out) else {
        return WiringState::Uninitialized;
    };

    view.input(out)
        .and_then(|input| view.children(in_plugs).iter().position(|e| *e == input))
        .map_or(WiringState::Routed, |slot| WiringState::DirectWired { slot })
}

/// Connects the output directly to the selected input, or disconnects it
/// when a control varies with context.
///
/// Does nothing when the output already has the connection it should have.
pub(crate) fn update_internal_connection(
    edit: &mut GraphEdit<'_>,
    plugs: &SwitchPlugs,
    config: &SwitchConfig,
) -> GraphResult<()> {
    let Some(out) = plugs.out else {
        return Ok(());
    };

    let view = edit.view();
    let varies = [plugs.index, plugs.enabled]
        .into_iter()
        .flatten()
        .any(|control| view.varies_with_context(control));

    let target = if varies {
        None
    } else {
        let eval = view.evaluator();
        let slot = active_index(&eval, plugs, &config.local_context_keys, &Context::current())?;
        opposite_plug(&view, plugs, out, slot).map_err(|error| error.into_graph_error(plugs.node))?
    };

    let previous = wiring(&view, plugs);
    if view.input(out) == target {
        return Ok(());
    }
    drop(view);

    edit.set_input(out, None)?;
    if target.is_some() {
        edit.set_input(out, target)?;
    }

    tracing::debug!(
        target: TRACING_TARGET_WIRING,
        node = %plugs.node,
        from = %previous,
        to = %wiring(&edit.view(), plugs),
        "Updated internal connection"
    );
    Ok(())
}
