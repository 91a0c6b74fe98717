//! Reacting to changes around a switch.

use plexus_graph::{GraphEdit, GraphEvent, GraphResult, NodeId, Parent};

use crate::config::SwitchConfig;
use crate::plugs::SwitchPlugs;
use crate::wiring::update_internal_connection;

/// Updates the switch's wiring when `event` may change which input is
/// selected.
///
/// When the input array is first attached, the switch also starts watching
/// it, so that elements added by later connections are seen.
pub(crate) fn handle_event(
    edit: &mut GraphEdit<'_>,
    node: NodeId,
    config: &SwitchConfig,
    event: &GraphEvent,
) -> GraphResult<()> {
    let plugs = SwitchPlugs::locate(&edit.view(), node, config);

    let update = match *event {
        GraphEvent::ChildAdded {
            parent: Parent::Node(owner),
            child,
        } if owner == node => {
            if Some(child) == plugs.in_plugs {
                edit.watch_children(child, node)?;
                true
            } else {
                Some(child) == plugs.out
            }
        }
        GraphEvent::ChildRemoved {
            parent: Parent::Node(owner),
            ..
        } => owner == node,
        GraphEvent::ChildAdded {
            parent: Parent::Plug(parent),
            ..
        }
        | GraphEvent::ChildRemoved {
            parent: Parent::Plug(parent),
            ..
        } => Some(parent) == plugs.in_plugs,
        GraphEvent::PlugSet(plug) | GraphEvent::InputChanged(plug) => plugs.is_control(plug),
        _ => false,
    };

    if update {
        update_internal_connection(edit, &plugs, config)?;
    }
    Ok(())
}
