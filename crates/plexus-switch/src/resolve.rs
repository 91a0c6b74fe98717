//! Mapping between input and output plugs.

use plexus_graph::{GraphView, PlugId};

use crate::error::{SwitchError, SwitchResult};
use crate::plugs::SwitchPlugs;

/// Finds the plug corresponding to `plug` on the other side of a switch.
///
/// `plug` may be the output, a descendant of the output, an element of the
/// input array or a descendant of an element. For output-side plugs the
/// counterpart is looked up below input element `slot`; for input-side
/// plugs it is looked up below the output and `slot` is ignored.
///
/// Returns `None` when the switch has not been set up, when `plug` lies on
/// neither side, or when `slot` does not exist. Fails when the path to
/// `plug` does not exist on the opposite side.
pub(crate) fn opposite_plug(
    view: &GraphView<'_>,
    plugs: &SwitchPlugs,
    plug: PlugId,
    slot: usize,
) -> SwitchResult<Option<PlugId>> {
    let (Some(in_plugs), Some(out)) = (plugs.in_plugs, plugs.out) else {
        return Ok(None);
    };

    // Names from `plug` up to, but excluding, the side's root.
    let mut names = Vec::new();
    let mut current = plug;
    let root = loop {
        if current == out {
            break current;
        }
        let Some(parent) = view.parent_plug(current) else {
            return Ok(None);
        };
        if parent == in_plugs {
            break current;
        }
        names.push(view.name(current).unwrap_or_default());
        current = parent;
    };

    let opposite_root = if root == out {
        match view.children(in_plugs).get(slot) {
            Some(element) => *element,
            None => return Ok(None),
        }
    } else {
        out
    };

    let mut opposite = opposite_root;
    for name in names.iter().rev() {
        opposite = view
            .child(opposite, name)
            .ok_or_else(|| SwitchError::ShapeMismatch {
                plug,
                name: (*name).to_owned(),
            })?;
    }
    Ok(Some(opposite))
}
