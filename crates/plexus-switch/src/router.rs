//! Hashing and computing outputs by forwarding to the selected input.

use plexus_graph::{Context, ContentHash, Evaluator, GraphResult, PlugId, Value};

use crate::index::active_index;
use crate::plugs::SwitchPlugs;
use crate::resolve::opposite_plug;

/// Returns the input plug feeding `output` under `context`, if it holds a
/// value.
fn selected_input(
    eval: &Evaluator<'_, '_>,
    plugs: &SwitchPlugs,
    local_keys: &[String],
    output: PlugId,
    context: &Context,
) -> GraphResult<Option<PlugId>> {
    let view = eval.view();
    let slot = active_index(eval, plugs, local_keys, context)?;
    let input = opposite_plug(view, plugs, output, slot)
        .map_err(|error| error.into_graph_error(plugs.node))?;
    Ok(input.filter(|input| view.value_type(*input).is_some()))
}

/// Returns the hash of the selected input, unchanged.
pub(crate) fn hash(
    eval: &Evaluator<'_, '_>,
    plugs: &SwitchPlugs,
    local_keys: &[String],
    output: PlugId,
    context: &Context,
) -> GraphResult<ContentHash> {
    match selected_input(eval, plugs, local_keys, output, context)? {
        Some(input) => eval.hash(input, context),
        None => eval.default_hash(output),
    }
}

/// Returns the value of the selected input, unchanged.
pub(crate) fn compute(
    eval: &Evaluator<'_, '_>,
    plugs: &SwitchPlugs,
    local_keys: &[String],
    output: PlugId,
    context: &Context,
) -> GraphResult<Value> {
    match selected_input(eval, plugs, local_keys, output, context)? {
        Some(input) => eval.value(input, context),
        None => eval.default_value(output),
    }
}
