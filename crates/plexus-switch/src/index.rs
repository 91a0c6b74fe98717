//! Active input selection.

use plexus_graph::{Context, ContextScope, Evaluator, GraphResult, ValueType};

use crate::TRACING_TARGET_ROUTE;
use crate::plugs::SwitchPlugs;

/// Returns the input element selected under `context`.
///
/// The selection is 0 while the switch is disabled or has no connected
/// input. Otherwise the index is wrapped over the connected inputs, which
/// excludes the spare element at the end of the array. An index that
/// varies with context is evaluated with `local_keys` removed from the
/// context.
pub(crate) fn active_index(
    eval: &Evaluator<'_, '_>,
    plugs: &SwitchPlugs,
    local_keys: &[String],
    context: &Context,
) -> GraphResult<usize> {
    let view = eval.view();
    let size = plugs.slot_count(view);
    if size <= 1 {
        return Ok(0);
    }

    if let Some(enabled) = plugs.enabled {
        let enabled = eval.value(enabled, context)?.convert_to(ValueType::Bool);
        if enabled.and_then(|value| value.as_bool()) == Some(false) {
            return Ok(0);
        }
    }

    let Some(index_plug) = plugs.index else {
        return Ok(0);
    };
    let index = if view.varies_with_context(index_plug) {
        let global = context.without(local_keys);
        let _scope = ContextScope::enter(global.clone());
        eval.value(index_plug, &global)?
    } else {
        eval.value(index_plug, context)?
    };

    let index = index.as_int().unwrap_or_default();
    let selected = index.rem_euclid(size as i64 - 1) as usize;
    tracing::trace!(
        target: TRACING_TARGET_ROUTE,
        node = %plugs.node,
        index,
        size,
        selected,
        "Selected input"
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use plexus_graph::prelude::*;

    use crate::SwitchConfig;
    use crate::fixture::Fixture;

    #[test]
    fn test_negative_index_wraps_euclidean() {
        let fixture = Fixture::ints(3);
        fixture.set_index(-1);

        let view = fixture.graph.read();
        assert_eq!(fixture.switch.active_index(&view, &Context::new()).unwrap(), 2);
    }

    #[test]
    fn test_varying_index_ignores_local_context_keys() {
        let config = SwitchConfig::builder()
            .local_context_key("scene:path")
            .build()
            .unwrap();
        let fixture = Fixture::build(config, PlugTemplate::value("value", 0), 3, |edit, plug, i| {
            edit.set_value(plug, i as i64)
        });

        let index = fixture.index();
        fixture
            .graph
            .edit(|edit| {
                let query = ContextQuery::create(edit, "path", "scene:path", 1)?;
                edit.set_input(index, Some(query.out))
            })
            .unwrap();

        let view = fixture.graph.read();
        let local = Context::new().with("scene:path", 2);
        assert_eq!(fixture.switch.active_index(&view, &local).unwrap(), 1);
    }

    #[test]
    fn test_varying_index_sees_global_context() {
        let fixture = Fixture::ints(3);
        let index = fixture.index();
        fixture
            .graph
            .edit(|edit| {
                let query = ContextQuery::create(edit, "pick", "pick", 0)?;
                edit.set_input(index, Some(query.out))
            })
            .unwrap();

        let view = fixture.graph.read();
        let context = Context::new().with("pick", 2);
        assert_eq!(fixture.switch.active_index(&view, &context).unwrap(), 2);
    }
}
