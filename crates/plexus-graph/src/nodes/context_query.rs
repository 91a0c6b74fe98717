use std::sync::Arc;

use crate::context::Context;
use crate::edit::GraphEdit;
use crate::error::{GraphError, GraphResult};
use crate::eval::Evaluator;
use crate::hash::{ContentHash, ContentHasher};
use crate::id::{NodeId, Parent, PlugId};
use crate::node::NodeBehavior;
use crate::plug::{Direction, PlugTemplate};
use crate::value::Value;
use crate::view::GraphView;

/// Node whose output is the value of a context variable.
///
/// The variable is named by the `name` plug. When the context does not bind
/// it, or binds it to a value that cannot be converted to the output type,
/// the output takes the value of the `default` plug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextQuery {
    /// The node.
    pub node: NodeId,
    /// Name of the variable to read.
    pub name: PlugId,
    /// Value used when the variable is not bound.
    pub default: PlugId,
    /// The variable's value.
    pub out: PlugId,
}

impl ContextQuery {
    /// Adds a context query node whose output has the type of `default`.
    pub fn create(
        edit: &mut GraphEdit<'_>,
        node_name: impl Into<String>,
        variable: &str,
        default: impl Into<Value>,
    ) -> GraphResult<Self> {
        let default = default.into();
        let node = edit.add_node(node_name, Some(Arc::new(ContextQueryBehavior)));
        let parent = Parent::Node(node);

        let name = edit.add_plug(parent, Direction::In, &PlugTemplate::value("name", variable))?;
        let default_plug =
            edit.add_plug(parent, Direction::In, &PlugTemplate::value("default", default.clone()))?;
        let out = edit.add_plug(parent, Direction::Out, &PlugTemplate::value("out", default))?;

        Ok(Self {
            node,
            name,
            default: default_plug,
            out,
        })
    }
}

/// Behaviour of [`ContextQuery`] nodes.
#[derive(Debug, Default)]
pub struct ContextQueryBehavior;

impl ContextQueryBehavior {
    fn plugs(view: &GraphView<'_>, node: NodeId) -> GraphResult<(PlugId, PlugId, PlugId)> {
        let find = |name: &str| {
            view.node_child(node, name).ok_or_else(|| {
                GraphError::InvalidConfig(format!("context query is missing its {name:?} plug"))
            })
        };
        Ok((find("name")?, find("default")?, find("out")?))
    }

    /// Returns the bound variable converted to the type of `output`.
    fn lookup(eval: &Evaluator<'_, '_>, node: NodeId, output: PlugId, context: &Context) -> GraphResult<Option<Value>> {
        let view = eval.view();
        let (name, _, _) = Self::plugs(view, node)?;
        let variable = eval.value(name, context)?;
        let Some(variable) = variable.as_str() else {
            return Ok(None);
        };

        let value_type = view.value_type(output).ok_or(GraphError::NotAValuePlug(output))?;
        Ok(context.get(variable).and_then(|value| value.convert_to(value_type)))
    }
}

impl NodeBehavior for ContextQueryBehavior {
    fn type_name(&self) -> &'static str {
        "ContextQuery"
    }

    fn affects(&self, view: &GraphView<'_>, node: NodeId, input: PlugId, outputs: &mut Vec<PlugId>) {
        if let Ok((name, default, out)) = Self::plugs(view, node) {
            if input == name || input == default {
                outputs.push(out);
            }
        }
    }

    fn hash(&self, eval: &Evaluator<'_, '_>, output: PlugId, context: &Context) -> GraphResult<ContentHash> {
        let node = eval.view().node_of(output).ok_or(GraphError::UnknownPlug(output))?;
        let mut hasher = ContentHasher::new();
        hasher.append_str(self.type_name());

        match Self::lookup(eval, node, output, context)? {
            Some(value) => {
                hasher.append_value(&value);
            }
            None => {
                let (_, default, _) = Self::plugs(eval.view(), node)?;
                hasher.append_hash(&eval.hash(default, context)?);
            }
        }
        Ok(hasher.finish())
    }

    fn compute(&self, eval: &Evaluator<'_, '_>, output: PlugId, context: &Context) -> GraphResult<Value> {
        let node = eval.view().node_of(output).ok_or(GraphError::UnknownPlug(output))?;
        match Self::lookup(eval, node, output, context)? {
            Some(value) => Ok(value),
            None => {
                let (_, default, _) = Self::plugs(eval.view(), node)?;
                eval.value(default, context)
            }
        }
    }
}
