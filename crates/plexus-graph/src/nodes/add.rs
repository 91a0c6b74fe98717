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

/// Node adding two integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Add {
    /// The node.
    pub node: NodeId,
    /// First operand.
    pub a: PlugId,
    /// Second operand.
    pub b: PlugId,
    /// Wrapping sum of the operands.
    pub out: PlugId,
}

impl Add {
    /// Adds an adder node with both operands set to zero.
    pub fn create(edit: &mut GraphEdit<'_>, name: impl Into<String>) -> GraphResult<Self> {
        let node = edit.add_node(name, Some(Arc::new(AddBehavior)));
        let parent = Parent::Node(node);

        Ok(Self {
            node,
            a: edit.add_plug(parent, Direction::In, &PlugTemplate::value("a", 0))?,
            b: edit.add_plug(parent, Direction::In, &PlugTemplate::value("b", 0))?,
            out: edit.add_plug(parent, Direction::Out, &PlugTemplate::value("out", 0))?,
        })
    }
}

/// Behaviour of [`Add`] nodes.
#[derive(Debug, Default)]
pub struct AddBehavior;

fn operands(view: &GraphView<'_>, output: PlugId) -> GraphResult<(PlugId, PlugId)> {
    let node = view.node_of(output).ok_or(GraphError::UnknownPlug(output))?;
    let find = |name: &str| {
        view.node_child(node, name)
            .ok_or_else(|| GraphError::InvalidConfig(format!("adder is missing its {name:?} plug")))
    };
    Ok((find("a")?, find("b")?))
}

impl NodeBehavior for AddBehavior {
    fn type_name(&self) -> &'static str {
        "Add"
    }

    fn affects(&self, view: &GraphView<'_>, node: NodeId, input: PlugId, outputs: &mut Vec<PlugId>) {
        if matches!(view.name(input), Some("a" | "b")) {
            outputs.extend(view.node_child(node, "out"));
        }
    }

    fn hash(&self, eval: &Evaluator<'_, '_>, output: PlugId, context: &Context) -> GraphResult<ContentHash> {
        let (a, b) = operands(eval.view(), output)?;
        let mut hasher = ContentHasher::new();
        hasher
            .append_str(self.type_name())
            .append_hash(&eval.hash(a, context)?)
            .append_hash(&eval.hash(b, context)?);
        Ok(hasher.finish())
    }

    fn compute(&self, eval: &Evaluator<'_, '_>, output: PlugId, context: &Context) -> GraphResult<Value> {
        let (a, b) = operands(eval.view(), output)?;
        let a = eval.value(a, context)?.as_int().unwrap_or_default();
        let b = eval.value(b, context)?.as_int().unwrap_or_default();
        Ok(Value::Int(a.wrapping_add(b)))
    }
}
