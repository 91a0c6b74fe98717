//! Pull-based evaluation of plug hashes and values.
//!
//! Values are computed lazily: asking for a plug's value first asks for the
//! hash of its source, and only runs the source node's computation when no
//! value is cached for that hash. Every request is made under an explicit
//! [`Context`], which is also made current on the evaluating thread while a
//! node behaviour runs.

use std::cell::RefCell;
use std::sync::Arc;

use crate::TRACING_TARGET_EVAL;
use crate::context::{Context, ContextScope};
use crate::error::{GraphError, GraphResult};
use crate::hash::{ContentHash, ContentHasher};
use crate::id::PlugId;
use crate::node::NodeBehavior;
use crate::plug::{Direction, PlugKind};
use crate::value::Value;
use crate::view::GraphView;

type Frame = (PlugId, ContentHash);

/// Evaluates plugs of one [`GraphView`].
///
/// An evaluator tracks the chain of `(plug, context)` pairs currently being
/// evaluated, so that a dependency cycle fails with
/// [`GraphError::Cycle`] and runaway recursion fails with
/// [`GraphError::RecursionLimit`] instead of overflowing the stack. Each
/// thread evaluating a graph uses its own evaluator.
pub struct Evaluator<'v, 'a> {
    view: &'v GraphView<'a>,
    stack: RefCell<Vec<Frame>>,
}

struct FrameGuard<'s> {
    stack: &'s RefCell<Vec<Frame>>,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl<'v, 'a> Evaluator<'v, 'a> {
    pub(crate) fn new(view: &'v GraphView<'a>) -> Self {
        Self {
            view,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Returns the view being evaluated.
    pub fn view(&self) -> &'v GraphView<'a> {
        self.view
    }

    /// Returns the number of evaluations in progress.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    fn enter(&self, plug: PlugId, context: &Context) -> GraphResult<FrameGuard<'_>> {
        let frame = (plug, context.hash());
        let mut stack = self.stack.borrow_mut();

        if stack.contains(&frame) {
            tracing::warn!(
                target: TRACING_TARGET_EVAL,
                plug = %plug,
                name = %self.view.relative_name(plug),
                "Dependency cycle detected"
            );
            return Err(GraphError::Cycle { plug });
        }

        let limit = self.view.config().max_evaluation_depth;
        if stack.len() >= limit {
            return Err(GraphError::RecursionLimit { plug, limit });
        }

        stack.push(frame);
        Ok(FrameGuard { stack: &self.stack })
    }

    /// Returns the behaviour responsible for computing `plug`, when `plug`
    /// is an output of a computing node.
    fn computing_behavior(&self, plug: PlugId) -> Option<Arc<dyn NodeBehavior>> {
        let data = self.view.plug_data(plug)?;
        if data.direction != Direction::Out {
            return None;
        }
        self.view
            .behavior(data.node)
            .filter(|behavior| behavior.is_compute())
            .cloned()
    }

    fn computed_hash(
        &self,
        behavior: &dyn NodeBehavior,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<ContentHash> {
        let shared = self.view.shared();
        let generation = self.view.generation();
        if let Some(hash) = shared.hashes.get(output, context.hash(), generation) {
            return Ok(hash);
        }

        let hash = {
            let _scope = ContextScope::enter(context.clone());
            behavior.hash(self, output, context)?
        };
        shared.hashes.insert(output, context.hash(), generation, hash);
        Ok(hash)
    }

    /// Returns the hash of `plug` under `context`.
    ///
    /// Compound and array plugs hash their children in order. Value plugs
    /// hash their source: a computed output is hashed by its node, anything
    /// else by its stored value.
    pub fn hash(&self, plug: PlugId, context: &Context) -> GraphResult<ContentHash> {
        let data = self.view.require(plug)?;
        let _frame = self.enter(plug, context)?;

        if !matches!(data.kind, PlugKind::Value { .. }) {
            let mut hasher = ContentHasher::new();
            hasher.append_int(data.children.len() as i64);
            for child in &data.children {
                hasher.append_hash(&self.hash(*child, context)?);
            }
            return Ok(hasher.finish());
        }

        let source = self.view.source(plug);
        if let Some(behavior) = self.computing_behavior(source) {
            return self.computed_hash(behavior.as_ref(), source, context);
        }

        let value = self
            .view
            .stored_value(source)
            .ok_or(GraphError::NotAValuePlug(source))?;
        let mut hasher = ContentHasher::new();
        hasher.append_value(value);
        Ok(hasher.finish())
    }

    /// Returns the value of `plug` under `context`, converted to the plug's
    /// declared type.
    pub fn value(&self, plug: PlugId, context: &Context) -> GraphResult<Value> {
        let data = self.view.require(plug)?;
        let expected = data.value_type().ok_or(GraphError::NotAValuePlug(plug))?;
        let _frame = self.enter(plug, context)?;

        let source = self.view.source(plug);
        let value = match self.computing_behavior(source) {
            Some(behavior) => self.computed_value(behavior.as_ref(), source, context)?,
            None => self
                .view
                .stored_value(source)
                .cloned()
                .ok_or(GraphError::NotAValuePlug(source))?,
        };

        let actual = value.value_type();
        value.convert_to(expected).ok_or(GraphError::TypeMismatch {
            plug,
            expected,
            actual,
        })
    }

    fn computed_value(
        &self,
        behavior: &dyn NodeBehavior,
        output: PlugId,
        context: &Context,
    ) -> GraphResult<Value> {
        let expected = self
            .view
            .value_type(output)
            .ok_or(GraphError::NotAValuePlug(output))?;
        let hash = self.computed_hash(behavior, output, context)?;
        let shared = self.view.shared();
        if let Some(value) = shared.values.get(&hash, expected) {
            return Ok(value);
        }

        let value = {
            let _scope = ContextScope::enter(context.clone());
            behavior.compute(self, output, context)?
        };
        let actual = value.value_type();
        let value = value.convert_to(expected).ok_or(GraphError::TypeMismatch {
            plug: output,
            expected,
            actual,
        })?;

        tracing::trace!(
            target: TRACING_TARGET_EVAL,
            plug = %output,
            name = %self.view.relative_name(output),
            hash = ?hash,
            "Computed value"
        );
        shared.values.insert(hash, value.clone());
        Ok(value)
    }

    /// Hash used by nodes that do not override [`NodeBehavior::hash`]: the
    /// node type and the output's path, so the output behaves as a
    /// constant.
    pub fn default_hash(&self, output: PlugId) -> GraphResult<ContentHash> {
        let data = self.view.require(output)?;
        let type_name = self
            .view
            .behavior(data.node)
            .map_or("node", |behavior| behavior.type_name());

        let mut hasher = ContentHasher::new();
        hasher
            .append_str(type_name)
            .append_str(&self.view.relative_name(output));
        Ok(hasher.finish())
    }

    /// Value used by nodes that do not override [`NodeBehavior::compute`]:
    /// the output's default value.
    pub fn default_value(&self, output: PlugId) -> GraphResult<Value> {
        self.view
            .default_value(output)
            .cloned()
            .ok_or(GraphError::NotAValuePlug(output))
    }
}
