//! Dirty propagation.

use std::collections::{HashSet, VecDeque};

use crate::id::PlugId;
use crate::view::GraphView;

/// Returns `plug` and every plug whose value may change because of it, in
/// breadth-first order.
///
/// A change reaches plugs connected downstream, plugs declared affected by
/// node behaviours, and the ancestors of every reached plug.
pub(crate) fn dirty_closure(view: &GraphView<'_>, plug: PlugId) -> Vec<PlugId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([plug]);

    while let Some(current) = queue.pop_front() {
        if !view.contains_plug(current) || !seen.insert(current) {
            continue;
        }
        order.push(current);

        queue.extend(view.affected_by(current));
        if let Some(parent) = view.parent_plug(current) {
            queue.push_back(parent);
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_closure_follows_connections_and_parents() {
        let graph = Graph::new();
        let (a, b_x, b) = graph
            .edit(|edit| {
                let n1 = edit.add_node("n1", None);
                let n2 = edit.add_node("n2", None);
                let a = edit.add_plug(Parent::Node(n1), Direction::Out, &PlugTemplate::value("a", 0))?;
                let b = edit.add_plug(
                    Parent::Node(n2),
                    Direction::In,
                    &PlugTemplate::compound("b", vec![PlugTemplate::value("x", 0)]),
                )?;
                let b_x = edit.view().child(b, "x").unwrap();
                edit.set_input(b_x, Some(a))?;
                Ok((a, b_x, b))
            })
            .unwrap();

        let view = graph.read();
        assert_eq!(view.dirtied_by(a), vec![a, b_x, b]);
    }
}
