use crate::circuit::{Graph, Node, NodeId};
use log::{debug, trace};

//
// Public Interface
//

/// Semantics-preserving graph simplification: constant folding,
/// self-cancellation, common-subexpression sharing and dead-node
/// elimination, iterated to a fixed point. Running it on an already
/// optimized graph changes nothing.
pub fn optimize_graph(graph: &mut Graph) {
    graph.check();
    time_debug!("Optimizing circuit", {
        loop {
            let before = graph.node_count();
            let folded = rebuild(graph, None);
            let live = live_nodes(&folded);
            *graph = rebuild(&folded, Some(&live));
            if graph.node_count() == before {
                break;
            }
        }
    });
    debug!(
        "Optimizer reached fixed point: {} nodes, {} AND",
        graph.node_count(),
        graph.and_node_count()
    );
}

//
// Private Implementation
//

// Replays every kept node through the smart constructors, which apply
// the folding and sharing rules and renumber the survivors compactly.
fn rebuild(graph: &Graph, keep: Option<&[bool]>) -> Graph {
    let mut out = Graph::new();
    let mut mapping: Vec<NodeId> = vec![usize::MAX; graph.node_count()];
    for (id, node) in graph.nodes().iter().enumerate() {
        if let Some(keep) = keep {
            if !keep[id] {
                trace!("Removing dead node n{}", id);
                continue;
            }
        }
        mapping[id] = match node {
            Node::Input { name } => out.input(name),
            Node::Const { value } => out.constant(*value),
            Node::And { left, right } => out.and(mapping[*left], mapping[*right]),
            Node::Xor { left, right } => out.xor(mapping[*left], mapping[*right]),
            Node::Output { name, value } => out.output(name, mapping[*value]),
        };
    }
    out
}

// A node is live when an OUTPUT reaches it by following operand edges
// backwards.
fn live_nodes(graph: &Graph) -> Vec<bool> {
    let mut live = vec![false; graph.node_count()];
    let mut stack: Vec<NodeId> = graph.outputs().to_vec();
    while let Some(id) = stack.pop() {
        if live[id] {
            continue;
        }
        live[id] = true;
        match graph.node(id) {
            Node::Input { .. } | Node::Const { .. } => (),
            Node::And { left, right } | Node::Xor { left, right } => {
                stack.push(*left);
                stack.push(*right);
            }
            Node::Output { value, .. } => stack.push(*value),
        }
    }
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn bindings(a: bool, b: bool) -> HashMap<String, bool> {
        let mut m = HashMap::new();
        m.insert("a".to_string(), a);
        m.insert("b".to_string(), b);
        m
    }

    // Raw graph with none of the builder's folding applied, so the
    // optimizer alone is under test.
    fn raw_push(g: &mut Graph, node: Node) -> NodeId {
        let id = g.node_count();
        match node {
            Node::Input { ref name } => return g.input(name),
            Node::Output { ref name, value } => return g.output(name, value),
            _ => (),
        }
        g.nodes.push(node);
        id
    }

    #[test]
    fn optimization_preserves_semantics() {
        let mut g = Graph::new();
        let a = g.input("a");
        let b = g.input("b");
        let or = {
            let both = g.and(a, b);
            let either = g.xor(a, b);
            g.xor(both, either)
        };
        let not_a = {
            let t = g.constant(true);
            g.xor(a, t)
        };
        let mix = g.and(or, not_a);
        g.output("or", or);
        g.output("mix", mix);

        let mut optimized = rebuild(&g, None);
        optimize_graph(&mut optimized);
        for &(x, y) in &[(false, false), (false, true), (true, false), (true, true)] {
            let before = g.evaluate(&bindings(x, y)).unwrap();
            let after = optimized.evaluate(&bindings(x, y)).unwrap();
            assert_eq!(before, after, "inputs a={} b={}", x, y);
        }
    }

    #[test]
    fn optimization_is_idempotent() {
        let mut g = Graph::new();
        let a = g.input("a");
        let b = g.input("b");
        let x = g.and(a, b);
        let y = g.xor(x, b);
        g.output("y", y);
        optimize_graph(&mut g);
        let once = g.node_count();
        optimize_graph(&mut g);
        assert_eq!(g.node_count(), once);
    }

    #[test]
    fn fanned_out_and_cancels_through_xor() {
        let mut g = Graph::new();
        let a = raw_push(&mut g, Node::Input { name: "a".into() });
        let b = raw_push(&mut g, Node::Input { name: "b".into() });
        let g1 = raw_push(&mut g, Node::And { left: a, right: b });
        let g2 = raw_push(&mut g, Node::And { left: a, right: b });
        let x = raw_push(&mut g, Node::Xor { left: g1, right: g2 });
        raw_push(
            &mut g,
            Node::Output {
                name: "x".into(),
                value: x,
            },
        );
        optimize_graph(&mut g);
        // a single constant-false output; the AND and XOR nodes are gone
        assert_eq!(g.node_count(), 2);
        assert!(matches!(g.node(0), Node::Const { value: false }));
        assert!(matches!(g.node(1), Node::Output { .. }));
        let result = g.evaluate(&bindings(true, true)).unwrap();
        assert_eq!(result["x"], false);
    }

    #[test]
    fn dead_nodes_are_removed() {
        let mut g = Graph::new();
        let a = g.input("a");
        let b = g.input("b");
        let live = g.xor(a, b);
        g.and(a, b); // no output reaches this one
        g.output("live", live);
        optimize_graph(&mut g);
        assert_eq!(g.node_count(), 4);
        assert!(g.nodes().iter().all(|n| !matches!(n, Node::And { .. })));
    }

    #[test]
    fn constants_propagate_through_the_graph() {
        let mut g = Graph::new();
        let a = raw_push(&mut g, Node::Input { name: "a".into() });
        let t = raw_push(&mut g, Node::Const { value: true });
        let f = raw_push(&mut g, Node::Const { value: false });
        let x = raw_push(&mut g, Node::And { left: a, right: t });
        let y = raw_push(&mut g, Node::Xor { left: x, right: f });
        raw_push(
            &mut g,
            Node::Output {
                name: "y".into(),
                value: y,
            },
        );
        optimize_graph(&mut g);
        // folds down to the input wired straight to the output
        assert_eq!(g.node_count(), 2);
        let result = g.evaluate(&bindings(true, false)).unwrap();
        assert_eq!(result["y"], true);
    }
}
