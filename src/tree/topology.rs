//! Shape helpers shared by lineage trees and neighbor-joining trees
//!
//! All traversals use explicit stacks: lineage trees over tens of thousands
//! of cells can be deep enough to exhaust the call stack.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::ops::Add;

/// Splice out every node with exactly one child.
///
/// The child is reparented to the spliced node's parent with the two branch
/// lengths summed. A unifurcating root is dropped and its child becomes the
/// root. Returns the (possibly new) root.
pub(crate) fn collapse_unifurcations<N, E>(
    graph: &mut StableDiGraph<N, E>,
    root: NodeIndex,
) -> NodeIndex
where
    E: Copy + Add<Output = E>,
{
    let mut root = root;
    let view: &StableDiGraph<N, E> = graph;
    let candidates: Vec<NodeIndex> = view
        .node_indices()
        .filter(|&n| out_degree(view, n) == 1)
        .collect();

    for node in candidates {
        // splicing never changes another node's out-degree
        let child_edge = match graph.edges_directed(node, Direction::Outgoing).next() {
            Some(e) => (e.target(), *e.weight()),
            None => continue,
        };
        let parent_edge = graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|e| (e.source(), *e.weight()));

        let (child, child_length) = child_edge;
        match parent_edge {
            Some((parent, parent_length)) => {
                graph.remove_node(node);
                graph.add_edge(parent, child, parent_length + child_length);
            }
            None => {
                graph.remove_node(node);
                if node == root {
                    root = child;
                }
            }
        }
    }
    root
}

fn out_degree<N, E>(graph: &StableDiGraph<N, E>, node: NodeIndex) -> usize {
    graph.neighbors_directed(node, Direction::Outgoing).count()
}

/// Nodes below `root` (inclusive) in post-order
pub(crate) fn postorder<N, E>(graph: &StableDiGraph<N, E>, root: NodeIndex) -> Vec<NodeIndex> {
    let mut order = Vec::with_capacity(graph.node_count());
    let mut stack = vec![(root, false)];
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        stack.push((node, true));
        let mut children: Vec<NodeIndex> =
            graph.neighbors_directed(node, Direction::Outgoing).collect();
        children.sort();
        stack.extend(children.into_iter().rev().map(|c| (c, false)));
    }
    order
}

/// Childless nodes below `root` (inclusive), in post-order
pub(crate) fn leaves_below<N, E>(graph: &StableDiGraph<N, E>, root: NodeIndex) -> Vec<NodeIndex> {
    postorder(graph, root)
        .into_iter()
        .filter(|&n| out_degree(graph, n) == 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_sums_branch_lengths() {
        let mut g: StableDiGraph<&str, f64> = StableDiGraph::new();
        let root = g.add_node("root");
        let mid = g.add_node("mid");
        let a = g.add_node("a");
        let b = g.add_node("b");
        g.add_edge(root, mid, 1.5);
        g.add_edge(mid, a, 2.0);
        g.add_edge(root, b, 1.0);

        let new_root = collapse_unifurcations(&mut g, root);
        assert_eq!(new_root, root);
        assert_eq!(g.node_count(), 3);
        let edge = g.find_edge(root, a).unwrap();
        assert_eq!(g[edge], 3.5);
    }

    #[test]
    fn test_collapse_long_chain() {
        let mut g: StableDiGraph<usize, f64> = StableDiGraph::new();
        let nodes: Vec<NodeIndex> = (0..6).map(|i| g.add_node(i)).collect();
        for w in nodes.windows(2) {
            g.add_edge(w[0], w[1], 1.0);
        }
        let extra = g.add_node(99);
        g.add_edge(nodes[4], extra, 1.0);

        let root = collapse_unifurcations(&mut g, nodes[0]);
        assert_eq!(root, nodes[4]);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_postorder_and_leaves() {
        let mut g: StableDiGraph<(), ()> = StableDiGraph::new();
        let root = g.add_node(());
        let x = g.add_node(());
        let y = g.add_node(());
        let z = g.add_node(());
        g.add_edge(root, x, ());
        g.add_edge(root, y, ());
        g.add_edge(x, z, ());

        assert_eq!(postorder(&g, root), vec![z, x, y, root]);
        assert_eq!(leaves_below(&g, root), vec![z, y]);
        assert_eq!(leaves_below(&g, y), vec![y]);
    }
}
