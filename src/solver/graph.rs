//! Similarity graphs and percolation
//!
//! The builder scores every pair of samples once and returns an immutable
//! edge list sorted by ascending weight. Percolation then only advances a
//! cut point through that list, so removal order is reproducible and no
//! edge is ever re-added.

use super::SplitContext;
use crate::similarity::SimilarityFunction;
use log::debug;
use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Undirected similarity edge between two sample rows (`source < target`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub weight: f64,
    pub source: usize,
    pub target: usize,
}

/// Thresholded pairwise-similarity graph over a sample subset
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    /// Sample rows, ascending
    nodes: Vec<usize>,
    /// Edges sorted by (weight, source, target)
    edges: Vec<WeightedEdge>,
}

/// Outcome of percolating a similarity graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Percolation {
    /// Connected components, members ascending, ordered by smallest member
    pub components: Vec<Vec<usize>>,
    /// Number of minimum-weight removal rounds performed
    pub rounds: usize,
}

impl SimilarityGraph {
    /// Score every pair in `samples`, keeping those at or above `threshold`
    pub fn build<S: SimilarityFunction + ?Sized>(
        ctx: &SplitContext<'_>,
        samples: &[usize],
        similarity: &S,
        threshold: f64,
    ) -> Self {
        let mut nodes = samples.to_vec();
        nodes.sort_unstable();
        nodes.dedup();

        let mut edges = Vec::new();
        for (i, &source) in nodes.iter().enumerate() {
            for &target in &nodes[i + 1..] {
                let weight = similarity.similarity(
                    ctx.row(source),
                    ctx.row(target),
                    ctx.missing_char(),
                    ctx.weights,
                );
                if weight >= threshold {
                    edges.push(WeightedEdge {
                        weight,
                        source,
                        target,
                    });
                }
            }
        }
        edges.sort_by(|a, b| {
            a.weight
                .total_cmp(&b.weight)
                .then(a.source.cmp(&b.source))
                .then(a.target.cmp(&b.target))
        });

        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WeightedEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Connected components with every edge present
    pub fn components(&self) -> Vec<Vec<usize>> {
        components_of(&self.nodes, &self.edges)
    }

    /// Remove all minimum-weight edges at once, round after round, until the
    /// graph falls apart into at least two components or no edge is left
    pub fn percolate(&self) -> Percolation {
        let mut cut = 0;
        let mut rounds = 0;
        let mut components = self.components();

        while components.len() == 1 && cut < self.edges.len() {
            let min_weight = self.edges[cut].weight;
            while cut < self.edges.len() && self.edges[cut].weight == min_weight {
                cut += 1;
            }
            rounds += 1;
            components = components_of(&self.nodes, &self.edges[cut..]);
            debug!(
                "Percolation round {}: removed edges of weight {}, {} components",
                rounds,
                min_weight,
                components.len()
            );
        }

        Percolation { components, rounds }
    }

    /// `petgraph` view of the graph; node weights are sample rows
    pub fn to_graph(&self) -> UnGraph<usize, f64> {
        let mut graph = UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        let index: HashMap<usize, _> = self
            .nodes
            .iter()
            .map(|&n| (n, graph.add_node(n)))
            .collect();
        for e in &self.edges {
            graph.add_edge(index[&e.source], index[&e.target], e.weight);
        }
        graph
    }
}

/// Components of `nodes` under `edges`, in canonical order
fn components_of(nodes: &[usize], edges: &[WeightedEdge]) -> Vec<Vec<usize>> {
    let position: HashMap<usize, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut sets = UnionFind::new(nodes.len());
    for e in edges {
        sets.union(position[&e.source], position[&e.target]);
    }
    let labels = sets.into_labeling();

    // nodes are ascending, so first-seen order is smallest-member order
    let mut group_of: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for (i, &node) in nodes.iter().enumerate() {
        let group = *group_of.entry(labels[i]).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[group].push(node);
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{CharacterMatrix, Weights};
    use crate::similarity::{FnSimilarity, HammingSimilarityWithoutMissing};
    use petgraph::algo::connected_components;

    fn two_clusters() -> CharacterMatrix {
        CharacterMatrix::new(
            vec![
                ("a", vec![1, 1, 0, 0]),
                ("b", vec![1, 1, 0, 0]),
                ("c", vec![1, 1, 2, 0]),
                ("d", vec![0, 0, 3, 3]),
                ("e", vec![0, 0, 3, 3]),
                ("f", vec![0, 4, 3, 3]),
            ],
            -1,
        )
        .unwrap()
    }

    #[test]
    fn test_build_thresholds_and_sorts() {
        let unique = two_clusters().deduplicate();
        let ctx = SplitContext::new(&unique, None);
        let samples: Vec<usize> = (0..unique.len()).collect();

        let graph = SimilarityGraph::build(&ctx, &samples, &HammingSimilarityWithoutMissing, 0.0);
        // a and b collapse onto one row: all pairs of the 4 unique rows
        assert_eq!(unique.len(), 4);
        assert_eq!(graph.edge_count(), 6);
        assert!(graph.edges().windows(2).all(|w| w[0].weight <= w[1].weight));

        let strict = SimilarityGraph::build(&ctx, &samples, &HammingSimilarityWithoutMissing, 1.0);
        assert!(strict.edges().iter().all(|e| e.weight >= 1.0));
        assert_eq!(strict.components().len(), 2);
    }

    #[test]
    fn test_percolation_two_dense_clusters_one_round() {
        let unique = two_clusters().deduplicate();
        let ctx = SplitContext::new(&unique, None);
        let samples: Vec<usize> = (0..unique.len()).collect();
        let graph = SimilarityGraph::build(&ctx, &samples, &HammingSimilarityWithoutMissing, 0.0);

        let result = graph.percolate();
        assert_eq!(result.rounds, 1);
        assert_eq!(result.components, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_percolation_removes_all_ties_together() {
        let unique = CharacterMatrix::new(
            vec![("a", vec![1]), ("b", vec![2]), ("c", vec![3])],
            -1,
        )
        .unwrap()
        .deduplicate();
        let ctx = SplitContext::new(&unique, None);
        // every pair scores the same: one round must strip them all
        let flat = FnSimilarity::new(|_: &[i32], _: &[i32], _: i32, _: Option<&Weights>| 1.0);
        let graph = SimilarityGraph::build(&ctx, &[0, 1, 2], &flat, 0.0);
        let result = graph.percolate();
        assert_eq!(result.rounds, 1);
        assert_eq!(result.components, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_already_disconnected_needs_no_rounds() {
        let unique = two_clusters().deduplicate();
        let ctx = SplitContext::new(&unique, None);
        let graph = SimilarityGraph::build(&ctx, &[0, 1, 2, 3], &HammingSimilarityWithoutMissing, 1.0);
        let result = graph.percolate();
        assert_eq!(result.rounds, 0);
        assert_eq!(result.components.len(), 2);
    }

    #[test]
    fn test_petgraph_view_agrees() {
        let unique = two_clusters().deduplicate();
        let ctx = SplitContext::new(&unique, None);
        let graph = SimilarityGraph::build(&ctx, &[0, 1, 2, 3], &HammingSimilarityWithoutMissing, 1.0);
        let view = graph.to_graph();
        assert_eq!(view.node_count(), 4);
        assert_eq!(view.edge_count(), graph.edge_count());
        assert_eq!(connected_components(&view), graph.components().len());
    }
}
