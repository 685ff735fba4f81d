//! Neighbor joining (Saitou & Nei 1987) as a merge step
//!
//! Percolation can shatter a graph into more than two components. Their
//! ancestral vectors are joined with NJ and the bipartition at the root of
//! the result decides which components travel together.

use crate::error::{Result, SolverError};
use crate::matrix::{CharacterState, Weights};
use crate::similarity::DissimilarityFunction;
use crate::tree::{collapse_unifurcations, leaves_below};
use nalgebra::DMatrix;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

/// Rooted NJ tree; leaves carry the taxon index they stand for
#[derive(Debug, Clone)]
pub struct NjTree {
    graph: StableDiGraph<Option<usize>, f64>,
    root: NodeIndex,
    joins: usize,
}

impl NjTree {
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn graph(&self) -> &StableDiGraph<Option<usize>, f64> {
        &self.graph
    }

    /// Number of join operations performed
    pub fn joins(&self) -> usize {
        self.joins
    }

    pub fn collapse_unifurcations(&mut self) {
        self.root = collapse_unifurcations(&mut self.graph, self.root);
    }

    /// Taxa under each child of the root, each group ascending
    pub fn root_clusters(&self) -> Vec<Vec<usize>> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(self.root, Direction::Outgoing)
            .collect();
        children.sort();
        children
            .into_iter()
            .map(|child| {
                let mut taxa: Vec<usize> = leaves_below(&self.graph, child)
                    .into_iter()
                    .filter_map(|n| self.graph[n])
                    .collect();
                taxa.sort_unstable();
                taxa
            })
            .collect()
    }
}

/// Pairwise dissimilarities between character vectors
pub fn dissimilarity_matrix<V, D>(
    vectors: &[V],
    dissimilarity: &D,
    missing_char: CharacterState,
    weights: Option<&Weights>,
) -> DMatrix<f64>
where
    V: AsRef<[CharacterState]>,
    D: DissimilarityFunction + ?Sized,
{
    let n = vectors.len();
    let mut dist = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = dissimilarity.dissimilarity(
                vectors[i].as_ref(),
                vectors[j].as_ref(),
                missing_char,
                weights,
            );
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }
    dist
}

/// Build a tree from an n × n dissimilarity matrix (n ≥ 2).
///
/// Joins the pair minimizing Q(i, j) = (r − 2)·d(i, j) − R(i) − R(j) until
/// two nodes remain; those become the children of the root. Ties go to the
/// first pair in scan order. Distances may be negative.
pub fn neighbor_joining(dist: &DMatrix<f64>) -> Result<NjTree> {
    let n = dist.nrows();
    if dist.ncols() != n {
        return Err(SolverError::InvalidInput(format!(
            "distance matrix must be square, got {}x{}",
            n,
            dist.ncols()
        )));
    }
    if n < 2 {
        return Err(SolverError::InvalidInput(format!(
            "neighbor joining needs at least 2 taxa, got {}",
            n
        )));
    }
    if dist.iter().any(|d| !d.is_finite()) {
        return Err(SolverError::InvalidInput(
            "distance matrix contains non-finite values".into(),
        ));
    }

    // room for the n taxa plus the n - 2 internal nodes created by joins
    let max_nodes = 2 * n;
    let mut d = DMatrix::<f64>::zeros(max_nodes, max_nodes);
    d.view_mut((0, 0), (n, n)).copy_from(dist);

    let mut graph: StableDiGraph<Option<usize>, f64> = StableDiGraph::new();
    let mut node_of: Vec<NodeIndex> = (0..n).map(|i| graph.add_node(Some(i))).collect();
    let mut active: Vec<usize> = (0..n).collect();
    let mut joins = 0;

    while active.len() > 2 {
        let r = active.len() as f64;
        let mut row_sums = vec![0.0; max_nodes];
        for &i in &active {
            row_sums[i] = active.iter().filter(|&&j| j != i).map(|&j| d[(i, j)]).sum();
        }

        let mut best_q = f64::INFINITY;
        let mut best_pair = (active[0], active[1]);
        for (ai, &i) in active.iter().enumerate() {
            for &j in &active[ai + 1..] {
                let q = (r - 2.0) * d[(i, j)] - row_sums[i] - row_sums[j];
                if q < best_q {
                    best_q = q;
                    best_pair = (i, j);
                }
            }
        }
        let (bi, bj) = best_pair;

        let dij = d[(bi, bj)];
        let delta = (row_sums[bi] - row_sums[bj]) / (r - 2.0);
        let li = (0.5 * (dij + delta)).max(0.0);
        let lj = (0.5 * (dij - delta)).max(0.0);

        let new = node_of.len();
        let node = graph.add_node(None);
        graph.add_edge(node, node_of[bi], li);
        graph.add_edge(node, node_of[bj], lj);
        node_of.push(node);

        for &k in &active {
            if k != bi && k != bj {
                let dk = 0.5 * (d[(bi, k)] + d[(bj, k)] - dij);
                d[(new, k)] = dk;
                d[(k, new)] = dk;
            }
        }

        active.retain(|&x| x != bi && x != bj);
        active.push(new);
        joins += 1;
    }

    let (fi, fj) = (active[0], active[1]);
    let half = (d[(fi, fj)] / 2.0).max(0.0);
    let root = graph.add_node(None);
    graph.add_edge(root, node_of[fi], half);
    graph.add_edge(root, node_of[fj], half);

    Ok(NjTree { graph, root, joins })
}
