//! PercolationSolver: split by dissolving the weakest similarity edges
//!
//! Samples are connected by their pairwise similarity and the weakest edges
//! are removed until the graph breaks apart. When it breaks into more than
//! two pieces, the pieces are grouped in two by neighbor joining over their
//! ancestral character vectors.

use super::graph::SimilarityGraph;
use super::lca::get_lca_characters;
use super::neighbor_joining::{dissimilarity_matrix, neighbor_joining};
use super::{Partition, SplitContext, SplitStrategy};
use crate::config::SolverConfig;
use crate::error::{Result, SolverError};
use crate::matrix::CharacterState;
use crate::similarity::{NegatedSimilarity, SimilarityFunction, SimilarityKind};
use log::debug;

/// Graph-percolation split strategy
#[derive(Debug, Clone)]
pub struct PercolationSolver<S = SimilarityKind> {
    similarity: S,
    /// Pairs scoring below this never get an edge
    threshold: f64,
}

impl Default for PercolationSolver {
    fn default() -> Self {
        Self {
            similarity: SimilarityKind::default(),
            threshold: 0.0,
        }
    }
}

impl PercolationSolver {
    /// Shared-mutation similarity, threshold 0
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        Self::with_similarity(config.similarity, config.threshold)
    }
}

impl<S: SimilarityFunction> PercolationSolver<S> {
    /// Fails with `InvalidThreshold` unless `threshold` is finite and inside
    /// the similarity function's valid range
    pub fn with_similarity(similarity: S, threshold: f64) -> Result<Self> {
        let (min, max) = similarity.valid_range();
        if !threshold.is_finite() || threshold < min || threshold > max {
            return Err(SolverError::InvalidThreshold {
                threshold,
                min,
                max,
            });
        }
        Ok(Self {
            similarity,
            threshold,
        })
    }

    pub fn similarity(&self) -> &S {
        &self.similarity
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Partition `samples` by percolating their similarity graph.
    ///
    /// A graph with no edges is returned whole on the left side.
    pub fn perform_split(&self, ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Partition> {
        let graph = SimilarityGraph::build(ctx, samples, &self.similarity, self.threshold);
        if graph.edge_count() == 0 {
            debug!("No edges among {} samples at threshold {}", samples.len(), self.threshold);
            return Ok(Partition::non_separable(samples));
        }

        let percolation = graph.percolate();
        debug!(
            "Percolated {} samples into {} components after {} rounds",
            samples.len(),
            percolation.components.len(),
            percolation.rounds
        );

        let mut components = percolation.components;
        match components.len() {
            // a graph with an edge always percolates into at least two
            0 | 1 => Ok(Partition::non_separable(samples)),
            2 => {
                let right = components.pop().unwrap_or_default();
                let left = components.pop().unwrap_or_default();
                Ok(Partition::new(left, right))
            }
            _ => self.merge_components(ctx, &components),
        }
    }

    /// Group more than two components into two by neighbor joining over
    /// their LCA vectors, with negated similarity as the distance
    fn merge_components(
        &self,
        ctx: &SplitContext<'_>,
        components: &[Vec<usize>],
    ) -> Result<Partition> {
        let lcas = components
            .iter()
            .map(|members| {
                let rows: Vec<&[CharacterState]> = members.iter().map(|&m| ctx.row(m)).collect();
                get_lca_characters(&rows, ctx.missing_char())
            })
            .collect::<Result<Vec<_>>>()?;

        let dist = dissimilarity_matrix(
            &lcas,
            &NegatedSimilarity(&self.similarity),
            ctx.missing_char(),
            ctx.weights,
        );
        let mut tree = neighbor_joining(&dist)?;
        tree.collapse_unifurcations();

        let clusters = tree.root_clusters();
        if clusters.len() != 2 {
            return Err(SolverError::InvalidPartition(format!(
                "neighbor joining root has {} children, expected 2",
                clusters.len()
            )));
        }

        let mut sides: Vec<Vec<usize>> = clusters
            .iter()
            .map(|cluster| {
                let mut side: Vec<usize> = cluster
                    .iter()
                    .flat_map(|&c| components[c].iter().copied())
                    .collect();
                side.sort_unstable();
                side
            })
            .collect();
        sides.sort();
        debug!(
            "Joined {} components into sides of {} and {}",
            components.len(),
            sides[0].len(),
            sides[1].len()
        );

        let right = sides.pop().unwrap_or_default();
        let left = sides.pop().unwrap_or_default();
        Ok(Partition::new(left, right))
    }
}

impl<S: SimilarityFunction> SplitStrategy for PercolationSolver<S> {
    fn split(&self, ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Partition> {
        self.perform_split(ctx, samples)
    }

    fn name(&self) -> &'static str {
        "percolation"
    }
}
