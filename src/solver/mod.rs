//! Top-down lineage solvers
//!
//! A [`SplitStrategy`] partitions a set of deduplicated sample rows in two;
//! the [`RecursiveSolver`] harness applies it until every set is a single
//! row and assembles the resulting tree. Two strategies ship with the crate:
//! the frequency-based [`VanillaGreedySolver`] and the graph-based
//! [`PercolationSolver`].

mod graph;
mod greedy;
mod harness;
mod lca;
mod missing;
mod neighbor_joining;
mod percolation;

pub use graph::{Percolation, SimilarityGraph, WeightedEdge};
pub use greedy::VanillaGreedySolver;
pub use harness::RecursiveSolver;
pub use lca::get_lca_characters;
pub use missing::{FnClassifier, MissingDataClassifier, MissingDataPolicy, Side};
pub use neighbor_joining::{dissimilarity_matrix, neighbor_joining, NjTree};
pub use percolation::PercolationSolver;

use crate::error::{Result, SolverError};
use crate::matrix::{CharacterState, UniqueCharacterMatrix, Weights};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read-only data a strategy needs for one split
#[derive(Debug, Clone, Copy)]
pub struct SplitContext<'a> {
    pub matrix: &'a UniqueCharacterMatrix,
    pub weights: Option<&'a Weights>,
}

impl<'a> SplitContext<'a> {
    pub fn new(matrix: &'a UniqueCharacterMatrix, weights: Option<&'a Weights>) -> Self {
        Self { matrix, weights }
    }

    pub fn missing_char(&self) -> CharacterState {
        self.matrix.missing_char()
    }

    pub fn row(&self, index: usize) -> &'a [CharacterState] {
        self.matrix.row(index)
    }
}

/// Strategy for cutting a sample set in two
pub trait SplitStrategy {
    /// Partition `samples` (row indices of the context matrix).
    ///
    /// A partition with an empty side, or a `NonSeparableSet` error, tells
    /// the harness the set cannot be resolved any further.
    fn split(&self, ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Partition>;

    /// Short name used in log lines
    fn name(&self) -> &'static str;
}

/// Two disjoint groups of row indices covering the input set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

impl Partition {
    pub fn new(left: Vec<usize>, right: Vec<usize>) -> Self {
        Self { left, right }
    }

    /// Whole set on one side: nothing was separated
    pub fn non_separable(samples: &[usize]) -> Self {
        Self::new(samples.to_vec(), Vec::new())
    }

    pub fn is_degenerate(&self) -> bool {
        self.left.is_empty() || self.right.is_empty()
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Check the sides are disjoint and together contain exactly `samples`
    pub fn validate(&self, samples: &[usize]) -> Result<()> {
        let expected: HashSet<usize> = samples.iter().copied().collect();
        let mut seen = HashSet::with_capacity(self.len());
        for &s in self.left.iter().chain(self.right.iter()) {
            if !seen.insert(s) {
                return Err(SolverError::InvalidPartition(format!(
                    "sample {} appears more than once",
                    s
                )));
            }
            if !expected.contains(&s) {
                return Err(SolverError::InvalidPartition(format!(
                    "sample {} was not in the input set",
                    s
                )));
            }
        }
        if seen.len() != expected.len() {
            return Err(SolverError::InvalidPartition(format!(
                "{} of {} samples were dropped",
                expected.len() - seen.len(),
                expected.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_validate() {
        let samples = [0, 1, 2, 3];
        assert!(Partition::new(vec![0, 2], vec![1, 3]).validate(&samples).is_ok());
        assert!(Partition::non_separable(&samples).validate(&samples).is_ok());
    }

    #[test]
    fn test_partition_rejects_duplicates_and_drops() {
        let samples = [0, 1, 2];
        let dup = Partition::new(vec![0, 1], vec![1, 2]);
        assert!(matches!(dup.validate(&samples), Err(SolverError::InvalidPartition(_))));

        let dropped = Partition::new(vec![0], vec![2]);
        let err = dropped.validate(&samples).unwrap_err();
        assert!(err.to_string().contains("dropped"));

        let foreign = Partition::new(vec![0, 1], vec![2, 9]);
        assert!(foreign.validate(&samples).is_err());
    }

    #[test]
    fn test_degenerate() {
        assert!(Partition::non_separable(&[4, 5]).is_degenerate());
        assert!(!Partition::new(vec![4], vec![5]).is_degenerate());
    }
}
