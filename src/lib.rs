//! lintree — top-down cell lineage reconstruction
//!
//! Infers the lineage of cells from the irreversible mutations they
//! accumulated. A character matrix is recursively partitioned by a split
//! strategy (greedy on the most frequent mutation, or similarity-graph
//! percolation) and the partitions are assembled into a rooted tree.

pub mod config;
pub mod error;
pub mod matrix;
pub mod similarity;
pub mod solver;
pub mod tree;

pub use config::SolverConfig;
pub use error::{Result, SolverError};
pub use matrix::{CharacterMatrix, CharacterState, Priors};
pub use solver::{PercolationSolver, RecursiveSolver, SplitStrategy, VanillaGreedySolver};
pub use tree::Tree;
