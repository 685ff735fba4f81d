//! SolverConfig — selects the built-in behaviours of the solvers
//!
//! Everything a solve depends on besides the input itself: the similarity
//! threshold, which similarity and prior transform to use, and where samples
//! with missing data go during greedy splits.

use crate::error::Result;
use crate::matrix::PriorTransformKind;
use crate::similarity::SimilarityKind;
use crate::solver::MissingDataPolicy;
use serde::{Deserialize, Serialize};

/// Solver configuration, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Minimum similarity for two samples to share an edge (percolation)
    pub threshold: f64,
    /// Pairwise similarity used by percolation and its merge step
    pub similarity: SimilarityKind,
    /// Turns priors into mutation weights
    pub prior_transform: PriorTransformKind,
    /// Side assignment for samples missing the splitting character (greedy)
    pub missing_data: MissingDataPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            similarity: SimilarityKind::HammingWithoutMissing,
            prior_transform: PriorTransformKind::NegativeLog,
            missing_data: MissingDataPolicy::AverageSimilarity,
        }
    }
}

impl SolverConfig {
    /// Only samples sharing at least one mutation are connected
    pub fn strict() -> Self {
        Self {
            threshold: 1.0,
            ..Self::default()
        }
    }

    /// Every pair is connected and similarity is normalized for missing data
    pub fn permissive() -> Self {
        Self {
            threshold: 0.0,
            similarity: SimilarityKind::HammingNormalizedOverMissing,
            prior_transform: PriorTransformKind::SquareRootInverse,
            missing_data: MissingDataPolicy::AssignToLarger,
        }
    }

    /// Parse a configuration; absent fields take their default
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
