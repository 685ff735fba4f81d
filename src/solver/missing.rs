//! Missing-data classifiers for the greedy split
//!
//! When a sample was not observed at the splitting character, something
//! else has to decide which side it joins. That decision is injected into
//! the greedy solver through [`MissingDataClassifier`].

use super::SplitContext;
use crate::similarity::{HammingSimilarityWithoutMissing, SimilarityFunction};
use serde::{Deserialize, Serialize};

/// Side of a partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// Assigns samples with a missing splitting character to a side
pub trait MissingDataClassifier {
    /// Returns the `missing` samples split into (joining left, joining
    /// right). Every missing sample must be returned exactly once.
    fn classify(
        &self,
        ctx: &SplitContext<'_>,
        left: &[usize],
        right: &[usize],
        missing: &[usize],
    ) -> (Vec<usize>, Vec<usize>);
}

/// Built-in classifiers selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingDataPolicy {
    /// Everything joins the larger side (left on ties)
    AssignToLarger,
    /// Each sample joins the side it shares more mutations with on average
    /// (right on ties)
    #[default]
    AverageSimilarity,
    /// Everything joins a fixed side
    AssignTo(Side),
}

impl MissingDataClassifier for MissingDataPolicy {
    fn classify(
        &self,
        ctx: &SplitContext<'_>,
        left: &[usize],
        right: &[usize],
        missing: &[usize],
    ) -> (Vec<usize>, Vec<usize>) {
        match self {
            MissingDataPolicy::AssignToLarger => {
                if left.len() >= right.len() {
                    (missing.to_vec(), Vec::new())
                } else {
                    (Vec::new(), missing.to_vec())
                }
            }
            MissingDataPolicy::AssignTo(Side::Left) => (missing.to_vec(), Vec::new()),
            MissingDataPolicy::AssignTo(Side::Right) => (Vec::new(), missing.to_vec()),
            MissingDataPolicy::AverageSimilarity => {
                missing.iter().partition(|&&sample| {
                    let to_left = mean_similarity(ctx, sample, left);
                    let to_right = mean_similarity(ctx, sample, right);
                    to_left > to_right
                })
            }
        }
    }
}

fn mean_similarity(ctx: &SplitContext<'_>, sample: usize, group: &[usize]) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    let total: f64 = group
        .iter()
        .map(|&other| {
            HammingSimilarityWithoutMissing.similarity(
                ctx.row(sample),
                ctx.row(other),
                ctx.missing_char(),
                ctx.weights,
            )
        })
        .sum();
    total / group.len() as f64
}

/// Caller-supplied classifier
pub struct FnClassifier<F>(pub F);

impl<F> MissingDataClassifier for FnClassifier<F>
where
    F: Fn(&SplitContext<'_>, &[usize], &[usize], &[usize]) -> (Vec<usize>, Vec<usize>),
{
    fn classify(
        &self,
        ctx: &SplitContext<'_>,
        left: &[usize],
        right: &[usize],
        missing: &[usize],
    ) -> (Vec<usize>, Vec<usize>) {
        (self.0)(ctx, left, right, missing)
    }
}
