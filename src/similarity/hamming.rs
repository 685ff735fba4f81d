//! Hamming-style scores over character vectors
//!
//! All scores skip positions where either side is missing. Similarities only
//! count shared *mutations*: two unmutated positions carry no evidence of a
//! common ancestor below the root.

use super::{DissimilarityFunction, SimilarityFunction};
use crate::matrix::{CharacterState, Weights};

/// Positions observed on both sides
fn present_pairs<'a>(
    a: &'a [CharacterState],
    b: &'a [CharacterState],
    missing_char: CharacterState,
) -> impl Iterator<Item = (usize, CharacterState, CharacterState)> + 'a {
    a.iter()
        .zip(b.iter())
        .enumerate()
        .filter(move |&(_, (&x, &y))| x != missing_char && y != missing_char)
        .map(|(i, (&x, &y))| (i, x, y))
}

/// Weighted count of shared mutations
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingSimilarityWithoutMissing;

impl SimilarityFunction for HammingSimilarityWithoutMissing {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        present_pairs(a, b, missing_char)
            .filter(|&(_, x, y)| x == y && x != 0)
            .map(|(i, x, _)| Weights::weight_of(weights, i, x))
            .sum()
    }

    fn valid_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }
}

/// Shared-mutation similarity divided by the number of positions observed
/// on both sides
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingSimilarityNormalizedOverMissing;

impl SimilarityFunction for HammingSimilarityNormalizedOverMissing {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        let present = present_pairs(a, b, missing_char).count();
        if present == 0 {
            return 0.0;
        }
        HammingSimilarityWithoutMissing.similarity(a, b, missing_char, weights) / present as f64
    }

    fn valid_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }
}

/// Number of observed positions where the two vectors disagree
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingDistance;

impl DissimilarityFunction for HammingDistance {
    fn dissimilarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        _weights: Option<&Weights>,
    ) -> f64 {
        present_pairs(a, b, missing_char)
            .filter(|&(_, x, y)| x != y)
            .count() as f64
    }
}

/// Mutation-aware distance: an unmutated-vs-mutated disagreement costs the
/// mutation's weight, two different mutations cost both weights. Normalized
/// by the number of positions observed on both sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedHammingDistance;

impl DissimilarityFunction for WeightedHammingDistance {
    fn dissimilarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        let mut present = 0usize;
        let mut total = 0.0;
        for (i, x, y) in present_pairs(a, b, missing_char) {
            present += 1;
            if x == y {
                continue;
            }
            if x == 0 || y == 0 {
                let mutated = if x == 0 { y } else { x };
                total += Weights::weight_of(weights, i, mutated);
            } else {
                total += Weights::weight_of(weights, i, x) + Weights::weight_of(weights, i, y);
            }
        }
        if present == 0 {
            return 0.0;
        }
        total / present as f64
    }
}
