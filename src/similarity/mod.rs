//! Similarity and dissimilarity between mutation-state vectors
//!
//! Scoring functions are injected into the solvers through the
//! [`SimilarityFunction`] and [`DissimilarityFunction`] traits. The built-in
//! Hamming-style scores live in `hamming`; [`SimilarityKind`] selects one of
//! them from configuration.

mod hamming;

pub use hamming::{
    HammingDistance, HammingSimilarityNormalizedOverMissing, HammingSimilarityWithoutMissing,
    WeightedHammingDistance,
};

use crate::matrix::{CharacterState, Weights};
use serde::{Deserialize, Serialize};

/// Scores how strongly two state vectors support a shared ancestor
pub trait SimilarityFunction {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64;

    /// Closed interval of scores this function can produce
    fn valid_range(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }
}

/// Scores how far apart two state vectors are
pub trait DissimilarityFunction {
    fn dissimilarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64;
}

impl<T: SimilarityFunction + ?Sized> SimilarityFunction for &T {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        (**self).similarity(a, b, missing_char, weights)
    }

    fn valid_range(&self) -> (f64, f64) {
        (**self).valid_range()
    }
}

impl<T: SimilarityFunction + ?Sized> SimilarityFunction for Box<T> {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        (**self).similarity(a, b, missing_char, weights)
    }

    fn valid_range(&self) -> (f64, f64) {
        (**self).valid_range()
    }
}

/// Turns a similarity into a dissimilarity by negation, so the most similar
/// pair becomes the closest
pub struct NegatedSimilarity<S>(pub S);

impl<S: SimilarityFunction> DissimilarityFunction for NegatedSimilarity<S> {
    fn dissimilarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        -self.0.similarity(a, b, missing_char, weights)
    }
}

/// Caller-supplied similarity with an explicit valid range
pub struct FnSimilarity<F> {
    func: F,
    range: (f64, f64),
}

impl<F> FnSimilarity<F>
where
    F: Fn(&[CharacterState], &[CharacterState], CharacterState, Option<&Weights>) -> f64,
{
    /// Wrap a closure; scores are assumed unbounded
    pub fn new(func: F) -> Self {
        Self {
            func,
            range: (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }
}

impl<F> SimilarityFunction for FnSimilarity<F>
where
    F: Fn(&[CharacterState], &[CharacterState], CharacterState, Option<&Weights>) -> f64,
{
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        (self.func)(a, b, missing_char, weights)
    }

    fn valid_range(&self) -> (f64, f64) {
        self.range
    }
}

/// Built-in similarity functions selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityKind {
    #[default]
    HammingWithoutMissing,
    HammingNormalizedOverMissing,
}

impl SimilarityFunction for SimilarityKind {
    fn similarity(
        &self,
        a: &[CharacterState],
        b: &[CharacterState],
        missing_char: CharacterState,
        weights: Option<&Weights>,
    ) -> f64 {
        match self {
            SimilarityKind::HammingWithoutMissing => {
                HammingSimilarityWithoutMissing.similarity(a, b, missing_char, weights)
            }
            SimilarityKind::HammingNormalizedOverMissing => {
                HammingSimilarityNormalizedOverMissing.similarity(a, b, missing_char, weights)
            }
        }
    }

    fn valid_range(&self) -> (f64, f64) {
        match self {
            SimilarityKind::HammingWithoutMissing => HammingSimilarityWithoutMissing.valid_range(),
            SimilarityKind::HammingNormalizedOverMissing => {
                HammingSimilarityNormalizedOverMissing.valid_range()
            }
        }
    }
}
