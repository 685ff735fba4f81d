//! Priors and mutation weights
//!
//! Priors give the probability of each (character, state) mutation arising.
//! A prior transform turns them into weights, so rare mutations count for
//! more when scoring splits and similarities.

use super::CharacterState;
use crate::error::{Result, SolverError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Character index → state → prior probability
pub type Priors = BTreeMap<usize, BTreeMap<CharacterState, f64>>;

/// Turns a prior probability into a non-negative weight
pub trait PriorTransform {
    fn transform(&self, probability: f64) -> f64;
}

/// Built-in prior transforms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorTransformKind {
    /// `-ln(p)`
    #[default]
    NegativeLog,
    /// `1 / sqrt(p)`
    SquareRootInverse,
}

impl PriorTransform for PriorTransformKind {
    fn transform(&self, probability: f64) -> f64 {
        match self {
            PriorTransformKind::NegativeLog => -probability.ln(),
            PriorTransformKind::SquareRootInverse => 1.0 / probability.sqrt(),
        }
    }
}

/// Caller-supplied prior transform
pub struct FnPriorTransform<F>(pub F);

impl<F> PriorTransform for FnPriorTransform<F>
where
    F: Fn(f64) -> f64,
{
    fn transform(&self, probability: f64) -> f64 {
        (self.0)(probability)
    }
}

/// Per-(character, state) weights. Missing entries weigh 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weights(BTreeMap<usize, BTreeMap<CharacterState, f64>>);

impl Weights {
    /// Derive weights from priors.
    ///
    /// Every probability must lie in (0, 1] and every transformed weight must
    /// be finite and non-negative.
    pub fn from_priors(priors: &Priors, transform: &dyn PriorTransform) -> Result<Self> {
        let mut table = BTreeMap::new();
        for (&character, states) in priors {
            let mut row = BTreeMap::new();
            for (&state, &probability) in states {
                if !(probability > 0.0 && probability <= 1.0) {
                    return Err(SolverError::InvalidPrior {
                        character,
                        state,
                        probability,
                    });
                }
                let weight = transform.transform(probability);
                if !weight.is_finite() || weight < 0.0 {
                    return Err(SolverError::InvalidInput(format!(
                        "prior transform produced weight {} for character {} state {}",
                        weight, character, state
                    )));
                }
                row.insert(state, weight);
            }
            table.insert(character, row);
        }
        Ok(Self(table))
    }

    /// Weight of a (character, state) pair, if one was configured
    pub fn get(&self, character: usize, state: CharacterState) -> Option<f64> {
        self.0.get(&character).and_then(|s| s.get(&state)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weight lookup that treats absent weights as uniform
    pub fn weight_of(weights: Option<&Weights>, character: usize, state: CharacterState) -> f64 {
        weights
            .and_then(|w| w.get(character, state))
            .unwrap_or(1.0)
    }
}
