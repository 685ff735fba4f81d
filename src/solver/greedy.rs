//! VanillaGreedySolver: split on the most frequent mutation
//!
//! Mutations are irreversible, so samples sharing a frequent mutation most
//! likely descend from the ancestor in which it arose.

use super::missing::{MissingDataClassifier, MissingDataPolicy};
use super::{Partition, SplitContext, SplitStrategy};
use crate::config::SolverConfig;
use crate::error::{Result, SolverError};
use crate::matrix::{CharacterState, Weights};
use log::debug;
use std::collections::BTreeMap;

/// Frequency-based split strategy
#[derive(Debug, Clone, Default)]
pub struct VanillaGreedySolver<C = MissingDataPolicy> {
    classifier: C,
}

impl VanillaGreedySolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::with_classifier(config.missing_data)
    }
}

impl<C: MissingDataClassifier> VanillaGreedySolver<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Pick the (character, state) to split on.
    ///
    /// Candidates are mutated states not shared by every sample observed at
    /// that character. The highest `count × weight` wins; ties go to the
    /// lowest character, then the lowest state.
    pub fn find_split(
        &self,
        ctx: &SplitContext<'_>,
        samples: &[usize],
    ) -> Result<(usize, CharacterState)> {
        let missing_char = ctx.missing_char();
        let mut best: Option<((usize, CharacterState), f64)> = None;

        for character in 0..ctx.matrix.n_characters() {
            let mut counts: BTreeMap<CharacterState, usize> = BTreeMap::new();
            let mut missing = 0;
            for &sample in samples {
                let state = ctx.row(sample)[character];
                if state == missing_char {
                    missing += 1;
                } else if state != 0 {
                    *counts.entry(state).or_insert(0) += 1;
                }
            }

            let observed = samples.len() - missing;
            for (&state, &count) in &counts {
                if count >= observed {
                    continue;
                }
                let score = count as f64 * Weights::weight_of(ctx.weights, character, state);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some(((character, state), score));
                }
            }
        }

        best.map(|(split, _)| split)
            .ok_or(SolverError::NonSeparableSet { size: samples.len() })
    }

    /// Samples carrying `state` at `character` go left, other observed
    /// samples go right, missing ones are left to the classifier
    pub fn perform_split(
        &self,
        ctx: &SplitContext<'_>,
        samples: &[usize],
        (character, state): (usize, CharacterState),
    ) -> Partition {
        let missing_char = ctx.missing_char();
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut missing = Vec::new();
        for &sample in samples {
            let observed = ctx.row(sample)[character];
            if observed == state {
                left.push(sample);
            } else if observed == missing_char {
                missing.push(sample);
            } else {
                right.push(sample);
            }
        }

        if !missing.is_empty() {
            let (to_left, to_right) = self.classifier.classify(ctx, &left, &right, &missing);
            left.extend(to_left);
            right.extend(to_right);
        }
        left.sort_unstable();
        right.sort_unstable();
        Partition::new(left, right)
    }
}

impl<C: MissingDataClassifier> SplitStrategy for VanillaGreedySolver<C> {
    fn split(&self, ctx: &SplitContext<'_>, samples: &[usize]) -> Result<Partition> {
        let (character, state) = self.find_split(ctx, samples)?;
        debug!(
            "Greedy split of {} samples on character {} state {}",
            samples.len(),
            character,
            state
        );
        Ok(self.perform_split(ctx, samples, (character, state)))
    }

    fn name(&self) -> &'static str {
        "greedy"
    }
}
