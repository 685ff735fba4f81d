//! CharacterMatrix and its deduplicated row view

use crate::error::{Result, SolverError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A single character state. `0` is the unmutated state.
pub type CharacterState = i32;

/// Samples × characters table of observed mutation states
#[derive(Debug, Clone, Serialize)]
pub struct CharacterMatrix {
    /// Sample identifiers, in input order
    samples: Vec<String>,
    /// One state vector per sample, parallel to `samples`
    rows: Vec<Vec<CharacterState>>,
    /// Sentinel marking an unobserved state
    missing_char: CharacterState,
    /// Opaque per-sample annotations, carried onto the solved tree
    meta_data: Option<serde_json::Value>,
}

impl CharacterMatrix {
    /// Build a matrix from (sample id, state vector) pairs.
    ///
    /// Fails on duplicate ids or vectors of differing length.
    pub fn new<I, S>(entries: I, missing_char: CharacterState) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<CharacterState>)>,
        S: Into<String>,
    {
        let mut samples = Vec::new();
        let mut rows: Vec<Vec<CharacterState>> = Vec::new();
        let mut seen = HashMap::new();

        for (sample, states) in entries {
            let sample = sample.into();
            if let Some(first) = rows.first() {
                if first.len() != states.len() {
                    return Err(SolverError::InconsistentVectorLength {
                        sample,
                        expected: first.len(),
                        found: states.len(),
                    });
                }
            }
            if seen.insert(sample.clone(), samples.len()).is_some() {
                return Err(SolverError::DuplicateSample(sample));
            }
            samples.push(sample);
            rows.push(states);
        }

        Ok(Self {
            samples,
            rows,
            missing_char,
            meta_data: None,
        })
    }

    /// Attach meta data that the solver passes through untouched
    pub fn with_meta_data(mut self, meta_data: serde_json::Value) -> Self {
        self.meta_data = Some(meta_data);
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of characters per sample (0 for an empty matrix)
    pub fn n_characters(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn missing_char(&self) -> CharacterState {
        self.missing_char
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn meta_data(&self) -> Option<&serde_json::Value> {
        self.meta_data.as_ref()
    }

    /// State vector of a sample by id
    pub fn get(&self, sample: &str) -> Option<&[CharacterState]> {
        self.samples
            .iter()
            .position(|s| s == sample)
            .map(|i| self.rows[i].as_slice())
    }

    /// Iterate (sample id, state vector) in input order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CharacterState])> {
        self.samples
            .iter()
            .zip(self.rows.iter())
            .map(|(s, r)| (s.as_str(), r.as_slice()))
    }

    /// Collapse identical state vectors onto shared row indices.
    ///
    /// Rows are numbered in order of first appearance, so the result is
    /// deterministic for a given input order.
    pub fn deduplicate(&self) -> UniqueCharacterMatrix {
        let mut index: HashMap<&[CharacterState], usize> = HashMap::new();
        let mut rows: Vec<Vec<CharacterState>> = Vec::new();
        let mut row_samples: Vec<Vec<String>> = Vec::new();
        let mut node_mapping = BTreeMap::new();

        for (sample, states) in self.iter() {
            let row = *index.entry(states).or_insert_with(|| {
                rows.push(states.to_vec());
                row_samples.push(Vec::new());
                rows.len() - 1
            });
            row_samples[row].push(sample.to_string());
            node_mapping.insert(sample.to_string(), row);
        }

        UniqueCharacterMatrix {
            rows,
            row_samples,
            node_mapping,
            missing_char: self.missing_char,
        }
    }
}

/// Deduplicated character matrix addressed by integer row index
#[derive(Debug, Clone, Serialize)]
pub struct UniqueCharacterMatrix {
    rows: Vec<Vec<CharacterState>>,
    /// Original sample ids collapsed onto each row
    row_samples: Vec<Vec<String>>,
    /// Original sample id → row index
    node_mapping: BTreeMap<String, usize>,
    missing_char: CharacterState,
}

impl UniqueCharacterMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn n_characters(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn missing_char(&self) -> CharacterState {
        self.missing_char
    }

    /// State vector of a row
    pub fn row(&self, index: usize) -> &[CharacterState] {
        &self.rows[index]
    }

    /// Original sample ids collapsed onto a row
    pub fn samples_of(&self, index: usize) -> &[String] {
        &self.row_samples[index]
    }

    /// Row index of an original sample id
    pub fn row_of(&self, sample: &str) -> Option<usize> {
        self.node_mapping.get(sample).copied()
    }

    pub fn node_mapping(&self) -> &BTreeMap<String, usize> {
        &self.node_mapping
    }
}
