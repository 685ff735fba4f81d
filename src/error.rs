//! Solver errors
//!
//! Structural problems with the input (ragged matrices, duplicate ids, bad
//! priors or thresholds) are fatal. `NonSeparableSet` is the one recoverable
//! kind: the harness turns it into a polytomy instead of failing the solve.

use crate::matrix::CharacterState;

/// Errors raised while building or solving a lineage tree
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("No samples were given to the solver")]
    EmptyInput,

    #[error("Reached an empty sample set during recursion")]
    EmptyPartition,

    #[error("Threshold {threshold} is outside the similarity range [{min}, {max}]")]
    InvalidThreshold { threshold: f64, min: f64, max: f64 },

    #[error("Set of {size} samples cannot be separated")]
    NonSeparableSet { size: usize },

    #[error("Sample '{sample}' has {found} characters, expected {expected}")]
    InconsistentVectorLength {
        sample: String,
        expected: usize,
        found: usize,
    },

    #[error("Sample '{0}' appears more than once in the character matrix")]
    DuplicateSample(String),

    #[error("Prior for character {character} state {state} must lie in (0, 1], got {probability}")]
    InvalidPrior {
        character: usize,
        state: CharacterState,
        probability: f64,
    },

    #[error("Split strategy returned an invalid partition: {0}")]
    InvalidPartition(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SolverError {
    /// Whether the harness may absorb this error locally
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SolverError::NonSeparableSet { .. })
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SolverError::InconsistentVectorLength {
            sample: "cell_7".into(),
            expected: 4,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("cell_7"));
        assert!(msg.contains("expected 4"));

        let err = SolverError::InvalidThreshold { threshold: -1.0, min: 0.0, max: f64::INFINITY };
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_only_non_separable_is_recoverable() {
        assert!(SolverError::NonSeparableSet { size: 3 }.is_recoverable());
        assert!(!SolverError::EmptyInput.is_recoverable());
        assert!(!SolverError::InvalidPartition("overlap".into()).is_recoverable());
    }

    #[test]
    fn test_config_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SolverError = json_err.into();
        assert!(matches!(err, SolverError::Config(_)));
    }
}
