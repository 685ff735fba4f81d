//! Character matrices — the observed mutation states per cell
//!
//! The preprocessing pipeline hands over one ordered state vector per sample.
//! Solvers work on the deduplicated view, where identical vectors share a
//! row index and are expanded back to every sample id once the tree is built.

mod character;
mod priors;

pub use character::{CharacterMatrix, CharacterState, UniqueCharacterMatrix};
pub use priors::{FnPriorTransform, PriorTransform, PriorTransformKind, Priors, Weights};
