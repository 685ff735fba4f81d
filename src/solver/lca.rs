//! Ancestral state inference under Camin-Sokal parsimony
//!
//! Mutations are irreversible and arise independently, so a character on
//! which the descendants disagree cannot have mutated yet in their latest
//! common ancestor.

use crate::error::{Result, SolverError};
use crate::matrix::CharacterState;

/// Character vector of the latest common ancestor of `vectors`.
///
/// Per position: the shared state when every observed entry agrees, `0` when
/// observed entries disagree, and `missing_char` when nothing was observed.
pub fn get_lca_characters<V: AsRef<[CharacterState]>>(
    vectors: &[V],
    missing_char: CharacterState,
) -> Result<Vec<CharacterState>> {
    let first = vectors.first().ok_or(SolverError::EmptyInput)?.as_ref();
    let k = first.len();
    for (i, v) in vectors.iter().enumerate() {
        if v.as_ref().len() != k {
            return Err(SolverError::InconsistentVectorLength {
                sample: i.to_string(),
                expected: k,
                found: v.as_ref().len(),
            });
        }
    }

    let lca = (0..k)
        .map(|position| {
            let mut observed = vectors
                .iter()
                .map(|v| v.as_ref()[position])
                .filter(|&s| s != missing_char);
            match observed.next() {
                None => missing_char,
                Some(state) => {
                    if observed.all(|s| s == state) {
                        state
                    } else {
                        0
                    }
                }
            }
        })
        .collect();
    Ok(lca)
}
