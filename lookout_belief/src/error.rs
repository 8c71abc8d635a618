// Error types for the belief core.
//
// Only contract violations are errors: a missing or malformed observation,
// and a typed property read against a property of another type. Everything
// that is a normal belief outcome (unknown identifier, stale update,
// unreachable goal) is expressed as `Option`/`bool` instead.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BeliefError {
    #[error("invalid observation: {0}")]
    InvalidInput(String),
    #[error("entity {entity} has no {expected} property '{property}'")]
    TypeMismatch {
        entity: String,
        property: String,
        expected: &'static str,
    },
}
