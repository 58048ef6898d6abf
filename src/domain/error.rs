//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent invalid documents or geometry settings.
///
/// Tree operations, layout and viewport transitions never fail; these are
/// raised only where input enters the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node without id")]
    EmptyId,

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("invalid metadata '{key}' on node {id}: {reason}")]
    InvalidMetadata {
        id: String,
        key: String,
        reason: String,
    },

    #[error("invalid {name}: {value}")]
    InvalidDimension { name: String, value: f64 },
}

impl DomainError {
    pub fn dimension(name: impl Into<String>, value: f64) -> Self {
        Self::InvalidDimension {
            name: name.into(),
            value,
        }
    }
}

/// Result type for domain validation.
pub type DomainResult<T> = Result<T, DomainError>;
