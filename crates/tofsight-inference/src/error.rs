//! Error type for graph loading and execution.

use thiserror::Error;
use tofsight_types::Encoding;

use crate::graph::OpKind;

/// Errors raised while initialising or running the inference engine.
///
/// Every variant except [`InferenceError::InferenceFailed`] is an
/// initialisation failure and leaves the engine unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Graph schema mismatch: runtime expects version {expected}, graph has {found}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("Graph encoding mismatch: configured {expected}, graph uses {found}")]
    EncodingMismatch { expected: Encoding, found: Encoding },

    #[error("Unsupported operator: {0}")]
    UnsupportedOp(OpKind),

    #[error("Op resolver full: at most {capacity} operator kinds can be registered")]
    ResolverFull { capacity: usize },

    #[error("Arena exhausted: graph needs {required} bytes, arena holds {capacity}")]
    ArenaExhausted { required: usize, capacity: usize },

    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl InferenceError {
    /// `true` for errors that can only happen during initialisation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, InferenceError::InferenceFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_details() {
        let err = InferenceError::ArenaExhausted {
            required: 2048,
            capacity: 1024,
        };
        assert!(err.to_string().contains("2048"));
        let err = InferenceError::UnsupportedOp(OpKind::Softmax);
        assert!(err.to_string().contains("SOFTMAX"));
    }

    #[test]
    fn only_forward_pass_failures_are_recoverable() {
        assert!(!InferenceError::InferenceFailed("nan".into()).is_fatal());
        assert!(
            InferenceError::SchemaMismatch {
                expected: 3,
                found: 2
            }
            .is_fatal()
        );
    }
}
