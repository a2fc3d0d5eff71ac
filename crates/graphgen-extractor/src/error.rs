//! Error types for the Extractor

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage at which an LLM call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The first extraction call
    Initial,
    /// A "should I continue?" call, 1-based round
    Deciding {
        /// Glean round the decision belongs to
        round: usize,
    },
    /// A "continue extracting" call, 1-based round
    Extracting {
        /// Glean round being extracted
        round: usize,
    },
    /// Description summarisation during merge
    Summarizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Initial => write!(f, "initial extraction"),
            Stage::Deciding { round } => write!(f, "continue decision (round {})", round),
            Stage::Extracting { round } => write!(f, "glean extraction (round {})", round),
            Stage::Summarizing => write!(f, "description summarization"),
        }
    }
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error for chunk '{chunk_id}' during {stage}: {message}")]
    Llm {
        /// Chunk being extracted
        chunk_id: String,
        /// Stage whose call failed
        stage: Stage,
        /// Provider error message
        message: String,
    },

    /// An LLM call exceeded the configured timeout
    #[error("LLM call timed out for chunk '{chunk_id}' during {stage}")]
    Timeout {
        /// Chunk being extracted
        chunk_id: String,
        /// Stage whose call timed out
        stage: Stage,
    },

    /// Description summarisation failed for a node or edge
    #[error("LLM error while summarizing {key}: {message}")]
    Summary {
        /// Entity name or `(src, tgt)` label being merged
        key: String,
        /// Provider error message, or the timeout
        message: String,
    },

    /// Graph store error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Chunk the error belongs to, if any
    pub fn chunk_id(&self) -> Option<&str> {
        match self {
            ExtractorError::Llm { chunk_id, .. } | ExtractorError::Timeout { chunk_id, .. } => {
                Some(chunk_id)
            }
            _ => None,
        }
    }

    /// Stage the error happened in, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ExtractorError::Llm { stage, .. } | ExtractorError::Timeout { stage, .. } => {
                Some(*stage)
            }
            ExtractorError::Summary { .. } => Some(Stage::Summarizing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_chunk_and_stage() {
        let err = ExtractorError::Llm {
            chunk_id: "c1".to_string(),
            stage: Stage::Extracting { round: 2 },
            message: "connection reset".to_string(),
        };

        assert_eq!(err.chunk_id(), Some("c1"));
        assert_eq!(err.stage(), Some(Stage::Extracting { round: 2 }));
        let text = err.to_string();
        assert!(text.contains("c1"));
        assert!(text.contains("round 2"));
    }

    #[test]
    fn test_summary_error_names_merge_key_not_chunk() {
        let err = ExtractorError::Summary {
            key: "Entity1".to_string(),
            message: "connection reset".to_string(),
        };

        assert!(err.chunk_id().is_none());
        assert_eq!(err.stage(), Some(Stage::Summarizing));
        assert!(!err.to_string().contains("chunk"));
        assert!(err.to_string().contains("Entity1"));
    }

    #[test]
    fn test_store_error_has_no_chunk() {
        let err = ExtractorError::Store("disk full".to_string());
        assert!(err.chunk_id().is_none());
        assert!(err.stage().is_none());
    }
}
