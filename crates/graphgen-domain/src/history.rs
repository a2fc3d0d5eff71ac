//! Conversation history for multi-turn LLM calls

use serde::{Deserialize, Serialize};

/// One prompt/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// What was sent to the model
    pub prompt: String,

    /// What the model answered
    pub response: String,
}

/// Ordered sequence of turns
///
/// Grows monotonically while one chunk is being gleaned and is dropped once
/// extraction returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a history from a single exchange
    pub fn from_exchange(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.push(prompt, response);
        history
    }

    /// Append an exchange
    pub fn push(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.turns.push(Turn {
            prompt: prompt.into(),
            response: response.into(),
        });
    }

    /// The recorded turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when no turn has been recorded
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
