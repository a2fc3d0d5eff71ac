//! GraphGen LLM Provider Layer
//!
//! Pluggable LLM provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmClient` trait from
//! `graphgen-domain`. It supports multiple LLM backends with a common
//! interface, plus a retry decorator that wraps any of them.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama chat API integration
//! - `RetryingProvider`: Exponential-backoff wrapper around another provider
//!
//! # Examples
//!
//! ```
//! use graphgen_llm::MockProvider;
//! use graphgen_domain::{traits::LlmClient, ConversationHistory};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let provider = MockProvider::new("Hello from LLM!");
//! let history = ConversationHistory::new();
//! let result = provider.generate("test prompt", &history).await.unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod retry;

use async_trait::async_trait;
use graphgen_domain::traits::LlmClient;
use graphgen_domain::ConversationHistory;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use retry::{RetryPolicy, RetryingProvider};

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// A single request attempt ran past its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::RateLimitExceeded | LlmError::Timeout(_)
        )
    }
}

/// Marker response that makes [`MockProvider`] fail instead of answering
pub const MOCK_ERROR: &str = "ERROR";

/// A call observed by [`MockProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Prompt passed to `generate`
    pub prompt: String,

    /// Number of history turns passed along with the prompt
    pub history_len: usize,
}

/// Mock LLM provider for deterministic testing
///
/// Answers are chosen in this order:
///
/// 1. A response registered for the exact prompt. Several responses for the
///    same prompt are returned in order; the last one repeats.
/// 2. The next entry of the script queue.
/// 3. The default response.
///
/// Any chosen answer equal to [`MOCK_ERROR`] is returned as an error.
///
/// # Examples
///
/// ```
/// use graphgen_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("should continue?", "yes");
/// provider.add_response("should continue?", "no");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    script: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a MockProvider that answers calls in order from `script`
    ///
    /// Once the script is exhausted the default response (empty) is used.
    pub fn scripted<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new("");
        provider
            .script
            .lock()
            .unwrap()
            .extend(script.into_iter().map(Into::into));
        provider
    }

    /// Add a response for a given prompt
    ///
    /// Calling this repeatedly for the same prompt queues the responses.
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(prompt.into())
            .or_default()
            .push_back(response.into());
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.add_response(prompt, MOCK_ERROR);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Reset the call count and recorded calls
    pub fn reset_call_count(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self, prompt: &str) -> String {
        let mut responses = self.responses.lock().unwrap();
        if let Some(queue) = responses.get_mut(prompt) {
            if queue.len() > 1 {
                if let Some(front) = queue.pop_front() {
                    return front;
                }
            }
            if let Some(last) = queue.front() {
                return last.clone();
            }
        }
        drop(responses);

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }

        self.default_response.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmClient for MockProvider {
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        history: &ConversationHistory,
    ) -> Result<String, Self::Error> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            history_len: history.len(),
        });

        let response = self.next_response(prompt);
        if response == MOCK_ERROR {
            return Err(LlmError::Other("Mock error".to_string()));
        }
        Ok(response)
    }
}
