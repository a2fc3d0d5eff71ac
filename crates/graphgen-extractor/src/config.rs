//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delimiters and entity types the model is asked to use
///
/// Shared by every language: only the prose of the prompt changes with the
/// input language, never the markers the parser splits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Separates fields inside one record
    pub tuple_delimiter: String,

    /// Separates records
    pub record_delimiter: String,

    /// Marks the end of the model's output
    pub completion_delimiter: String,

    /// Entity types offered to the model
    pub entity_types: Vec<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            tuple_delimiter: "<|>".to_string(),
            record_delimiter: "##".to_string(),
            completion_delimiter: "<|COMPLETE|>".to_string(),
            entity_types: [
                "concept",
                "date",
                "location",
                "keyword",
                "organization",
                "person",
                "event",
                "work",
                "nature",
                "artificial",
                "science",
                "technology",
                "mission",
                "gene",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FormatConfig {
    /// Validate the delimiters
    pub fn validate(&self) -> Result<(), String> {
        let delimiters = [
            ("tuple_delimiter", &self.tuple_delimiter),
            ("record_delimiter", &self.record_delimiter),
            ("completion_delimiter", &self.completion_delimiter),
        ];
        for (name, value) in delimiters {
            if value.is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        if self.tuple_delimiter == self.record_delimiter
            || self.tuple_delimiter == self.completion_delimiter
            || self.record_delimiter == self.completion_delimiter
        {
            return Err("delimiters must be distinct".to_string());
        }
        Ok(())
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum number of glean rounds after the initial extraction
    pub max_loop: usize,

    /// Maximum chunks (and merge keys) processed concurrently
    pub max_concurrency: usize,

    /// Maximum time for a single LLM call (seconds)
    pub llm_timeout_secs: u64,

    /// Whether long descriptions are summarised by the LLM during merge
    pub enable_summary: bool,

    /// Joined descriptions longer than this (characters) get summarised
    pub summary_threshold_chars: usize,

    /// Delimiters and entity types
    pub format: FormatConfig,
}

impl ExtractorConfig {
    /// Get the LLM call timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Worst-case number of LLM calls for one chunk
    pub fn max_calls_per_chunk(&self) -> usize {
        1 + 2 * self.max_loop
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        if self.summary_threshold_chars == 0 {
            return Err("summary_threshold_chars must be greater than 0".to_string());
        }
        self.format.validate()
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_loop: 3,
            max_concurrency: 8,
            llm_timeout_secs: 120,
            enable_summary: true,
            summary_threshold_chars: 2_000,
            format: FormatConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: one glean round, shorter timeouts, more parallelism
    pub fn aggressive() -> Self {
        Self {
            max_loop: 1,
            max_concurrency: 16,
            llm_timeout_secs: 60,
            enable_summary: false,
            summary_threshold_chars: 4_000,
            format: FormatConfig::default(),
        }
    }

    /// Lenient preset: more glean rounds and longer timeouts for better recall
    pub fn lenient() -> Self {
        Self {
            max_loop: 5,
            max_concurrency: 4,
            llm_timeout_secs: 300,
            enable_summary: true,
            summary_threshold_chars: 1_000,
            format: FormatConfig::default(),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
