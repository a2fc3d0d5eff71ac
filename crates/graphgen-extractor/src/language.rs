//! Input language selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prompt template family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English prompts
    English,
    /// Chinese prompts
    Chinese,
}

impl Language {
    /// Name used inside prompts ("Use {language} as output language")
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the template family for `text`
///
/// Any CJK unified ideograph selects Chinese; everything else is English.
///
/// # Examples
///
/// ```
/// use graphgen_extractor::{detect_language, Language};
///
/// assert_eq!(detect_language("Entity1 founded by Person1."), Language::English);
/// assert_eq!(detect_language("张三创立了公司"), Language::Chinese);
/// ```
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)) {
        Language::Chinese
    } else {
        Language::English
    }
}
