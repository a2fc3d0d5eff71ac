//! Turns attribute lists into entity or relationship records

use crate::config::FormatConfig;
use crate::tokenizer::{extract_tuple, split_by_markers, split_records};
use graphgen_domain::{
    EntityRecord, ExtractionResult, RelationshipRecord, DEFAULT_RELATIONSHIP_WEIGHT,
};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?[0-9]*\.?[0-9]+$").expect("float pattern is valid")
});

const ENTITY_FIELDS: usize = 4;
const RELATIONSHIP_FIELDS: usize = 5;
const WEIGHT_INDEX: usize = 5;

/// Why a candidate record produced nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// First field is neither `entity` nor `relationship`
    UnknownKind(String),
    /// Fewer fields than the record kind requires
    TooFewFields {
        /// `entity` or `relationship`
        kind: &'static str,
        /// Fields actually present
        found: usize,
    },
    /// Entity name, source or target was empty after cleaning
    EmptyName,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::UnknownKind(kind) => write!(f, "unknown record kind '{}'", kind),
            DiscardReason::TooFewFields { kind, found } => {
                write!(f, "{} record with only {} fields", kind, found)
            }
            DiscardReason::EmptyName => write!(f, "empty entity name"),
        }
    }
}

/// Outcome of classifying one attribute list
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    /// An entity mention
    Entity(EntityRecord),
    /// A relationship mention
    Relationship(RelationshipRecord),
    /// Nothing usable
    Discarded(DiscardReason),
}

/// Clean one field of model output
///
/// Unescapes HTML entities, drops control characters, trims, and removes
/// surrounding double quotes.
pub fn clean_str(input: &str) -> String {
    let unescaped = unescape_html(input.trim());
    let visible: String = unescaped.chars().filter(|c| !c.is_control()).collect();
    visible.trim().trim_matches('"').trim().to_string()
}

fn unescape_html(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|&end| end <= 10) {
            Some(end) => match decode_entity(&tail[1..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let hex = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

fn discriminator(field: &str) -> String {
    clean_str(field).trim_matches('\'').to_lowercase()
}

/// Classify one attribute list taken from chunk `chunk_id`
///
/// Exactly one outcome per list. Entity descriptions containing the tuple
/// delimiter are rejoined with it; relationship fields past the weight are
/// ignored.
pub fn classify(attributes: &[&str], chunk_id: &str, tuple_delimiter: &str) -> ParsedRecord {
    let Some(first) = attributes.first() else {
        return ParsedRecord::Discarded(DiscardReason::UnknownKind(String::new()));
    };

    match discriminator(first).as_str() {
        "entity" => {
            if attributes.len() < ENTITY_FIELDS {
                return ParsedRecord::Discarded(DiscardReason::TooFewFields {
                    kind: "entity",
                    found: attributes.len(),
                });
            }
            let entity_name = clean_str(attributes[1]);
            if entity_name.is_empty() {
                return ParsedRecord::Discarded(DiscardReason::EmptyName);
            }
            ParsedRecord::Entity(EntityRecord {
                entity_name,
                entity_type: clean_str(attributes[2]),
                description: clean_str(&attributes[3..].join(tuple_delimiter)),
                source_id: chunk_id.to_string(),
            })
        }
        "relationship" => {
            if attributes.len() < RELATIONSHIP_FIELDS {
                return ParsedRecord::Discarded(DiscardReason::TooFewFields {
                    kind: "relationship",
                    found: attributes.len(),
                });
            }
            let src_id = clean_str(attributes[1]);
            let tgt_id = clean_str(attributes[2]);
            if src_id.is_empty() || tgt_id.is_empty() {
                return ParsedRecord::Discarded(DiscardReason::EmptyName);
            }
            ParsedRecord::Relationship(RelationshipRecord {
                src_id,
                tgt_id,
                description: clean_str(attributes[3]),
                keywords: clean_str(attributes[4]),
                weight: parse_weight(attributes.get(WEIGHT_INDEX).copied()),
                source_id: chunk_id.to_string(),
            })
        }
        other => ParsedRecord::Discarded(DiscardReason::UnknownKind(other.to_string())),
    }
}

fn parse_weight(field: Option<&str>) -> f64 {
    field
        .map(clean_str)
        .filter(|w| FLOAT_RE.is_match(w))
        .and_then(|w| w.parse().ok())
        .unwrap_or(DEFAULT_RELATIONSHIP_WEIGHT)
}

/// Records parsed from one chunk's raw output
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    /// Grouped records
    pub result: ExtractionResult,
    /// Candidates that held a tuple but produced no record
    pub discarded: usize,
}

/// Parse a chunk's concatenated raw output into grouped records
///
/// Candidates without a parenthesised group are skipped without counting;
/// malformed tuples are counted and logged at debug level.
pub fn parse_response(raw: &str, chunk_id: &str, format: &FormatConfig) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    for candidate in split_records(raw, &format.record_delimiter, &format.completion_delimiter) {
        let Some(inner) = extract_tuple(candidate) else {
            continue;
        };
        let attributes = split_by_markers(inner, &[format.tuple_delimiter.as_str()]);

        match classify(&attributes, chunk_id, &format.tuple_delimiter) {
            ParsedRecord::Entity(record) => parsed.result.push_entity(record),
            ParsedRecord::Relationship(record) => parsed.result.push_relationship(record),
            ParsedRecord::Discarded(reason) => {
                debug!("Chunk '{}': discarded {}: {}", chunk_id, reason, candidate);
                parsed.discarded += 1;
            }
        }
    }

    parsed
}
