//! JSONL chunk loading.

use crate::error::Result;
use graphgen_domain::Chunk;
use serde::Deserialize;
use std::io::BufRead;
use tracing::warn;

/// One line of a chunk file.
#[derive(Debug, Deserialize)]
struct ChunkLine {
    #[serde(default)]
    id: Option<String>,
    content: String,
}

/// Chunks read from a JSONL source.
#[derive(Debug, Default)]
pub struct LoadedChunks {
    /// Parsed chunks, in file order
    pub chunks: Vec<Chunk>,

    /// Non-blank lines that could not be parsed
    pub skipped: usize,
}

/// Read `{"id": ..., "content": ...}` objects, one per line.
///
/// Blank lines are ignored. Lines that fail to parse are logged and skipped.
/// A missing or blank id becomes `chunk-<line number>` (1-based).
pub fn load_chunks<R: BufRead>(reader: R) -> Result<LoadedChunks> {
    let mut loaded = LoadedChunks::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ChunkLine>(&line) {
            Ok(parsed) => {
                let id = parsed
                    .id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("chunk-{}", line_number));
                loaded.chunks.push(Chunk::new(id, parsed.content));
            }
            Err(e) => {
                warn!("Skipping line {}: {}", line_number, e);
                loaded.skipped += 1;
            }
        }
    }

    Ok(loaded)
}
