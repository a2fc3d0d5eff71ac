//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use graphgen_domain::{CanonicalEdge, CanonicalNode, EdgeKey};
use graphgen_extractor::BuildReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const DESCRIPTION_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the report of an extract run.
    pub fn format_report(&self, report: &BuildReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(format!(
                "{} {} {}",
                report.chunks_succeeded,
                report.merge.nodes_created + report.merge.nodes_updated,
                report.merge.edges_created + report.merge.edges_updated
            )),
            OutputFormat::Table => Ok(self.format_report_table(report)),
        }
    }

    fn format_report_table(&self, report: &BuildReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        let rows = [
            ("Chunks", format!("{}/{}", report.chunks_succeeded, report.chunks_total)),
            ("Entity mentions", report.entity_mentions.to_string()),
            ("Relationship mentions", report.relationship_mentions.to_string()),
            ("Discarded records", report.discarded_records.to_string()),
            ("Nodes created", report.merge.nodes_created.to_string()),
            ("Nodes updated", report.merge.nodes_updated.to_string()),
            ("Edges created", report.merge.edges_created.to_string()),
            ("Edges updated", report.merge.edges_updated.to_string()),
            ("Placeholder nodes", report.merge.placeholder_nodes.to_string()),
            ("Summaries", report.merge.summaries.to_string()),
            ("LLM calls", report.llm_calls.to_string()),
            ("Elapsed", format!("{} ms", report.elapsed_ms)),
        ];
        for (metric, value) in rows {
            builder.push_record([metric.to_string(), value]);
        }

        let mut out = self.styled(builder);
        for failure in &report.failures {
            out.push('\n');
            out.push_str(&self.error(&format!(
                "Chunk '{}' failed: {}",
                failure.chunk_id, failure.reason
            )));
        }
        out
    }

    /// Format graph nodes.
    pub fn format_nodes(&self, nodes: &[(String, CanonicalNode)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = nodes
                    .iter()
                    .map(|(name, node)| {
                        serde_json::json!({
                            "name": name,
                            "entity_type": node.entity_type,
                            "description": node.description,
                            "source_ids": node.source_ids(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(nodes
                .iter()
                .map(|(name, _)| name.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if nodes.is_empty() {
                    return Ok(self.colorize("No nodes found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Name", "Type", "Description", "Sources"]);
                for (name, node) in nodes {
                    builder.push_record([
                        name.clone(),
                        node.entity_type.clone(),
                        truncate(&node.description, DESCRIPTION_WIDTH),
                        node.source_ids().len().to_string(),
                    ]);
                }
                Ok(self.styled(builder))
            }
        }
    }

    /// Format graph edges.
    pub fn format_edges(&self, edges: &[(EdgeKey, CanonicalEdge)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = edges
                    .iter()
                    .map(|((src, tgt), edge)| {
                        serde_json::json!({
                            "src_id": src,
                            "tgt_id": tgt,
                            "description": edge.description,
                            "keywords": edge.keywords,
                            "weight": edge.weight,
                            "source_ids": edge.source_ids(),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(edges
                .iter()
                .map(|((src, tgt), _)| format!("{}\t{}", src, tgt))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if edges.is_empty() {
                    return Ok(self.colorize("No edges found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Source", "Target", "Keywords", "Weight", "Description"]);
                for ((src, tgt), edge) in edges {
                    builder.push_record([
                        src.clone(),
                        tgt.clone(),
                        edge.keywords.clone(),
                        format!("{:.2}", edge.weight),
                        truncate(&edge.description, DESCRIPTION_WIDTH),
                    ]);
                }
                Ok(self.styled(builder))
            }
        }
    }

    fn styled(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Shorten `text` to at most `width` characters, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}
