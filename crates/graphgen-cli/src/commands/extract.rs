//! Extract command implementation.

use crate::chunks::{load_chunks, LoadedChunks};
use crate::cli::{ExtractArgs, PresetArg};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use graphgen_domain::traits::{GraphStore, LlmClient};
use graphgen_domain::Chunk;
use graphgen_extractor::{BuildReport, Extractor, ExtractorConfig};
use graphgen_llm::{OllamaProvider, RetryPolicy, RetryingProvider};
use graphgen_store::SqliteGraphStore;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let extractor_config = resolve_extractor_config(&args, &config.extractor)?;
    let endpoint = args.endpoint.clone().unwrap_or_else(|| config.llm.endpoint.clone());
    let model = args.model.clone().unwrap_or_else(|| config.llm.model.clone());
    let db_path = args.db.clone().unwrap_or_else(|| config.store.path.clone());

    let loaded = read_chunks(&args.input)?;
    if loaded.skipped > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!("Skipped {} unparseable line(s)", loaded.skipped))
        );
    }
    if loaded.chunks.is_empty() {
        return Err(CliError::InvalidInput("No chunks to extract".to_string()));
    }
    eprintln!(
        "{}",
        formatter.info(&format!("Loaded {} chunk(s)", loaded.chunks.len()))
    );

    info!(
        "Extracting {} chunks with {} at {} into {}",
        loaded.chunks.len(),
        model,
        endpoint,
        db_path.display()
    );

    let attempt_timeout = extractor_config.llm_timeout();
    let provider = OllamaProvider::new(endpoint, model.clone())
        .with_temperature(config.llm.temperature)
        .with_timeout(attempt_timeout);
    let llm = RetryingProvider::new(provider, config.llm.retry)
        .with_attempt_timeout(attempt_timeout);
    let extractor_config = budget_for_retries(extractor_config, &config.llm.retry);
    let store = SqliteGraphStore::new(&db_path)?;

    let report = build(llm, extractor_config, &model, &loaded.chunks, &store).await?;

    println!("{}", formatter.format_report(&report)?);
    if !report.is_complete() {
        eprintln!(
            "{}",
            formatter.warning(&format!("{} chunk(s) failed", report.failures.len()))
        );
    }
    Ok(())
}

/// Extract `chunks` with `llm` and merge them into `store`.
pub async fn build<L, S>(
    llm: L,
    config: ExtractorConfig,
    model: &str,
    chunks: &[Chunk],
    store: &S,
) -> Result<BuildReport>
where
    L: LlmClient + 'static,
    S: GraphStore,
{
    let extractor = Extractor::new(llm, config)?.with_model_name(model);
    Ok(extractor.build_graph(chunks, store).await?)
}

/// Apply the preset and command-line overrides to the configured settings.
pub fn resolve_extractor_config(
    args: &ExtractArgs,
    base: &ExtractorConfig,
) -> Result<ExtractorConfig> {
    let mut config = match args.preset {
        None => base.clone(),
        Some(preset) => {
            let mut preset_config = match preset {
                PresetArg::Aggressive => ExtractorConfig::aggressive(),
                PresetArg::Default => ExtractorConfig::default(),
                PresetArg::Lenient => ExtractorConfig::lenient(),
            };
            preset_config.format = base.format.clone();
            preset_config
        }
    };

    if let Some(max_loop) = args.max_loop {
        config.max_loop = max_loop;
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if args.no_summary {
        config.enable_summary = false;
    }

    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

/// Widen the pipeline's per-call deadline to cover every retry.
///
/// In the CLI `llm_timeout_secs` bounds one HTTP attempt. The pipeline's
/// deadline wraps the retrying provider, so it must fit all attempts and
/// backoffs.
pub fn budget_for_retries(mut config: ExtractorConfig, policy: &RetryPolicy) -> ExtractorConfig {
    let budget = policy.call_budget(config.llm_timeout());
    config.llm_timeout_secs = budget.as_secs() + u64::from(budget.subsec_nanos() > 0);
    config
}

fn read_chunks(input: &Path) -> Result<LoadedChunks> {
    if input == Path::new("-") {
        load_chunks(io::stdin().lock())
    } else {
        load_chunks(BufReader::new(File::open(input)?))
    }
}
