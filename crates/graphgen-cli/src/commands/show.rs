//! Show command implementation.

use crate::cli::ShowArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use graphgen_domain::traits::GraphStore;
use graphgen_store::SqliteGraphStore;

/// Execute the show command.
pub async fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let path = args.db.unwrap_or_else(|| config.store.path.clone());
    if !path.exists() {
        return Err(CliError::InvalidInput(format!(
            "Graph database {} does not exist",
            path.display()
        )));
    }
    let store = SqliteGraphStore::new(&path)?;

    if !args.edges {
        let mut nodes = store.all_nodes().await?;
        nodes.truncate(args.limit);
        println!("{}", formatter.format_nodes(&nodes)?);
    }

    if !args.nodes {
        let mut edges = store.all_edges().await?;
        edges.truncate(args.limit);
        println!("{}", formatter.format_edges(&edges)?);
    }

    Ok(())
}
