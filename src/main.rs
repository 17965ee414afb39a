// SPDX-License-Identifier: MIT OR Apache-2.0

//! paperdex - semantic retrieval for research workspaces
//!
//! Command-line front end over the retrieval core: ingest item text into a
//! workspace, query it, and manage stored records.

mod cli;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands, ItemArgs, OutputFormat};
use paperdex::config::Config;
use paperdex::embedding::{
    create_provider, ChunkConfig, EmbeddingProvider, EmbeddingStorage, ProviderSelection,
};
use paperdex::output;
use paperdex::retrieval::Retriever;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// How command results are printed.
struct Render {
    format: OutputFormat,
    compact: bool,
    use_color: bool,
}

fn main() -> Result<()> {
    // Initialize tracing with PAPERDEX_LOG env var (e.g., PAPERDEX_LOG=debug paperdex query ...)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PAPERDEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "paperdex", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let selection = config.resolve_provider()?;
    let render = Render {
        format: cli.format,
        compact: cli.compact,
        use_color: cli.format == OutputFormat::Text && output::use_colors(),
    };

    let provider = create_provider(&selection)?;
    if let Commands::Provider = cli.command {
        print_provider(&selection, provider.as_ref(), &render)?;
        return Ok(());
    }

    let db_path = match cli.db.as_deref() {
        Some(path) => PathBuf::from(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            config.storage.path(&cwd)
        }
    };
    debug!(db = %db_path.display(), "opening embedding storage");
    let storage = EmbeddingStorage::open(&db_path)?;

    match cli.command {
        Commands::Ingest(args) => {
            ingest_item(&config, provider, storage, &args, false, &render)?;
        }
        Commands::Reembed(args) => {
            ingest_item(&config, provider, storage, &args, true, &render)?;
        }
        Commands::Query {
            query,
            workspace,
            limit,
            threshold,
        } => {
            let retriever =
                Retriever::new(provider, storage, ChunkConfig::new(config.chunking.max_chars())?);
            let limit = limit.unwrap_or_else(|| config.search.limit());
            let threshold = threshold.unwrap_or_else(|| config.search.threshold());
            let results = retriever.query(&workspace, &query, limit, threshold)?;

            match render.format {
                OutputFormat::Json => println!("{}", output::to_json(&results, render.compact)?),
                OutputFormat::Text => println!("{}", output::render_results(&results, render.use_color)),
            }
        }
        Commands::Delete {
            workspace,
            item,
            all,
        } => {
            let retriever = Retriever::new(provider, storage, ChunkConfig::default());
            let deleted = match item {
                Some(item) => retriever.delete_item(&workspace, &item)?,
                None if all => retriever.delete_workspace(&workspace)?,
                None => bail!("either --item or --all is required"),
            };

            match render.format {
                OutputFormat::Json => println!(
                    "{}",
                    output::to_json(&serde_json::json!({ "deleted": deleted }), render.compact)?
                ),
                OutputFormat::Text => println!("Deleted {} records.", deleted),
            }
        }
        Commands::Stats { workspace } => {
            let retriever = Retriever::new(provider, storage, ChunkConfig::default());
            let stats = retriever.stats(&workspace)?;

            match render.format {
                OutputFormat::Json => println!("{}", output::to_json(&stats, render.compact)?),
                OutputFormat::Text => println!("{}", output::render_stats(&stats, render.use_color)),
            }
        }
        Commands::Provider | Commands::Completions { .. } => {}
    }

    Ok(())
}

fn ingest_item(
    config: &Config,
    provider: Box<dyn EmbeddingProvider>,
    storage: EmbeddingStorage,
    args: &ItemArgs,
    reembed: bool,
    render: &Render,
) -> Result<()> {
    let max_chars = args.max_chars.unwrap_or_else(|| config.chunking.max_chars());
    let chunk_config = ChunkConfig::new(max_chars)?;
    let text = read_item_text(args)?;
    let mut retriever = Retriever::new(provider, storage, chunk_config);
    let report = if reembed {
        retriever.reembed(&args.workspace, &args.item, &text)?
    } else {
        retriever.ingest(&args.workspace, &args.item, &text)?
    };

    match render.format {
        OutputFormat::Json => println!("{}", output::to_json(&report, render.compact)?),
        OutputFormat::Text => println!("{}", output::render_ingest(&report, render.use_color)),
    }
    if args.strict {
        report.into_result()?;
    }
    Ok(())
}

fn read_item_text(args: &ItemArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read item text from stdin")?;
    Ok(buffer)
}

fn print_provider(
    selection: &ProviderSelection,
    provider: &dyn EmbeddingProvider,
    render: &Render,
) -> Result<()> {
    let endpoint = match selection {
        ProviderSelection::Remote(remote) => Some(remote.endpoint.as_str()),
        ProviderSelection::Local { .. } => None,
    };
    let kind = if selection.is_remote() { "remote" } else { "local" };

    match render.format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "provider": kind,
                "model": provider.model_id(),
                "endpoint": endpoint,
                "dimensions": provider.dimensions(),
            });
            println!("{}", output::to_json(&summary, render.compact)?)
        }
        OutputFormat::Text => {
            let dimensions = provider
                .dimensions()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "model default".to_string());
            match endpoint {
                Some(endpoint) => println!(
                    "remote {} via {} ({} dimensions)",
                    provider.model_id(),
                    endpoint,
                    dimensions
                ),
                None => println!("local {} ({} dimensions)", provider.model_id(), dimensions),
            }
        }
    }
    Ok(())
}
