//! ReadEngine main entry point
//!
//! This is the command-line interface for ReadEngine: ingest pages by URL or
//! file, read and delete them, search everything ingested so far and
//! rebuild the search index from the document store.

use anyhow::Context;
use clap::{Parser, Subcommand};
use readengine::config::{default_config_path, load_config_or_default, Config};
use readengine::engine::{format_time, open, QueryEngine, SqliteCoordinator};
use readengine::storage::DocId;
use readengine::IngestState;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// ReadEngine: index whatever you read and search it later
///
/// Pages are fetched, stripped down to their main content and stored; the
/// full-text index over them can be rebuilt from the store at any time.
#[derive(Parser, Debug)]
#[command(name = "readengine")]
#[command(version = "1.0.0")]
#[command(about = "Index what you read, search it later", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a web page and ingest it
    #[command(alias = "u")]
    Url {
        /// Absolute http(s) URL
        url: String,
    },

    /// Ingest a local HTML file
    #[command(alias = "f")]
    File {
        /// Path to the HTML file
        path: PathBuf,
    },

    /// Delete a stored document
    #[command(alias = "d")]
    Del {
        /// Document id
        id: DocId,
    },

    /// Print a stored document
    #[command(alias = "r")]
    Read {
        /// Document id
        id: DocId,
    },

    /// Search stored documents
    #[command(alias = "s")]
    Search {
        /// Keywords; every one must match
        keyword: String,

        /// Maximum number of hits
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List stored documents with their ingestion time
    #[command(alias = "hi")]
    History,

    /// Rebuild the search index from the document store
    #[command(alias = "rb")]
    Rebuild,

    /// Show document and index counts
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    tracing::debug!("Loading configuration from: {}", config_path.display());
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    let mut coordinator = open(&config)
        .with_context(|| format!("failed to open store at {}", config.store.path.display()))?;

    match cli.command {
        Command::Url { url } => handle_url(&mut coordinator, &url).await,
        Command::File { path } => handle_file(&mut coordinator, path).await,
        Command::Del { id } => handle_delete(&mut coordinator, id),
        Command::Read { id } => handle_read(&coordinator, id),
        Command::Search { keyword, limit } => handle_search(&coordinator, &config, &keyword, limit),
        Command::History => handle_history(&coordinator),
        Command::Rebuild => handle_rebuild(&mut coordinator),
        Command::Stats => handle_stats(&coordinator, &config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("readengine=info,warn"),
            1 => EnvFilter::new("readengine=debug,info"),
            2 => EnvFilter::new("readengine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `url`: fetches and ingests one page, cancellable with Ctrl-C
async fn handle_url(coordinator: &mut SqliteCoordinator, url: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling fetch");
                cancel.cancel();
            }
        })
    };

    let result = coordinator.ingest_url(url, &cancel).await;
    watcher.abort();

    let report = result.with_context(|| format!("failed to ingest {}", url))?;
    print_ingest(report.document.id, &report.document.title, report.state);
    Ok(())
}

/// Handles `file`: ingests a local HTML file
async fn handle_file(coordinator: &mut SqliteCoordinator, path: PathBuf) -> anyhow::Result<()> {
    let report = coordinator
        .ingest_file(&path)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))?;
    print_ingest(report.document.id, &report.document.title, report.state);
    Ok(())
}

fn print_ingest(id: DocId, title: &str, state: IngestState) {
    println!("{}  {}", id, title);
    if state == IngestState::Degraded {
        println!("⚠ Stored but not indexed; run `readengine rebuild` to repair");
    }
}

/// Handles `del`
fn handle_delete(coordinator: &mut SqliteCoordinator, id: DocId) -> anyhow::Result<()> {
    let report = coordinator
        .delete(id)
        .with_context(|| format!("failed to delete {}", id))?;
    println!("✓ Deleted {}", report.id);
    if !report.index_removed {
        println!("⚠ Index entry not removed; run `readengine rebuild` to repair");
    }
    Ok(())
}

/// Handles `read`
fn handle_read(coordinator: &SqliteCoordinator, id: DocId) -> anyhow::Result<()> {
    let document = coordinator
        .get(id)
        .with_context(|| format!("failed to read {}", id))?;

    println!("{}", document.title);
    println!("{}", document.source);
    println!("Ingested: {}", format_time(document.id));
    println!();
    println!("{}", document.content);
    Ok(())
}

/// Handles `search`
fn handle_search(
    coordinator: &SqliteCoordinator,
    config: &Config,
    keyword: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let engine = QueryEngine::new(&config.search);
    let results = engine
        .search(coordinator.index(), keyword, limit)
        .with_context(|| format!("search for {:?} failed", keyword))?;

    if results.total == 0 {
        println!("No documents match {:?}", keyword);
        return Ok(());
    }

    println!("{} result(s) for {:?}\n", results.total, keyword);
    for hit in &results.hits {
        println!("[{}] {}  ({})", hit.id, hit.title, hit.ingested_at);
        println!("    {}", hit.source);
        if let Some(snippet) = &hit.snippet {
            println!("    {}", snippet);
        }
        println!();
    }
    Ok(())
}

/// Handles `history`
fn handle_history(coordinator: &SqliteCoordinator) -> anyhow::Result<()> {
    let documents = coordinator.history().context("failed to list documents")?;
    if documents.is_empty() {
        println!("No documents stored yet");
        return Ok(());
    }
    for document in &documents {
        println!(
            "{}  {}  {}",
            document.id,
            format_time(document.id),
            document.title
        );
    }
    Ok(())
}

/// Handles `rebuild`
fn handle_rebuild(coordinator: &mut SqliteCoordinator) -> anyhow::Result<()> {
    let report = coordinator.rebuild().context("rebuild failed")?;
    println!("=== Index Rebuilt ===\n");
    println!("  Scanned: {}", report.scanned);
    println!("  Indexed: {}", report.indexed);
    println!("  Failed:  {}", report.failed.len());
    for id in &report.failed {
        println!("    - {}", id);
    }
    println!("  Index size: {}", report.doc_count);
    Ok(())
}

/// Handles `stats`
fn handle_stats(coordinator: &SqliteCoordinator, config: &Config) -> anyhow::Result<()> {
    let stats = coordinator.stats().context("failed to read statistics")?;
    println!("Store: {}\n", config.store.path.display());
    println!("  Documents: {}", stats.documents);
    println!("  Indexed:   {}", stats.indexed);
    if stats.documents != stats.indexed {
        println!("\n⚠ Index is out of sync; run `readengine rebuild` to repair");
    }
    Ok(())
}
