use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use discovery::{DiscoveryConfig, DiscoveryOrchestrator, PipelineResult};
use image_model::{PolicyMode, SearchQuery};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// image-scout - Image discovery for a named subject
#[derive(Parser)]
#[command(name = "image-scout")]
#[command(about = "Find, validate and rank images of a named subject", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "image-scout.toml")]
    config: PathBuf,

    /// Debug logging for the pipeline crates
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, validate and rank images
    Search {
        /// Name of the subject to search for
        #[arg(long)]
        subject: String,

        /// Free-text content descriptor, e.g. "professional high quality photo"
        #[arg(long, default_value = "")]
        descriptor: String,

        /// Policy mode: strict or permissive
        #[arg(long, default_value = "strict")]
        mode: PolicyMode,

        /// Candidates to aggregate (defaults to the config value)
        #[arg(long)]
        target: Option<usize>,

        /// Maximum results to print (defaults to the config value)
        #[arg(long)]
        max: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a profile picture URL for a subject
    Profile {
        #[arg(long)]
        subject: String,
    },

    /// Print a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "info,discovery=debug,pipeline=debug,sources=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Search {
            subject,
            descriptor,
            mode,
            target,
            max,
            json,
        } => handle_search(&cli.config, subject, descriptor, mode, target, max, json).await?,
        Commands::Profile { subject } => handle_profile(&cli.config, subject).await?,
        Commands::InitConfig => handle_init_config()?,
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<DiscoveryConfig> {
    let config = DiscoveryConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok(config)
}

/// Handle the 'search' command
async fn handle_search(
    config_path: &Path,
    subject: String,
    descriptor: String,
    mode: PolicyMode,
    target: Option<usize>,
    max: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let mut orchestrator =
        DiscoveryOrchestrator::from_config(&config).context("Failed to build orchestrator")?;
    if let Some(max) = max {
        orchestrator = orchestrator.with_max_results(max);
    }

    let query = SearchQuery::new(
        subject,
        descriptor,
        target.unwrap_or(config.pipeline.target_count),
    );

    // Ctrl-C stops new batch and candidate work; what was decided is still printed
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Cancelling...", "!".yellow());
            on_interrupt.cancel();
        }
    });

    info!(
        "Searching '{}' (target {}, mode {})",
        query.search_terms(),
        query.target_count,
        mode
    );
    let start = Instant::now();
    let result = orchestrator
        .run_cancellable(&query, mode, &cancel)
        .await
        .with_context(|| format!("Search for '{}' failed", query.search_terms()))?;

    if json {
        let output = serde_json::json!({
            "candidates": result.candidates,
            "total_raw_found": result.total_raw_found,
            "stats": result.stats,
            "summary": result.summary(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_result(&query, mode, &result);
        println!("{} Done in {:?}", "✓".green(), start.elapsed());
    }
    Ok(())
}

/// Handle the 'profile' command
async fn handle_profile(config_path: &Path, subject: String) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator =
        DiscoveryOrchestrator::from_config(&config).context("Failed to build orchestrator")?;

    let url = orchestrator.profile_picture(&subject).await;
    println!("{}", url);
    Ok(())
}

/// Handle the 'init-config' command
fn handle_init_config() -> Result<()> {
    let rendered = DiscoveryConfig::default()
        .to_toml()
        .context("Failed to render default config")?;
    print!("{}", rendered);
    Ok(())
}

/// Format and print a pipeline result
fn print_result(query: &SearchQuery, mode: PolicyMode, result: &PipelineResult) {
    println!(
        "{}",
        format!("Images for '{}' ({} mode):", query.search_terms(), mode)
            .bold()
            .blue()
    );

    for (rank, scored) in result.candidates.iter().enumerate() {
        println!(
            "{}. {} [{}x{}] - Score: {:.2}",
            (rank + 1).to_string().green(),
            scored.candidate.url,
            scored.candidate.width,
            scored.candidate.height,
            scored.fused_score
        );
        if !scored.candidate.source_domain.is_empty() {
            println!("   {}Source: {}", "• ".cyan(), scored.candidate.source_domain);
        }
        if !scored.content.matched_elements.is_empty() {
            let elements: Vec<&str> = scored
                .content
                .matched_elements
                .iter()
                .map(String::as_str)
                .collect();
            println!("   {}Matched: {}", "• ".cyan(), elements.join(", "));
        }
    }

    println!("{}", "Statistics:".bold());
    for (name, count) in result.stats_map() {
        println!("  {}: {}", name, count);
    }
    if result.is_partial() {
        println!(
            "{} Partial results (aggregation stopped: {:?})",
            "!".yellow(),
            result.stop
        );
    }
    println!("{}", result.summary());
}
