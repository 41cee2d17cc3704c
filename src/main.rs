use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use songlink_resolve::config::ResolverConfig;
use songlink_resolve::models::{Candidate, CatalogResponse, SongQuery, Target};
use songlink_resolve::progress::{create_progress_bar, create_spinner, format_duration, set_log_only};
use songlink_resolve::resolve::Resolver;
use songlink_resolve::safety::validate_output_path;
use songlink_resolve::scoring::{best_match, rank_candidates};

#[derive(Parser)]
#[command(name = "songlink")]
#[command(about = "Resolve a song/artist query to a streaming link and a video id")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON config file (endpoints, catalog parameters, timeouts)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog storefront country, overrides the config file
    #[arg(long, global = true)]
    country: Option<String>,

    /// Catalog result limit, overrides the config file
    #[arg(long, global = true)]
    limit: Option<u32>,

    #[arg(long, global = true, default_value = "0")]
    workers: usize,

    /// Hide spinners and progress bars
    #[arg(long, global = true)]
    log_only: bool,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one query and print the links as JSON
    Resolve {
        #[arg(long)]
        song: String,
        #[arg(long)]
        artist: Option<String>,
        /// Record label, only used for the video search
        #[arg(long)]
        label: Option<String>,
    },
    /// Run the matcher offline over a saved catalog response
    Match {
        results: PathBuf,
        #[arg(long)]
        song: String,
        #[arg(long, default_value = "")]
        artist: String,
        /// Print every candidate's score and tiers as JSON
        #[arg(long)]
        explain: bool,
    },
    /// Resolve a JSON array of queries in parallel
    Batch { queries: PathBuf, output: PathBuf },
}

/// Saved catalog responses come either as the full envelope or a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SavedResults {
    Bare(Vec<Candidate>),
    Envelope(CatalogResponse),
}

fn read_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let saved: SavedResults = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse catalog results in {}", path.display()))?;
    Ok(match saved {
        SavedResults::Bare(candidates) => candidates,
        SavedResults::Envelope(response) => response.results,
    })
}

fn load_config(args: &Args) -> Result<ResolverConfig> {
    let mut config = ResolverConfig::load(args.config.as_deref())?;
    if let Some(ref country) = args.country {
        config.country = country.clone();
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    Ok(config)
}

fn run_resolve(
    config: &ResolverConfig,
    verbose: bool,
    song: &str,
    artist: Option<&str>,
    label: Option<&str>,
) -> Result<()> {
    let query = SongQuery::new(song, artist, label)?;
    let resolver = Resolver::from_config(config).verbose(verbose);

    let spinner = create_spinner(&format!("Resolving '{}'", query.song));
    let links = resolver.resolve_links(&query)?;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&links)?);
    Ok(())
}

fn run_match(results: &Path, song: &str, artist: &str, explain: bool) -> Result<()> {
    let candidates = read_candidates(results)?;
    println!("Loaded {} candidates from {:?}", candidates.len(), results);

    let target = Target::new(song, artist);

    if explain {
        println!("\nRanking for '{}' by '{}':", target.title, target.artist);
        println!("{}", explain_json(&candidates, &target)?);
    }

    match best_match(&candidates, &target) {
        Some(best) => println!("Best match:\n{}", serde_json::to_string_pretty(best)?),
        None => println!("No acceptable match."),
    }

    Ok(())
}

/// Every candidate with its score and tiers, in input order.
fn explain_json(candidates: &[Candidate], target: &Target) -> Result<String> {
    let ranked = rank_candidates(candidates, target);
    Ok(serde_json::to_string_pretty(&ranked)?)
}

fn run_batch(config: &ResolverConfig, verbose: bool, queries_path: &Path, output: &Path) -> Result<()> {
    validate_output_path(output, queries_path)?;

    let text = std::fs::read_to_string(queries_path)
        .with_context(|| format!("Failed to read {}", queries_path.display()))?;
    let queries: Vec<SongQuery> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse queries in {}", queries_path.display()))?;
    println!("Loaded {} queries from {:?}", queries.len(), queries_path);

    let resolver = Resolver::from_config(config).verbose(verbose);
    let pb = create_progress_bar(queries.len() as u64, "Resolving");
    let (entries, stats) = resolver.resolve_batch(&queries, &pb);
    pb.finish_and_clear();

    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(output, json)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    stats.log_phase("batch");

    println!("\n{:=<60}", "");
    println!("Batch complete!");
    println!("  Queries: {}", stats.total_queries);
    println!("  Streaming links: {} ({:.1}%)", stats.streaming_links, stats.link_rate());
    println!("  Video ids: {}", stats.video_ids);
    println!("  Output: {:?}", output);
    println!("{:=<60}", "");

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    let start = Instant::now();
    let config = load_config(&args)?;

    match &args.command {
        Command::Resolve {
            song,
            artist,
            label,
        } => run_resolve(
            &config,
            args.verbose,
            song,
            artist.as_deref(),
            label.as_deref(),
        )?,
        Command::Match {
            results,
            song,
            artist,
            explain,
        } => run_match(results, song, artist, *explain)?,
        Command::Batch { queries, output } => {
            run_batch(&config, args.verbose, queries, output)?
        }
    }

    if args.verbose {
        eprintln!("[DONE] {}", format_duration(start.elapsed()));
    }

    Ok(())
}
