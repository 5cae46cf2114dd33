use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meta_stats::api::{build_router, state::AppState};
use meta_stats::config::AppConfig;
use meta_stats::models::{DeltaOutcome, SetShare, SnapshotScope, Standing};
use meta_stats::query::{QueryFacade, SnapshotStore};
use meta_stats::snapshot::{SnapshotBuild, SnapshotBuilder};
use meta_stats::storage::{
    import_matches, list_scopes, load_matches, load_reference, read_latest_snapshot,
    write_snapshot, StorageConfig,
};

#[derive(Parser)]
#[command(name = "meta-stats")]
#[command(about = "Matchup, card and meta-share statistics for competitive card game results")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a snapshot from the stored corpus
    Build {
        /// Restrict to one tournament
        #[arg(long, conflicts_with_all = ["from", "to"])]
        tournament: Option<String>,

        /// Window start, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Window end, exclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Corpus partitions folded in parallel
        #[arg(long)]
        partitions: Option<usize>,

        /// Build and report but don't write the snapshot
        #[arg(long)]
        dry_run: bool,
    },

    /// Append a JSONL file of match records to the corpus
    Import {
        /// Source file, one match record per line
        file: PathBuf,
    },

    /// Start the API server over the latest stored snapshots
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the latest snapshot of a scope
    Show {
        /// Scope key (global, tournament-<id>, window-<from>-<to>)
        #[arg(long, default_value = "global")]
        scope: String,

        /// Number of standings to print
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = PathBuf::from(&cli.config);
    let mut config = if path.exists() {
        AppConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        AppConfig::default()
    };

    if let Some(ref data_dir) = cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(ref log_level) = cli.log_level {
        config.log_level = log_level.clone();
    }
    Ok(config)
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD or RFC 3339): {}", s))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid date: {}", s))?;
    Ok(midnight.and_utc())
}

fn build_scope(
    tournament: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<SnapshotScope> {
    match (tournament, from, to) {
        (Some(id), _, _) => Ok(SnapshotScope::Tournament { id: id.into() }),
        (None, Some(from), Some(to)) => {
            let from = parse_instant(&from)?;
            let to = parse_instant(&to)?;
            if from >= to {
                bail!("--from must be before --to");
            }
            Ok(SnapshotScope::Window { from, to })
        }
        (None, None, None) => Ok(SnapshotScope::Global),
        _ => bail!("--from and --to must be given together"),
    }
}

fn print_standings(title: &str, standings: &[Standing], top: usize) {
    println!("\n=== {} ===", title);
    for s in standings.iter().take(top) {
        println!(
            "{:>3}. {:<48} {:>5.1}%  {:>3}-{:<3}-{:<3} share {:>5.1}%  {:?}{}",
            s.placement,
            s.key,
            s.win_rate * 100.0,
            s.stat.match_wins,
            s.stat.match_losses,
            s.stat.match_draws,
            s.meta_share * 100.0,
            s.tier,
            if s.qualified { "" } else { "  (below minimum)" }
        );
    }
}

fn print_share(title: &str, share: &SetShare) {
    println!("\n=== {} ({} appearances) ===", title, share.total);
    for entry in &share.entries {
        println!("  {:<12} {:>6} {:>6.1}%", entry.key, entry.count, entry.percentage);
    }
}

fn print_build(build: &SnapshotBuild) {
    let snapshot = &build.snapshot;
    println!("\n=== Snapshot {} ===", snapshot.id);
    println!("Scope:            {}", snapshot.scope);
    println!("Matches folded:   {}", snapshot.match_count);
    println!("Matches skipped:  {}", snapshot.skipped_count);
    println!("Deck identities:  {}", snapshot.deck_standings.len());
    println!("Cards tracked:    {}", snapshot.card_stats.len());

    if build.diagnostics.is_clean() {
        println!("Diagnostics:      clean");
    }
    if !build.diagnostics.skipped.is_empty() {
        println!("\nSkipped:");
        for record in &build.diagnostics.skipped {
            println!("  - {}: {}", record.match_id, record.reason);
        }
    }
    if !build.diagnostics.unknown_cards.is_empty() {
        println!("\nUnknown cards:");
        for id in &build.diagnostics.unknown_cards {
            println!("  - {}", id);
        }
    }

    match &build.delta {
        DeltaOutcome::NoPrevious => println!("\nNo previous snapshot to compare against"),
        DeltaOutcome::NoComparableSnapshot { expected, found } => println!(
            "\nPrevious snapshot not comparable (expected {}, found {})",
            expected, found
        ),
        DeltaOutcome::Computed(delta) => {
            println!("\n=== Changes since {} ===", delta.previous_id);
            for d in &delta.decks {
                println!(
                    "  {:<48} {:>3} -> {:<3} {:?}",
                    d.key, d.placement_before, d.placement_now, d.arrow_direction
                );
            }
            for d in &delta.set_share {
                println!(
                    "  {:<12} {:>6.1}% -> {:>6.1}% ({:+.1})",
                    d.key, d.share_before, d.share_now, d.delta
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting meta-stats v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Build {
            tournament,
            from,
            to,
            partitions,
            dry_run,
        } => {
            let scope = build_scope(tournament, from, to)?;
            let mut aggregation = config.aggregation.clone();
            if let Some(partitions) = partitions {
                if partitions == 0 {
                    bail!("--partitions must be greater than 0");
                }
                aggregation.partitions = partitions;
            }

            let reference = load_reference(&storage).context("Failed to load card reference")?;
            let corpus = load_matches(&storage).context("Failed to load match corpus")?;
            let previous = read_latest_snapshot(&storage, &scope)
                .context("Failed to read previous snapshot")?;

            let build = SnapshotBuilder::new(aggregation).build(
                scope,
                &corpus,
                &reference,
                previous.as_ref(),
            );
            print_build(&build);

            if dry_run {
                println!("\n(dry run - snapshot not written)");
            } else {
                let path = write_snapshot(&storage, &build.snapshot)
                    .context("Failed to write snapshot")?;
                println!("\nWritten to {}", path.display());
            }
        }
        Commands::Import { file } => {
            let added = import_matches(&storage, &file)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!(
                "Imported {} new matches into {}",
                added,
                storage.matches_path().display()
            );
        }
        Commands::Serve { host, port } => {
            let store = Arc::new(SnapshotStore::new());
            for scope in list_scopes(&storage).context("Failed to list snapshot scopes")? {
                if let Some(snapshot) = read_latest_snapshot(&storage, &scope)
                    .with_context(|| format!("Failed to read snapshot for {}", scope))?
                {
                    store.publish(snapshot);
                }
            }
            if store.is_empty() {
                tracing::warn!("No snapshots found under {:?}", storage.snapshots_dir());
            }

            let state = AppState::new(QueryFacade::new(store), &config.server.cors_origin);
            let app = build_router(state);
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Show { scope, top } => {
            let scope = SnapshotScope::from_key(&scope)
                .with_context(|| format!("Invalid scope key: {}", scope))?;
            let Some(snapshot) = read_latest_snapshot(&storage, &scope)? else {
                println!("No snapshot for {}", scope);
                return Ok(());
            };

            println!("=== Snapshot {} ===", snapshot.id);
            println!("Scope:      {}", snapshot.scope);
            println!("Generated:  {}", snapshot.generated_at.to_rfc3339());
            println!(
                "Matches:    {} ({} skipped)",
                snapshot.match_count, snapshot.skipped_count
            );
            print_standings("Decks", &snapshot.deck_standings, top);
            print_standings("Leaders", &snapshot.leader_standings, top);
            print_standings("Bases", &snapshot.base_standings, top);
            print_share("Set share", &snapshot.set_share);
            print_share("Block share", &snapshot.block_share);
        }
    }

    Ok(())
}
