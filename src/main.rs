//! vhost-index command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ──▶ config::loader ──▶ IndexConfig
//!                                          │
//!                                          ▼
//!                        resolver::Generation::build
//!                     (index::keys → table → wildcard)
//!                                          │
//!                                          ▼
//!   host name ──────────▶ NameResolver (ArcSwap<Generation>) ──▶ virtual host
//!                                          ▲
//!   config change ──▶ config::watcher ─────┘  (rebuild + atomic swap)
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use vhost_index::config::{load_config, watcher::ConfigWatcher, IndexConfig};
use vhost_index::observability::{logging, metrics};
use vhost_index::resolver::{Generation, NameResolver, Resolution};

#[derive(Parser)]
#[command(name = "vhost-index")]
#[command(about = "Build and query virtual host name indexes", long_about = None)]
struct Cli {
    /// Path to the TOML configuration.
    #[arg(short, long, default_value = "vhost-index.toml")]
    config: PathBuf,

    /// Emit JSON instead of plain text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and build the index
    Check,
    /// Resolve host names against the configuration
    Lookup {
        /// Host names to resolve
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Resolve names from stdin, rebuilding when the configuration changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(path = ?cli.config, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    logging::init(&config.observability.log_level);

    match cli.command {
        Commands::Check => check(&config, cli.json)?,
        Commands::Lookup { names } => {
            let resolver = NameResolver::new(&config)?;
            let mut out = std::io::stdout().lock();
            for name in &names {
                print_resolution(&mut out, name, resolver.resolve(name), cli.json)?;
            }
        }
        Commands::Watch => watch(&cli.config, &config, cli.json).await?,
    }

    Ok(())
}

fn check(config: &IndexConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let generation = Generation::build(config, 1)?;
    let stats = generation.index().stats();
    let largest_bucket = generation
        .index()
        .bucket_footprints()
        .into_iter()
        .max()
        .unwrap_or(0);

    if json {
        let report = json!({
            "hosts": generation.hosts().len(),
            "stats": stats,
            "largest_bucket": largest_bucket,
            "bucket_size": config.hash.bucket_size,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("configuration ok: {} hosts", generation.hosts().len());
        println!("  exact:  {} keys in {} buckets", stats.exact_keys, stats.exact_buckets);
        println!("  head:   {} patterns in {} nodes", stats.head_patterns, stats.head_nodes);
        println!("  tail:   {} patterns in {} nodes", stats.tail_patterns, stats.tail_nodes);
        println!("  largest bucket: {} of {} bytes", largest_bucket, config.hash.bucket_size);
    }
    Ok(())
}

async fn watch(path: &Path, config: &IndexConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let resolver = NameResolver::new(config)?;
    let (watcher, mut updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(new_config) = updates.recv() => {
                match resolver.reload(&new_config) {
                    Ok(generation) => tracing::debug!(generation, "Watch picked up new generation"),
                    Err(e) => tracing::debug!(error = %e, generation = resolver.current().number(), "Watch keeps current generation"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let name = line.trim();
                if name.is_empty() {
                    continue;
                }
                let mut out = std::io::stdout().lock();
                print_resolution(&mut out, name, resolver.resolve(name), json)?;
                out.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    tracing::info!(generation = resolver.current().number(), "Watch stopped");
    Ok(())
}

fn print_resolution(
    out: &mut impl Write,
    name: &str,
    resolution: Option<Resolution>,
    json: bool,
) -> std::io::Result<()> {
    if json {
        let value = match &resolution {
            Some(r) => json!({
                "name": name,
                "host": r.host.name,
                "match": r.matched.map_or("default", |m| m.as_str()),
                "generation": r.generation,
            }),
            None => json!({ "name": name, "host": null }),
        };
        writeln!(out, "{value}")
    } else {
        match resolution {
            Some(r) => writeln!(
                out,
                "{name}\t{}\t{}",
                r.host.name,
                r.matched.map_or("default", |m| m.as_str())
            ),
            None => writeln!(out, "{name}\t-\tnot found"),
        }
    }
}
