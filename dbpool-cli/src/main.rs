//! DBPOOL CLI
//!
//! Command-line driver for the expiring database handle cache.

mod sim;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dbpool_cache::{CacheConfig, ExpiringCache, Ttl};
use sim::{Ledger, SimulatedConnection};

/// DBPOOL - expiring cache of database handles
#[derive(Parser)]
#[command(name = "dbpool")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through the cache lifecycle with simulated connections
    Demo,

    /// Hammer the cache from concurrent workers and check for leaked handles
    Soak {
        /// Number of concurrent workers
        #[arg(short, long, default_value = "8")]
        workers: usize,
        /// Number of distinct keys
        #[arg(short, long, default_value = "64")]
        keys: usize,
        /// How long to run, in seconds
        #[arg(short, long, default_value = "5")]
        duration_secs: u64,
        /// Entry TTL in milliseconds (defaults to DBPOOL_DEFAULT_TTL_MS)
        #[arg(long)]
        ttl_ms: Option<u64>,
        /// Sweeper period in milliseconds (defaults to DBPOOL_SWEEP_INTERVAL_MS)
        #[arg(long)]
        sweep_ms: Option<u64>,
        /// Probability that closing a connection fails
        #[arg(long, default_value = "0.0")]
        close_failure_rate: f64,
        /// RNG seed for a reproducible operation mix
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the configuration resolved from the environment
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "dbpool=debug,dbpool_cache=debug,info"
    } else {
        "dbpool=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Demo => cmd_demo().await,
        Commands::Soak {
            workers,
            keys,
            duration_secs,
            ttl_ms,
            sweep_ms,
            close_failure_rate,
            seed,
        } => {
            let mut config = CacheConfig::from_env().context("Invalid cache configuration")?;
            if let Some(ttl) = ttl_ms {
                config.default_ttl_ms = ttl;
            }
            if let Some(sweep) = sweep_ms {
                config.sweep_interval_ms = sweep;
            }
            let opts = SoakOptions {
                workers,
                keys,
                duration: Duration::from_secs(duration_secs),
                close_failure_rate,
                seed,
            };
            cmd_soak(config, opts).await
        }
        Commands::Config => cmd_config(),
    }
}

/// Scripted tour of set/get/expiry/delete/sweep/clear
async fn cmd_demo() -> Result<()> {
    println!("{}", "🗄️  DBPOOL cache demo".cyan().bold());

    let ledger = Arc::new(Ledger::default());
    let cache = ExpiringCache::new(Duration::from_millis(300), Duration::from_millis(100))
        .context("Failed to start cache")?;

    println!("\n{}", "1. Storing connections".dimmed());
    cache.set("orders", ledger.open("postgres://orders", 0.0), Duration::ZERO);
    cache.set("audit", ledger.open("postgres://audit", 0.0), Duration::from_millis(150));
    cache.set_with_expiry("config", ledger.open("postgres://config", 0.0), Ttl::Never);
    for info in cache.describe() {
        println!("   {} ttl={:?}ms", info.key.yellow(), info.ttl_ms);
    }

    println!("\n{}", "2. Lookup refreshes the sliding window".dimmed());
    if let Some(db) = cache.get("orders") {
        println!("   {} #{} {}", "hit:".green(), db.id(), db.dsn());
    }

    println!("\n{}", "3. Replacing a key closes the old handle".dimmed());
    let old = cache.get("orders").context("orders should be cached")?;
    cache.set("orders", ledger.open("postgres://orders-replica", 0.0), Duration::ZERO);
    println!("   old #{} closed: {}", old.id(), old.is_closed());

    println!("\n{}", "4. Waiting for the sweeper to expire 'audit'...".dimmed());
    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("   keys now: {:?}", cache.get_items());

    println!("\n{}", "5. Deleting".dimmed());
    match cache.delete("audit") {
        Ok(()) => println!("   audit deleted"),
        Err(e) => println!("   {} {}", "expected:".yellow(), e),
    }
    cache.delete("config")?;
    println!("   config deleted");

    println!("\n{}", "6. Clearing".dimmed());
    cache.clear_all();
    println!("   entries left: {}", cache.len());

    print_summary(&cache, &ledger)?;
    Ok(())
}

struct SoakOptions {
    workers: usize,
    keys: usize,
    duration: Duration,
    close_failure_rate: f64,
    seed: Option<u64>,
}

/// Concurrent random set/get/delete followed by a leak check
async fn cmd_soak(config: CacheConfig, opts: SoakOptions) -> Result<()> {
    if opts.keys == 0 || opts.workers == 0 {
        bail!("workers and keys must both be at least 1");
    }
    if !(0.0..=1.0).contains(&opts.close_failure_rate) {
        bail!("close failure rate must be within 0.0..=1.0");
    }

    println!(
        "{} {} workers, {} keys, {:?} (ttl={}ms, sweep={}ms)",
        "🔥 Soaking:".cyan().bold(),
        opts.workers,
        opts.keys,
        opts.duration,
        config.default_ttl_ms,
        config.sweep_interval_ms,
    );

    let ledger = Arc::new(Ledger::default());
    let cache = Arc::new(ExpiringCache::with_config(config).context("Failed to start cache")?);
    let base_seed = opts.seed.unwrap_or_else(rand::random);
    info!(seed = base_seed, "soak started");

    let deadline = Instant::now() + opts.duration;
    let mut workers = JoinSet::new();
    for worker in 0..opts.workers {
        let cache = cache.clone();
        let ledger = ledger.clone();
        let keys = opts.keys;
        let failure_rate = opts.close_failure_rate;
        let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(worker as u64));

        workers.spawn(async move {
            let mut ops = 0u64;
            while Instant::now() < deadline {
                let key = format!("db-{}", rng.gen_range(0..keys));
                match rng.gen_range(0..10) {
                    0..=4 => {
                        let _ = cache.get(&key);
                    }
                    5..=7 => {
                        let conn = ledger.open(&format!("postgres://{key}"), failure_rate);
                        cache.set(&key, conn, Duration::ZERO);
                    }
                    _ => {
                        let _ = cache.delete(&key);
                    }
                }
                ops += 1;
                if ops % 64 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            ops
        });
    }

    let total_ms = as_millis(opts.duration);
    let pb = ProgressBar::new(total_ms);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {elapsed_precise} {msg}")?
            .progress_chars("#>-"),
    );
    let started = Instant::now();
    while Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
        pb.set_position(as_millis(started.elapsed()).min(total_ms));
        pb.set_message(format!("{} open", ledger.leaked()));
    }

    let mut total_ops = 0u64;
    while let Some(result) = workers.join_next().await {
        total_ops += result.context("soak worker panicked")?;
    }
    pb.finish_with_message("done");

    println!("   {} {} operations", "✓".green(), total_ops);
    println!("   {} {} entries before clear", "✓".green(), cache.len());

    cache.clear_all();
    print_summary(&cache, &ledger)
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn print_summary(cache: &ExpiringCache<SimulatedConnection>, ledger: &Ledger) -> Result<()> {
    println!("\n{}", "📈 Stats:".green().bold());
    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    println!(
        "\n   opened={} closed={} failed={} double={}",
        ledger.opened(),
        ledger.closed(),
        ledger.failed(),
        ledger.double_closed()
    );

    if ledger.double_closed() > 0 {
        bail!("{} connection(s) closed more than once", ledger.double_closed());
    }
    if ledger.leaked() > 0 {
        bail!("{} connection(s) never closed", ledger.leaked());
    }
    println!("   {} every connection closed exactly once", "✅".green());
    Ok(())
}

/// Print the configuration resolved from the environment
fn cmd_config() -> Result<()> {
    let config = CacheConfig::from_env().context("Invalid cache configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
