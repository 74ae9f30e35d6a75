//! `staysync` CLI: reconcile booking feeds and manage manual directives.
//!
//! ## Usage
//!
//! ```sh
//! # Fetch every configured feed and rewrite the master calendar
//! staysync reconcile
//!
//! # Add feeds on the command line (URL or local file)
//! staysync reconcile --source airbnb=https://www.airbnb.com/calendar/ical/1.ics?s=... \
//!                    --source booking=./exports/booking.ics
//!
//! # Resolve from the stored import calendar without touching the network
//! staysync reconcile --offline
//!
//! # Block, release prep time on, or clear single nights
//! staysync block 2026-03-01 2026-03-02
//! staysync unblock 2026-01-09
//! staysync clear 2026-03-01
//!
//! # Show resolved nights
//! staysync nights --from 2026-01-01 --to 2026-02-01 --json
//! ```

mod feeds;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use stay_engine::{
    reconcile_payloads, CalendarStore, FeedConfig, FetchMode, FileStore, NightState, Reconciler,
    RunInputs, StoreKey, SyncConfig,
};

#[derive(Parser)]
#[command(
    name = "staysync",
    version,
    about = "Reconcile rental booking feeds into one availability calendar",
    propagate_version = true
)]
struct Cli {
    /// YAML configuration file (missing file means defaults)
    #[arg(long, global = true, env = "STAYSYNC_CONFIG", default_value = "staysync.yaml")]
    config: PathBuf,

    /// Directory holding the master, import and manual calendars
    #[arg(long, global = true, env = "STAYSYNC_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Anchor date for the resolution window (default: today at the property)
    #[arg(long, global = true, value_parser = parse_day)]
    today: Option<NaiveDate>,

    /// Prep-time nights before each reservation
    #[arg(long, global = true, env = "BUFFER_DAYS_BEFORE")]
    before_days: Option<u32>,

    /// Prep-time nights after each reservation
    #[arg(long, global = true, env = "BUFFER_DAYS_AFTER")]
    after_days: Option<u32>,

    /// Log progress, not just problems
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feeds, resolve every night and write the calendars
    Reconcile {
        /// Extra feed as NAME=URL|PATH (repeatable)
        #[arg(long = "source", value_name = "NAME=URL|PATH", value_parser = feeds::parse_source_arg)]
        sources: Vec<FeedConfig>,
        /// Skip fetching; resolve from the stored import calendar
        #[arg(long)]
        offline: bool,
    },
    /// Block nights (only nights with no reservation or prep time are affected)
    Block {
        #[arg(required = true, value_name = "DATE", value_parser = parse_day)]
        dates: Vec<NaiveDate>,
    },
    /// Release prep time on nights
    Unblock {
        #[arg(required = true, value_name = "DATE", value_parser = parse_day)]
        dates: Vec<NaiveDate>,
    },
    /// Remove manual directives starting on the given nights
    Clear {
        #[arg(required = true, value_name = "DATE", value_parser = parse_day)]
        dates: Vec<NaiveDate>,
    },
    /// Show resolved nights from the stored calendars
    Nights {
        /// First night (default: today)
        #[arg(long, value_parser = parse_day)]
        from: Option<NaiveDate>,
        /// End of range, exclusive (default: 30 nights after --from)
        #[arg(long, value_parser = parse_day)]
        to: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let today = match cli.today {
        Some(day) => day,
        None => config.today()?,
    };
    let store = Arc::new(FileStore::new(&cli.data_dir));
    let reconciler = Reconciler::new(config.calendar_name.clone(), store.clone(), config);

    match cli.command {
        Commands::Reconcile { sources, offline } => {
            reconcile(&reconciler, sources, offline, today).await?;
        }
        Commands::Block { dates } => {
            let count = reconciler
                .edit_directives(|book| book.block(&dates))
                .await
                .context("Failed to record BLOCK directives")?;
            println!("Blocked {count} night(s)");
        }
        Commands::Unblock { dates } => {
            let count = reconciler
                .edit_directives(|book| book.unblock(&dates))
                .await
                .context("Failed to record UNBLOCK directives")?;
            println!("Released prep time on {count} night(s)");
        }
        Commands::Clear { dates } => {
            let count = reconciler
                .edit_directives(|book| book.clear(&dates))
                .await
                .context("Failed to clear manual directives")?;
            println!("Removed {count} directive(s)");
        }
        Commands::Nights { from, to, json } => {
            show_nights(store.as_ref(), reconciler.config(), today, from, to, json)?;
        }
    }

    Ok(())
}

/// Config file, then CLI flags / environment on top.
fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    if let Some(days) = cli.before_days {
        config.before_days = days;
    }
    if let Some(days) = cli.after_days {
        config.after_days = days;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn reconcile(
    reconciler: &Reconciler,
    extra: Vec<FeedConfig>,
    offline: bool,
    today: NaiveDate,
) -> Result<()> {
    let config = reconciler.config();
    let all: Vec<FeedConfig> = config.sources.iter().cloned().chain(extra).collect();
    let sources = feeds::build_sources(&all, config)?;
    let mode = if offline {
        FetchMode::Offline
    } else {
        FetchMode::Online
    };

    match reconciler.run(&sources, mode, today).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.counts)?);
            Ok(())
        }
        Err(failure) => {
            println!("{}", serde_json::to_string_pretty(&failure.counts)?);
            Err(anyhow::Error::new(failure.error).context("Reconciliation failed"))
        }
    }
}

/// Resolve from the stored import and manual calendars without writing anything.
fn show_nights(
    store: &FileStore,
    config: &SyncConfig,
    today: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let from = from.unwrap_or(today);
    let to = to.unwrap_or(from + Duration::days(30));
    if to <= from {
        bail!("--to ({to}) must be after --from ({from})");
    }

    let cached_import = store.load(StoreKey::Import)?;
    if cached_import.is_none() {
        bail!(
            "No import calendar at {}; run `staysync reconcile` first",
            store.path(StoreKey::Import).display()
        );
    }
    let inputs = RunInputs {
        directives: store.load(StoreKey::Manual)?,
        cached_import,
        ..RunInputs::default()
    };
    let outcome = reconcile_payloads(&inputs, config, today).context("Failed to resolve nights")?;
    let selected: Vec<&NightState> = outcome.nights.range(from, to).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
    } else {
        for night in selected {
            println!(
                "{}  {:<9}  {}",
                night.date,
                night.category.title(),
                night.description
            );
        }
    }
    Ok(())
}

fn parse_day(raw: &str) -> std::result::Result<NaiveDate, String> {
    ics_core::parse_date(raw).ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}
