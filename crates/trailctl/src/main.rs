//! `trailctl`: inspect and feed a Trail version store.
//!
//! # Usage
//!
//! ```text
//! trailctl record create --type Post --id 1 --attrs post.json --actor alice
//! trailctl record update --type Post --id 1 --attrs post.json --next post2.json
//! trailctl versions --type Post --id 1
//! trailctl trail --type Post --id 1 --current post2.json --last-modified 2024-01-01T10:00:00Z
//! trailctl state-at --type Post --id 1 --at 2024-01-01T09:00:00Z \
//!     --current post2.json --last-modified 2024-01-01T10:00:00Z
//! trailctl owners
//! ```

mod config;
mod input;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use trail_history::{
    AuditOptions, FixedActor, History, HistoryError, LiveEntity, NoActor, Recorder, TrailConfig,
};
use trail_store::{FjallStore, SnapshotStore};
use trail_types::{OwnerRef, Version};
use tracing::{debug, info};

use config::CliConfig;
use input::{parse_timestamp, read_attributes};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "trailctl", version, about = "Trail version store tool")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the store directory.
    #[arg(short, long, global = true, env = "TRAIL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Identifies the entity a command works on.
#[derive(clap::Args)]
struct OwnerArgs {
    /// Entity type name.
    #[arg(short = 't', long = "type")]
    item_type: String,

    /// Entity id.
    #[arg(short, long)]
    id: String,
}

impl OwnerArgs {
    fn owner(&self) -> OwnerRef {
        OwnerRef::new(&self.item_type, &self.id)
    }
}

/// The live state of an entity, supplied by the caller.
#[derive(clap::Args)]
struct LiveArgs {
    /// JSON object file with the entity's current attributes.
    #[arg(long)]
    current: PathBuf,

    /// When the current state was last modified (RFC 3339).
    #[arg(long, value_parser = parse_timestamp)]
    last_modified: DateTime<Utc>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordEvent {
    Create,
    Update,
    Destroy,
}

#[derive(clap::Args)]
struct RecordArgs {
    event: RecordEvent,

    #[command(flatten)]
    owner: OwnerArgs,

    /// JSON object file with the entity's attributes before the event.
    #[arg(long)]
    attrs: PathBuf,

    /// JSON object file with the attributes after an update.
    #[arg(long, required_if_eq("event", "update"))]
    next: Option<PathBuf>,

    /// Who performed the change.
    #[arg(long, env = "TRAIL_ACTOR")]
    actor: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a lifecycle event.
    Record(RecordArgs),

    /// Print an entity's stored versions, oldest first, one JSON per line.
    Versions {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Print an entity's attributes as of a past instant.
    StateAt {
        #[command(flatten)]
        owner: OwnerArgs,

        #[command(flatten)]
        live: LiveArgs,

        /// The instant to reconstruct (RFC 3339).
        #[arg(long, value_parser = parse_timestamp)]
        at: DateTime<Utc>,
    },

    /// Print an entity's audit trail, newest first, one JSON per line.
    Trail {
        #[command(flatten)]
        owner: OwnerArgs,

        #[command(flatten)]
        live: LiveArgs,

        /// Attributes to leave out (comma separated). Defaults to the config.
        #[arg(long, value_delimiter = ',')]
        ignore: Option<Vec<String>>,

        /// Report every attribute, ignoring nothing.
        #[arg(long, conflicts_with = "ignore")]
        all: bool,
    },

    /// List every entity with stored history.
    Owners,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    trail_history::set_enabled(config.trail.enabled);

    let store: Arc<dyn SnapshotStore> = Arc::new(
        FjallStore::open(&config.storage.data_dir).with_context(|| {
            format!(
                "failed to open store at {}",
                config.storage.data_dir.display()
            )
        })?,
    );
    debug!(data_dir = %config.storage.data_dir.display(), "opened store");

    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Record(args) => {
            if cmd_record(&config.trail, store, &args, &mut out)?.is_none() {
                eprintln!("nothing recorded for {}", args.owner.owner());
            }
            Ok(())
        }
        Commands::Versions { owner } => cmd_versions(store.as_ref(), &owner.owner(), &mut out),
        Commands::StateAt { owner, live, at } => {
            cmd_state_at(store, owner.owner(), &live, at, &mut out)
        }
        Commands::Trail {
            owner,
            live,
            ignore,
            all,
        } => {
            let options = audit_options(all, ignore, &config.trail);
            cmd_trail(store, owner.owner(), &live, &options, &mut out)
        }
        Commands::Owners => cmd_owners(store.as_ref(), &mut out),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr so stdout stays machine-readable.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--all` wins, then an explicit `--ignore` list, then the config.
fn audit_options(all: bool, ignore: Option<Vec<String>>, config: &TrailConfig) -> AuditOptions {
    if all {
        AuditOptions::ignoring_nothing()
    } else if let Some(ignore) = ignore {
        AuditOptions::ignoring(ignore)
    } else {
        AuditOptions::from_config(config)
    }
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn live_entity(owner: OwnerRef, live: &LiveArgs) -> Result<LiveEntity> {
    let attributes = read_attributes(&live.current)?;
    Ok(LiveEntity::new(owner, attributes, live.last_modified))
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

/// Record one event and print the stored version. `None` when nothing was
/// recorded.
fn cmd_record(
    trail: &TrailConfig,
    store: Arc<dyn SnapshotStore>,
    args: &RecordArgs,
    out: &mut impl Write,
) -> Result<Option<Version>> {
    let recorder = Recorder::from_config(store, trail);
    let recorder = match &args.actor {
        Some(actor) => recorder.with_actor(Arc::new(FixedActor::new(actor.clone()))),
        None => recorder.with_actor(Arc::new(NoActor)),
    };

    let entity = LiveEntity::new(args.owner.owner(), read_attributes(&args.attrs)?, Utc::now());
    let recorded = match args.event {
        RecordEvent::Create => recorder.record_create(&entity)?,
        RecordEvent::Update => {
            let next = args
                .next
                .as_deref()
                .context("--next is required for update")?;
            recorder.record_update(&entity, &read_attributes(next)?)?
        }
        RecordEvent::Destroy => recorder.record_destroy(&entity)?,
    };

    if let Some(version) = &recorded {
        info!(owner = %version.owner, id = %version.id, "recorded");
        print_json(out, version)?;
    }
    Ok(recorded)
}

fn cmd_versions(store: &dyn SnapshotStore, owner: &OwnerRef, out: &mut impl Write) -> Result<()> {
    for version in store.list_for(owner)? {
        print_json(out, &version)?;
    }
    Ok(())
}

fn cmd_state_at(
    store: Arc<dyn SnapshotStore>,
    owner: OwnerRef,
    live: &LiveArgs,
    at: DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    let entity = live_entity(owner, live)?;
    match History::new(store).state_at(&entity, at) {
        Ok(state) => print_json(out, &state),
        Err(HistoryError::NotFoundAtTimestamp { owner, at }) => {
            anyhow::bail!("{owner} did not exist before {}", at.to_rfc3339())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_trail(
    store: Arc<dyn SnapshotStore>,
    owner: OwnerRef,
    live: &LiveArgs,
    options: &AuditOptions,
    out: &mut impl Write,
) -> Result<()> {
    let entity = live_entity(owner, live)?;
    for entry in History::new(store).audit_trail(&entity, options)? {
        print_json(out, &entry)?;
    }
    Ok(())
}

fn cmd_owners(store: &dyn SnapshotStore, out: &mut impl Write) -> Result<()> {
    for owner in store.owners()? {
        writeln!(out, "{owner}")?;
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
