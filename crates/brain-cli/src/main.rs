use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use brain_core::{AccrualEngine, ActivityKind, ActivityMeta, Selection};
use brain_db::SqliteStore;
use chrono::Utc;
use clap::Parser;
use fs2::FileExt;
use tracing_subscriber::EnvFilter;

use brain_cli::commands::{define, export, options, report, reset, set, status, tick};
use brain_cli::{Cli, Commands, Config};

/// Load config, take the store lock, and open the engine.
///
/// The returned lock file must be held until the command finishes; dropping
/// it releases the lock.
fn open_engine(config_path: Option<&Path>) -> Result<(AccrualEngine<SqliteStore>, File)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let dir = config.database_dir();
    std::fs::create_dir_all(dir).context("failed to create database directory")?;

    let lock = File::create(dir.join(".lock")).context("failed to create lock file")?;
    lock.lock_exclusive().context("failed to acquire lock")?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let engine = AccrualEngine::with_config(store, config.state_key, config.economy);
    Ok((engine, lock))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tracing may already be initialized in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut engine, _lock) = open_engine(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let now = Utc::now();

    match command {
        Commands::Set {
            location,
            movement,
            activities,
        } => {
            let selection = Selection::new(location.as_deref(), movement.as_deref(), activities);
            set::run(&mut out, &mut engine, selection, now)?;
        }
        Commands::Toggle { activity } => set::toggle(&mut out, &mut engine, activity, now)?,
        Commands::Clear => set::clear(&mut out, &mut engine, now)?,
        Commands::Tick => tick::run(&mut out, &mut engine, now)?,
        Commands::Status => status::run(&mut out, &mut engine, now)?,
        Commands::Report { json } => report::run(&mut out, &engine, *json)?,
        Commands::Export => export::run(&mut out, &mut engine, now)?,
        Commands::Reset { yes } => reset::run(&mut out, &mut engine, *yes)?,
        Commands::Options => options::run(&mut out, &mut engine, now)?,
        Commands::Define {
            label,
            productive,
            relax,
            neutral: _,
        } => {
            let meta = match (productive, relax) {
                (Some(rate), _) => ActivityMeta::with_rate(ActivityKind::Productive, *rate),
                (None, Some(rate)) => ActivityMeta::with_rate(ActivityKind::Relax, *rate),
                (None, None) => Ok(ActivityMeta::neutral()),
            }
            .context("invalid activity rate")?;
            define::run(&mut out, &mut engine, label, meta, now)?;
        }
    }

    Ok(())
}
