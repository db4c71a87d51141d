//! dbh-matcher - command-line entry point
//!
//! `convert` resolves a JSON array of track descriptors and prints one JSON
//! progress event per line on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dbh_common::config::{self, TomlConfig};
use dbh_matcher::config::MatcherSettings;
use dbh_matcher::db::TrackRegistry;
use dbh_matcher::models::{Isrc, RegistryKey};
use dbh_matcher::workflow::{run_conversion, ConversionEvent};
use dbh_matcher::{MatcherEngine, MatchingMode, TrackDescriptor};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for dbh-matcher
#[derive(Parser, Debug)]
#[command(name = "dbh-matcher")]
#[command(about = "Resolve Spotify, YouTube and CSV tracks to DAB catalog ids")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = config::CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Root folder holding the registry database
    #[arg(short, long, env = config::ROOT_FOLDER_ENV_VAR)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a batch of track descriptors
    Convert {
        /// JSON array of descriptors, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Matching mode: strict or lenient (default from config)
        #[arg(short, long)]
        mode: Option<String>,

        /// Skip MusicBrainz ISRC enrichment
        #[arg(long)]
        no_enrich: bool,
    },
    /// Query the registry without touching the network
    Lookup {
        #[arg(long, group = "key")]
        spotify: Option<String>,

        #[arg(long, group = "key")]
        youtube: Option<String>,

        #[arg(long, group = "key")]
        isrc: Option<String>,
    },
    /// Print registry statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;

    // stdout carries the event stream, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = config::resolve_root_folder(
        args.root_folder.as_deref(),
        config::ROOT_FOLDER_ENV_VAR,
        &toml_config,
    );
    let db_path = config::database_path(&root_folder, &toml_config);
    info!("Registry database: {}", db_path.display());

    let registry = TrackRegistry::open(&db_path)
        .await
        .with_context(|| format!("Failed to open registry at {}", db_path.display()))?;

    match args.command {
        Command::Convert {
            input,
            mode,
            no_enrich,
        } => convert(toml_config, registry, &input, mode.as_deref(), no_enrich).await,
        Command::Lookup {
            spotify,
            youtube,
            isrc,
        } => lookup(&registry, spotify, youtube, isrc).await,
        Command::Stats => stats(&registry, &db_path).await,
    }
}

async fn convert(
    mut toml_config: TomlConfig,
    registry: TrackRegistry,
    input: &str,
    mode: Option<&str>,
    no_enrich: bool,
) -> Result<()> {
    if no_enrich {
        toml_config.matching.enrichment_enabled = false;
    }

    let settings = MatcherSettings::resolve(&toml_config)?;
    let mode = mode
        .map(MatchingMode::from_request)
        .unwrap_or(settings.default_mode);

    let tracks = read_tracks(input).await?;
    info!("Loaded {} tracks, mode {}", tracks.len(), mode);

    let engine = MatcherEngine::build(&settings, registry).context("Failed to build matcher")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling conversion");
            signal_cancel.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel::<ConversionEvent>(32);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "Failed to serialize event"),
            }
        }
    });

    let outcome = run_conversion(engine.resolver(), &tracks, mode, &cancel, &tx).await;
    drop(tx);
    printer.await.context("Event printer failed")?;

    engine.shutdown().await;

    if outcome.cancelled {
        info!(
            "Conversion cancelled after {} of {} tracks",
            outcome.results.len(),
            tracks.len()
        );
    }
    Ok(())
}

async fn read_tracks(input: &str) -> Result<Vec<TrackDescriptor>> {
    let content = if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(Path::new(input))
            .await
            .with_context(|| format!("Failed to read {}", input))?
    };

    serde_json::from_str(&content).context("Input must be a JSON array of track descriptors")
}

async fn lookup(
    registry: &TrackRegistry,
    spotify: Option<String>,
    youtube: Option<String>,
    isrc: Option<String>,
) -> Result<()> {
    let key = match (spotify, youtube, isrc) {
        (Some(id), _, _) => RegistryKey::Spotify(id),
        (_, Some(id), _) => RegistryKey::Youtube(id),
        (_, _, Some(code)) => RegistryKey::Isrc(Isrc::parse(&code)?),
        _ => bail!("One of --spotify, --youtube or --isrc is required"),
    };

    let target_id = registry
        .try_lookup(&key)
        .await
        .context("Registry lookup failed")?;

    let entry = match &target_id {
        Some(id) => registry.get(id).await.context("Registry read failed")?,
        None => None,
    };

    let output = serde_json::json!({
        "key": key.column(),
        "value": key.value(),
        "target_id": target_id,
        "entry": entry,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn stats(registry: &TrackRegistry, db_path: &Path) -> Result<()> {
    let count = registry.count().await.context("Registry count failed")?;
    let output = serde_json::json!({
        "database": db_path.display().to_string(),
        "entries": count,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
