use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{DrosteConfig, TOKEN_ENV};
use droste_chain::{
    ChainEvent, ChainOrchestrator, HttpImageResolver, Pipeline, ReplicateClient,
};
use droste_graph::{GraphWalker, MediaWikiSource};
use droste_placement::extract_detailed;
use droste_protocol::{serialize_json, serialize_json_pretty};
use droste_store::{load_ordered, FrameStore, JsonFileStore};
use droste_timeline::{NavigationState, TimelineNavigator, WheelOutcome};
use serde::Serialize;
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod config;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serialize_json_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "droste")]
#[command(about = "Recursive image chains over a link graph", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (overrides DROSTE_CONFIG and ./droste.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Frame store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the store, walk from a topic and build the composite chain
    Search(SearchArgs),

    /// Print persisted frames in chain order
    Frames,

    /// Delete all persisted frames
    Clear,

    /// Recover a placement from analysis model text (file or stdin)
    Extract(ExtractArgs),

    /// Replay wheel deltas against the persisted frames
    Navigate(NavigateArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Seed topic title
    topic: String,

    /// Hops after the seed (default from config)
    #[arg(long, short = 'd')]
    depth: Option<usize>,

    /// Seed for random candidate picks
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Model API token (env: DROSTE_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// MediaWiki action API endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// Model prediction endpoint
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Args)]
struct ExtractArgs {
    /// Read text from a file instead of stdin
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct NavigateArgs {
    /// Frame to open before replaying
    #[arg(long, default_value_t = 0)]
    open: usize,

    /// Wheel deltas, comma-separated (negative scrolls deeper)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    deltas: Vec<f64>,

    /// Simulated time between events
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper internals stay quiet below debug
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = DrosteConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.store {
        config.store.path = Some(path.clone());
    }

    match cli.command {
        Commands::Search(args) => run_search(args, config, cli.pretty).await?,
        Commands::Frames => run_frames(&config, cli.pretty).await?,
        Commands::Clear => run_clear(&config).await?,
        Commands::Extract(args) => run_extract(args, cli.pretty)?,
        Commands::Navigate(args) => run_navigate(args, &config, cli.pretty).await?,
    }
    Ok(())
}

fn open_store(config: &DrosteConfig) -> Arc<JsonFileStore> {
    let path = config.store_path();
    log::debug!("Frame store: {}", path.display());
    Arc::new(JsonFileStore::new(path))
}

async fn run_search(args: SearchArgs, mut config: DrosteConfig, pretty: bool) -> Result<()> {
    let token = args
        .token
        .or_else(|| env::var(TOKEN_ENV).ok())
        .filter(|token| !token.trim().is_empty())
        .with_context(|| format!("Missing model API token: set {TOKEN_ENV} or pass --token"))?;
    if let Some(api_url) = args.api_url {
        config.source.api_url = api_url;
    }
    if let Some(endpoint) = args.endpoint {
        config.models.endpoint = endpoint;
    }
    if let Some(seed) = args.rng_seed {
        config.walk.rng_seed = Some(seed);
    }
    let depth = args.depth.unwrap_or(config.walk.max_depth);

    let source = Arc::new(
        MediaWikiSource::new(&config.source.api_url).context("Failed to build graph client")?,
    );
    let images = Arc::new(
        HttpImageResolver::new(source.clone(), config.models.call_timeout())
            .context("Failed to build image client")?,
    );
    let models = Arc::new(
        ReplicateClient::new(&config.models, token).context("Failed to build model client")?,
    );

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let progress = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            log_event(&event);
        }
    });

    let orchestrator = ChainOrchestrator::new(
        images,
        models.clone(),
        models,
        open_store(&config),
        config.models.clone(),
    )
    .with_events(events_tx);
    let walker = GraphWalker::new(source, config.walk.clone());
    let pipeline = Pipeline::new(walker, orchestrator);

    let outcome = pipeline.search(&args.topic, depth).await;
    drop(pipeline);
    let _ = progress.await;

    let context = outcome.with_context(|| format!("Search for '{}' failed", args.topic))?;
    if context.frames.is_empty() {
        log::warn!("No frames produced for '{}'", args.topic);
    }
    print_json(&context, pretty)
}

fn log_event(event: &ChainEvent) {
    match event {
        ChainEvent::NodeStarted {
            ordinal,
            total,
            title,
        } => log::info!("[{}/{total}] Linking to... {title}", ordinal + 1),
        ChainEvent::SourceSkipped { title, reason, .. } => {
            log::warn!("Skipped {title}: {reason}")
        }
        ChainEvent::CompositeDegraded { index, reason, .. } => {
            log::warn!("Frame {index}: model processing failed, using original image ({reason})")
        }
        ChainEvent::PlacementMissing { index, .. } => {
            log::info!("Frame {index}: no placement found")
        }
        ChainEvent::FramePersisted {
            index,
            title,
            is_generated,
            ..
        } => log::info!("Frame {index} saved: {title} (generated: {is_generated})"),
    }
}

async fn run_frames(config: &DrosteConfig, pretty: bool) -> Result<()> {
    let store = open_store(config);
    let frames = load_ordered(store.as_ref())
        .await
        .context("Failed to load frames")?;
    print_json(&frames, pretty)
}

async fn run_clear(config: &DrosteConfig) -> Result<()> {
    let store = open_store(config);
    store.clear().await.context("Failed to clear frames")?;
    print_stdout(r#"{"cleared":true}"#)
}

#[derive(Serialize)]
struct ExtractOutput {
    placement: Option<droste_protocol::Placement>,
    strategy: Option<&'static str>,
}

fn run_extract(args: ExtractArgs, pretty: bool) -> Result<()> {
    let raw = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let output = match extract_detailed(&raw) {
        Ok(extraction) => ExtractOutput {
            placement: Some(extraction.placement),
            strategy: Some(extraction.strategy),
        },
        Err(err) => {
            log::info!("No placement: {err}");
            ExtractOutput {
                placement: None,
                strategy: None,
            }
        }
    };
    print_json(&output, pretty)
}

#[derive(Serialize)]
struct NavigationStep {
    delta: f64,
    #[serde(flatten)]
    outcome: WheelOutcome,
    state: NavigationState,
}

async fn run_navigate(args: NavigateArgs, config: &DrosteConfig, pretty: bool) -> Result<()> {
    let store = open_store(config);
    let mut navigator = TimelineNavigator::new(Vec::new(), config.navigation.clone());
    let count = navigator
        .refresh(store.as_ref())
        .await
        .context("Failed to load frames")?;
    if count == 0 {
        anyhow::bail!("No frames persisted; run `droste search <topic>` first");
    }
    navigator.open(args.open)?;

    let start = Instant::now();
    let interval = Duration::from_millis(args.interval_ms);
    let steps: Vec<NavigationStep> = args
        .deltas
        .iter()
        .zip(0u32..)
        .map(|(&delta, i)| {
            let outcome = navigator.on_wheel(delta, start + interval * i);
            NavigationStep {
                delta,
                outcome,
                state: navigator.state(),
            }
        })
        .collect();
    print_json(&steps, pretty)
}
