//! `admatch` command line entry point.
//!
//! Reads a payload, runs the pipeline over HTTP, prints the results as JSON
//! on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use admatch::{AdmatchConfig, MatchDirection, Pipeline};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Match ad previews to the ad creative images they were built from.
#[derive(Parser, Debug)]
#[command(name = "admatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON payload (one user object or an array of users), or `-` to read stdin.
    payload: String,

    /// Path to a YAML configuration file.
    #[arg(short, long, env = "ADMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Which side drives the best-match search.
    #[arg(long, value_enum)]
    direction: Option<DirectionArg>,

    /// Keep only the best-scoring variant of each creative.
    #[arg(long)]
    group_variants: bool,

    /// Per-image download timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum concurrent downloads per user.
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print single-line JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    /// One result per preview.
    TargetsToCandidates,
    /// One result per creative variant.
    CandidatesToTargets,
}

impl From<DirectionArg> for MatchDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::TargetsToCandidates => MatchDirection::TargetsToCandidates,
            DirectionArg::CandidatesToTargets => MatchDirection::CandidatesToTargets,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error processing data: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    init_tracing(&config.log_level, cli.log_format);

    let payload = read_payload(&cli.payload)?;
    let pipeline = Pipeline::http(&config)?;
    let results = pipeline.process_payload(&payload).await?;

    let rendered = if cli.compact {
        serde_json::to_string(&results)?
    } else {
        serde_json::to_string_pretty(&results)?
    };
    println!("{rendered}");
    Ok(())
}

/// File values first, then CLI flags on top.
fn load_config(cli: &Cli) -> anyhow::Result<AdmatchConfig> {
    let mut config = match &cli.config {
        Some(path) => AdmatchConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AdmatchConfig::default(),
    };

    if let Some(direction) = cli.direction {
        config.matcher.direction = direction.into();
    }
    if cli.group_variants {
        config.matcher.group_variants = true;
    }
    if let Some(secs) = cli.timeout_secs {
        config.fetch.timeout_secs = secs;
    }
    if let Some(n) = cli.max_concurrency {
        config.fetch.max_concurrency = n;
    }

    config.validate()?;
    Ok(config)
}

fn read_payload(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading payload from stdin")?;
        Ok(buf)
    } else {
        Ok(arg.to_string())
    }
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_target(false).init(),
    }
}
