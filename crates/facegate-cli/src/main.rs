use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_assistant::{Assistant, AuthSession, Intent, Sender};
use facegate_core::{LivenessPipeline, OnnxEngine};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "facegate", about = "Face liveness check and authentication assistant")]
struct Cli {
    /// Optional TOML configuration file (FACEGATE_* variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one liveness check on an image file (exit status 0 = live)
    Check {
        /// Captured image (PNG, JPEG, ...)
        image: PathBuf,
        /// Print a JSON report instead of a one-word verdict
        #[arg(long)]
        json: bool,
    },
    /// Talk to the authentication assistant on stdin/stdout
    Chat,
    /// Walk through a full authentication session with a captured image
    Session {
        #[arg(short, long)]
        image: PathBuf,
        /// Print the session transcript as JSON
        #[arg(long)]
        json: bool,
    },
    /// Model file utilities
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
    /// Show resolved configuration and model availability
    Status,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Print the SHA-256 digest of a file
    Hash { file: PathBuf },
    /// Verify the configured model against the configured digest
    Verify,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref())?;
    tracing::debug!(?cfg, "configuration loaded");

    match cli.command {
        Commands::Check { image, json } => check(&cfg, &image, json).await,
        Commands::Chat => chat().await,
        Commands::Session { image, json } => session(&cfg, &image, json).await,
        Commands::Models { command } => models(&cfg, command),
        Commands::Status => status(&cfg),
    }
}

fn build_pipeline(cfg: &Config) -> Result<LivenessPipeline> {
    let options = cfg.pipeline_options()?;
    let engine = Arc::new(OnnxEngine::new(cfg.intra_threads));
    Ok(LivenessPipeline::new(engine, options))
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading image {}", path.display()))
}

fn verdict_code(live: bool) -> ExitCode {
    if live {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

async fn check(cfg: &Config, image: &Path, json: bool) -> Result<ExitCode> {
    let bytes = read_image(image)?;
    let pipeline = build_pipeline(cfg)?;

    if !json {
        let live = pipeline.authenticate_liveness(&bytes).await;
        println!("{}", if live { "live" } else { "not live" });
        return Ok(verdict_code(live));
    }

    let (live, body) = match pipeline.attempt(&bytes).await {
        Ok(report) => (report.is_live, serde_json::to_value(&report)?),
        Err(err) => (
            false,
            serde_json::json!({ "is_live": false, "error": err.to_string() }),
        ),
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(verdict_code(live))
}

async fn chat() -> Result<ExitCode> {
    let mut assistant = Assistant::new();
    println!("{}", assistant.greet());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (intent, reply) = assistant.respond(line);
        println!("{reply}");
        if intent == Intent::Goodbye {
            break;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn session(cfg: &Config, image: &Path, json: bool) -> Result<ExitCode> {
    let bytes = read_image(image)?;
    let pipeline = build_pipeline(cfg)?;

    let mut session = AuthSession::new();
    session.start();
    session.capture(bytes)?;
    let live = session.authenticate(&pipeline).await?;

    if json {
        let body = serde_json::json!({
            "stage": session.stage(),
            "authenticated": session.is_authenticated(),
            "transcript": session.transcript(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        for message in session.transcript() {
            let who = match message.sender {
                Sender::Bot => "assistant",
                Sender::User => "you",
            };
            println!("[{}] {who}: {}", message.sent_at.format("%H:%M:%S"), message.text);
        }
    }

    Ok(verdict_code(live))
}

fn models(cfg: &Config, command: ModelsCommand) -> Result<ExitCode> {
    match command {
        ModelsCommand::Hash { file } => {
            println!("{}", facegate_models::sha256_file_hex(&file)?);
        }
        ModelsCommand::Verify => {
            let path = cfg.model_path();
            match cfg.model_sha256.as_deref() {
                Some(expected) => {
                    facegate_models::verify_file_sha256(&path, expected)?;
                    println!("{}: OK", path.display());
                }
                None => {
                    let digest = facegate_models::sha256_file_hex(&path)?;
                    tracing::warn!("no model digest configured; set FACEGATE_MODEL_SHA256 to pin it");
                    println!("{}: {digest} (unpinned)", path.display());
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn status(cfg: &Config) -> Result<ExitCode> {
    let path = cfg.model_path();
    let body = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "model_path": path.display().to_string(),
        "model_present": path.exists(),
        "model_pinned": cfg.model_sha256.is_some(),
        "liveness_threshold": cfg.liveness_threshold,
        "score_rule": cfg.score_rule,
        "infer_timeout_secs": cfg.infer_timeout_secs,
        "intra_threads": cfg.intra_threads,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(ExitCode::SUCCESS)
}
