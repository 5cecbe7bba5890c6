//! SafeTrack - child-safety escalation service
//!
//! Serves the agent pipeline over HTTP, or runs it once from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the configured address
//! cargo run --release
//!
//! # One-shot evaluation of a telemetry file
//! ./safetrack run --telemetry reading.json
//!
//! # Print the effective configuration as TOML
//! ./safetrack print-config
//! ```
//!
//! # Environment Variables
//!
//! - `SAFETRACK_CONFIG`: Path to a `safetrack.toml`
//! - `SAFETRACK_SERVER_ADDR` / `PORT`: Bind address override
//! - `SAFETRACK_CORS_ORIGINS`: Comma-separated allowed origins
//! - `SAFETRACK_LOG_FORMAT`: `json` for JSON log lines
//! - `AI_STUDIO_API_KEY`: Text-generation API key (name is configurable)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use safetrack::api::{create_app, AppState};
use safetrack::config::{self, SafetyConfig};
use safetrack::{build_generator, Orchestrator, RawTelemetry};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "safetrack")]
#[command(about = "SafeTrack child-safety escalation service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a config file (overrides SAFETRACK_CONFIG and ./safetrack.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the pipeline once and print the result as JSON
    Run {
        /// JSON file with a telemetry object
        #[arg(long)]
        telemetry: PathBuf,
        /// Treat the alert as acknowledged by the caregiver
        #[arg(long)]
        acked: bool,
    },

    /// Print the effective configuration as TOML
    PrintConfig,
}

// ============================================================================
// Startup
// ============================================================================

/// Initialize logging. `SAFETRACK_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("SAFETRACK_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SafetyConfig> {
    match path {
        Some(p) => SafetyConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(SafetyConfig::load()),
    }
}

/// Bind address: `--addr`, then `SAFETRACK_SERVER_ADDR`, then `PORT`, then config.
fn server_addr(cli: Option<String>, config: &SafetyConfig) -> String {
    cli.or_else(|| std::env::var("SAFETRACK_SERVER_ADDR").ok())
        .or_else(|| std::env::var("PORT").ok().map(|port| format!("0.0.0.0:{}", port.trim())))
        .unwrap_or_else(|| config.server.addr.clone())
}

async fn run_once(orchestrator: &Orchestrator, telemetry: &PathBuf, acked: bool) -> Result<()> {
    let contents = std::fs::read_to_string(telemetry)
        .with_context(|| format!("Failed to read {}", telemetry.display()))?;
    let telemetry: RawTelemetry =
        serde_json::from_str(&contents).context("Telemetry file must hold a JSON object")?;

    match orchestrator.run(telemetry, acked).await {
        Ok(run) => {
            let body = safetrack::api::envelope::OrchestrateResponse::from(run);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err).context("Pipeline halted")),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = CliArgs::parse();
    let safety_config = load_config(args.config.as_ref())?;

    if let Some(SubCommand::PrintConfig) = &args.command {
        println!("{}", safety_config.to_toml()?);
        return Ok(());
    }

    let generator = build_generator(&safety_config.generator);
    let backend = generator.backend_name();
    let orchestrator = Arc::new(Orchestrator::new(&safety_config, generator));

    if let Some(SubCommand::Run { telemetry, acked }) = &args.command {
        return run_once(&orchestrator, telemetry, *acked).await;
    }

    let addr = server_addr(args.addr, &safety_config);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  SafeTrack - child-safety escalation agents");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "Temperature gate: {}°F | Public tier after {}s unacknowledged | Generator: {}",
        safety_config.risk.temperature_threshold_f,
        safety_config.escalation.social_threshold_secs,
        backend
    );
    if safety_config.escalation.social_threshold_secs <= config::defaults::RAPID_RESPONSE_SOCIAL_THRESHOLD_SECS {
        info!("Rapid-response public tier threshold in effect");
    }

    let state = AppState::new(orchestrator, Arc::new(safety_config), backend);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("SafeTrack shutdown complete");
    Ok(())
}
