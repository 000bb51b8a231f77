//! PII Scrubber server
//!
//! Detects and masks personally identifiable information in free text over
//! HTTP (`POST /mask`).
//!
//! Usage:
//! ```bash
//! # With config file
//! piiscrub-server --config config.yaml
//!
//! # Or with environment variables
//! ENABLE_AUTH=true API_USERNAME=scrubber API_PASSWORD=change-me-please piiscrub-server
//!
//! # Validate configuration and print it with secrets redacted
//! piiscrub-server --config config.yaml check-config
//! ```
//!
//! Test with:
//! ```bash
//! curl http://localhost:8000/mask \
//!   -H "Content-Type: application/json" \
//!   -d '{"text": "John Doe, john@example.com", "masking_mode": "replace"}'
//! ```

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::ServerConfig;
use piiscrub_core::{MaskPipeline, WhatlangDetector};
use piiscrub_ingress::build_app;
use piiscrub_observability::Metrics;
use piiscrub_pii::{AnalyzerConfig, RegexAnalyzer, StandardAnonymizer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// PII Scrubber - detect and mask personal data in text
#[derive(Parser)]
#[command(name = "piiscrub-server")]
#[command(about = "HTTP service that detects and masks PII in free text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "PIISCRUB_CONFIG",
        global = true
    )]
    config: Option<String>,

    /// Address to bind (overrides config and HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default if no command specified)
    Serve,
    /// Load and validate configuration, then print it with secrets redacted
    CheckConfig,
}

/// File, then environment, then CLI flags
fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => ServerConfig::default(),
    };

    config.merge_env()?;

    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    Ok(config)
}

/// Per-request logging is suppressed unless enabled; errors always show
fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let level = if config.logging.enabled {
        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level.as_str(),
            _ => "info",
        }
    } else {
        "error"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_pipeline(config: &ServerConfig) -> anyhow::Result<MaskPipeline> {
    let scrub = config.scrub.clone();

    let (bundled, missing): (Vec<String>, Vec<String>) = scrub
        .languages
        .supported
        .iter()
        .cloned()
        .partition(|l| RegexAnalyzer::LANGUAGES.contains(&l.as_str()));

    if !missing.is_empty() {
        warn!(
            languages = ?missing,
            "No recognizers for some supported languages; requests routed to them will fail"
        );
    }

    let analyzer = RegexAnalyzer::new(AnalyzerConfig {
        languages: bundled,
        ..AnalyzerConfig::default()
    })
    .context("failed to build entity analyzer")?;

    let detector = WhatlangDetector::new(&scrub.languages.supported);

    Ok(MaskPipeline::new(
        scrub,
        Arc::new(analyzer),
        Arc::new(StandardAnonymizer::new()),
        Arc::new(detector),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(Commands::CheckConfig) = cli.command {
        config.scrub.validate()?;
        let redacted = ServerConfig {
            scrub: config.scrub.redacted(),
            ..config
        };
        print!("{}", serde_yaml::to_string(&redacted)?);
        return Ok(());
    }

    init_tracing(&config)?;

    if let Err(e) = config.scrub.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if config.scrub.auth.enabled && !config.scrub.auth.has_credentials() {
        error!(
            "ENABLE_AUTH is true but API_USERNAME/API_PASSWORD are not set; /mask will answer 500"
        );
    }

    info!("Initializing PII scrubber");
    info!(
        languages = ?config.scrub.languages.supported,
        default_language = %config.scrub.languages.default,
        auto_detect = config.scrub.languages.auto_detect,
        max_text_size = config.scrub.max_text_size,
        auth = config.scrub.auth.enabled,
        rate_limit = config.scrub.rate_limit.enabled,
        "Configuration loaded"
    );

    let pipeline = Arc::new(build_pipeline(&config)?);
    let metrics = Arc::new(Metrics::new()?);
    let app = build_app(pipeline, metrics);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    info!("PII scrubber listening on http://{}", addr);
    info!("   - Mask endpoint:      http://{}/mask", addr);
    info!("   - Health check:       http://{}/health", addr);
    info!("   - Prometheus metrics: http://{}/metrics", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
