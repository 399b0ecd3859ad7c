use anyhow::Result;
use clap::Parser;
use llm_relay::{config::Config, llm::OllamaClient, pipeline::Pipeline, shutdown};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Relay between a RabbitMQ job queue and a local Ollama endpoint.
#[derive(Parser, Debug)]
#[command(name = "llm-relay", version)]
struct Cli {
    /// Address of the ollama server
    #[arg(long = "ollama-host", default_value = "http://localhost:11434")]
    ollama_host: String,

    /// How many workers should run in parallel
    #[arg(long = "worker-count", default_value_t = 1)]
    worker_count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .json()
        .init();

    let config = match Config::from_env(cli.ollama_host, cli.worker_count) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    info!("Starting llm-relay");

    let pipeline = match Pipeline::connect(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "failed to connect to broker");
            std::process::exit(1);
        }
    };

    let client = Arc::new(OllamaClient::new(config.ollama_host.clone()));
    let handle = pipeline.start(client, config.worker_count);

    let code = shutdown::wait_for_shutdown().await?;
    handle.shutdown(SHUTDOWN_GRACE).await;

    std::process::exit(code);
}
