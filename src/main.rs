use clap::Parser;
use mediafetch::{Config, MediaFetcher, run_with_shutdown};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mediafetch", version, about = "Fetch remote media as MP3 or MP4")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, short, env = "MEDIAFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Shared download directory (overrides config value).
    #[arg(long, env = "MEDIAFETCH_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Address to bind the API to (overrides config value).
    #[arg(long, env = "MEDIAFETCH_BIND")]
    bind: Option<SocketAddr>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.log_json {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

fn load_config(cli: &Cli) -> mediafetch::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.download_dir {
        config.storage.download_dir = dir.clone();
    }
    if let Some(bind) = cli.bind {
        config.api.bind_address = bind;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(&cli)?;
    let fetcher = MediaFetcher::new(config).await?;
    fetcher.start_sweeper().await;

    let server = fetcher.spawn_api_server();

    tokio::select! {
        result = server => {
            // the server only returns on failure
            match result {
                Ok(Err(e)) => tracing::error!(error = %e, "API server failed"),
                Err(e) => tracing::error!(error = %e, "API server task panicked"),
                Ok(Ok(())) => {}
            }
            fetcher.shutdown().await;
        }
        _ = run_with_shutdown(&fetcher) => {}
    }

    Ok(())
}
