use clap::Parser;
use office_md::config::BackendKind;
use office_md::{create_router, utils::init_logger, AppState, Config};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "office-md", version, about = "Convert office documents to Markdown in the browser")]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Conversion backend: markitdown or native (overrides CONVERTER_BACKEND)
    #[arg(long)]
    backend: Option<BackendKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(backend) = cli.backend {
        config.converter.backend = backend;
    }
    info!("Configuration loaded: {:?}", config.server);

    // Create shared state
    let state = AppState::new(config.clone());
    info!(backend = state.converter.backend_name(), "Converter ready");

    let _sweeper = state.sessions.spawn_idle_sweeper(
        config.session.idle_timeout_secs,
        config.session.sweep_interval_secs,
    );

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
