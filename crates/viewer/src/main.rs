//! Terminal PGN viewer with live Stockfish analysis.

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use viewer::{Args, Session, ViewerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so the board on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ViewerConfig::from_args(Args::parse());
    info!(
        engine = %config.engine.stockfish_path,
        depth = config.engine.depth,
        enabled = config.engine_enabled,
        "Viewer config loaded"
    );

    let mut session = Session::new(config.clone());
    session.start_engine();

    if let Some(path) = &config.pgn_file {
        if let Err(e) = session.load_file(path, config.format_on_load).await {
            warn!(error = %e, "Could not open initial game");
            eprintln!("Error: {e}");
        }
    }

    session
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Viewer stopped");
    Ok(())
}
