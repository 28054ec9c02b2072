use std::path::PathBuf;
use std::time::Duration;

use analysis_engine::EngineConfig;
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "viewer",
    about = "Step through a PGN game with live Stockfish evaluation"
)]
pub struct Args {
    /// PGN file to open on startup
    pub pgn_file: Option<PathBuf>,

    /// Normalise whitespace in every transcript before parsing
    #[arg(long)]
    pub format: bool,

    /// Engine binary (overrides STOCKFISH_PATH)
    #[arg(long)]
    pub engine: Option<String>,

    /// Search depth (overrides ANALYSIS_DEPTH)
    #[arg(long)]
    pub depth: Option<u32>,

    /// Debounce in milliseconds (overrides ANALYSIS_DEBOUNCE_MS)
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Run without an engine
    #[arg(long)]
    pub no_engine: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerConfig {
    pub engine: EngineConfig,
    pub pgn_file: Option<PathBuf>,
    pub format_on_load: bool,
    pub engine_enabled: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            pgn_file: None,
            format_on_load: false,
            engine_enabled: true,
        }
    }
}

impl ViewerConfig {
    /// Environment first, then command-line flags on top.
    pub fn from_args(args: Args) -> Self {
        Self::merge(EngineConfig::from_env(), args)
    }

    pub fn merge(mut engine: EngineConfig, args: Args) -> Self {
        if let Some(path) = args.engine {
            engine.stockfish_path = path;
        }
        if let Some(depth) = args.depth.filter(|&d| d > 0) {
            engine.depth = depth;
        }
        if let Some(ms) = args.debounce_ms {
            engine.debounce = Duration::from_millis(ms);
        }

        Self {
            engine,
            pgn_file: args.pgn_file,
            format_on_load: args.format,
            engine_enabled: !args.no_engine,
        }
    }
}
