pub mod bridge;
pub mod config;
pub mod debounce;
pub mod error;
pub mod stockfish;
pub mod uci;

pub use bridge::{BridgeState, EngineBridge, EngineUpdate, Generation};
pub use config::EngineConfig;
pub use debounce::Debouncer;
pub use error::EngineError;
pub use uci::{parse_line, EngineLine, InfoLine};
