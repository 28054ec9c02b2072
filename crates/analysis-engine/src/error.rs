//! Engine error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine process could not be acquired; analysis stays disabled.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}
