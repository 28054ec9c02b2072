pub mod command;
pub mod config;
pub mod error;
pub mod render;
pub mod session;

pub use command::Command;
pub use config::{Args, ViewerConfig};
pub use error::ViewerError;
pub use session::{Session, Step};
