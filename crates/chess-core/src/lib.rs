//! Game model for the viewer: transcript loading, navigation, evaluation
//! state and the derived presentation.

pub mod error;
pub mod evaluation;
pub mod format;
pub mod game_data;
pub mod navigation;
pub mod pgn;
pub mod presentation;

pub use error::CoreError;
pub use evaluation::{EvaluationSnapshot, PvLine, Score};
pub use format::format_pgn;
pub use game_data::{GameMetadata, GameRecord, LastMove, Position, Side, START_FEN};
pub use navigation::{NavAction, NavigationController};
pub use presentation::PresentationState;
