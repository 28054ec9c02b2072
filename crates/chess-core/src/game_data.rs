use serde::{Deserialize, Serialize};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<shakmaty::Color> for Side {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Side::White,
            shakmaty::Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub event: Option<String>,
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            white: "White".to_string(),
            black: "Black".to_string(),
            result: "*".to_string(),
            date: None,
            event: None,
        }
    }
}

impl GameMetadata {
    /// One-line header, e.g. `Carlsen vs Nakamura (1-0)`.
    pub fn summary(&self) -> String {
        format!("{} vs {} ({})", self.white, self.black, self.result)
    }
}

/// One half-move of the loaded game and the position it leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub san: String,
    /// FEN after this move has been played
    pub fen: String,
    pub from: String,
    pub to: String,
    pub color: Side,
    pub ply: usize,
}

/// Origin and destination of the move that produced the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub metadata: GameMetadata,
    /// Position before the first move (index -1)
    pub initial_fen: String,
    pub positions: Vec<Position>,
}

impl Default for GameRecord {
    fn default() -> Self {
        Self {
            metadata: GameMetadata::default(),
            initial_fen: START_FEN.to_string(),
            positions: Vec::new(),
        }
    }
}

impl GameRecord {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// FEN at `ply`, or the initial FEN for `None`.
    pub fn fen_at(&self, ply: Option<usize>) -> Option<&str> {
        match ply {
            None => Some(&self.initial_fen),
            Some(i) => self.positions.get(i).map(|p| p.fen.as_str()),
        }
    }

    /// SAN moves in game order.
    pub fn san_moves(&self) -> Vec<&str> {
        self.positions.iter().map(|p| p.san.as_str()).collect()
    }
}
