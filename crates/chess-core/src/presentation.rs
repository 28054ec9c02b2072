//! Read-only view model derived from the navigation state and the latest
//! evaluation. Nothing here owns state.

use serde::Serialize;
use shakmaty::{Board, File, Rank, Square};

use crate::error::CoreError;
use crate::evaluation::{EvaluationSnapshot, Score};
use crate::game_data::{GameRecord, LastMove, Side};
use crate::navigation::NavigationController;

/// Scores beyond ±10 pawns fill the bar completely.
pub const EVAL_CLAMP_CP: i32 = 1000;

/// Threshold for the panel's winning / losing tone.
const TONE_THRESHOLD_CP: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SquareView {
    pub name: String,
    /// FEN piece letter, uppercase for White
    pub piece: Option<char>,
    pub light: bool,
    pub highlighted: bool,
}

/// Squares in display order: `ranks[0]` is the top row as seen by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub ranks: Vec<Vec<SquareView>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCell {
    pub index: usize,
    pub san: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovePair {
    pub number: u32,
    pub white: Option<MoveCell>,
    pub black: Option<MoveCell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalTone {
    Winning,
    Level,
    Losing,
}

/// A secondary engine line as shown under the best line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlternateLineView {
    pub rank: u32,
    pub label: String,
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationView {
    /// White's share of the bar, 0..=100
    pub percent: f64,
    pub bar_label: String,
    pub text: String,
    pub tone: EvalTone,
    pub best_line: Vec<String>,
    pub alternate_lines: Vec<AlternateLineView>,
    pub depth: u32,
    pub best_move: Option<String>,
    pub is_searching: bool,
    pub engine_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationState {
    pub title: String,
    pub fen: String,
    pub flipped: bool,
    pub board: BoardView,
    pub last_move: Option<LastMove>,
    pub moves: Vec<MovePair>,
    pub active_index: Option<usize>,
    pub can_step_backward: bool,
    pub can_step_forward: bool,
    pub evaluation: EvaluationView,
}

impl PresentationState {
    pub fn derive(
        nav: &NavigationController,
        flipped: bool,
        eval: &EvaluationSnapshot,
    ) -> Result<Self, CoreError> {
        let fen = nav.current_fen();
        let last_move = nav.last_move();
        let board = board_view(fen, flipped, last_move.as_ref())?;

        Ok(Self {
            title: nav.record().metadata.summary(),
            fen: fen.to_string(),
            flipped,
            board,
            last_move,
            moves: move_list(nav.record(), nav.cursor()),
            active_index: nav.cursor(),
            can_step_backward: nav.can_step_backward(),
            can_step_forward: nav.can_step_forward(),
            evaluation: evaluation_view(eval, side_to_move(fen)),
        })
    }
}

/// White's share of the evaluation bar.
///
/// Centipawns are clamped to ±1000 and mapped linearly so 0 cp is 50%.
/// A reported mate overrides the score: positive → 100, otherwise 0.
pub fn eval_bar_percent(centipawns: i32, mate: Option<i32>) -> f64 {
    match mate {
        Some(m) if m > 0 => 100.0,
        Some(_) => 0.0,
        None => {
            let clamped = centipawns.clamp(-EVAL_CLAMP_CP, EVAL_CLAMP_CP);
            50.0 + f64::from(clamped) * 50.0 / f64::from(EVAL_CLAMP_CP)
        }
    }
}

/// Short label drawn on the bar: `M3`, `+0.4`, `-1.2`.
pub fn bar_label(centipawns: i32, mate: Option<i32>) -> String {
    match mate {
        Some(m) => format!("M{}", m.abs()),
        None => {
            let pawns = f64::from(centipawns) / 100.0;
            if centipawns > 0 {
                format!("+{pawns:.1}")
            } else {
                format!("{pawns:.1}")
            }
        }
    }
}

/// Panel text: `Mate in 3`, `+0.35`.
pub fn evaluation_text(centipawns: i32, mate: Option<i32>) -> String {
    match mate {
        Some(m) => format!("Mate in {}", m.abs()),
        None => {
            let pawns = f64::from(centipawns) / 100.0;
            if centipawns > 0 {
                format!("+{pawns:.2}")
            } else {
                format!("{pawns:.2}")
            }
        }
    }
}

pub fn evaluation_tone(centipawns: i32, mate: Option<i32>) -> EvalTone {
    match mate {
        Some(m) if m > 0 => EvalTone::Winning,
        Some(_) => EvalTone::Losing,
        None if centipawns > TONE_THRESHOLD_CP => EvalTone::Winning,
        None if centipawns < -TONE_THRESHOLD_CP => EvalTone::Losing,
        None => EvalTone::Level,
    }
}

fn evaluation_view(eval: &EvaluationSnapshot, to_move: Side) -> EvaluationView {
    // "mate 0": the side to move is already mated
    let (percent, bar_label, text, tone) = match (eval.mate, to_move) {
        (Some(0), side) => {
            let (percent, tone) = match side {
                Side::Black => (100.0, EvalTone::Winning),
                Side::White => (0.0, EvalTone::Losing),
            };
            (percent, "#".to_string(), "Checkmate".to_string(), tone)
        }
        _ => (
            eval_bar_percent(eval.centipawns, eval.mate),
            bar_label(eval.centipawns, eval.mate),
            evaluation_text(eval.centipawns, eval.mate),
            evaluation_tone(eval.centipawns, eval.mate),
        ),
    };

    let alternate_lines = eval
        .alternate_lines
        .iter()
        .map(|line| AlternateLineView {
            rank: line.multipv,
            label: match line.score {
                Some(Score::Cp(cp)) => evaluation_text(cp, None),
                Some(Score::Mate(n)) => evaluation_text(0, Some(n)),
                None => "?".to_string(),
            },
            moves: line.pv.clone(),
        })
        .collect();

    EvaluationView {
        percent,
        bar_label,
        text,
        tone,
        best_line: eval.principal_variation.clone(),
        alternate_lines,
        depth: eval.depth,
        best_move: eval.best_move.clone(),
        is_searching: eval.is_searching,
        engine_ready: eval.engine_ready,
    }
}

fn side_to_move(fen: &str) -> Side {
    match fen.split_whitespace().nth(1) {
        Some("b") => Side::Black,
        _ => Side::White,
    }
}

/// Piece placement of `fen` as display rows.
pub fn board_view(
    fen: &str,
    flipped: bool,
    last_move: Option<&LastMove>,
) -> Result<BoardView, CoreError> {
    let placement = fen.split_whitespace().next().unwrap_or_default();
    let board: Board = placement.parse().map_err(|e| CoreError::InvalidFen {
        fen: fen.to_string(),
        reason: format!("{e}"),
    })?;

    let mut rank_order: Vec<u32> = (0..8).rev().collect();
    let mut file_order: Vec<u32> = (0..8).collect();
    if flipped {
        rank_order.reverse();
        file_order.reverse();
    }

    let ranks = rank_order
        .iter()
        .map(|&rank| {
            file_order
                .iter()
                .map(|&file| {
                    let square = Square::from_coords(File::new(file), Rank::new(rank));
                    let name = square.to_string();
                    let highlighted =
                        last_move.is_some_and(|m| m.from == name || m.to == name);
                    SquareView {
                        piece: board.piece_at(square).map(|p| p.char()),
                        light: (file + rank) % 2 == 1,
                        highlighted,
                        name,
                    }
                })
                .collect()
        })
        .collect();

    Ok(BoardView { ranks })
}

/// Moves grouped as numbered White/Black pairs. A game starting with Black
/// to move gets a leading pair with an empty White cell.
pub fn move_list(record: &GameRecord, cursor: Option<usize>) -> Vec<MovePair> {
    let mut number = record
        .initial_fen
        .split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
    let mut pairs: Vec<MovePair> = Vec::with_capacity(record.len() / 2 + 1);

    for position in &record.positions {
        let cell = MoveCell {
            index: position.ply,
            san: position.san.clone(),
            active: cursor == Some(position.ply),
        };
        match position.color {
            Side::White => pairs.push(MovePair {
                number,
                white: Some(cell),
                black: None,
            }),
            Side::Black => {
                match pairs.last_mut() {
                    Some(last) if last.black.is_none() => last.black = Some(cell),
                    _ => pairs.push(MovePair {
                        number,
                        white: None,
                        black: Some(cell),
                    }),
                }
                number += 1;
            }
        }
    }

    pairs
}
