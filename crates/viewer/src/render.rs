//! Text and JSON rendering of the view model.

use std::fmt::Write;

use chess_core::presentation::{EvaluationView, MoveCell, PresentationState};

use crate::error::ViewerError;

const BAR_WIDTH: usize = 24;

pub fn render_text(view: &PresentationState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    out.push('\n');
    render_board(&mut out, view);
    out.push('\n');
    render_evaluation(&mut out, &view.evaluation);
    out.push('\n');
    render_moves(&mut out, view);
    out
}

pub fn render_json(view: &PresentationState) -> Result<String, ViewerError> {
    Ok(serde_json::to_string_pretty(view)?)
}

fn render_board(out: &mut String, view: &PresentationState) {
    for row in &view.board.ranks {
        let rank = row
            .first()
            .and_then(|sq| sq.name.chars().nth(1))
            .unwrap_or(' ');
        let _ = write!(out, " {rank} ");
        for square in row {
            let glyph = square
                .piece
                .unwrap_or(if square.light { '.' } else { ':' });
            if square.highlighted {
                let _ = write!(out, "[{glyph}]");
            } else {
                let _ = write!(out, " {glyph} ");
            }
        }
        out.push('\n');
    }

    out.push_str("   ");
    if let Some(row) = view.board.ranks.first() {
        for square in row {
            let file = square.name.chars().next().unwrap_or(' ');
            let _ = write!(out, " {file} ");
        }
    }
    out.push('\n');
}

/// One-line evaluation bar: `#` is White's share.
pub fn eval_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn render_evaluation(out: &mut String, eval: &EvaluationView) {
    if !eval.engine_ready {
        out.push_str("Engine: not available\n");
        return;
    }

    let _ = writeln!(out, "{} {}", eval_bar(eval.percent), eval.bar_label);
    let status = if eval.is_searching { "  (searching)" } else { "" };
    let _ = writeln!(out, "Evaluation: {} depth {}{status}", eval.text, eval.depth);
    if !eval.best_line.is_empty() {
        let _ = writeln!(out, "Best line: {}", eval.best_line.join(" "));
    }
    for line in &eval.alternate_lines {
        let _ = writeln!(out, "Line {}: {} {}", line.rank, line.label, line.moves.join(" "));
    }
    if let Some(best) = &eval.best_move {
        let _ = writeln!(out, "Best move: {best}");
    }
}

fn render_moves(out: &mut String, view: &PresentationState) {
    if view.moves.is_empty() {
        out.push_str("No moves\n");
        return;
    }

    for pair in &view.moves {
        let _ = writeln!(
            out,
            "{:>3}. {:<9} {}",
            pair.number,
            cell(pair.white.as_ref(), ".."),
            cell(pair.black.as_ref(), "")
        );
    }
}

fn cell(cell: Option<&MoveCell>, empty: &str) -> String {
    match cell {
        Some(c) if c.active => format!("[{}]", c.san),
        Some(c) => c.san.clone(),
        None => empty.to_string(),
    }
}
