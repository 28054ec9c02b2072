//! Tolerant tokenizer for engine output.
//!
//! Fields are located by marker token (`depth`, `score`, `multipv`, `pv`, ...)
//! and read from the token(s) that follow. A missing or unparsable marker
//! yields `None` for that field only.

use std::str::FromStr;

use chess_core::Score;

/// Tokens that end a `pv` move list.
const INFO_KEYWORDS: &[&str] = &[
    "depth",
    "seldepth",
    "time",
    "nodes",
    "multipv",
    "score",
    "currmove",
    "currmovenumber",
    "hashfull",
    "nps",
    "tbhits",
    "sbhits",
    "cpuload",
    "refutation",
    "currline",
    "string",
    "bmc",
    "wdl",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    /// Readiness sentinel after `uci`
    UciOk,
    Info(InfoLine),
    /// `bestmove <m>`; `(none)` and any ponder suggestion are dropped
    BestMove { best_move: Option<String> },
    Other,
}

/// Fields of one `info` progress line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub pv: Option<Vec<String>>,
}

impl InfoLine {
    /// 1-based multi-PV rank; lines without `multipv` are the primary line.
    pub fn rank(&self) -> u32 {
        self.multipv.unwrap_or(1)
    }

    pub fn is_primary(&self) -> bool {
        self.rank() == 1
    }

    fn carries_evaluation(&self) -> bool {
        self.depth.is_some() || self.score.is_some() || self.pv.is_some()
    }
}

/// Classify a single line of engine output.
pub fn parse_line(line: &str) -> EngineLine {
    let trimmed = line.trim();
    let mut tokens = trimmed.split_whitespace();

    match tokens.next() {
        Some("uciok") => EngineLine::UciOk,
        Some("info") => parse_info(trimmed).map_or(EngineLine::Other, EngineLine::Info),
        Some("bestmove") => {
            let best_move = tokens
                .next()
                .filter(|m| *m != "(none)")
                .map(String::from);
            EngineLine::BestMove { best_move }
        }
        _ => EngineLine::Other,
    }
}

/// Parse an `info` line. Lines with no depth, score or pv (e.g.
/// `info string ...`, `info currmove ...`) return `None`.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    let mut parts: Vec<&str> = line.split_whitespace().collect();
    // Everything after `string` is free text
    if let Some(idx) = parts.iter().position(|p| *p == "string") {
        parts.truncate(idx);
    }

    let info = InfoLine {
        depth: value_after(&parts, "depth"),
        multipv: value_after(&parts, "multipv"),
        score: parse_score(&parts),
        pv: parse_pv(&parts),
    };

    info.carries_evaluation().then_some(info)
}

fn value_after<T: FromStr>(parts: &[&str], marker: &str) -> Option<T> {
    let idx = parts.iter().position(|p| *p == marker)?;
    parts.get(idx + 1)?.parse().ok()
}

/// `score cp <v>` or `score mate <v>`; bound qualifiers after the value are
/// ignored.
fn parse_score(parts: &[&str]) -> Option<Score> {
    let idx = parts.iter().position(|p| *p == "score")?;
    let value: i32 = parts.get(idx + 2)?.parse().ok()?;
    match *parts.get(idx + 1)? {
        "cp" => Some(Score::Cp(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

/// PV moves run from the `pv` marker to the next keyword or end of line.
fn parse_pv(parts: &[&str]) -> Option<Vec<String>> {
    let idx = parts.iter().position(|p| *p == "pv")?;
    let moves = parts[idx + 1..]
        .iter()
        .take_while(|p| !INFO_KEYWORDS.contains(*p))
        .map(|p| p.to_string())
        .collect();
    Some(moves)
}
