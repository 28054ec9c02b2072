//! PGN transcript loading.
//!
//! The transcript is scanned once: top-level tags are collected for the
//! headers while comments and variations are dropped from the movetext.
//! Every SAN token is then replayed through shakmaty so the resulting
//! `GameRecord` holds the FEN after each ply.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position as _, Square};

use crate::error::CoreError;
use crate::game_data::{GameMetadata, GameRecord, Position};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(\w+)\s+"((?:[^"\\]|\\.)*)"\s*$"#).expect("tag pattern compiles")
});

static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+").expect("move number pattern compiles"));

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

impl GameRecord {
    /// Parse a transcript into a fully materialised record.
    pub fn from_pgn(pgn: &str) -> Result<Self, CoreError> {
        parse_pgn(pgn)
    }
}

/// Parse a PGN string into a `GameRecord`.
///
/// Fails on empty input, unknown movetext tokens, illegal moves, unbalanced
/// comments/variations and unusable `FEN` headers. Nothing is partially
/// returned on failure.
pub fn parse_pgn(pgn: &str) -> Result<GameRecord, CoreError> {
    if pgn.trim().is_empty() {
        return Err(invalid("empty transcript"));
    }

    let mut metadata = GameMetadata::default();
    let mut setup = None;
    let mut fen = None;

    let transcript = scan_transcript(pgn)?;
    for (key, value) in transcript.tags {
        match key.as_str() {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "Event" => metadata.event = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // `[SetUp "0"]` explicitly says the FEN tag is not authoritative
    let start = match fen {
        Some(ref f) if setup.as_deref() != Some("0") => starting_position(f)?,
        _ => Chess::default(),
    };
    let initial_fen = fen_string(&start);

    let tokens = movetext_tokens(&transcript.mainline);
    let mut pos = start;
    let mut positions = Vec::with_capacity(tokens.len());

    for token in tokens {
        let ply = positions.len();
        let san_plus: SanPlus = token
            .parse()
            .map_err(|_| invalid(format!("unrecognised token '{token}' at ply {}", ply + 1)))?;
        let mv = san_plus
            .san
            .to_move(&pos)
            .map_err(|e| invalid(format!("illegal move '{token}' at ply {}: {e}", ply + 1)))?;

        let (from, to) = move_squares(&mv);
        let color = pos.turn();
        let san = San::from_move(&pos, mv.clone());
        pos.play_unchecked(mv);

        let suffix = if pos.is_checkmate() {
            "#"
        } else if pos.is_check() {
            "+"
        } else {
            ""
        };

        positions.push(Position {
            san: format!("{san}{suffix}"),
            fen: fen_string(&pos),
            from: from.to_string(),
            to: to.to_string(),
            color: color.into(),
            ply,
        });
    }

    Ok(GameRecord {
        metadata,
        initial_fen,
        positions,
    })
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidTranscript(reason.into())
}

fn fen_string(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

fn starting_position(fen: &str) -> Result<Chess, CoreError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| invalid(format!("bad FEN header '{fen}': {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| invalid(format!("bad FEN header '{fen}': {e}")))
}

/// Origin and destination as a board would highlight them. Castling is
/// reported as the king's two-square walk, not king-takes-rook.
fn move_squares(mv: &Move) -> (Square, Square) {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            (*king, Square::from_coords(file, king.rank()))
        }
        _ => (mv.from().unwrap_or(mv.to()), mv.to()),
    }
}

/// Mainline SAN tokens with move numbers, NAGs, annotation glyphs and the
/// trailing result removed. Zero-written castling becomes `O-O`/`O-O-O`.
fn movetext_tokens(mainline: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for raw in mainline.split_whitespace() {
        let token = match MOVE_NUMBER_RE.find(raw) {
            Some(m) => &raw[m.end()..],
            None => raw,
        };
        let token = token.trim_end_matches(|c| c == '!' || c == '?');
        if token.is_empty() || token.starts_with('$') {
            continue;
        }
        if RESULT_TOKENS.contains(&token) {
            break;
        }
        tokens.push(normalise_castling(token));
    }

    tokens
}

fn normalise_castling(token: &str) -> String {
    if let Some(rest) = token.strip_prefix("0-0-0") {
        format!("O-O-O{rest}")
    } else if let Some(rest) = token.strip_prefix("0-0") {
        format!("O-O{rest}")
    } else {
        token.to_string()
    }
}

/// Top-level tag pairs in order, plus the movetext with tags, `{}` / `;`
/// comments and `()` variations (nested) replaced by whitespace.
struct Transcript {
    tags: Vec<(String, String)>,
    mainline: String,
}

fn scan_transcript(pgn: &str) -> Result<Transcript, CoreError> {
    let mut tags = Vec::new();
    let mut out = String::with_capacity(pgn.len());
    let mut chars = pgn.chars();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if !chars.by_ref().any(|c| c == '}') {
                    return Err(invalid("unterminated comment"));
                }
                out.push(' ');
            }
            ';' => {
                // Rest-of-line comment; running off the end is fine
                let _ = chars.by_ref().find(|&c| c == '\n');
                out.push(' ');
            }
            '(' => {
                depth += 1;
                out.push(' ');
            }
            ')' => {
                if depth == 0 {
                    return Err(invalid("unbalanced ')' in movetext"));
                }
                depth -= 1;
                out.push(' ');
            }
            _ if depth > 0 => {}
            '[' => {
                let raw = read_tag(&mut chars)?;
                if let Some(tag) = parse_tag(&raw) {
                    tags.push(tag);
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    if depth > 0 {
        return Err(invalid("unterminated variation"));
    }
    Ok(Transcript {
        tags,
        mainline: out,
    })
}

/// Raw text between `[` and the closing `]`, escapes left in place.
fn read_tag(chars: &mut std::str::Chars<'_>) -> Result<String, CoreError> {
    let mut raw = String::new();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => {
                raw.push(c);
                if let Some(escaped) = chars.next() {
                    raw.push(escaped);
                }
                continue;
            }
            '"' => quoted = !quoted,
            ']' if !quoted => return Ok(raw),
            _ => {}
        }
        raw.push(c);
    }
    Err(invalid("unterminated header tag"))
}

/// Malformed tags are ignored rather than rejected.
fn parse_tag(raw: &str) -> Option<(String, String)> {
    let cap = TAG_RE.captures(raw)?;
    let mut value = String::with_capacity(cap[2].len());
    let mut chars = cap[2].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.extend(chars.next()),
            _ => value.push(c),
        }
    }
    Some((cap[1].to_string(), value))
}
