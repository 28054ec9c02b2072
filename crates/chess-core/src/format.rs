//! Cleanup for pasted PGN text.
//!
//! Only line breaks and surrounding whitespace are touched. The transform is
//! idempotent: `format_pgn(&format_pgn(x)) == format_pgn(x)`.

use std::sync::LazyLock;

use regex::Regex;

static TAG_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\s*\[").expect("tag boundary pattern compiles"));

static MOVETEXT_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\s*1\.").expect("movetext start pattern compiles"));

/// Normalize line endings, put each header tag on its own line and make sure
/// a blank line separates the headers from `1.`.
pub fn format_pgn(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let split = TAG_BOUNDARY_RE.replace_all(unified.trim(), "]\n[");
    MOVETEXT_START_RE.replace(&split, "]\n\n1.").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_adjacent_tags() {
        assert_eq!(
            format_pgn(r#"[A "x"][B "y"]"#),
            "[A \"x\"]\n[B \"y\"]"
        );
    }

    #[test]
    fn test_inserts_gap_before_movetext() {
        let formatted = format_pgn("[White \"a\"] [Black \"b\"] 1. e4 e5");
        assert_eq!(formatted, "[White \"a\"]\n[Black \"b\"]\n\n1. e4 e5");
    }

    #[test]
    fn test_unifies_line_endings_and_trims() {
        let formatted = format_pgn("  [White \"a\"]\r\n[Black \"b\"]\r\n\r\n1. e4  \r\n");
        assert_eq!(formatted, "[White \"a\"]\n[Black \"b\"]\n\n1. e4");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "1. e4 e5",
            "[A \"x\"][B \"y\"]1. d4",
            "[A \"x\"]\r\n\r\n\r\n1. c4 {a [%clk 0:01] note} 1-0",
            "\r[A \"x\"]  \t [B \"y\"]\n1.e4 ]  1. weird",
            "[Event \"]1.\"] 1. e4",
        ];
        for sample in samples {
            let once = format_pgn(sample);
            assert_eq!(format_pgn(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_leaves_moves_alone() {
        let pgn = "[White \"a\"]\n\n1. e4 e5 2. Nf3";
        assert_eq!(format_pgn(pgn), pgn);
    }
}
