//! Engine configuration from environment variables

use std::env;
use std::time::Duration;

pub const DEFAULT_STOCKFISH_PATH: &str = "stockfish";
pub const DEFAULT_DEPTH: u32 = 20;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub stockfish_path: String,

    /// Search depth per analysed position
    pub depth: u32,

    /// Quiet period after a position change before analysis is sent
    pub debounce: Duration,

    pub threads: u32,

    pub hash_mb: u32,

    /// Number of lines reported; only the first feeds the evaluation
    pub multipv: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stockfish_path: DEFAULT_STOCKFISH_PATH.to_string(),
            depth: DEFAULT_DEPTH,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            threads: 1,
            hash_mb: 64,
            multipv: 1,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            stockfish_path: lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            depth: number("ANALYSIS_DEPTH")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&d| d > 0)
                .unwrap_or(defaults.depth),
            debounce: number("ANALYSIS_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            threads: number("ENGINE_THREADS")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&t| t > 0)
                .unwrap_or(defaults.threads),
            hash_mb: number("ENGINE_HASH_MB")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&h| h > 0)
                .unwrap_or(defaults.hash_mb),
            multipv: number("ENGINE_MULTIPV")
                .and_then(|v| u32::try_from(v).ok())
                .filter(|&m| m > 0)
                .unwrap_or(defaults.multipv),
        }
    }

    /// `setoption` commands sent once the engine reports `uciok`.
    pub fn uci_options(&self) -> Vec<String> {
        vec![
            format!("setoption name Threads value {}", self.threads),
            format!("setoption name Hash value {}", self.hash_mb),
            format!("setoption name MultiPV value {}", self.multipv),
            "setoption name UCI_AnalyseMode value true".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
        assert_eq!(EngineConfig::default().debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("STOCKFISH_PATH", "/opt/sf"),
            ("ANALYSIS_DEPTH", "12"),
            ("ANALYSIS_DEBOUNCE_MS", "50"),
            ("ENGINE_THREADS", "zero"),
            ("ENGINE_MULTIPV", "0"),
        ]));
        assert_eq!(config.stockfish_path, "/opt/sf");
        assert_eq!(config.depth, 12);
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.threads, 1);
        assert_eq!(config.multipv, 1);
    }

    #[test]
    fn test_uci_options() {
        let options = EngineConfig::default().uci_options();
        assert!(options.contains(&"setoption name MultiPV value 1".to_string()));
        assert_eq!(options.len(), 4);
    }
}
