//! Engine bridge: owns the Stockfish process and turns its output into
//! evaluation updates for the position currently on screen.
//!
//! Searches are tagged with a [`Generation`]. The engine answers searches in
//! the order they were started, so every `go` without a matching `bestmove`
//! is kept in a FIFO and info lines are attributed to its front. Output for
//! anything but the current search is dropped.

use std::collections::VecDeque;

use chess_core::{EvaluationSnapshot, PvLine};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::stockfish::StockfishProcess;
use crate::uci::{parse_line, EngineLine, InfoLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    /// `uci` sent, waiting for `uciok`
    Starting,
    Ready,
    Unavailable,
    Shutdown,
}

/// Token identifying one analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSearch {
    generation: Generation,
    /// Engine scores are side-to-move relative; flip them for Black.
    black_to_move: bool,
}

/// Change to apply to the evaluation snapshot. Scores are already from
/// White's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineUpdate {
    Ready,
    SearchStarted {
        generation: Generation,
    },
    Progress {
        generation: Generation,
        info: InfoLine,
    },
    AlternateLine {
        generation: Generation,
        line: PvLine,
    },
    SearchStopped {
        generation: Generation,
    },
    SearchFinished {
        generation: Generation,
        best_move: Option<String>,
    },
    Unavailable {
        reason: String,
    },
}

impl EngineUpdate {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            EngineUpdate::SearchStarted { generation }
            | EngineUpdate::Progress { generation, .. }
            | EngineUpdate::AlternateLine { generation, .. }
            | EngineUpdate::SearchStopped { generation }
            | EngineUpdate::SearchFinished { generation, .. } => Some(*generation),
            EngineUpdate::Ready | EngineUpdate::Unavailable { .. } => None,
        }
    }

    pub fn apply(&self, snapshot: &mut EvaluationSnapshot) {
        match self {
            EngineUpdate::Ready => snapshot.engine_ready = true,
            EngineUpdate::SearchStarted { .. } => snapshot.begin_search(),
            EngineUpdate::Progress { info, .. } => {
                if let Some(depth) = info.depth {
                    snapshot.depth = depth;
                }
                if let Some(score) = info.score {
                    snapshot.set_score(score);
                }
                if let Some(pv) = &info.pv {
                    snapshot.principal_variation = pv.clone();
                }
            }
            EngineUpdate::AlternateLine { line, .. } => snapshot.upsert_alternate(line.clone()),
            EngineUpdate::SearchStopped { .. } => snapshot.is_searching = false,
            EngineUpdate::SearchFinished { best_move, .. } => {
                snapshot.is_searching = false;
                snapshot.best_move = best_move.clone();
            }
            EngineUpdate::Unavailable { .. } => {
                snapshot.engine_ready = false;
                snapshot.is_searching = false;
            }
        }
    }
}

pub struct EngineBridge {
    config: EngineConfig,
    state: BridgeState,
    process: Option<StockfishProcess>,
    commands: Option<mpsc::UnboundedSender<String>>,
    next_generation: u64,
    /// Most recently dispatched request, whether or not it is still running
    latest: Option<Generation>,
    current: Option<ActiveSearch>,
    /// Searches sent with `go` whose `bestmove` has not arrived yet
    outstanding: VecDeque<Generation>,
}

impl EngineBridge {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: BridgeState::Idle,
            process: None,
            commands: None,
            next_generation: 0,
            latest: None,
            current: None,
            outstanding: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == BridgeState::Ready
    }

    pub fn is_searching(&self) -> bool {
        self.current.is_some()
    }

    pub fn latest_generation(&self) -> Option<Generation> {
        self.latest
    }

    /// Spawn the engine and send `uci`. Returns the engine's output lines,
    /// which the caller feeds back through [`handle_line`](Self::handle_line).
    ///
    /// Only the first call does anything. A spawn failure leaves the bridge
    /// `Unavailable` for good.
    pub fn start(&mut self) -> Result<Option<mpsc::UnboundedReceiver<String>>, EngineError> {
        if self.state != BridgeState::Idle {
            return Ok(None);
        }

        let path = self.config.stockfish_path.clone();
        match StockfishProcess::spawn(&path) {
            Ok((process, channels)) => {
                info!(path = %path, "Engine process started");
                self.process = Some(process);
                self.attach(channels.commands);
                Ok(Some(channels.lines))
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Engine unavailable, analysis disabled");
                self.state = BridgeState::Unavailable;
                Err(e)
            }
        }
    }

    /// Drive an engine reachable through `commands` instead of a spawned
    /// process.
    pub fn attach(&mut self, commands: mpsc::UnboundedSender<String>) {
        self.commands = Some(commands);
        self.state = BridgeState::Starting;
        self.send("uci");
    }

    /// Process one line of engine output.
    pub fn handle_line(&mut self, line: &str) -> Option<EngineUpdate> {
        match parse_line(line) {
            EngineLine::UciOk => {
                if self.state != BridgeState::Starting {
                    return None;
                }
                for option in self.config.uci_options() {
                    self.send(&option);
                }
                self.state = BridgeState::Ready;
                info!("Engine ready");
                Some(EngineUpdate::Ready)
            }
            EngineLine::Info(info) => self.handle_info(info),
            EngineLine::BestMove { best_move } => {
                let finished = self.outstanding.pop_front()?;
                match self.current {
                    Some(search) if search.generation == finished => {
                        self.current = None;
                        debug!(generation = finished.0, ?best_move, "Search finished");
                        Some(EngineUpdate::SearchFinished {
                            generation: finished,
                            best_move,
                        })
                    }
                    _ => {
                        debug!(generation = finished.0, "Dropped bestmove of stale search");
                        None
                    }
                }
            }
            EngineLine::Other => None,
        }
    }

    fn handle_info(&self, mut info: InfoLine) -> Option<EngineUpdate> {
        let search = self.current?;
        if self.outstanding.front() != Some(&search.generation) {
            return None;
        }
        if search.black_to_move {
            info.score = info.score.map(|s| s.flipped());
        }

        let generation = search.generation;
        if info.is_primary() {
            Some(EngineUpdate::Progress { generation, info })
        } else {
            Some(EngineUpdate::AlternateLine {
                generation,
                line: PvLine {
                    multipv: info.rank(),
                    depth: info.depth,
                    score: info.score,
                    pv: info.pv.unwrap_or_default(),
                },
            })
        }
    }

    /// Start analysing `fen`. Ignored until the engine is ready.
    pub fn request_analysis(&mut self, fen: &str, depth: u32) -> Option<EngineUpdate> {
        if !self.is_ready() {
            debug!(state = ?self.state, "Analysis request ignored, engine not ready");
            return None;
        }

        if self.current.is_some() {
            self.send("stop");
        }
        self.send(&format!("position fen {fen}"));
        self.send(&format!("go depth {depth}"));

        let generation = Generation(self.next_generation);
        self.next_generation += 1;
        self.outstanding.push_back(generation);
        self.latest = Some(generation);
        self.current = Some(ActiveSearch {
            generation,
            black_to_move: fen.split_whitespace().nth(1) == Some("b"),
        });

        debug!(generation = generation.0, depth, "Analysis requested");
        Some(EngineUpdate::SearchStarted { generation })
    }

    /// Stop the running search. Its remaining output is dropped.
    pub fn stop(&mut self) -> Option<EngineUpdate> {
        let search = self.current.take()?;
        self.send("stop");
        Some(EngineUpdate::SearchStopped {
            generation: search.generation,
        })
    }

    /// The engine went away (stdout closed or write failure).
    pub fn mark_unavailable(&mut self, reason: &str) -> Option<EngineUpdate> {
        if matches!(self.state, BridgeState::Unavailable | BridgeState::Shutdown) {
            return None;
        }
        warn!(reason, "Engine unavailable");
        self.release();
        self.state = BridgeState::Unavailable;
        Some(EngineUpdate::Unavailable {
            reason: reason.to_string(),
        })
    }

    /// Send `quit` and kill the process. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.state == BridgeState::Shutdown {
            return;
        }
        self.send("quit");
        self.release();
        self.state = BridgeState::Shutdown;
        debug!("Engine bridge shut down");
    }

    /// Whether an update still describes the most recent request.
    pub fn accepts(&self, update: &EngineUpdate) -> bool {
        match update.generation() {
            Some(generation) => self.latest == Some(generation),
            None => true,
        }
    }

    fn release(&mut self) {
        self.commands = None;
        if let Some(mut process) = self.process.take() {
            process.kill();
        }
        self.current = None;
        self.outstanding.clear();
    }

    fn send(&self, cmd: &str) {
        if let Some(commands) = &self.commands {
            if commands.send(cmd.to_string()).is_err() {
                debug!(cmd, "Engine command channel closed");
            }
        }
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::presentation::eval_bar_percent;
    use chess_core::Score;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn ready_bridge() -> (EngineBridge, mpsc::UnboundedReceiver<String>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = EngineBridge::new(EngineConfig::default());
        bridge.attach(tx);
        assert_eq!(bridge.handle_line("uciok"), Some(EngineUpdate::Ready));
        drain(&mut rx);
        (bridge, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut sent = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            sent.push(cmd);
        }
        sent
    }

    fn feed(bridge: &EngineBridge, snapshot: &mut EvaluationSnapshot, update: Option<EngineUpdate>) {
        if let Some(update) = update {
            if bridge.accepts(&update) {
                update.apply(snapshot);
            }
        }
    }

    #[test]
    fn test_handshake_and_ready_gate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = EngineBridge::new(EngineConfig::default());
        bridge.attach(tx);
        assert_eq!(drain(&mut rx), vec!["uci"]);
        assert_eq!(bridge.state(), BridgeState::Starting);

        assert_eq!(bridge.request_analysis(AFTER_E4, 20), None);
        assert!(drain(&mut rx).is_empty());

        let _ = bridge.handle_line("id name Stockfish 16");
        assert_eq!(bridge.handle_line("uciok"), Some(EngineUpdate::Ready));
        let sent = drain(&mut rx);
        assert!(sent.iter().all(|c| c.starts_with("setoption")));
        assert!(bridge.is_ready());

        // A second uciok is noise
        assert_eq!(bridge.handle_line("uciok"), None);
    }

    #[test]
    fn test_stop_precedes_new_position() {
        let (mut bridge, mut rx) = ready_bridge();
        bridge.request_analysis(START, 20);
        assert_eq!(
            drain(&mut rx),
            vec![format!("position fen {START}"), "go depth 20".to_string()]
        );

        bridge.request_analysis(AFTER_E4, 20);
        assert_eq!(
            drain(&mut rx),
            vec![
                "stop".to_string(),
                format!("position fen {AFTER_E4}"),
                "go depth 20".to_string()
            ]
        );
    }

    const START: &str = chess_core::START_FEN;

    #[test]
    fn test_info_updates_snapshot() {
        let (mut bridge, _rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot {
            engine_ready: true,
            ..Default::default()
        };

        let started = bridge.request_analysis(AFTER_E4_E5, 20);
        feed(&bridge, &mut snapshot, started);
        assert!(snapshot.is_searching);

        let update = bridge.handle_line("info depth 12 score cp 35 multipv 1 pv e2e4 e7e5");
        feed(&bridge, &mut snapshot, update);
        assert_eq!(snapshot.centipawns, 35);
        assert_eq!(snapshot.mate, None);
        assert_eq!(snapshot.depth, 12);
        assert_eq!(snapshot.principal_variation, vec!["e2e4", "e7e5"]);
        assert_eq!(eval_bar_percent(snapshot.centipawns, snapshot.mate), 51.75);

        let update = bridge.handle_line("bestmove g1f3 ponder b8c6");
        feed(&bridge, &mut snapshot, update);
        assert!(!snapshot.is_searching);
        assert_eq!(snapshot.best_move.as_deref(), Some("g1f3"));
        assert!(!bridge.is_searching());
    }

    #[test]
    fn test_black_to_move_scores_are_flipped() {
        let (mut bridge, _rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot::default();
        bridge.request_analysis(AFTER_E4, 20);

        let update = bridge.handle_line("info depth 10 score cp 20 pv e7e5");
        feed(&bridge, &mut snapshot, update);
        assert_eq!(snapshot.centipawns, -20);

        let update = bridge.handle_line("info depth 11 score mate 3 pv e7e5");
        feed(&bridge, &mut snapshot, update);
        assert_eq!(snapshot.score(), Score::Mate(-3));
        assert_eq!(eval_bar_percent(snapshot.centipawns, snapshot.mate), 0.0);
    }

    #[test]
    fn test_stale_lines_after_new_request_are_dropped() {
        let (mut bridge, _rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot::default();

        bridge.request_analysis(START, 20);
        let second = bridge.request_analysis(AFTER_E4_E5, 20);
        feed(&bridge, &mut snapshot, second);

        // Still belongs to the first search
        assert_eq!(bridge.handle_line("info depth 18 score cp 500 pv d2d4"), None);
        assert_eq!(bridge.handle_line("bestmove d2d4"), None);

        let update = bridge.handle_line("info depth 5 score cp 30 pv g1f3");
        feed(&bridge, &mut snapshot, update);
        assert_eq!(snapshot.centipawns, 30);
        assert_eq!(snapshot.depth, 5);
    }

    #[test]
    fn test_stop_drops_remaining_output() {
        let (mut bridge, mut rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot::default();
        let started = bridge.request_analysis(START, 20);
        feed(&bridge, &mut snapshot, started);
        drain(&mut rx);

        let stopped = bridge.stop();
        assert_eq!(drain(&mut rx), vec!["stop"]);
        feed(&bridge, &mut snapshot, stopped);
        assert!(!snapshot.is_searching);

        assert_eq!(bridge.handle_line("info depth 9 score cp 12 pv e2e4"), None);
        assert_eq!(bridge.handle_line("bestmove e2e4"), None);
        assert_eq!(snapshot.depth, 0);

        // Nothing running, so no stop and nothing to report
        assert_eq!(bridge.stop(), None);
        bridge.request_analysis(AFTER_E4, 20);
        assert_eq!(drain(&mut rx)[0], format!("position fen {AFTER_E4}"));
    }

    #[test]
    fn test_alternate_lines_do_not_touch_primary() {
        let config = EngineConfig {
            multipv: 2,
            ..Default::default()
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = EngineBridge::new(config);
        bridge.attach(tx);
        bridge.handle_line("uciok");
        assert!(drain(&mut rx).contains(&"setoption name MultiPV value 2".to_string()));

        let mut snapshot = EvaluationSnapshot::default();
        bridge.request_analysis(START, 20);
        for line in [
            "info depth 10 multipv 1 score cp 25 pv e2e4",
            "info depth 10 multipv 2 score cp 15 pv d2d4 d7d5",
        ] {
            let update = bridge.handle_line(line);
            feed(&bridge, &mut snapshot, update);
        }
        assert_eq!(snapshot.centipawns, 25);
        assert_eq!(snapshot.principal_variation, vec!["e2e4"]);
        assert_eq!(snapshot.alternate_lines.len(), 1);
        assert_eq!(snapshot.alternate_lines[0].score, Some(Score::Cp(15)));
        assert_eq!(snapshot.alternate_lines[0].pv, vec!["d2d4", "d7d5"]);
    }

    #[test]
    fn test_malformed_lines_are_partial() {
        let (mut bridge, _rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot::default();
        bridge.request_analysis(START, 20);

        let update = bridge.handle_line("info depth 7 score cp");
        feed(&bridge, &mut snapshot, update);
        assert_eq!(snapshot.depth, 7);
        assert_eq!(snapshot.centipawns, 0);
        assert_eq!(bridge.handle_line("garbage"), None);
    }

    #[test]
    fn test_shutdown_is_repeatable() {
        let (mut bridge, mut rx) = ready_bridge();
        bridge.request_analysis(START, 20);
        drain(&mut rx);

        bridge.shutdown();
        assert_eq!(drain(&mut rx), vec!["quit"]);
        bridge.shutdown();
        assert_eq!(bridge.state(), BridgeState::Shutdown);
        assert!(!bridge.is_searching());
        assert_eq!(bridge.request_analysis(START, 20), None);
        assert_eq!(bridge.mark_unavailable("gone"), None);
    }

    #[test]
    fn test_unavailable_after_exit() {
        let (mut bridge, _rx) = ready_bridge();
        let mut snapshot = EvaluationSnapshot {
            engine_ready: true,
            ..Default::default()
        };
        let update = bridge.mark_unavailable("engine exited");
        feed(&bridge, &mut snapshot, update);
        assert!(!snapshot.engine_ready);
        assert_eq!(bridge.state(), BridgeState::Unavailable);
        assert_eq!(bridge.mark_unavailable("engine exited"), None);
    }

    #[tokio::test]
    async fn test_spawn_failure_disables_analysis() {
        let config = EngineConfig {
            stockfish_path: "/nonexistent/stockfish-binary".into(),
            ..Default::default()
        };
        let mut bridge = EngineBridge::new(config);
        assert!(matches!(bridge.start(), Err(EngineError::Unavailable(_))));
        assert_eq!(bridge.state(), BridgeState::Unavailable);
        assert!(matches!(bridge.start(), Ok(None)));
        assert_eq!(bridge.request_analysis(START, 20), None);
    }
}
