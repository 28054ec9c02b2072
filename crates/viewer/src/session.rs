//! Viewer session: owns the loaded game, the navigation cursor, the engine
//! bridge and the latest evaluation, and runs the interactive loop.

use std::path::Path;

use analysis_engine::{Debouncer, EngineBridge, EngineUpdate};
use chess_core::{
    format_pgn, EvaluationSnapshot, GameRecord, NavAction, NavigationController, PresentationState,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{Command, HELP};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::render::{render_json, render_text};

/// Result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

pub struct Session {
    config: ViewerConfig,
    nav: NavigationController,
    flipped: bool,
    snapshot: EvaluationSnapshot,
    bridge: EngineBridge,
    engine_lines: Option<mpsc::UnboundedReceiver<String>>,
    /// FEN waiting for its quiet period to pass
    pending: Debouncer<String>,
}

impl Session {
    pub fn new(config: ViewerConfig) -> Self {
        let bridge = EngineBridge::new(config.engine.clone());
        let pending = Debouncer::new(config.engine.debounce);
        Self {
            config,
            nav: NavigationController::default(),
            flipped: false,
            snapshot: EvaluationSnapshot::default(),
            bridge,
            engine_lines: None,
            pending,
        }
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn snapshot(&self) -> &EvaluationSnapshot {
        &self.snapshot
    }

    pub fn bridge(&self) -> &EngineBridge {
        &self.bridge
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn analysis_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Spawn the configured engine. Failure only disables analysis.
    pub fn start_engine(&mut self) {
        if !self.config.engine_enabled {
            info!("Engine disabled");
            return;
        }
        match self.bridge.start() {
            Ok(Some(lines)) => self.engine_lines = Some(lines),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Continuing without analysis"),
        }
    }

    /// Use an already running engine reached through these channels.
    pub fn attach_engine(
        &mut self,
        commands: mpsc::UnboundedSender<String>,
        lines: mpsc::UnboundedReceiver<String>,
    ) {
        self.bridge.attach(commands);
        self.engine_lines = Some(lines);
    }

    pub async fn load_file(&mut self, path: &Path, format: bool) -> Result<(), ViewerError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ViewerError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.load_text(&text, format)
    }

    /// Replace the game. On error the current game stays loaded.
    pub fn load_text(&mut self, text: &str, format: bool) -> Result<(), ViewerError> {
        let text = if format || self.config.format_on_load {
            format_pgn(text)
        } else {
            text.to_string()
        };

        let record = GameRecord::from_pgn(&text)?;
        info!(
            game = %record.metadata.summary(),
            plies = record.len(),
            "Game loaded"
        );
        self.nav.reload(record);
        self.position_changed();
        Ok(())
    }

    pub fn navigate(&mut self, action: NavAction) -> bool {
        let moved = self.nav.apply(action);
        if moved {
            self.position_changed();
        }
        moved
    }

    pub fn presentation(&self) -> Result<PresentationState, ViewerError> {
        Ok(PresentationState::derive(
            &self.nav,
            self.flipped,
            &self.snapshot,
        )?)
    }

    pub fn render(&self) -> Result<String, ViewerError> {
        Ok(render_text(&self.presentation()?))
    }

    pub async fn execute(&mut self, command: Command) -> Result<Step, ViewerError> {
        let output = match command {
            Command::Navigate(action) => {
                if !self.navigate(action) {
                    return Ok(Step::Continue(String::new()));
                }
                self.render()?
            }
            Command::Flip => {
                self.flipped = !self.flipped;
                self.render()?
            }
            Command::Load(path) => {
                self.load_file(&path, false).await?;
                self.render()?
            }
            Command::Format(path) => {
                self.load_file(&path, true).await?;
                self.render()?
            }
            Command::Show => self.render()?,
            Command::Json => render_json(&self.presentation()?)?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Step::Quit),
        };
        Ok(Step::Continue(output))
    }

    pub async fn execute_line(&mut self, line: &str) -> Result<Step, ViewerError> {
        if line.trim().is_empty() {
            return Ok(Step::Continue(String::new()));
        }
        let command: Command = line.parse()?;
        self.execute(command).await
    }

    /// Feed one line of engine output. Returns a short notice worth showing
    /// the user, if any.
    pub fn handle_engine_line(&mut self, line: &str) -> Option<String> {
        let update = self.bridge.handle_line(line)?;
        match update {
            EngineUpdate::Ready => {
                self.apply(update);
                // Analyse whatever is already on the board
                self.pending.schedule(self.nav.current_fen().to_string());
                Some("Engine ready".to_string())
            }
            EngineUpdate::SearchFinished { .. } => {
                if self.apply(update) {
                    self.analysis_summary()
                } else {
                    None
                }
            }
            update => {
                self.apply(update);
                None
            }
        }
    }

    /// The engine's output ended.
    pub fn engine_closed(&mut self) {
        self.engine_lines = None;
        if let Some(update) = self.bridge.mark_unavailable("engine process exited") {
            self.apply(update);
        }
    }

    /// Debounce elapsed for `fen`.
    pub fn analysis_due(&mut self, fen: &str) {
        if fen != self.nav.current_fen() {
            debug!(fen, "Skipping analysis of a position no longer shown");
            return;
        }
        let depth = self.bridge.config().depth;
        if let Some(update) = self.bridge.request_analysis(fen, depth) {
            self.apply(update);
        }
    }

    pub fn shutdown(&mut self) {
        self.pending.cancel();
        self.bridge.shutdown();
    }

    fn position_changed(&mut self) {
        if let Some(update) = self.bridge.stop() {
            self.apply(update);
        }
        self.pending.schedule(self.nav.current_fen().to_string());
    }

    fn apply(&mut self, update: EngineUpdate) -> bool {
        if !self.bridge.accepts(&update) {
            return false;
        }
        update.apply(&mut self.snapshot);
        true
    }

    fn analysis_summary(&self) -> Option<String> {
        let view = self.presentation().ok()?.evaluation;
        let best = view.best_move.as_deref().unwrap_or("-");
        Some(format!(
            "Analysis: {} depth {} best {best}",
            view.text, view.depth
        ))
    }

    /// Interactive loop over `input` until `quit`, end of input or Ctrl-C.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<(), ViewerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut input = input.lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        write_block(&mut output, &self.render()?).await?;

        loop {
            tokio::select! {
                line = input.next_line() => {
                    let Some(line) = line? else { break };
                    match self.execute_line(&line).await {
                        Ok(Step::Quit) => break,
                        Ok(Step::Continue(text)) => write_block(&mut output, &text).await?,
                        Err(e) => {
                            warn!(error = %e, "Command failed");
                            write_block(&mut output, &format!("Error: {e}")).await?;
                        }
                    }
                }
                line = next_engine_line(&mut self.engine_lines) => match line {
                    Some(line) => {
                        if let Some(notice) = self.handle_engine_line(&line) {
                            write_block(&mut output, &notice).await?;
                        }
                    }
                    None => self.engine_closed(),
                },
                fen = self.pending.fire() => self.analysis_due(&fen),
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn next_engine_line(lines: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match lines {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn write_block<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<(), ViewerError> {
    if text.is_empty() {
        return Ok(());
    }
    output.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}
