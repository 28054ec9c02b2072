//! Stockfish child process.
//!
//! The process is driven fire-and-forget: commands go into an unbounded
//! channel drained by a writer task, and every stdout line is forwarded by a
//! reader task. Neither side blocks the caller.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Running engine process and its I/O pumps
pub struct StockfishProcess {
    process: Child,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

/// Both ends handed to the owner of the process
pub struct EngineChannels {
    pub commands: mpsc::UnboundedSender<String>,
    pub lines: mpsc::UnboundedReceiver<String>,
}

impl StockfishProcess {
    /// Spawn the engine binary at `path`. Must be called inside a tokio
    /// runtime.
    pub fn spawn(path: &str) -> Result<(Self, EngineChannels), EngineError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(write_commands(stdin, command_rx));
        let reader = tokio::spawn(read_lines(BufReader::new(stdout), line_tx));

        Ok((
            Self {
                process,
                writer,
                reader,
            },
            EngineChannels {
                commands: command_tx,
                lines: line_rx,
            },
        ))
    }

    /// Kill the process and stop both pumps. Does not wait for exit.
    pub fn kill(&mut self) {
        let _ = self.process.start_kill();
        self.writer.abort();
        self.reader.abort();
    }
}

impl Drop for StockfishProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

async fn write_commands(mut stdin: ChildStdin, mut commands: mpsc::UnboundedReceiver<String>) {
    while let Some(cmd) = commands.recv().await {
        debug!(cmd = cmd.as_str(), "SF <");
        if let Err(e) = send_line(&mut stdin, &cmd).await {
            warn!(error = %e, "Failed to write to engine");
            break;
        }
    }
}

async fn send_line(stdin: &mut ChildStdin, cmd: &str) -> Result<(), EngineError> {
    stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

async fn read_lines(stdout: BufReader<ChildStdout>, lines_tx: mpsc::UnboundedSender<String>) {
    let mut lines = stdout.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(line = line.trim(), "SF >");
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("Engine stdout closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read from engine");
                break;
            }
        }
    }
}
