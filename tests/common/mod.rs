#![allow(dead_code)]

use analysis_engine::{EngineBridge, EngineConfig};
use tokio::sync::mpsc;

/// Short opera game with headers, a comment and a variation.
pub const OPERA_GAME: &str = r#"[Event "Paris"]
[White "Morphy"]
[Black "Duke Karl / Count Isouard"]
[Result "1-0"]

1. e4 e5 2. Nf3 d6 {Philidor} 3. d4 Bg4 (3... exd4) 4. dxe5 Bxf3 5. Qxf3 dxe5
6. Bc4 Nf6 7. Qb3 Qe7 8. Nc3 c6 9. Bg5 b5 10. Nxb5 cxb5 11. Bxb5+ Nbd7
12. O-O-O Rd8 13. Rxd7 Rxd7 14. Rd1 Qe6 15. Bxd7+ Nxd7 16. Qb8+ Nxb8
17. Rd8# 1-0"#;

pub const SHORT_GAME: &str = "1. e4 e5 2. Nf3";

/// Bridge that talks to the returned channels instead of a process, already
/// past the `uciok` handshake.
pub fn ready_bridge() -> (EngineBridge, mpsc::UnboundedReceiver<String>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut bridge = EngineBridge::new(EngineConfig::default());
    bridge.attach(tx);
    bridge.handle_line("uciok");
    drain(&mut rx);
    (bridge, rx)
}

/// Everything sent to the engine so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut sent = Vec::new();
    while let Ok(cmd) = rx.try_recv() {
        sent.push(cmd);
    }
    sent
}
