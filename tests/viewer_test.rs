//! Integration tests: the viewer session driven through its command loop.

mod common;

use std::time::Duration;

use common::OPERA_GAME;
use tokio::sync::mpsc;
use tokio::time::advance;
use viewer::{Session, Step, ViewerConfig};

fn write_game(name: &str, text: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.pgn", std::process::id()));
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn load_navigate_and_dump() {
    let path = write_game("opera", OPERA_GAME);
    let mut session = Session::new(ViewerConfig {
        engine_enabled: false,
        ..Default::default()
    });

    let Step::Continue(text) = session
        .execute_line(&format!("load {}", path.display()))
        .await
        .unwrap()
    else {
        panic!("load should not quit");
    };
    assert!(text.starts_with("Morphy vs Duke Karl / Count Isouard (1-0)"));
    assert_eq!(session.navigation().index(), -1);

    session.execute_line("jump 32").await.unwrap();
    let Step::Continue(json) = session.execute_line("json").await.unwrap() else {
        panic!("json should not quit");
    };
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["active_index"], 32);
    assert_eq!(value["last_move"]["to"], "d8");
    assert_eq!(value["can_step_forward"], false);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn format_command_accepts_squashed_transcript() {
    let path = write_game("squashed", "[White \"A\"] [Black \"B\"] 1. d4 d5\r\n");
    let mut session = Session::new(ViewerConfig {
        engine_enabled: false,
        ..Default::default()
    });
    session
        .execute_line(&format!("format {}", path.display()))
        .await
        .unwrap();
    assert_eq!(session.navigation().record().san_moves(), vec!["d4", "d5"]);
    assert_eq!(session.navigation().record().metadata.white, "A");
    let _ = std::fs::remove_file(path);
}

#[tokio::test(start_paused = true)]
async fn burst_of_moves_sends_one_analysis() {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel::<String>();
    let mut session = Session::new(ViewerConfig::default());
    session.attach_engine(cmd_tx, line_rx);
    session.load_text(OPERA_GAME, false).unwrap();
    session.handle_engine_line("uciok");

    for _ in 0..5 {
        session.execute_line("next").await.unwrap();
        advance(Duration::from_millis(50)).await;
    }
    let shown = session.navigation().current_fen().to_string();

    // Close the input only after the quiet period has passed
    let (input_tx, input_rx) = tokio::io::duplex(64);
    let feeder = async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        drop(input_tx);
    };
    let mut output = Vec::new();
    let (result, ()) = tokio::join!(
        session.run(tokio::io::BufReader::new(input_rx), &mut output),
        feeder
    );
    result.unwrap();

    let sent: Vec<String> = std::iter::from_fn(|| cmd_rx.try_recv().ok()).collect();
    let positions: Vec<&String> = sent.iter().filter(|c| c.starts_with("position")).collect();
    assert_eq!(positions, vec![&format!("position fen {shown}")]);
    assert!(sent.contains(&"go depth 20".to_string()));
    assert_eq!(sent.last().map(String::as_str), Some("quit"));
    drop(line_tx);
}
