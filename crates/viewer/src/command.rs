//! Interactive commands read from stdin, one per line.

use std::path::PathBuf;
use std::str::FromStr;

use chess_core::NavAction;

use crate::error::ViewerError;

pub const HELP: &str = "\
Commands:
  next, n          step forward one move
  prev, p          step back one move
  first, start     go to the initial position
  last, end        go to the final position
  jump <i>         go to move index i (0 = first move, -1 = start)
  flip             flip the board
  load <file>      load a PGN file
  format <file>    normalise whitespace, then load
  show             redraw the board
  json             dump the view model as JSON
  help             this text
  quit, q          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(NavAction),
    Flip,
    Load(PathBuf),
    Format(PathBuf),
    Show,
    Json,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ViewerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Command::Navigate(NavAction::Next),
            "prev" | "p" => Command::Navigate(NavAction::Previous),
            "first" | "start" => Command::Navigate(NavAction::First),
            "last" | "end" => Command::Navigate(NavAction::Last),
            "jump" => {
                let index = rest.parse::<isize>().map_err(|_| {
                    ViewerError::InvalidArgument(format!("jump needs a move index, got `{rest}`"))
                })?;
                Command::Navigate(NavAction::JumpTo(index))
            }
            "flip" => Command::Flip,
            "load" => Command::Load(path_argument("load", rest)?),
            "format" => Command::Format(path_argument("format", rest)?),
            "show" => Command::Show,
            "json" => Command::Json,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => return Err(ViewerError::UnknownCommand(word.to_string())),
        };
        Ok(command)
    }
}

fn path_argument(command: &str, rest: &str) -> Result<PathBuf, ViewerError> {
    if rest.is_empty() {
        return Err(ViewerError::InvalidArgument(format!("{command} needs a file path")));
    }
    Ok(PathBuf::from(rest))
}
