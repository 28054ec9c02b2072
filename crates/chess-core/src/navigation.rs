//! Which position of the loaded game is on the board.
//!
//! The cursor is `None` for the initial position and `Some(i)` for the
//! position after ply `i`; externally it is also exposed as an index in
//! `[-1, N-1]`. Every transition returns whether the cursor moved, and
//! out-of-range requests are ignored rather than reported.

use crate::game_data::{GameRecord, LastMove, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    First,
    Previous,
    Next,
    Last,
    JumpTo(isize),
}

#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    record: GameRecord,
    cursor: Option<usize>,
}

impl NavigationController {
    pub fn new(record: GameRecord) -> Self {
        Self {
            record,
            cursor: None,
        }
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor as an index where -1 is the initial position.
    pub fn index(&self) -> isize {
        self.cursor.map_or(-1, |i| i as isize)
    }

    pub fn go_to_start(&mut self) -> bool {
        self.set_cursor(None)
    }

    pub fn go_to_end(&mut self) -> bool {
        self.set_cursor(self.record.len().checked_sub(1))
    }

    pub fn step_forward(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.record.len() {
            self.set_cursor(Some(next))
        } else {
            false
        }
    }

    pub fn step_backward(&mut self) -> bool {
        match self.cursor {
            None => false,
            Some(0) => self.set_cursor(None),
            Some(i) => self.set_cursor(Some(i - 1)),
        }
    }

    pub fn jump_to(&mut self, index: isize) -> bool {
        if index < -1 || index >= self.record.len() as isize {
            return false;
        }
        self.set_cursor(usize::try_from(index).ok())
    }

    /// Swap in a new game; always lands on the initial position.
    pub fn reload(&mut self, record: GameRecord) {
        self.record = record;
        self.cursor = None;
    }

    pub fn apply(&mut self, action: NavAction) -> bool {
        match action {
            NavAction::First => self.go_to_start(),
            NavAction::Previous => self.step_backward(),
            NavAction::Next => self.step_forward(),
            NavAction::Last => self.go_to_end(),
            NavAction::JumpTo(index) => self.jump_to(index),
        }
    }

    pub fn current(&self) -> Option<&Position> {
        self.cursor.and_then(|i| self.record.positions.get(i))
    }

    pub fn current_fen(&self) -> &str {
        match self.current() {
            Some(p) => &p.fen,
            None => &self.record.initial_fen,
        }
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.current().map(|p| LastMove {
            from: p.from.clone(),
            to: p.to.clone(),
        })
    }

    pub fn can_step_backward(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_step_forward(&self) -> bool {
        self.cursor.map_or(0, |i| i + 1) < self.record.len()
    }

    fn set_cursor(&mut self, cursor: Option<usize>) -> bool {
        if self.cursor == cursor {
            return false;
        }
        self.cursor = cursor;
        true
    }
}
