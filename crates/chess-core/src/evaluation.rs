use serde::{Deserialize, Serialize};

/// Engine score. Exactly one of centipawns / mate is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Score {
    Cp(i32),
    /// Mate in N moves, sign gives the mating side
    Mate(i32),
}

impl Score {
    /// Same score seen from the other side.
    pub fn flipped(self) -> Self {
        match self {
            Score::Cp(v) => Score::Cp(-v),
            Score::Mate(n) => Score::Mate(-n),
        }
    }
}

/// A non-primary multi-PV line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvLine {
    pub multipv: u32,
    pub depth: Option<u32>,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

/// Latest evaluation of the analysed position, White's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSnapshot {
    pub centipawns: i32,
    pub mate: Option<i32>,
    pub principal_variation: Vec<String>,
    pub depth: u32,
    pub is_searching: bool,
    pub engine_ready: bool,
    /// Set once the search of the current position has finished
    pub best_move: Option<String>,
    pub alternate_lines: Vec<PvLine>,
}

impl EvaluationSnapshot {
    pub fn score(&self) -> Score {
        match self.mate {
            Some(n) => Score::Mate(n),
            None => Score::Cp(self.centipawns),
        }
    }

    /// Store a score, clearing the other representation.
    pub fn set_score(&mut self, score: Score) {
        match score {
            Score::Cp(v) => {
                self.centipawns = v;
                self.mate = None;
            }
            Score::Mate(n) => {
                self.centipawns = 0;
                self.mate = Some(n);
            }
        }
    }

    /// Forget everything known about the previous position and mark a new
    /// search as running.
    pub fn begin_search(&mut self) {
        self.centipawns = 0;
        self.mate = None;
        self.principal_variation.clear();
        self.depth = 0;
        self.best_move = None;
        self.alternate_lines.clear();
        self.is_searching = true;
    }

    /// Insert or replace the alternate line with the same multipv rank.
    pub fn upsert_alternate(&mut self, line: PvLine) {
        match self
            .alternate_lines
            .iter_mut()
            .find(|l| l.multipv == line.multipv)
        {
            Some(existing) => *existing = line,
            None => {
                self.alternate_lines.push(line);
                self.alternate_lines.sort_by_key(|l| l.multipv);
            }
        }
    }
}
