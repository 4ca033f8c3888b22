//! Per-puzzle solving state machine driven by the input grid.
//!
//! The session owns the in-memory copy of the user's input. Callers persist
//! [`SolvingSession::user_input`] through the progress store after each
//! change, and mark completion once [`SolvingSession::is_finished`] turns
//! true.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::answer::{accepts_input, check_answer, is_answer_complete, is_separator};
use crate::progress::ProgressEntry;

/// Where the solver stands on the current puzzle
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Playing,
    Correct,
    /// Last check failed; returns to `Playing` once acknowledged
    Incorrect,
    GivenUp,
}

#[derive(Clone, Debug)]
pub struct SolvingSession {
    solution: Vec<char>,
    user_input: Vec<String>,
    state: GameState,
}

impl SolvingSession {
    /// Fresh grid with every slot empty
    pub fn new(solution: &str) -> Self {
        let solution: Vec<char> = solution.chars().collect();
        let user_input = vec![String::new(); solution.len()];
        Self {
            solution,
            user_input,
            state: GameState::Playing,
        }
    }

    /// Restore a grid from stored progress.
    ///
    /// Stored input is padded or cut to the solution length. A completed
    /// entry resumes as `Correct` when its input checks out, otherwise as
    /// `GivenUp`.
    pub fn resume(solution: &str, entry: &ProgressEntry) -> Self {
        let mut session = Self::new(solution);
        for (slot, stored) in session.user_input.iter_mut().zip(&entry.user_input) {
            slot.clone_from(stored);
        }

        if entry.is_completed() {
            session.state = if check_answer(&session.user_input, solution) {
                GameState::Correct
            } else {
                GameState::GivenUp
            };
        }
        session
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn user_input(&self) -> &[String] {
        &self.user_input
    }

    /// Solved or abandoned; the grid no longer accepts input
    pub fn is_finished(&self) -> bool {
        matches!(self.state, GameState::Correct | GameState::GivenUp)
    }

    pub fn explanation_visible(&self) -> bool {
        self.is_finished()
    }

    pub fn is_complete(&self) -> bool {
        is_answer_complete(&self.user_input, &self.solution())
    }

    /// Put `value` into the slot at `index`, lowercased.
    ///
    /// Rejected (returns `false`) when finished, out of range, on a
    /// separator position, or when `value` is not a single letter or a clear.
    pub fn input(&mut self, index: usize, value: &str) -> bool {
        if self.is_finished() || !accepts_input(value) {
            return false;
        }

        match self.solution.get(index) {
            Some(c) if !is_separator(*c) => {
                self.user_input[index] = value.to_lowercase();
                true
            }
            _ => false,
        }
    }

    /// Check the grid, moving to `Correct` or `Incorrect`.
    pub fn check(&mut self) -> GameState {
        if self.is_finished() {
            return self.state;
        }

        self.state = if check_answer(&self.user_input, &self.solution()) {
            GameState::Correct
        } else {
            GameState::Incorrect
        };
        self.state
    }

    /// Dismiss an `Incorrect` verdict
    pub fn acknowledge(&mut self) {
        if self.state == GameState::Incorrect {
            self.state = GameState::Playing;
        }
    }

    /// Reveal the answer into the grid and stop play.
    pub fn give_up(&mut self) {
        if self.is_finished() {
            return;
        }

        self.user_input = self.solution.iter().map(|c| c.to_string()).collect();
        self.state = GameState::GivenUp;
    }

    fn solution(&self) -> String {
        self.solution.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleClass;

    fn type_word(session: &mut SolvingSession, word: &str) {
        for (i, c) in word.chars().enumerate() {
            if c != '_' {
                session.input(i, &c.to_string());
            }
        }
    }

    #[test]
    fn test_new_session_is_blank() {
        let session = SolvingSession::new("see-through");
        assert_eq!(session.user_input().len(), 11);
        assert!(session.user_input().iter().all(String::is_empty));
        assert_eq!(session.state(), GameState::Playing);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_correct_answer() {
        let mut session = SolvingSession::new("see-through");
        type_word(&mut session, "SEE_THROUGH");

        assert!(session.is_complete());
        assert_eq!(session.check(), GameState::Correct);
        assert!(session.is_finished());
        assert!(session.explanation_visible());
        assert_eq!(session.user_input()[0], "s");
    }

    #[test]
    fn test_incorrect_answer_then_retry() {
        let mut session = SolvingSession::new("dog");
        type_word(&mut session, "cat");

        assert_eq!(session.check(), GameState::Incorrect);
        assert!(!session.is_finished());
        session.acknowledge();
        assert_eq!(session.state(), GameState::Playing);

        type_word(&mut session, "dog");
        assert_eq!(session.check(), GameState::Correct);
    }

    #[test]
    fn test_input_rejections() {
        let mut session = SolvingSession::new("a-b");
        assert!(!session.input(1, "x"));
        assert!(!session.input(3, "x"));
        assert!(!session.input(0, "xy"));
        assert!(!session.input(0, "1"));
        assert!(session.input(0, "A"));
        assert!(session.input(0, ""));
        assert_eq!(session.user_input()[0], "");
    }

    #[test]
    fn test_give_up_reveals_and_locks() {
        let mut session = SolvingSession::new("my pal");
        session.give_up();

        assert_eq!(session.state(), GameState::GivenUp);
        assert!(session.is_finished());
        assert_eq!(session.user_input().concat(), "my pal");
        assert!(!session.input(0, "x"));
        assert_eq!(session.check(), GameState::GivenUp);
    }

    #[test]
    fn test_resume_from_progress() {
        let entry = ProgressEntry {
            puzzle_id: 3,
            puzzle_class: PuzzleClass::Regular,
            user_input: vec!["d".into(), "o".into()],
            completed_at: None,
            last_played: 1,
        };
        let session = SolvingSession::resume("dog", &entry);
        assert_eq!(session.user_input(), ["d", "o", ""]);
        assert_eq!(session.state(), GameState::Playing);

        let done = ProgressEntry {
            user_input: vec!["d".into(), "o".into(), "g".into()],
            completed_at: Some(2),
            ..entry.clone()
        };
        assert_eq!(SolvingSession::resume("dog", &done).state(), GameState::Correct);

        let abandoned = ProgressEntry {
            completed_at: Some(2),
            ..entry
        };
        assert_eq!(SolvingSession::resume("dog", &abandoned).state(), GameState::GivenUp);
    }
}
