//! JavaScript-facing exports.
//!
//! Grid input crosses the boundary as a JSON array of strings and puzzles
//! come back as JSON, so the same functions work from any bundler without
//! extra glue. Malformed JSON input is treated like an empty grid.

use wasm_bindgen::prelude::*;

use crate::answer;
use crate::pattern;
use crate::puzzle::validate_solution;
use crate::session::{GameState, SolvingSession};
use crate::share::{self, RawPayload};

pub(crate) fn parse_input(user_input_json: &str) -> Vec<String> {
    serde_json::from_str(user_input_json).unwrap_or_default()
}

// ============================================================================
// Checking
// ============================================================================

#[wasm_bindgen(js_name = normalizeAnswer)]
pub fn normalize_answer(s: &str) -> String {
    answer::normalize(s)
}

/// `user_input_json` is an array with one string per solution character
#[wasm_bindgen(js_name = checkAnswer)]
pub fn check_answer_json(user_input_json: &str, solution: &str) -> bool {
    answer::check_answer(&parse_input(user_input_json), solution)
}

#[wasm_bindgen(js_name = isAnswerComplete)]
pub fn is_answer_complete_json(user_input_json: &str, solution: &str) -> bool {
    answer::is_answer_complete(&parse_input(user_input_json), solution)
}

/// Where the cursor moves after typing at `from`; `undefined` at the end
#[wasm_bindgen(js_name = nextEditableIndex)]
pub fn next_editable_index(solution: &str, from: usize) -> Option<usize> {
    answer::next_editable_index(solution, from)
}

/// Where the cursor moves on backspace from `from`
#[wasm_bindgen(js_name = previousEditableIndex)]
pub fn previous_editable_index(solution: &str, from: usize) -> Option<usize> {
    answer::previous_editable_index(solution, from)
}

#[wasm_bindgen(js_name = lengthPattern)]
pub fn length_pattern(solution: &str) -> String {
    pattern::solution_length_pattern(solution)
}

#[wasm_bindgen(js_name = isValidSolution)]
pub fn is_valid_solution(solution: &str) -> bool {
    validate_solution(solution)
}

// ============================================================================
// Share links
// ============================================================================

/// Encode a `{puzzle, solution, explanation?, source?, difficulty?}` JSON
/// object into a `code=...` query string.
///
/// Throws with a displayable message when puzzle or solution is blank.
#[wasm_bindgen(js_name = encodeShareLink)]
pub fn encode_share_link(payload_json: &str) -> Result<String, JsValue> {
    let raw: RawPayload =
        serde_json::from_str(payload_json).map_err(|e| JsValue::from_str(&e.to_string()))?;

    share::encode_raw(raw)
        .map(|link| link.query_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode the puzzle in a query string, as JSON. `undefined` when the link
/// is absent or unusable.
#[wasm_bindgen(js_name = decodeShareLink)]
pub fn decode_share_link(query: &str) -> Option<String> {
    let puzzle = share::decode(query)?;
    serde_json::to_string(&puzzle).ok()
}

// ============================================================================
// Solving session
// ============================================================================

/// Input grid state for one puzzle
#[wasm_bindgen]
pub struct PuzzleSession {
    inner: SolvingSession,
}

#[wasm_bindgen]
impl PuzzleSession {
    #[wasm_bindgen(constructor)]
    pub fn new(solution: &str) -> PuzzleSession {
        #[cfg(feature = "console_error_panic_hook")]
        crate::set_panic_hook();

        PuzzleSession {
            inner: SolvingSession::new(solution),
        }
    }

    /// Restore from a stored progress entry (JSON). Falls back to a blank
    /// grid when the entry cannot be read.
    #[wasm_bindgen(js_name = fromProgress)]
    pub fn from_progress(solution: &str, entry_json: &str) -> PuzzleSession {
        let inner = match serde_json::from_str(entry_json) {
            Ok(entry) => SolvingSession::resume(solution, &entry),
            Err(_) => SolvingSession::new(solution),
        };
        PuzzleSession { inner }
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> GameState {
        self.inner.state()
    }

    #[wasm_bindgen(getter)]
    pub fn finished(&self) -> bool {
        self.inner.is_finished()
    }

    #[wasm_bindgen(getter)]
    pub fn complete(&self) -> bool {
        self.inner.is_complete()
    }

    #[wasm_bindgen(getter, js_name = explanationVisible)]
    pub fn explanation_visible(&self) -> bool {
        self.inner.explanation_visible()
    }

    pub fn input(&mut self, index: usize, value: &str) -> bool {
        self.inner.input(index, value)
    }

    pub fn check(&mut self) -> GameState {
        self.inner.check()
    }

    pub fn acknowledge(&mut self) {
        self.inner.acknowledge()
    }

    #[wasm_bindgen(js_name = giveUp)]
    pub fn give_up(&mut self) {
        self.inner.give_up()
    }

    /// Current grid as a JSON array, ready for the progress store
    #[wasm_bindgen(js_name = userInput)]
    pub fn user_input(&self) -> String {
        serde_json::to_string(self.inner.user_input()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Get the WASM module version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
