//! Puzzle model shared by the checker, the share codec and the progress store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ============================================================================
// Constants
// ============================================================================

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

// ============================================================================
// Enums
// ============================================================================

/// Provenance of a puzzle. Affects display and moderation only.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "OFFICIAL")]
    Official,
    #[serde(rename = "USER_SUBMITTED")]
    UserSubmitted,
    #[serde(rename = "AI_GENERATED")]
    AiGenerated,
}

impl Default for Category {
    fn default() -> Self {
        Category::UserSubmitted
    }
}

impl Category {
    /// Wire name used by the API and inside share tokens
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Official => "OFFICIAL",
            Category::UserSubmitted => "USER_SUBMITTED",
            Category::AiGenerated => "AI_GENERATED",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "OFFICIAL" => Some(Category::Official),
            "USER_SUBMITTED" => Some(Category::UserSubmitted),
            "AI_GENERATED" => Some(Category::AiGenerated),
            _ => None,
        }
    }
}

/// Which family of puzzle a piece of solving state belongs to.
///
/// Orthogonal to [`Category`]: official and user-submitted puzzles live in
/// separate id spaces on the backend, so progress is keyed by both.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleClass {
    Regular,
    User,
}

impl Default for PuzzleClass {
    /// Puzzles predating the class distinction were all regular
    fn default() -> Self {
        PuzzleClass::Regular
    }
}

// ============================================================================
// Puzzle
// ============================================================================

/// A cryptic clue with its answer key.
///
/// `solution` is never rendered in the clear; the grid shows its
/// [length pattern](crate::pattern::solution_length_pattern) instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Puzzle {
    /// Positive for backend puzzles, negative for shared links
    pub id: i64,
    #[serde(rename = "puzzle")]
    pub puzzle_text: String,
    pub solution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(rename = "source", default)]
    pub category: Category,
    pub difficulty: u8,
    pub date_added: DateTime<Utc>,
}

impl Puzzle {
    /// True for puzzles that only exist inside a shared link
    pub fn is_ephemeral(&self) -> bool {
        self.id < 0
    }
}

// ============================================================================
// Solution validation
// ============================================================================

/// Check that `solution` is letters grouped into words, with single spaces
/// or hyphens strictly between letters.
///
/// The checker and codec assume this already holds; submission forms call
/// it before a puzzle is accepted.
pub fn validate_solution(solution: &str) -> bool {
    let chars: Vec<char> = solution.chars().collect();
    if chars.is_empty() {
        return false;
    }

    for (i, c) in chars.iter().enumerate() {
        match c {
            c if c.is_ascii_alphabetic() => {}
            ' ' | '-' => {
                let before = i.checked_sub(1).and_then(|j| chars.get(j));
                let after = chars.get(i + 1);
                let is_letter = |c: Option<&char>| c.is_some_and(|c| c.is_ascii_alphabetic());
                if !is_letter(before) || !is_letter(after) {
                    return false;
                }
            }
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_solution_accepts_words() {
        assert!(validate_solution("dog"));
        assert!(validate_solution("see-through"));
        assert!(validate_solution("hello world"));
        assert!(validate_solution("Up-To-Date"));
    }

    #[test]
    fn test_validate_solution_rejects_bad_separators() {
        assert!(!validate_solution(""));
        assert!(!validate_solution(" dog"));
        assert!(!validate_solution("dog-"));
        assert!(!validate_solution("dog  gone"));
        assert!(!validate_solution("dog- gone"));
        assert!(!validate_solution("dog1"));
        assert!(!validate_solution("café"));
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&Category::AiGenerated).unwrap(),
            "\"AI_GENERATED\""
        );
        assert_eq!(Category::from_wire("OFFICIAL"), Some(Category::Official));
        assert_eq!(Category::from_wire("official"), None);
        assert_eq!(Category::default(), Category::UserSubmitted);
    }

    #[test]
    fn test_puzzle_class_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PuzzleClass::User).unwrap(), "\"user\"");
        let class: PuzzleClass = serde_json::from_str("\"regular\"").unwrap();
        assert_eq!(class, PuzzleClass::Regular);
    }

    #[test]
    fn test_puzzle_reads_api_shape() {
        let json = r#"{
            "id": 12,
            "puzzle": "Hound finally gone (3)",
            "solution": "dog",
            "source": "OFFICIAL",
            "difficulty": 2,
            "date_added": "2024-03-01T00:00:00Z"
        }"#;
        let puzzle: Puzzle = serde_json::from_str(json).unwrap();
        assert_eq!(puzzle.puzzle_text, "Hound finally gone (3)");
        assert_eq!(puzzle.category, Category::Official);
        assert_eq!(puzzle.explanation, None);
        assert!(!puzzle.is_ephemeral());
    }
}
