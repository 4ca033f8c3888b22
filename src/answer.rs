//! Answer normalization and checking.
//!
//! User input is a grid with one slot per character of the solution. Slots
//! aligned with a space or hyphen are never edited, so both the checker and
//! the completeness test look only at letter positions.

/// True for the characters that separate words and sub-words in a solution
pub fn is_separator(c: char) -> bool {
    c == ' ' || c == '-'
}

/// Lowercase `s` and strip every whitespace character and hyphen.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decide whether the letters typed into `user_input` spell `solution`.
///
/// Empty slots and literal separator slots are skipped, so input built
/// from a grid with blank separator cells compares equal to the solution's
/// letters. Comparison is case-insensitive.
pub fn check_answer<S: AsRef<str>>(user_input: &[S], solution: &str) -> bool {
    let user_letters: Vec<String> = user_input
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|slot| !slot.is_empty() && *slot != " " && *slot != "-")
        .map(str::to_lowercase)
        .collect();

    let solution_letters: Vec<String> = solution
        .chars()
        .filter(|c| !is_separator(*c))
        .map(|c| c.to_lowercase().collect())
        .collect();

    user_letters == solution_letters
}

/// Decide whether every letter position of `solution` has been filled.
///
/// Slots holding only whitespace count as empty. Input shorter than the
/// solution leaves the trailing letter positions unfilled.
pub fn is_answer_complete<S: AsRef<str>>(user_input: &[S], solution: &str) -> bool {
    solution
        .chars()
        .enumerate()
        .filter(|(_, c)| !is_separator(*c))
        .all(|(index, _)| {
            user_input
                .get(index)
                .is_some_and(|slot| !slot.as_ref().trim().is_empty())
        })
}

/// Whether a single grid cell may take `value`: a clear or one ASCII letter.
pub fn accepts_input(value: &str) -> bool {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => true,
        (Some(c), None) => c.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Index of the first letter position after `from`, if any
pub fn next_editable_index(solution: &str, from: usize) -> Option<usize> {
    solution
        .chars()
        .enumerate()
        .skip(from.saturating_add(1))
        .find(|(_, c)| !is_separator(*c))
        .map(|(i, _)| i)
}

/// Index of the last letter position before `from`, if any
pub fn previous_editable_index(solution: &str, from: usize) -> Option<usize> {
    let chars: Vec<char> = solution.chars().collect();
    (0..from.min(chars.len()))
        .rev()
        .find(|&i| !is_separator(chars[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(letters: &str) -> Vec<String> {
        letters
            .chars()
            .map(|c| if c == '_' { String::new() } else { c.to_string() })
            .collect()
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize("See-Through"), "seethrough");
        assert_eq!(normalize("hello world"), "helloworld");
        assert_eq!(normalize(" up-to\tdate "), "uptodate");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_check_answer_plain_word() {
        assert!(check_answer(&slots("dog"), "dog"));
        assert!(!check_answer(&slots("cat"), "dog"));
    }

    #[test]
    fn test_check_answer_skips_blank_separator_slots() {
        assert!(check_answer(&slots("hello_world"), "hello world"));
        assert!(check_answer(&slots("see_through"), "see-through"));
        assert!(check_answer(
            &slots("hello_world_this_is_a_test"),
            "hello world-this is a test"
        ));
    }

    #[test]
    fn test_check_answer_skips_literal_separator_slots() {
        let input = ["a", "-", "l", "o", "n", "e"];
        assert!(check_answer(&input, "a-lone"));
        let input = ["m", "y", " ", "p", "a", "l"];
        assert!(check_answer(&input, "my pal"));
    }

    #[test]
    fn test_check_answer_is_case_insensitive() {
        assert!(check_answer(&slots("DOG"), "dog"));
        assert!(check_answer(&slots("HeLlO"), "hello"));
        assert!(check_answer(&slots("dog"), "DOG"));
    }

    #[test]
    fn test_check_answer_length_mismatch() {
        assert!(!check_answer(&slots("do"), "dog"));
        assert!(!check_answer(&slots("___"), "dog"));
        assert!(!check_answer(&slots("hellx"), "hello"));
        assert!(!check_answer(&slots("dogs"), "dog"));
    }

    #[test]
    fn test_check_answer_empty_solution() {
        let empty: [&str; 0] = [];
        assert!(check_answer(&empty, ""));
        assert!(!check_answer(&slots("a"), ""));
    }

    #[test]
    fn test_check_answer_with_correct_letters() {
        for solution in ["dog", "see-through", "well-done my friend", "a"] {
            let input: Vec<String> = solution.chars().map(|c| c.to_string()).collect();
            assert!(check_answer(&input, solution), "{solution}");
        }
    }

    #[test]
    fn test_is_answer_complete_ignores_separators() {
        assert!(is_answer_complete(&slots("hello_world"), "hello world"));
        assert!(is_answer_complete(&slots("see_through"), "see-through"));
        assert!(!is_answer_complete(&slots("hel_o_world"), "hello world"));
    }

    #[test]
    fn test_is_answer_complete_whitespace_is_empty() {
        let input = ["d", " ", "g"];
        assert!(!is_answer_complete(&input, "dog"));
    }

    #[test]
    fn test_is_answer_complete_short_input() {
        assert!(!is_answer_complete(&slots("do"), "dog"));
        let empty: [&str; 0] = [];
        assert!(is_answer_complete(&empty, ""));
        assert!(!is_answer_complete(&empty, "a"));
    }

    #[test]
    fn test_is_answer_complete_is_monotonic() {
        let solution = "up-to-date";
        let mut input = vec![String::new(); solution.len()];
        let mut was_complete = false;
        for (i, c) in solution.chars().enumerate() {
            if !is_separator(c) {
                input[i] = "x".into();
            }
            let complete = is_answer_complete(&input, solution);
            assert!(!was_complete || complete);
            was_complete = complete;
        }
        assert!(was_complete);
    }

    #[test]
    fn test_accepts_input() {
        assert!(accepts_input(""));
        assert!(accepts_input("a"));
        assert!(accepts_input("Z"));
        assert!(!accepts_input("ab"));
        assert!(!accepts_input("1"));
        assert!(!accepts_input("-"));
        assert!(!accepts_input("é"));
    }

    #[test]
    fn test_editable_index_navigation() {
        let solution = "ab c-d";
        assert_eq!(next_editable_index(solution, 0), Some(1));
        assert_eq!(next_editable_index(solution, 1), Some(3));
        assert_eq!(next_editable_index(solution, 3), Some(5));
        assert_eq!(next_editable_index(solution, 5), None);

        assert_eq!(previous_editable_index(solution, 5), Some(3));
        assert_eq!(previous_editable_index(solution, 3), Some(1));
        assert_eq!(previous_editable_index(solution, 0), None);
        assert_eq!(previous_editable_index(solution, 99), Some(5));
    }
}
