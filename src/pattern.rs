//! Public length pattern of a solution, e.g. `(3-4)` for "dog-gone".

/// Render `solution` as its enumeration: letter counts per sub-word, `-`
/// between hyphenated parts, `,` between words, all in parentheses.
///
/// Only counts and separator topology are revealed. Empty input renders as
/// an empty string rather than `()`.
pub fn solution_length_pattern(solution: &str) -> String {
    if solution.is_empty() {
        return String::new();
    }

    let words: Vec<String> = solution
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            word.split('-')
                .map(|part| part.chars().count().to_string())
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect();

    format!("({})", words.join(","))
}
