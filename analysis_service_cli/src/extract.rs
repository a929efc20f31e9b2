//! Keyword heuristic that pulls recommendation-like lines out of free text.
//!
//! This is a line filter, not a parser: any line mentioning one of the
//! keywords is kept, so prose such as "you should know that..." is a false
//! positive, and advice phrased without the keywords ("Cache the results")
//! is missed. Structured model output is the replacement if that matters.

const KEYWORDS: [&str; 4] = ["recommend", "suggest", "should", "consider"];
const BULLETS: [char; 3] = ['-', '•', '*'];
const MIN_LEN: usize = 10;

/// Returns the cleaned matching lines of `text`, in input order. Duplicates are kept.
pub fn extract_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| mentions_keyword(line))
        .map(clean_line)
        .filter(|line| line.chars().count() > MIN_LEN)
        .map(str::to_owned)
        .collect()
}

fn mentions_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn clean_line(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || BULLETS.contains(&c))
        .trim_end()
}
