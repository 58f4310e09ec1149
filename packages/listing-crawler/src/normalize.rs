//! Cleanup for description text extracted from listing pages.
//!
//! The site renders descriptions from nested blocks, so extracted text often
//! has words glued together across element boundaries ("teamStrong",
//! "5years", "role.You"). This pass repairs the spacing without touching
//! the line structure.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Expander label the site appends to collapsed descriptions
    static ref SHOW_MORE_REGEX: Regex = Regex::new(r"\s*Show\s+more\s+Show\s+less\s*$").unwrap();

    // "teamStrong" -> "team Strong"
    static ref CAMEL_JOIN_REGEX: Regex = Regex::new(r"([a-z])([A-Z])").unwrap();

    // "5years" -> "5 years"
    static ref DIGIT_JOIN_REGEX: Regex = Regex::new(r"([0-9])([a-zA-Z])").unwrap();

    // "role.You" -> "role. You" (only before a capitalised word, so "e.g." and "Node.js" survive)
    static ref SENTENCE_JOIN_REGEX: Regex = Regex::new(r"\.([A-Z][a-z])").unwrap();

    // "skills,including" -> "skills, including"
    static ref PUNCT_JOIN_REGEX: Regex = Regex::new(r"([,;:])([A-Za-z])").unwrap();

    // "(reports)Strong" -> "(reports) Strong"
    static ref PAREN_JOIN_REGEX: Regex = Regex::new(r"\)([A-Z][a-z])").unwrap();

    static ref INLINE_SPACE_REGEX: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Repair whitespace and punctuation spacing in a raw description.
pub fn normalize_description(raw: &str) -> String {
    let text = raw.trim();
    let text = SHOW_MORE_REGEX.replace(text, "");
    let text = CAMEL_JOIN_REGEX.replace_all(&text, "$1 $2");
    let text = DIGIT_JOIN_REGEX.replace_all(&text, "$1 $2");
    let text = SENTENCE_JOIN_REGEX.replace_all(&text, ". $1");
    let text = PUNCT_JOIN_REGEX.replace_all(&text, "$1 $2");
    let text = PAREN_JOIN_REGEX.replace_all(&text, ") $1");
    let text = INLINE_SPACE_REGEX.replace_all(&text, " ");

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
