use once_cell::sync::Lazy;
use regex::Regex;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*```.*$").expect("static regex"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("static regex"));
static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s*").expect("static regex"));
static STAR_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{1,3}([^*\n]+?)\*{1,3}").expect("static regex"));
static UNDERSCORE_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\s(])_{1,3}([^_\n]+?)_{1,3}").expect("static regex"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Punctuation a synthesizer reads naturally. Everything else is dropped.
const SPOKEN_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '-', '%', '$', '&', '/',
];

/// Turns a chat reply into plain text fit for speech synthesis.
///
/// Strips markdown emphasis, headers, list bullets, link targets, emoji and
/// any symbol outside [`SPOKEN_PUNCTUATION`], then collapses whitespace.
/// Returns an empty string when nothing pronounceable remains.
pub fn normalize_for_speech(text: &str) -> String {
    let text = CODE_FENCE.replace_all(text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = HEADER.replace_all(&text, "");
    let text = BULLET.replace_all(&text, "");
    let text = STAR_EMPHASIS.replace_all(&text, "$1");
    let text = UNDERSCORE_EMPHASIS.replace_all(&text, "$1$2");

    let filtered: String = text
        .chars()
        // Leftover underscores join words, as in snake_case.
        .map(|c| if c == '_' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || SPOKEN_PUNCTUATION.contains(c))
        .collect();

    let collapsed = WHITESPACE.replace_all(&filtered, " ");
    let spoken = collapsed.trim();

    if spoken.chars().any(char::is_alphanumeric) {
        spoken.to_string()
    } else {
        String::new()
    }
}
