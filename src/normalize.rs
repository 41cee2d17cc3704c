//! Shared normalization functions for catalog matching.
//! Used by the matcher and by the lookup query builders.
//!
//! CRITICAL: Any changes here change which candidate wins. Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Anything that is not a word character (Unicode letter, digit, underscore) or whitespace.
pub static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Runs of whitespace, collapsed to a single space.
pub static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Multi-artist separators: one or more of `,` and `&`, in any mix.
pub static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,&]+").unwrap());

/// Suffix appended to every video search so official uploads rank first.
pub const VIDEO_QUERY_SUFFIX: &str = "official Full video";

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize text for comparison: lower-case, drop punctuation, collapse whitespace.
/// e.g., "  Jay-Z!  feat.  Kanye " → "jayz feat kanye"
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Normalize an optional field; a missing value normalizes like "".
pub fn normalize_opt(s: Option<&str>) -> String {
    normalize(s.unwrap_or(""))
}

/// Split a catalog artist credit into normalized artist names.
/// e.g., "A & B, C" → ["a", "b", "c"]; "" → [""]
pub fn split_artists(field: &str) -> Vec<String> {
    ARTIST_SEPARATOR.split(field).map(normalize).collect()
}

// ============================================================================
// QUERY BUILDERS
// ============================================================================

/// Catalog search term. The label never takes part in catalog search.
pub fn catalog_term(song: &str, artist: &str) -> String {
    format!("{} {}", song, artist).trim().to_string()
}

/// Video search query with blanks from a missing artist or label squeezed out.
/// e.g., ("Song", "", "T-Series") → "Song T-Series official Full video"
pub fn video_query(song: &str, artist: &str, label: &str) -> String {
    let raw = format!("{} {} {} {}", song, artist, label, VIDEO_QUERY_SUFFIX);
    WHITESPACE_RUN.replace_all(&raw, " ").trim().to_string()
}

// ============================================================================
// TESTS
// ============================================================================
