use once_cell::sync::Lazy;
use regex::Regex;
use xxhash_rust::xxh3::xxh3_64;

// Single-quoted literals only. Double-quoted identifiers stay readable.
static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*'").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const PLACEHOLDER: &str = "?";

/// Normalize a SQL statement into its structural shape.
///
/// String literals and standalone integers become `?`, whitespace runs collapse
/// to one space, and the result is trimmed and lower-cased. Regex-level only:
/// malformed or dialect-specific SQL is accepted as-is.
pub fn fingerprint_query(sql: &str) -> String {
    let s = STRING_RE.replace_all(sql, PLACEHOLDER);
    let s = NUMBER_RE.replace_all(&s, PLACEHOLDER);
    WHITESPACE_RE.replace_all(&s, " ").trim().to_lowercase()
}

/// Short stable key for a fingerprint, for use as an identifier in reports.
pub fn fingerprint_key(fingerprint: &str) -> String {
    let hash = xxh3_64(fingerprint.as_bytes());
    format!("{hash:016x}")
}
