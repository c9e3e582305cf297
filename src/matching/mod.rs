// src/matching/mod.rs
//
// Title normalization and similarity scoring shared by the strategies.
//
// The two thresholds below were tuned against real list fixtures. Keep the
// values and their boundary tests together.

use crate::domain::MediaEntry;

/// Minimum normalized similarity for a fuzzy title match
pub const SIMILARITY_THRESHOLD: f64 = 0.98;

/// Largest accepted episode/chapter count divergence, relative to the smaller
/// count. 12 vs 13 (0.083) passes, 1 vs 13 (12.0) does not.
pub const MAX_COUNT_DIVERGENCE: f64 = 0.10;

/// Normalize title for matching
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '_' | '-' | '/' | '~' => Some(' '),
            c if c.is_alphanumeric() || c.is_whitespace() => Some(c),
            _ => None,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity of two titles after normalization, 0.0 to 1.0
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Any title variant of `a` is byte-for-byte equal to a variant of `b`
pub fn titles_equal(a: &MediaEntry, b: &MediaEntry) -> bool {
    let theirs = b.titles.variants();
    a.titles.variants().iter().any(|t| theirs.contains(t))
}

/// Best similarity across all title variant pairs
pub fn best_title_similarity(a: &MediaEntry, b: &MediaEntry) -> f64 {
    let theirs = b.titles.variants();
    a.titles
        .variants()
        .iter()
        .flat_map(|mine| theirs.iter().map(move |other| title_similarity(mine, other)))
        .fold(0.0, f64::max)
}

/// Any variant pair clears [`SIMILARITY_THRESHOLD`]
pub fn titles_similar(a: &MediaEntry, b: &MediaEntry) -> bool {
    best_title_similarity(a, b) >= SIMILARITY_THRESHOLD
}

/// Relative divergence of two unit counts; `None` when either is unknown
pub fn count_divergence(a: u32, b: u32) -> Option<f64> {
    if a == 0 || b == 0 {
        return None;
    }
    let smaller = a.min(b) as f64;
    let diff = (a as f64 - b as f64).abs();
    Some(diff / smaller)
}

/// Counts are close enough to describe the same release. Unknown counts pass.
pub fn counts_compatible(a: u32, b: u32) -> bool {
    count_divergence(a, b).map_or(true, |d| d <= MAX_COUNT_DIVERGENCE)
}
