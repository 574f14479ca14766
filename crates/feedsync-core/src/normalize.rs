//! String keys used for every identity comparison.
//!
//! All SKU, model, and name comparisons go through [`normalize`]. Keeping a
//! single implementation matters: if the resolver and the search index
//! disagree on how `"RP-1400SW"` reduces, a product can be found by search
//! and then scored as a mismatch.

/// Characters treated as hyphens when comparing model numbers.
const DASHES: &[char] = &['-', '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}'];

/// Reduces a display string to a comparable key: lowercased, with every
/// character outside `[a-z0-9]` removed.
///
/// ```
/// assert_eq!(feedsync_core::normalize("KEF Q350 (Black)"), "kefq350black");
/// ```
#[must_use]
pub fn normalize(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Like [`normalize`] but keeps the original case. Not used for matching.
#[must_use]
pub fn normalize_keeping_case(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Returns `true` for any hyphen or dash variant.
#[must_use]
pub fn is_dash(c: char) -> bool {
    DASHES.contains(&c)
}

/// Removes hyphens and dashes, leaving everything else intact.
#[must_use]
pub fn strip_dashes(s: &str) -> String {
    s.chars().filter(|c| !is_dash(*c)).collect()
}

/// Separator variants of a supplier SKU to try against the catalog model
/// field: spaces to dashes, dashes to spaces, dashes removed, spaces removed.
///
/// Variants identical to the input, empty variants, and duplicates are
/// dropped, so the result holds at most four entries.
#[must_use]
pub fn model_variants(sku: &str) -> Vec<String> {
    let candidates = [
        sku.replace(' ', "-"),
        sku.replace('-', " "),
        sku.replace('-', ""),
        sku.replace(' ', ""),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate.is_empty() || candidate == sku || variants.contains(&candidate) {
            continue;
        }
        variants.push(candidate);
    }
    variants
}
