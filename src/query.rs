// 🔎 Query Expansion - Raw text → normalized query + candidate categories

use crate::synonyms::SynonymTable;
use serde::Serialize;
use std::collections::HashSet;

/// Trimmed, lower-cased form used for every comparison
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Bridge human labels and machine keys: "Dining & Restaurants" → "dining_restaurants".
///
/// Each run of whitespace and `&` collapses to `_`, or to one `_` per `&`
/// when the run contains ampersands.
pub fn slugify_category(s: &str) -> String {
    let normalized = normalize(s);
    let mut out = String::with_capacity(normalized.len());
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        if !is_separator(c) {
            out.push(c);
            continue;
        }

        let mut ampersands = usize::from(c == '&');
        while let Some(&next) = chars.peek() {
            if !is_separator(next) {
                break;
            }
            ampersands += usize::from(next == '&');
            chars.next();
        }
        out.push_str(&"_".repeat(ampersands.max(1)));
    }

    out
}

fn is_separator(c: char) -> bool {
    c == '&' || c.is_whitespace()
}

/// "dining_restaurants" → "Dining Restaurants"
pub fn nice_label(slug: &str) -> String {
    let spaced = slug.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_is_word = false;

    for c in spaced.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !prev_is_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_is_word = is_word;
    }

    out
}

/// First standalone 4-digit token, read as a merchant category code hint
pub fn parse_mcc(query: &str) -> Option<String> {
    query
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .find(|token| token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

// ============================================================================
// EXPANDED QUERY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandedQuery {
    pub raw: String,
    pub normalized: String,
    pub slug: String,

    /// Informational only; nothing filters on it yet
    pub mcc: Option<String>,

    /// Candidate category keys; empty means no category-based match is possible
    pub categories: HashSet<String>,
}

impl ExpandedQuery {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}

pub fn expand_query(
    raw: &str,
    canonical: &HashSet<String>,
    synonyms: &SynonymTable,
) -> ExpandedQuery {
    let normalized = normalize(raw);
    let slug = slugify_category(&normalized);
    let mcc = parse_mcc(raw);
    let mut categories = HashSet::new();

    // Direct
    for category in canonical {
        let key = normalize(category);
        let key_slug = slugify_category(category);
        if [key, key_slug].iter().any(|form| *form == normalized || *form == slug) {
            categories.insert(category.clone());
        }
    }

    // Synonyms
    for term in [&normalized, &slug] {
        if let Some(found) = synonyms.lookup(term) {
            categories.extend(found.iter().cloned());
        }
    }

    // Substring fallback
    if categories.is_empty() && !normalized.is_empty() {
        for category in canonical {
            if normalize(category).contains(&normalized) {
                categories.insert(category.clone());
            }
        }
    }

    tracing::debug!(
        query = %normalized,
        slug = %slug,
        mcc = ?mcc,
        candidates = categories.len(),
        "query expanded"
    );

    ExpandedQuery {
        raw: raw.to_string(),
        normalized,
        slug,
        mcc,
        categories,
    }
}
