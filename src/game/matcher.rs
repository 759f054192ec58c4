//! Guess-to-name matching: normalization, exact lookup, and Levenshtein
//! fuzzy lookup.

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::catalog::records::Item;

/// Normalizes and compares guess strings against catalog names.
///
/// The two optional folding steps are configuration; whatever the settings,
/// normalization is idempotent and is applied identically to the guess and
/// to every candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NameMatcher {
    /// Map compound glyphs to their spelled-out form (æ→ae, œ→oe, ß→ss).
    pub fold_compound_glyphs: bool,
    /// Drop every character that is not a letter, digit, or space.
    pub strip_symbols: bool,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self {
            fold_compound_glyphs: false,
            strip_symbols: false,
        }
    }
}

impl NameMatcher {
    /// Canonical form used for comparison: trimmed, NFD-decomposed with
    /// combining marks stripped, lowercased, then optionally folded.
    pub fn normalize(&self, name: &str) -> String {
        let mut normalized = String::with_capacity(name.len());
        for c in name.trim().nfd().filter(|c| !is_combining_mark(*c)) {
            for lower in c.to_lowercase() {
                match lower {
                    'æ' if self.fold_compound_glyphs => normalized.push_str("ae"),
                    'œ' if self.fold_compound_glyphs => normalized.push_str("oe"),
                    'ß' if self.fold_compound_glyphs => normalized.push_str("ss"),
                    c if self.strip_symbols && !(c.is_alphanumeric() || c == ' ') => {}
                    c => normalized.push(c),
                }
            }
        }
        normalized
    }

    /// Find the candidate whose normalized name equals the normalized guess.
    pub fn match_exact<'a>(&self, guess: &str, candidates: &'a [Item]) -> Option<&'a Item> {
        let wanted = self.normalize(guess);
        candidates
            .iter()
            .find(|candidate| self.normalize(&candidate.localized_name) == wanted)
    }

    /// Find the candidate with the smallest edit distance to the guess,
    /// provided that distance is at most `max_distance`. Ties keep the first
    /// candidate in catalog order.
    pub fn match_fuzzy<'a>(
        &self,
        guess: &str,
        candidates: &'a [Item],
        max_distance: usize,
    ) -> Option<&'a Item> {
        let wanted = self.normalize(guess);
        let mut best: Option<(usize, &Item)> = None;
        for candidate in candidates {
            let distance = levenshtein(&wanted, &self.normalize(&candidate.localized_name));
            if distance <= max_distance && best.is_none_or(|(current, _)| distance < current) {
                best = Some((distance, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}

/// Classic dynamic-programming edit distance: insertions, deletions, and
/// substitutions at unit cost.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (row, &ca) in a.iter().enumerate() {
        current[0] = row + 1;
        for (col, &cb) in b.iter().enumerate() {
            let substitution = previous[col] + usize::from(ca != cb);
            current[col + 1] = substitution
                .min(previous[col + 1] + 1)
                .min(current[col] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
