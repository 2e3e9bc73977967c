use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CatalogError;
use crate::models::SearchCandidate;
use crate::tmdb::CatalogApi;

/// Fuzzy matches scoring below this (0-100) are rejected.
pub const MATCH_THRESHOLD: f64 = 70.0;

/// Picks the catalog entry a free-text title refers to.
#[derive(Clone)]
pub struct TitleResolver {
    catalog: Arc<dyn CatalogApi>,
}

impl TitleResolver {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    pub async fn resolve(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Option<SearchCandidate>, CatalogError> {
        let candidates = self.catalog.search(title, year, true).await?;
        Ok(pick_candidate(title, candidates))
    }
}

/// Exact case-insensitive title first, in catalog order; otherwise the best
/// token-sorted fuzzy score, provided it clears `MATCH_THRESHOLD`.
pub fn pick_candidate(query: &str, candidates: Vec<SearchCandidate>) -> Option<SearchCandidate> {
    if candidates.is_empty() {
        debug!("No candidates returned for '{}'", query);
        return None;
    }

    let query_lower = query.to_lowercase();
    if let Some(pos) = candidates
        .iter()
        .position(|c| c.title.to_lowercase() == query_lower)
    {
        return candidates.into_iter().nth(pos);
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = token_sort_ratio(query, &candidate.title);
        // Strict comparison keeps the first of equal scores.
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
        }
    }

    let (idx, score) = best?;
    let candidate = candidates.into_iter().nth(idx)?;
    if score >= MATCH_THRESHOLD {
        debug!(
            "Closest match for '{}': '{}' ({:.1}%)",
            query, candidate.title, score
        );
        Some(candidate)
    } else {
        info!(
            "Closest match for '{}' was '{}' ({:.1}%), below threshold",
            query, candidate.title, score
        );
        None
    }
}

/// Similarity on a 0-100 scale, ignoring case, punctuation and word order.
///
/// The score is the indel ratio of the sorted token strings:
/// `200 * lcs / (len_a + len_b)`, counted in chars.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = sorted_tokens(a).chars().collect();
    let b: Vec<char> = sorted_tokens(b).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    200.0 * longest_common_subsequence(&a, &b) as f64 / (a.len() + b.len()) as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

fn sorted_tokens(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, title: &str) -> SearchCandidate {
        SearchCandidate {
            id,
            title: title.to_string(),
            release_date: String::new(),
        }
    }

    #[test]
    fn word_order_does_not_matter() {
        assert_eq!(token_sort_ratio("Kong vs Godzilla", "godzilla VS. kong"), 100.0);
    }

    #[test]
    fn misspelling_scores_above_threshold() {
        assert!(token_sort_ratio("Godzila Minus One", "Godzilla Minus One") >= MATCH_THRESHOLD);
        assert!(token_sort_ratio("Mothra", "Rodan") < MATCH_THRESHOLD);
    }

    #[test]
    fn suffix_years_are_not_over_penalised() {
        // 2 * 8 / (13 + 8)
        let score = token_sort_ratio("Godzilla", "Godzilla 2000");
        assert!((score - 76.19).abs() < 0.01, "score was {score}");
        assert!(score >= MATCH_THRESHOLD);
    }

    #[test]
    fn score_is_symmetric_indel_ratio() {
        assert_eq!(token_sort_ratio("abcd", "acbd"), 75.0);
        assert_eq!(token_sort_ratio("acbd", "abcd"), 75.0);
        assert!(pick_candidate("Godzilla", vec![candidate(7, "Godzilla 2000")]).is_some());
    }

    #[test]
    fn blank_input_scores_zero() {
        assert_eq!(token_sort_ratio("", "Godzilla"), 0.0);
        assert_eq!(token_sort_ratio("?!", "Godzilla"), 0.0);
    }

    #[test]
    fn exact_match_beats_earlier_fuzzy_tie() {
        // "Godzilla!" also scores 100 after punctuation stripping and comes first.
        let picked = pick_candidate(
            "godzilla",
            vec![candidate(1, "Godzilla!"), candidate(2, "GODZILLA")],
        );
        assert_eq!(picked.map(|c| c.id), Some(2));
    }

    #[test]
    fn equal_fuzzy_scores_pick_first() {
        let picked = pick_candidate(
            "Godzila vs Kong",
            vec![
                candidate(10, "Godzilla vs Kong"),
                candidate(11, "Kong vs Godzilla"),
            ],
        );
        assert_eq!(picked.map(|c| c.id), Some(10));
    }

    #[test]
    fn low_scores_are_rejected() {
        let picked = pick_candidate("Mothra", vec![candidate(1, "Rodan"), candidate(2, "King Kong")]);
        assert!(picked.is_none());
    }

    #[test]
    fn empty_candidates_is_no_match() {
        assert!(pick_candidate("Godzilla", Vec::new()).is_none());
    }
}
