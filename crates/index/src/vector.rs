//! Vector similarity and nearest-neighbour ranking.
//!
//! Brute-force cosine similarity over every stored vector. Corpora here are
//! a few thousand passages per domain, so a linear scan is fast enough.

use synaxarion_core::{IndexedPassage, ScoredPassage};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ, either vector is empty, or either has
/// zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0f64, 0.0f64, 0.0f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (x as f64, y as f64);
            (dot + x * y, na + x * x, nb + y * y)
        },
    );

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank entries by cosine similarity to `query`, best first, at most `limit`.
///
/// Ties keep insertion order so results are stable across runs.
pub fn vector_search(entries: &[IndexedPassage], query: &[f32], limit: usize) -> Vec<ScoredPassage> {
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (i, cosine_similarity(&e.embedding, query)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(i, score)| ScoredPassage {
            passage: entries[i].passage.clone(),
            score,
        })
        .collect()
}
