use crate::gate::ConfidenceGate;
use crate::index::{CorpusIndex, SparseVector};
use crate::model::MatchResult;

/// Cosine similarity of two non-negative vectors, clamped to `[0, 1]`.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let (na, nb) = (a.norm(), b.norm());
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (a.dot(b) / (na * nb)).clamp(0.0, 1.0)
}

/// Highest-scoring vector; ties go to the lowest index.
///
/// Linear in the corpus size. Larger corpora would want an inverted index
/// over the sparse vectors instead.
pub fn top_match(query: &SparseVector, vectors: &[SparseVector]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, vector) in vectors.iter().enumerate() {
        let score = cosine_similarity(query, vector);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

/// Scores `query` against the whole index and runs the gate on the winner.
///
/// A query with no known terms is never accepted, whatever the threshold.
pub fn match_query(
    query: &SparseVector,
    index: &CorpusIndex,
    gate: &ConfidenceGate,
) -> MatchResult {
    let (best_index, score) = top_match(query, index.vectors()).unwrap_or((0, 0.0));
    MatchResult {
        best_index,
        score,
        accepted: !query.is_zero() && gate.decide(score),
    }
}
