//! Vector math for similarity lookups.
//!
//! All functions are pure and total: mismatched or degenerate inputs map to
//! sentinel values instead of errors. `cosine` returning 0.0 for mismatched
//! lengths or zero-magnitude inputs is interpreted by the cache as a forced
//! miss, not a real similarity.

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 when either input is empty, the lengths differ, or either
/// vector has zero magnitude.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Euclidean distance between two vectors.
///
/// Returns positive infinity when the lengths differ or both inputs are
/// empty. Used for diagnostics only; the cache's proximity metric is
/// [`cosine`].
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return f64::INFINITY;
    }

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Returns a fresh vector scaled to unit magnitude.
///
/// The zero vector is returned as an unchanged copy.
pub fn normalize(v: &[f64]) -> Vec<f64> {
    let magnitude = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if magnitude == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / magnitude).collect()
}
