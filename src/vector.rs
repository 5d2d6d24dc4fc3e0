//! Vector helpers shared by the store and the retrieval pipeline.
//!
//! Embedding providers emit different native widths (768 and 1536 have both
//! been observed), while the store's similarity index is fixed-width. Every
//! vector crossing the store boundary passes through [`reconcile`].

use std::cmp::Ordering;

/// Normalize `vector` to exactly `target_dim` elements.
///
/// Shorter vectors are right-padded with zeros, longer ones truncated to
/// the first `target_dim` elements. Zero-padding does not renormalize, so
/// similarity against a padded vector is an approximation, not an
/// apples-to-apples score with two natively equal-width vectors. The stored
/// corpus depends on this exact behavior.
pub fn reconcile(vector: &[f32], target_dim: usize) -> Vec<f32> {
    match vector.len().cmp(&target_dim) {
        Ordering::Equal => vector.to_vec(),
        Ordering::Less => {
            let mut padded = Vec::with_capacity(target_dim);
            padded.extend_from_slice(vector);
            padded.resize(target_dim, 0.0);
            padded
        }
        Ordering::Greater => vector[..target_dim].to_vec(),
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for empty, mismatched-length, or zero-norm inputs; such
/// pairs can never clear a positive similarity threshold.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
