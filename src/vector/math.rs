//! Primitive vector operations used by clustering and projection.
//!
//! Distances are computed over a bounded prefix of each vector. Embeddings
//! commonly carry hundreds of dimensions, and the interactive pipeline trades
//! exactness for speed by comparing only the leading coordinates.

/// Number of leading dimensions considered by [`distance`].
pub const DISTANCE_DIMS: usize = 50;

/// Euclidean distance over the first `min(50, a.len())` dimensions.
///
/// Both inputs must share that prefix length; the caller is responsible
/// for passing vectors of consistent dimensionality.
pub fn distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(DISTANCE_DIMS);
    debug_assert!(b.len() >= len, "Vectors must share the compared prefix");

    a[..len]
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}

/// Element-wise sum of two vectors of equal length.
pub fn sum(a: &[f32], b: &[f32]) -> Vec<f32> {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// Multiplies every coordinate by `k`.
pub fn scale(a: &[f32], k: f32) -> Vec<f32> {
    a.iter().map(|x| x * k).collect()
}

/// Prefix view of at most `dim` coordinates.
pub fn truncate(v: &[f32], dim: usize) -> &[f32] {
    &v[..v.len().min(dim)]
}

/// Coordinate-wise mean of the first `dim` coordinates of every vector.
///
/// Returns a zero vector of length `dim` when `vectors` is empty.
pub fn mean<V: AsRef<[f32]>>(vectors: &[V], dim: usize) -> Vec<f32> {
    let mut acc = vec![0.0f32; dim];
    if vectors.is_empty() {
        return acc;
    }

    for vector in vectors {
        for (slot, value) in acc.iter_mut().zip(vector.as_ref().iter()) {
            *slot += value;
        }
    }

    scale(&acc, 1.0 / vectors.len() as f32)
}
