//! Deterministic 2D layout of high-dimensional vectors.
//!
//! The projection is a fixed weighted sum over the centred leading
//! coordinates. It is stable and separates clusters visually, but it is not
//! PCA and its axes carry no explained-variance meaning.

use crate::vector::math::{self, truncate};

/// Number of leading dimensions that feed the projection.
pub const PROJECTION_DIMS: usize = 50;

/// Centre of the visualization canvas on both axes.
const CANVAS_CENTER: f32 = 50.0;

/// Scale applied to raw projected coordinates.
const CANVAS_SCALE: f32 = 30.0;

/// Projects every vector onto the 2D visualization canvas.
///
/// 1. Truncate to `min(dim, 50)` coordinates
/// 2. Centre on the coordinate-wise mean
/// 3. `x = Σ v[i] / (i + 1)`, `y = Σ v[i] * sin(i)`
/// 4. Map to `(50 + 30x, 50 + 30y)`
pub fn project_2d<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<(f32, f32)> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };

    let dim = first.as_ref().len().min(PROJECTION_DIMS);
    let mean = math::mean(vectors, dim);

    vectors
        .iter()
        .map(|v| {
            let (x, y) = truncate(v.as_ref(), dim)
                .iter()
                .zip(mean.iter())
                .enumerate()
                .fold((0.0f32, 0.0f32), |(x, y), (i, (value, m))| {
                    let centred = value - m;
                    (
                        x + centred * (1.0 / (i as f32 + 1.0)),
                        y + centred * (i as f32).sin(),
                    )
                });
            (CANVAS_CENTER + x * CANVAS_SCALE, CANVAS_CENTER + y * CANVAS_SCALE)
        })
        .collect()
}

/// Sequential coordinates for inputs too small to cluster.
///
/// Point `i` lands at `(50 + 20i - 20, 50 ± 10)`, alternating above and below
/// the centre line.
pub fn fallback_layout(n: usize) -> Vec<(f32, f32)> {
    (0..n)
        .map(|i| {
            let x = CANVAS_CENTER + (i as f32 * 20.0 - 20.0);
            let y = CANVAS_CENTER + ((i % 2) as f32 * 20.0 - 10.0);
            (x, y)
        })
        .collect()
}
