//! K-means clustering and silhouette scoring for embedding vectors.
//!
//! This module partitions embeddings into groups by geometric proximity in a
//! truncated vector space and reports a cluster-quality estimate.
//!
//! # Algorithm Details
//! - Distance metric: Euclidean over a prefix (see [`math::distance`])
//! - Working space: the first 5 coordinates of every vector
//! - Initialization: the first K vectors, so identical input always yields
//!   identical output
//! - Max iterations: 20 by default; stops early once no assignment changes
//! - Fewer than 3 vectors: a trivial single-cluster layout, no K-means run
//!
//! # Performance Characteristics
//! - O(n * k * 5 * iterations) time complexity
//! - Assignment step optionally runs on the rayon pool for large inputs
//! - Silhouette is estimated on at most 200 points using 10 coordinates

use crate::vector::math::{self, truncate};
use crate::vector::types::ClusterId;
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

/// Number of leading coordinates K-means works on.
pub const KMEANS_DIMS: usize = 5;

/// Default iteration cap for Lloyd's algorithm.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Below this many vectors clustering quality is meaningless.
pub const MIN_POINTS_FOR_KMEANS: usize = 3;

/// Lower bound of the automatic cluster count.
pub const MIN_CLUSTERS: usize = 2;

/// Upper bound of the automatic cluster count.
pub const MAX_CLUSTERS: usize = 10;

/// Upper bound of an explicit cluster count. Cluster ids stay below 99,
/// the graph group of unclustered points.
pub const MAX_EXPLICIT_CLUSTERS: usize = 99;

/// Maximum number of points sampled by [`silhouette`].
pub const SILHOUETTE_SAMPLE: usize = 200;

/// Number of leading coordinates used by [`silhouette`].
pub const SILHOUETTE_DIMS: usize = 10;

/// Inputs at or above this size use the parallel assignment step by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// Result of a K-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids in the truncated working space.
    pub centroids: Vec<Vec<f32>>,

    /// Cluster assignment for each input vector.
    pub assignments: Vec<ClusterId>,

    /// Number of assignment passes performed.
    pub iterations: usize,
}

impl KMeansResult {
    /// Number of clusters.
    #[must_use]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }
}

/// Outcome of [`cluster`].
#[derive(Debug, Clone, PartialEq)]
pub enum Clustering {
    /// Too few vectors to cluster: every point belongs to cluster 0.
    Fallback { assignments: Vec<ClusterId> },

    /// A full K-means run.
    KMeans(KMeansResult),
}

impl Clustering {
    /// Cluster assignment per input vector.
    #[must_use]
    pub fn assignments(&self) -> &[ClusterId] {
        match self {
            Clustering::Fallback { assignments } => assignments,
            Clustering::KMeans(result) => &result.assignments,
        }
    }

    /// Number of clusters discovered.
    #[must_use]
    pub fn k(&self) -> usize {
        match self {
            Clustering::Fallback { assignments } => usize::from(!assignments.is_empty()),
            Clustering::KMeans(result) => result.k(),
        }
    }

    /// Centroids, empty for the fallback layout.
    #[must_use]
    pub fn centroids(&self) -> &[Vec<f32>] {
        match self {
            Clustering::Fallback { .. } => &[],
            Clustering::KMeans(result) => &result.centroids,
        }
    }

    /// Number of K-means iterations, 0 for the fallback layout.
    #[must_use]
    pub fn iterations(&self) -> usize {
        match self {
            Clustering::Fallback { .. } => 0,
            Clustering::KMeans(result) => result.iterations,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Clustering::Fallback { .. })
    }
}

/// Tunables for [`cluster_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansOptions {
    /// Explicit cluster count; `None` selects one with [`choose_k`].
    pub k: Option<usize>,

    /// Iteration cap.
    pub max_iterations: usize,

    /// Minimum input size for the parallel assignment step.
    pub parallel_threshold: usize,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            k: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Errors that can occur during clustering operations.
///
/// These are caller contract violations; well-formed input never fails.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClusteringError {
    #[error(
        "Vector {index} is empty\nSuggestion: Ensure every chunk produced an embedding before clustering"
    )]
    EmptyVector { index: usize },

    #[error("Invalid cluster count: {0}\nSuggestion: Use k >= 1 or omit it to pick one automatically")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch at vector {index}: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Heuristic cluster count for `n` vectors: `clamp(ceil(sqrt(n / 2)), 2, 10)`.
///
/// A tunable stand-in for the elbow method, not an optimality guarantee.
#[must_use]
pub fn choose_k(n: usize) -> usize {
    let k = (n as f64 / 2.0).sqrt().ceil() as usize;
    k.clamp(MIN_CLUSTERS, MAX_CLUSTERS)
}

/// Clusters `vectors` with default options and an optional explicit `k`.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn cluster<V>(vectors: &[V], k: Option<usize>) -> Result<Clustering, ClusteringError>
where
    V: AsRef<[f32]> + Sync,
{
    cluster_with(
        vectors,
        KMeansOptions {
            k,
            ..KMeansOptions::default()
        },
    )
}

/// Clusters `vectors` into groups.
///
/// # Algorithm
/// 1. Validate shapes (non-empty vectors, one shared dimensionality)
/// 2. Fewer than 3 vectors: return [`Clustering::Fallback`]
/// 3. Otherwise run K-means with `k` from the options or [`choose_k`]
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn cluster_with<V>(vectors: &[V], options: KMeansOptions) -> Result<Clustering, ClusteringError>
where
    V: AsRef<[f32]> + Sync,
{
    validate_shapes(vectors)?;

    if options.k == Some(0) {
        return Err(ClusteringError::InvalidClusterCount(0));
    }

    if vectors.len() < MIN_POINTS_FOR_KMEANS {
        tracing::debug!(
            vectors = vectors.len(),
            "too few vectors for k-means, using single-cluster layout"
        );
        return Ok(Clustering::Fallback {
            assignments: vec![ClusterId::new(0); vectors.len()],
        });
    }

    let k = options
        .k
        .unwrap_or_else(|| choose_k(vectors.len()))
        .min(vectors.len())
        .min(MAX_EXPLICIT_CLUSTERS);

    Ok(Clustering::KMeans(kmeans_clustering(
        vectors,
        k,
        options.max_iterations,
        options.parallel_threshold,
    )))
}

/// Runs Lloyd's algorithm over the first [`KMEANS_DIMS`] coordinates.
///
/// Inputs are assumed validated: `1 <= k <= vectors.len()` and equal lengths.
pub fn kmeans_clustering<V>(
    vectors: &[V],
    k: usize,
    max_iterations: usize,
    parallel_threshold: usize,
) -> KMeansResult
where
    V: AsRef<[f32]> + Sync,
{
    debug_assert!(k >= 1 && k <= vectors.len());

    let reduced: Vec<&[f32]> = vectors
        .iter()
        .map(|v| truncate(v.as_ref(), KMEANS_DIMS))
        .collect();
    let parallel = reduced.len() >= parallel_threshold;

    let mut centroids: Vec<Vec<f32>> = reduced[..k].iter().map(|v| v.to_vec()).collect();
    let mut assignments = vec![ClusterId::new(0); reduced.len()];
    let mut previous: Option<Vec<ClusterId>> = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let next = assign_all(&reduced, &centroids, parallel);
        converged = previous.as_deref() == Some(next.as_slice());
        assignments = next;

        if converged {
            break;
        }

        centroids = update_centroids(&reduced, &assignments, &centroids);
        previous = Some(assignments.clone());
    }

    tracing::debug!(
        vectors = reduced.len(),
        k,
        iterations,
        converged,
        parallel,
        "k-means finished"
    );

    KMeansResult {
        centroids,
        assignments,
        iterations,
    }
}

/// Assigns a vector to the nearest centroid.
///
/// Ties resolve to the lowest centroid index.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> ClusterId {
    let mut best_distance = f32::INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let d = math::distance(vector, centroid);
        if d < best_distance {
            best_distance = d;
            best_cluster = i;
        }
    }

    ClusterId::from_index(best_cluster)
}

fn assign_all(reduced: &[&[f32]], centroids: &[Vec<f32>], parallel: bool) -> Vec<ClusterId> {
    if parallel {
        reduced
            .par_iter()
            .map(|v| assign_to_nearest_centroid(v, centroids))
            .collect()
    } else {
        reduced
            .iter()
            .map(|v| assign_to_nearest_centroid(v, centroids))
            .collect()
    }
}

/// Recomputes centroids as the mean of their members.
///
/// A cluster that lost all members keeps its previous centroid.
fn update_centroids(
    reduced: &[&[f32]],
    assignments: &[ClusterId],
    previous: &[Vec<f32>],
) -> Vec<Vec<f32>> {
    let dimension = reduced.first().map_or(0, |v| v.len());
    let mut sums = vec![vec![0.0f32; dimension]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (vector, cluster) in reduced.iter().zip(assignments.iter()) {
        let idx = cluster.index();
        sums[idx] = math::sum(&sums[idx], vector);
        counts[idx] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((sum, count), old)| {
            if count == 0 {
                old.clone()
            } else {
                math::scale(&sum, 1.0 / count as f32)
            }
        })
        .collect()
}

/// Estimates the silhouette score of a clustering.
///
/// Samples the first `min(n, 200)` points and compares them on their first
/// 10 coordinates, so the value is an interactive-speed approximation rather
/// than the canonical all-pairs silhouette. Returns 0 when `k < 2`.
pub fn silhouette<V: AsRef<[f32]>>(vectors: &[V], assignments: &[ClusterId], k: usize) -> f32 {
    if k < 2 {
        return 0.0;
    }

    let n = vectors.len().min(assignments.len()).min(SILHOUETTE_SAMPLE);
    if n == 0 {
        return 0.0;
    }

    let sampled: Vec<&[f32]> = vectors[..n]
        .iter()
        .map(|v| truncate(v.as_ref(), SILHOUETTE_DIMS))
        .collect();

    let mut total = 0.0f32;
    for i in 0..n {
        let own = assignments[i];
        let mut own_sum = 0.0f32;
        let mut own_count = 0usize;
        let mut others: BTreeMap<ClusterId, (f32, usize)> = BTreeMap::new();

        for j in 0..n {
            if i == j {
                continue;
            }
            let d = math::distance(sampled[i], sampled[j]);
            if assignments[j] == own {
                own_sum += d;
                own_count += 1;
            } else {
                let entry = others.entry(assignments[j]).or_insert((0.0, 0));
                entry.0 += d;
                entry.1 += 1;
            }
        }

        let a = if own_count > 0 {
            own_sum / own_count as f32
        } else {
            0.0
        };
        let b = others
            .values()
            .map(|(sum, count)| sum / *count as f32)
            .fold(None, |best: Option<f32>, mean| {
                Some(best.map_or(mean, |b| b.min(mean)))
            })
            .unwrap_or(0.0);

        let denom = a.max(b);
        if denom != 0.0 {
            total += (b - a) / denom;
        }
    }

    total / n as f32
}

fn validate_shapes<V: AsRef<[f32]>>(vectors: &[V]) -> Result<(), ClusteringError> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let expected = first.as_ref().len();

    for (index, vector) in vectors.iter().enumerate() {
        let actual = vector.as_ref().len();
        if actual == 0 {
            return Err(ClusteringError::EmptyVector { index });
        }
        if actual != expected {
            return Err(ClusteringError::DimensionMismatch {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(())
}
