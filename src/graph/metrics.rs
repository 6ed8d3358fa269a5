//! Whole-graph statistics, recomputed from scratch on every build.

use crate::graph::types::GraphMetrics;

/// Metrics plus the per-node degrees they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub metrics: GraphMetrics,
    /// Degree of each node, in node order
    pub degrees: Vec<usize>,
}

impl MetricsReport {
    /// `degree / (N - 1)` for node `index`; 0 when the graph has at most one node.
    pub fn centrality(&self, index: usize) -> f32 {
        let n = self.degrees.len();
        if n <= 1 {
            return 0.0;
        }
        self.degrees[index] as f32 / (n - 1) as f32
    }
}

/// Computes metrics for `groups.len()` nodes connected by `edges`.
///
/// Edges are index pairs into `groups`, one per unordered pair.
pub fn compute(groups: &[u32], edges: &[(usize, usize)], silhouette: f32) -> MetricsReport {
    let n = groups.len();
    let e = edges.len();

    let mut degrees = vec![0usize; n];
    let mut within = 0usize;
    for &(a, b) in edges {
        degrees[a] += 1;
        degrees[b] += 1;
        if groups[a] == groups[b] {
            within += 1;
        }
    }

    let density = if n > 1 {
        (2 * e) as f32 / (n * (n - 1)) as f32
    } else {
        0.0
    };

    let avg_degree = if n > 0 {
        degrees.iter().sum::<usize>() as f32 / n as f32
    } else {
        0.0
    };

    let modularity = if e > 0 {
        let expected = 1.0 / n as f32;
        within as f32 / e as f32 - expected * expected
    } else {
        0.0
    };

    MetricsReport {
        metrics: GraphMetrics {
            density,
            avg_degree,
            modularity,
            silhouette_score: silhouette,
            total_nodes: n,
            total_edges: e,
            connected_components: connected_components(n, edges),
        },
        degrees,
    }
}

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    /// Returns true when `a` and `b` were in different sets.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Number of connected components; isolated nodes count as one each.
pub fn connected_components(n: usize, edges: &[(usize, usize)]) -> usize {
    let mut sets = UnionFind::new(n);
    let merges = edges.iter().filter(|&&(a, b)| sets.union(a, b)).count();
    n - merges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph() {
        let report = compute(&[], &[], 0.0);
        assert_eq!(report.metrics, GraphMetrics::default());
        assert!(report.degrees.is_empty());
    }

    #[test]
    fn test_single_node() {
        let report = compute(&[0], &[], 0.5);
        assert_eq!(report.metrics.density, 0.0);
        assert_eq!(report.metrics.avg_degree, 0.0);
        assert_eq!(report.metrics.connected_components, 1);
        assert_eq!(report.metrics.silhouette_score, 0.5);
        assert_eq!(report.centrality(0), 0.0);
    }

    #[test]
    fn test_triangle_plus_isolated_node() {
        let groups = [0, 0, 1, 1];
        let edges = [(0, 1), (0, 2), (1, 2)];
        let report = compute(&groups, &edges, 0.0);

        assert!((report.metrics.density - 6.0 / 12.0).abs() < 1e-6);
        assert!((report.metrics.avg_degree - 1.5).abs() < 1e-6);
        // one of three edges stays within a group
        assert!((report.metrics.modularity - (1.0 / 3.0 - 1.0 / 16.0)).abs() < 1e-6);
        assert_eq!(report.metrics.connected_components, 2);
        assert_eq!(report.degrees, vec![2, 2, 2, 0]);
        assert!((report.centrality(0) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(report.centrality(3), 0.0);
    }

    #[test]
    fn test_complete_graph_density_is_one() {
        let groups = [0, 0, 0];
        let edges = [(0, 1), (0, 2), (1, 2)];
        let report = compute(&groups, &edges, 0.0);
        assert!((report.metrics.density - 1.0).abs() < 1e-6);
        assert!((report.centrality(1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_components_chain() {
        assert_eq!(connected_components(5, &[(0, 1), (1, 2), (3, 4)]), 2);
        assert_eq!(connected_components(3, &[(0, 1), (1, 2), (0, 2)]), 1);
        assert_eq!(connected_components(0, &[]), 0);
    }
}
