//! Keyword sets and the inverted index behind the sparse semantic join.
//!
//! Instead of scoring every node pair, the builder only scores pairs that
//! co-occur in at least one keyword bucket. Buckets holding too large a
//! share of all nodes behave like stopwords and are skipped.

use std::collections::{BTreeMap, HashSet};

/// Lower-cased, trimmed keyword set; blank entries are dropped.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> HashSet<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Set statistics for a pair of keyword sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordOverlap {
    pub intersection: usize,
    pub union: usize,
    pub min_size: usize,
}

impl KeywordOverlap {
    /// Compares two sets, iterating the smaller one.
    ///
    /// Returns `None` when either set is empty or they share nothing.
    pub fn between(a: &HashSet<String>, b: &HashSet<String>) -> Option<Self> {
        if a.is_empty() || b.is_empty() {
            return None;
        }

        let (smaller, larger) = if a.len() < b.len() { (a, b) } else { (b, a) };
        let intersection = smaller.iter().filter(|k| larger.contains(*k)).count();
        if intersection == 0 {
            return None;
        }

        Some(Self {
            intersection,
            union: a.len() + b.len() - intersection,
            min_size: a.len().min(b.len()),
        })
    }

    pub fn jaccard(&self) -> f32 {
        self.intersection as f32 / self.union as f32
    }

    /// Intersection over the smaller set; 1.0 when one set contains the other.
    pub fn overlap_coefficient(&self) -> f32 {
        self.intersection as f32 / self.min_size as f32
    }
}

/// Keyword -> node indices, plus each node's normalized set.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    sets: Vec<HashSet<String>>,
    buckets: BTreeMap<String, Vec<usize>>,
}

impl KeywordIndex {
    /// Indexes one keyword list per node, in node order.
    pub fn build<'a, I>(keyword_lists: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let sets: Vec<HashSet<String>> = keyword_lists
            .into_iter()
            .map(normalize_keywords)
            .collect();

        let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (node, set) in sets.iter().enumerate() {
            for keyword in set {
                buckets.entry(keyword.clone()).or_default().push(node);
            }
        }

        Self { sets, buckets }
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Normalized keyword set of node `index`.
    pub fn set(&self, index: usize) -> &HashSet<String> {
        &self.sets[index]
    }

    /// Buckets worth joining: at least two nodes and no more than
    /// `max_share` of all nodes. Yields `(keyword, ascending node indices)`.
    pub fn join_buckets(&self, max_share: f64) -> impl Iterator<Item = (&str, &[usize])> {
        let limit = self.sets.len() as f64 * max_share;
        self.buckets
            .iter()
            .filter(move |(_, nodes)| nodes.len() >= 2 && nodes.len() as f64 <= limit)
            .map(|(keyword, nodes)| (keyword.as_str(), nodes.as_slice()))
    }

    /// Keywords skipped because they appear in more than `max_share` of nodes.
    pub fn suppressed(&self, max_share: f64) -> Vec<&str> {
        let limit = self.sets.len() as f64 * max_share;
        self.buckets
            .iter()
            .filter(|(_, nodes)| nodes.len() >= 2 && nodes.len() as f64 > limit)
            .map(|(keyword, _)| keyword.as_str())
            .collect()
    }
}
