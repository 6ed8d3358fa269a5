//! Embedding generation for document chunks.
//!
//! [`EmbeddingGenerator`] is the seam for embedding providers. The bundled
//! [`LocalTfIdfGenerator`] needs no model download: it builds TF-IDF vectors
//! over the batch and pools or pads them to the profile dimension. Its vectors
//! depend on the whole batch, so the same text embeds differently in
//! different corpora.

use std::collections::HashMap;

use crate::config::EmbeddingModel;
use crate::pipeline::cache::ResponseCache;
use crate::pipeline::chunking::calculate_hash;
use crate::types::{DocumentChunk, EmbeddingVector};
use crate::vector::{VectorDimension, VectorError};

/// Trait for generating embeddings from text.
///
/// Implementations of this trait should be thread-safe and
/// capable of handling batch processing efficiently.
pub trait EmbeddingGenerator: Send + Sync {
    /// Generate embeddings for multiple texts, one per input.
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError>;

    /// Get the dimension of embeddings produced by this generator.
    #[must_use]
    fn dimension(&self) -> VectorDimension;

    /// Name recorded in `EmbeddingVector::model_used`.
    fn model_name(&self) -> &str;

    /// True when a text's vector depends on the rest of the batch.
    fn corpus_dependent(&self) -> bool {
        false
    }
}

/// Lower-cases, keeps letters, digits and Latin-1 accented letters, and
/// returns the words longer than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|&c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || ('\u{00C0}'..='\u{00FF}').contains(&c)
                || c.is_whitespace()
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Batch vocabulary in first-seen order plus per-word document frequency.
struct Corpus {
    documents: Vec<Vec<String>>,
    vocabulary: Vec<String>,
    positions: HashMap<String, usize>,
    document_frequency: Vec<usize>,
}

impl Corpus {
    fn build(texts: &[&str]) -> Self {
        let documents: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        let mut vocabulary = Vec::new();
        let mut positions = HashMap::new();
        let mut document_frequency = Vec::new();

        for words in &documents {
            let mut seen_here = vec![false; vocabulary.len()];
            for word in words {
                let position = *positions.entry(word.clone()).or_insert_with(|| {
                    vocabulary.push(word.clone());
                    document_frequency.push(0);
                    vocabulary.len() - 1
                });
                if position >= seen_here.len() {
                    seen_here.resize(position + 1, false);
                }
                if !seen_here[position] {
                    seen_here[position] = true;
                    document_frequency[position] += 1;
                }
            }
        }

        Self {
            documents,
            vocabulary,
            positions,
            document_frequency,
        }
    }

    fn term_frequencies(&self, document: usize) -> HashMap<usize, f32> {
        let mut counts = HashMap::new();
        for word in &self.documents[document] {
            if let Some(&position) = self.positions.get(word) {
                *counts.entry(position).or_insert(0.0) += 1.0;
            }
        }
        counts
    }
}

/// TF-IDF embeddings computed locally over the batch.
///
/// `idf = ln(N / (df + 1))`; each vector is L2-normalised, then average-pooled
/// down to the profile dimension or zero-padded up to it.
#[derive(Debug, Clone)]
pub struct LocalTfIdfGenerator {
    model: EmbeddingModel,
    dimension: VectorDimension,
}

impl LocalTfIdfGenerator {
    pub fn new(model: EmbeddingModel) -> Self {
        let dimension = match model {
            EmbeddingModel::Use => VectorDimension::dimension_512(),
            EmbeddingModel::SentenceBert => VectorDimension::dimension_768(),
        };
        Self { model, dimension }
    }

    fn pool(&self, vector: Vec<f32>) -> Vec<f32> {
        let dims = self.dimension.get();
        if vector.len() <= dims {
            let mut padded = vector;
            padded.resize(dims, 0.0);
            return padded;
        }

        let step = vector.len() as f64 / dims as f64;
        (0..dims)
            .map(|i| {
                let start = (i as f64 * step).floor() as usize;
                let end = (((i + 1) as f64 * step).floor() as usize).min(vector.len());
                let slice = &vector[start..end.max(start + 1)];
                slice.iter().sum::<f32>() / slice.len() as f32
            })
            .collect()
    }
}

impl Default for LocalTfIdfGenerator {
    fn default() -> Self {
        Self::new(EmbeddingModel::default())
    }
}

impl EmbeddingGenerator for LocalTfIdfGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, VectorError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let corpus = Corpus::build(texts);
        let n = texts.len() as f32;
        let idf: Vec<f32> = corpus
            .document_frequency
            .iter()
            .map(|&df| (n / (df as f32 + 1.0)).ln())
            .collect();

        let embeddings = (0..texts.len())
            .map(|document| {
                let mut vector = vec![0.0f32; corpus.vocabulary.len()];
                for (position, tf) in corpus.term_frequencies(document) {
                    vector[position] = tf * idf[position];
                }
                let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    vector.iter_mut().for_each(|v| *v /= norm);
                }
                self.pool(vector)
            })
            .collect();

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    fn model_name(&self) -> &str {
        match self.model {
            EmbeddingModel::Use => "Universal Sentence Encoder (Local Simulation)",
            EmbeddingModel::SentenceBert => "Sentence-BERT (Local Simulation)",
        }
    }

    fn corpus_dependent(&self) -> bool {
        true
    }
}

/// Words too common to be useful keywords.
const STOPWORDS: &[&str] = &[
    "que", "para", "com", "por", "uma", "dos", "das", "nos", "nas", "ser", "sua", "seu", "suas",
    "seus", "aos", "pelo", "pela", "pelos", "pelas", "este", "esta", "esse", "essa", "ele", "ela",
    "the", "and", "for", "with", "that", "this", "from", "are", "not",
];

/// Top `per_text` keywords of each text, ranked by smoothed TF-IDF.
///
/// Uses `idf = ln((1 + N) / (1 + df)) + 1` so terms shared by every text
/// still rank; ties keep first-seen order.
pub fn extract_keywords(texts: &[&str], per_text: usize) -> Vec<Vec<String>> {
    if per_text == 0 {
        return vec![Vec::new(); texts.len()];
    }

    let corpus = Corpus::build(texts);
    let n = texts.len() as f32;

    (0..texts.len())
        .map(|document| {
            let mut scored: Vec<(usize, f32)> = corpus
                .term_frequencies(document)
                .into_iter()
                .filter(|(position, _)| !STOPWORDS.contains(&corpus.vocabulary[*position].as_str()))
                .map(|(position, tf)| {
                    let df = corpus.document_frequency[position] as f32;
                    (position, tf * (((1.0 + n) / (1.0 + df)).ln() + 1.0))
                })
                .collect();
            scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            scored
                .into_iter()
                .take(per_text)
                .map(|(position, _)| corpus.vocabulary[position].clone())
                .collect()
        })
        .collect()
}

/// Fills in keywords for chunks that have none.
///
/// Returns the number of chunks updated.
pub fn assign_keywords(chunks: &mut [DocumentChunk], per_chunk: usize) -> usize {
    if per_chunk == 0 {
        return 0;
    }
    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let extracted = extract_keywords(&texts, per_chunk);

    let mut updated = 0;
    for (chunk, keywords) in chunks.iter_mut().zip(extracted) {
        if chunk.keywords.is_empty() && !keywords.is_empty() {
            chunk.keywords = keywords;
            updated += 1;
        }
    }
    updated
}

/// Embeds every chunk, reusing cached vectors where possible.
///
/// Cache keys include a fingerprint of the whole batch when the generator is
/// corpus dependent. A generator returning the wrong number of vectors, or
/// vectors of the wrong size, is an error.
pub fn embed_chunks(
    chunks: &[DocumentChunk],
    generator: &dyn EmbeddingGenerator,
    cache: &mut ResponseCache<Vec<f32>>,
) -> Result<Vec<EmbeddingVector>, VectorError> {
    let namespace = if generator.corpus_dependent() {
        let hashes: Vec<&str> = chunks.iter().map(|c| c.hash.as_str()).collect();
        format!("{}#{}", generator.model_name(), calculate_hash(&hashes.join(",")))
    } else {
        generator.model_name().to_string()
    };

    let mut vectors: Vec<Option<Vec<f32>>> = chunks
        .iter()
        .map(|chunk| cache.get(&namespace, &chunk.content))
        .collect();

    let missing: Vec<usize> = (0..chunks.len()).filter(|&i| vectors[i].is_none()).collect();
    if !missing.is_empty() {
        // Corpus-dependent vectors are only valid when computed over the full batch.
        let batch: Vec<usize> = if generator.corpus_dependent() {
            (0..chunks.len()).collect()
        } else {
            missing
        };
        let texts: Vec<&str> = batch.iter().map(|&i| chunks[i].content.as_str()).collect();
        let generated = generator.generate_embeddings(&texts)?;
        if generated.len() != batch.len() {
            return Err(VectorError::EmbeddingFailed(format!(
                "generator returned {} vectors for {} texts",
                generated.len(),
                batch.len()
            )));
        }
        for (index, vector) in batch.into_iter().zip(generated) {
            cache.insert(&namespace, &chunks[index].content, vector.clone());
            vectors[index] = Some(vector);
        }
    }

    let dimension = generator.dimension();
    chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| {
            let vector = vector.unwrap_or_default();
            dimension.validate_vector(&vector)?;
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(VectorError::NonFinite);
            }
            Ok(EmbeddingVector::from_chunk(chunk, vector, generator.model_name()))
        })
        .collect()
}
