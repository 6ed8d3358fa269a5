//! Document chunking with legal-structure detection.
//!
//! Documents are split on blank lines, with fallbacks for monolithic text,
//! and every part is tagged with the structural element it starts with
//! (chapter, article, paragraph, clause, item or section title).

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::ChunkingConfig;
use crate::types::{DocumentChunk, SourceDocument};

/// Documents split into fewer paragraphs than this fall back to fixed blocks.
const MIN_PARAGRAPHS: usize = 3;

/// Characters of the file name kept in chunk ids.
const ID_FILE_PREFIX: usize = 5;

/// Hash characters kept in chunk ids.
const ID_HASH_PREFIX: usize = 8;

/// Section titles longer than this are truncated in labels.
const TITLE_LABEL_CHARS: usize = 30;

/// Words used as the label of plain text fragments.
const FRAGMENT_LABEL_WORDS: usize = 5;

pub const ENTITY_MACRO: &str = "ESTRUTURA_MACRO";
pub const ENTITY_ARTICLE: &str = "ARTIGO";
pub const ENTITY_PARAGRAPH: &str = "PARAGRAFO";
pub const ENTITY_CLAUSE: &str = "INCISO";
pub const ENTITY_ITEM: &str = "ALINEA";
pub const ENTITY_SECTION_TITLE: &str = "TITULO_SECAO";
pub const ENTITY_FRAGMENT: &str = "FRAGMENTO_TEXTO";
pub const ENTITY_CONTINUATION: &str = "CONTINUACAO";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("chunking pattern is valid"));
    };
}

pattern!(PARAGRAPH_BREAK, r"\n\s*\n");
pattern!(SENTENCE_END, r"\.\s+");
pattern!(MACRO_HEADING, r"(?i)^(?:CAP[IÍ]TULO|T[IÍ]TULO|LIVRO)\s+[IVXLCDM\d]+");
pattern!(ARTICLE_HEADING, r"(?i)^(?:Art\.|Artigo)\s*[\d.]+(?:º|°)?");
pattern!(PARAGRAPH_START, r"(?i)^(?:§|Parágrafo)");
pattern!(PARAGRAPH_LABEL, r"(?i)^(?:§\s*[\d.]+(?:º|°)?|Parágrafo\s+único)");
pattern!(CLAUSE_HEADING, r"^([IVXLCDM]+)\s*[.\-–]\s+");
pattern!(ITEM_HEADING, r"^([a-z]\))\s+");

/// SHA-256 of `content`, hex encoded.
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Structural kind and display label of a text part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    pub entity_type: &'static str,
    pub label: String,
}

/// Classifies `text` by the structural element it starts with.
pub fn identify_entity(text: &str) -> EntityTag {
    let text = text.trim();
    let tag = |entity_type, label: String| EntityTag { entity_type, label };

    if let Some(m) = MACRO_HEADING.find(text) {
        return tag(ENTITY_MACRO, m.as_str().to_uppercase());
    }
    if let Some(m) = ARTICLE_HEADING.find(text) {
        return tag(ENTITY_ARTICLE, m.as_str().to_string());
    }
    if PARAGRAPH_START.is_match(text) {
        let label = PARAGRAPH_LABEL
            .find(text)
            .map_or_else(|| "§".to_string(), |m| m.as_str().to_string());
        return tag(ENTITY_PARAGRAPH, label);
    }
    if let Some(caps) = CLAUSE_HEADING.captures(text) {
        return tag(ENTITY_CLAUSE, format!("Inciso {}", &caps[1]));
    }
    if let Some(caps) = ITEM_HEADING.captures(text) {
        return tag(ENTITY_ITEM, format!("Alínea {}", &caps[1]));
    }

    let length = text.chars().count();
    if length > 3
        && length < 100
        && text == text.to_uppercase()
        && text.chars().any(|c| c.is_ascii_uppercase())
    {
        return tag(ENTITY_SECTION_TITLE, truncate_label(text, TITLE_LABEL_CHARS));
    }

    tag(ENTITY_FRAGMENT, leading_words(text, FRAGMENT_LABEL_WORDS))
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn leading_words(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let head = words[..words.len().min(count)].join(" ");
    if words.len() > count {
        format!("{head}...")
    } else {
        head
    }
}

/// Splits `text` into blocks of at most `size` characters, cutting before
/// whitespace when possible.
fn split_blocks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut blocks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut chars = rest.char_indices();
        let Some((limit, _)) = chars.nth(size) else {
            blocks.push(rest);
            break;
        };

        // Prefer the last cut inside the window that lands on whitespace.
        let cut = if rest[limit..].starts_with(char::is_whitespace) {
            limit
        } else {
            rest[..limit]
                .char_indices()
                .filter(|&(i, c)| i > 0 && c.is_whitespace())
                .map(|(i, _)| i)
                .last()
                .unwrap_or(limit)
        };

        blocks.push(&rest[..cut]);
        rest = rest[cut..].trim_start();
    }
    blocks
}

/// Splits on `.` followed by whitespace and an upper-case letter.
///
/// Every part ends with a period.
fn split_sentences(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        let next_upper = text[m.end()..].chars().next().is_some_and(char::is_uppercase);
        if next_upper {
            parts.push(format!("{}.", &text[start..m.start()]));
            start = m.end();
        }
    }

    let tail = &text[start..];
    if tail.ends_with('.') {
        parts.push(tail.to_string());
    } else {
        parts.push(format!("{tail}."));
    }
    parts
}

/// File name reduced to its first ASCII alphanumerics.
fn file_prefix(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(ID_FILE_PREFIX)
        .collect()
}

/// Splits documents into chunks according to `config`.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk_documents(&self, documents: &[SourceDocument]) -> Vec<DocumentChunk> {
        documents
            .iter()
            .enumerate()
            .flat_map(|(position, doc)| self.chunk_document(doc, position))
            .collect()
    }

    /// Chunks one document. `position` is its index in the batch and keeps
    /// ids unique across documents with similar names or equal text.
    pub fn chunk_document(&self, document: &SourceDocument, position: usize) -> Vec<DocumentChunk> {
        let normalized = document.text.replace("\r\n", "\n").replace('\r', "\n");
        let text = normalized.trim();
        if text.is_empty() {
            tracing::warn!(document = %document.name, "document is empty after normalization");
            return Vec::new();
        }

        let parts = self.split_parts(text);
        let prefix = format!("{}_{position}", file_prefix(&document.name));
        let mut chunks = Vec::with_capacity(parts.len());
        let mut skipped = 0usize;

        for (index, part) in parts.iter().enumerate() {
            let content = part.trim();
            if content.chars().count() < self.config.min_chunk_chars {
                skipped += 1;
                continue;
            }

            if content.chars().count() > self.config.max_chunk_chars {
                let segments = split_blocks(content, self.config.sub_chunk_chars);
                for (sub, segment) in segments.iter().enumerate() {
                    let segment = segment.trim();
                    if segment.chars().count() < self.config.min_chunk_chars {
                        continue;
                    }
                    let tag = identify_entity(segment);
                    let (entity_type, label) = if sub == 0 {
                        (tag.entity_type, tag.label)
                    } else {
                        (ENTITY_CONTINUATION, format!("{} (Cont. {})", tag.label, sub + 1))
                    };
                    chunks.push(make_chunk(
                        document,
                        format!("{prefix}_{index}_{sub}"),
                        segment,
                        entity_type,
                        label,
                    ));
                }
            } else {
                let tag = identify_entity(content);
                chunks.push(make_chunk(
                    document,
                    format!("{prefix}_{index}"),
                    content,
                    tag.entity_type,
                    tag.label,
                ));
            }
        }

        tracing::debug!(
            document = %document.name,
            parts = parts.len(),
            chunks = chunks.len(),
            skipped,
            "document chunked"
        );
        chunks
    }

    fn split_parts(&self, text: &str) -> Vec<String> {
        let length = text.chars().count();
        let mut parts: Vec<String> = PARAGRAPH_BREAK.split(text).map(str::to_string).collect();

        if parts.len() < MIN_PARAGRAPHS && length > self.config.fallback_block_chars {
            parts = split_blocks(text, self.config.fallback_block_chars)
                .into_iter()
                .map(str::to_string)
                .collect();
        }

        if parts.len() == 1 && length > self.config.sentence_split_chars {
            parts = split_sentences(text);
        }
        parts
    }
}

fn make_chunk(
    document: &SourceDocument,
    position: String,
    content: &str,
    entity_type: &str,
    label: String,
) -> DocumentChunk {
    let hash = calculate_hash(content);
    DocumentChunk {
        id: format!("chk_{position}_{}", &hash[..ID_HASH_PREFIX]),
        source: document.name.clone(),
        content: content.to_string(),
        tokens: content.split_whitespace().count(),
        entity_type: Some(entity_type.to_string()),
        entity_label: Some(label),
        keywords: Vec::new(),
        hash,
    }
}

/// Chunks `documents` with the default settings.
pub fn chunk_documents(documents: &[SourceDocument]) -> Vec<DocumentChunk> {
    Chunker::default().chunk_documents(documents)
}
