//! In-memory vector store keyed by entry id.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::Embedding;

/// One stored vector with its payload.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Payload returned on a hit (category id, FAQ answer, ...)
    pub label: String,
    /// Text the embedding was computed from
    pub text: String,
    /// Embedding vector
    pub embedding: Embedding,
}

/// Search hit
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    /// Entry id
    pub id: String,
    /// Entry payload
    pub label: String,
    /// Entry text
    pub text: String,
    /// Cosine similarity with the query
    pub score: f32,
}

/// In-memory vector database.
///
/// Entries are keyed by id, so inserting an existing id replaces it. Ids are
/// kept ordered to make equal-score hits come back in a stable order.
#[derive(Debug, Default)]
pub struct VectorStore {
    entries: BTreeMap<String, StoredEntry>,
}

impl VectorStore {
    /// Insert or replace an entry
    pub fn upsert(&mut self, id: String, entry: StoredEntry) {
        self.entries.insert(id, entry);
    }

    /// Whether an entry with `id` exists
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// The `top_k` entries most similar to the query embedding
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredEntry> {
        let mut scores: Vec<(&String, &StoredEntry, f32)> = self
            .entries
            .iter()
            .map(|(id, entry)| (id, entry, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        scores.sort_by(|first, second| second.2.partial_cmp(&first.2).unwrap_or(Ordering::Equal));

        scores
            .into_iter()
            .take(top_k)
            .map(|(id, entry, score)| ScoredEntry {
                id: id.clone(),
                label: entry.label.clone(),
                text: entry.text.clone(),
                score,
            })
            .collect()
    }

    /// Get number of stored embeddings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(vector_a: &[f32], vector_b: &[f32]) -> f32 {
    if vector_a.len() != vector_b.len() {
        return 0.0;
    }

    let dot_product: f32 = vector_a
        .iter()
        .zip(vector_b.iter())
        .map(|(left, right)| left * right)
        .sum();
    let magnitude_a = vector_a.iter().map(|value| value * value).sum::<f32>().sqrt();
    let magnitude_b = vector_b.iter().map(|value| value * value).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
