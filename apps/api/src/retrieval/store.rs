//! Snippet Store: persisted snippet collection queried by embedding similarity.
//!
//! `PgSnippetStore` (pgvector) is the production backend; `InMemorySnippetStore`
//! ranks by exact cosine similarity and backs tests and offline CLI runs.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;

/// A stored résumé snippet. Immutable once added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("batch length mismatch: {documents} documents, {embeddings} embeddings, {ids} ids")]
    LengthMismatch {
        documents: usize,
        embeddings: usize,
        ids: usize,
    },

    #[error("embedding for '{id}' has {actual} dimensions, expected {expected}")]
    InvalidEmbedding {
        id: String,
        expected: usize,
        actual: usize,
    },
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Retrieval(e.to_string())
    }
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    fn collection(&self) -> &str;

    /// Adds a batch. Ids already present are left untouched; returns the number
    /// of snippets actually inserted.
    async fn add(
        &self,
        documents: &[String],
        embeddings: &[Vec<f32>],
        ids: &[String],
    ) -> Result<usize, StoreError>;

    /// Up to `k` documents, most similar first.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Removes every snippet in the collection; returns how many were removed.
    async fn clear(&self) -> Result<usize, StoreError>;
}

/// Checks that a batch is aligned and every vector has `dimension` entries.
pub fn validate_batch(
    documents: &[String],
    embeddings: &[Vec<f32>],
    ids: &[String],
    dimension: usize,
) -> Result<(), StoreError> {
    if documents.len() != embeddings.len() || documents.len() != ids.len() {
        return Err(StoreError::LengthMismatch {
            documents: documents.len(),
            embeddings: embeddings.len(),
            ids: ids.len(),
        });
    }

    for (id, embedding) in ids.iter().zip(embeddings) {
        if embedding.len() != dimension {
            return Err(StoreError::InvalidEmbedding {
                id: id.clone(),
                expected: dimension,
                actual: embedding.len(),
            });
        }
    }

    Ok(())
}

/// Cosine similarity in [-1, 1]; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

// ────────────────────────────────────────────────────────────────────────────
// InMemorySnippetStore
// ────────────────────────────────────────────────────────────────────────────

pub struct InMemorySnippetStore {
    collection: String,
    dimension: usize,
    snippets: RwLock<Vec<Snippet>>,
}

impl InMemorySnippetStore {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            snippets: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Snippet>> {
        self.snippets.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Snippet>> {
        self.snippets.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SnippetStore for InMemorySnippetStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn add(
        &self,
        documents: &[String],
        embeddings: &[Vec<f32>],
        ids: &[String],
    ) -> Result<usize, StoreError> {
        validate_batch(documents, embeddings, ids, self.dimension)?;

        let mut snippets = self.write();
        let mut inserted = 0;
        for ((document, embedding), id) in documents.iter().zip(embeddings).zip(ids) {
            if snippets.iter().any(|s| &s.id == id) {
                continue;
            }
            snippets.push(Snippet {
                id: id.clone(),
                document: document.clone(),
                embedding: embedding.clone(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>, StoreError> {
        if embedding.len() != self.dimension {
            return Err(StoreError::InvalidEmbedding {
                id: "<query>".to_string(),
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let snippets = self.read();
        let mut scored: Vec<(f32, &Snippet)> = snippets
            .iter()
            .map(|s| (cosine_similarity(embedding, &s.embedding), s))
            .collect();
        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, s)| s.document.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read().len())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut snippets = self.write();
        let removed = snippets.len();
        snippets.clear();
        Ok(removed)
    }
}
