//! PostgreSQL + pgvector Snippet Store.
//!
//! Similarity is the store's own metric: cosine distance (`<=>`) served by an
//! HNSW index. Vectors are bound as pgvector text literals and cast in SQL.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::db::ensure_schema;
use crate::retrieval::embedder::EMBEDDING_DIM;
use crate::retrieval::store::{validate_batch, SnippetStore, StoreError};

pub struct PgSnippetStore {
    pool: PgPool,
    collection: String,
}

impl PgSnippetStore {
    /// Opens the named collection, creating the schema on first use.
    pub async fn load_or_create(pool: PgPool, collection: &str) -> Result<Self, StoreError> {
        ensure_schema(&pool).await?;

        let store = Self {
            pool,
            collection: collection.to_string(),
        };
        info!(
            "Snippet collection '{}' ready ({} snippets)",
            store.collection,
            store.count().await?
        );
        Ok(store)
    }
}

#[async_trait]
impl SnippetStore for PgSnippetStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn add(
        &self,
        documents: &[String],
        embeddings: &[Vec<f32>],
        ids: &[String],
    ) -> Result<usize, StoreError> {
        validate_batch(documents, embeddings, ids, EMBEDDING_DIM)?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0_u64;

        for ((document, embedding), id) in documents.iter().zip(embeddings).zip(ids) {
            let result = sqlx::query(
                r#"
                INSERT INTO snippets (collection, id, document, embedding)
                VALUES ($1, $2, $3, $4::vector)
                ON CONFLICT (collection, id) DO NOTHING
                "#,
            )
            .bind(&self.collection)
            .bind(id)
            .bind(document)
            .bind(vector_literal(embedding))
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted as usize)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<String>, StoreError> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(StoreError::InvalidEmbedding {
                id: "<query>".to_string(),
                expected: EMBEDDING_DIM,
                actual: embedding.len(),
            });
        }

        let documents = sqlx::query_scalar::<_, String>(NEAREST_SNIPPETS_SQL)
        .bind(&self.collection)
        .bind(vector_literal(embedding))
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snippets WHERE collection = $1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM snippets WHERE collection = $1")
            .bind(&self.collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }
}

/// Formats a vector as a pgvector literal: `[0.1,0.2,...]`.
/// The inner `ORDER BY` must stay a bare distance so pgvector can serve it from
/// the HNSW index; the id tiebreak is applied to the k rows it returns.
const NEAREST_SNIPPETS_SQL: &str = r#"
    WITH nearest AS (
        SELECT id, document, embedding <=> $2::vector AS distance
        FROM snippets
        WHERE collection = $1
        ORDER BY embedding <=> $2::vector
        LIMIT $3
    )
    SELECT document FROM nearest
    ORDER BY distance, id
"#;

fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, value) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&value.to_string());
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal_format() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
    }

    #[test]
    fn test_vector_literal_empty() {
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_nearest_query_orders_by_bare_distance_before_limit() {
        let sql = NEAREST_SNIPPETS_SQL.split_whitespace().collect::<Vec<_>>().join(" ");
        assert!(sql.contains("ORDER BY embedding <=> $2::vector LIMIT $3"));
        assert!(sql.ends_with("ORDER BY distance, id"));
    }
}
