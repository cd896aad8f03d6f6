//! Embedding capability: trait-based text → vector encoder.
//!
//! `ModelEmbedder` calls the model server through `llm_client`; `CachedEmbedder`
//! decorates any embedder with a Redis-backed cache for single-query lookups.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::ModelClient;

/// Output dimensionality of the default sentence-embedding model (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier; namespaces cached vectors.
    fn model(&self) -> &str;

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| AppError::Retrieval("embedding model returned no vector".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ModelEmbedder (model-server backed)
// ────────────────────────────────────────────────────────────────────────────

pub struct ModelEmbedder {
    client: ModelClient,
    model: String,
    dimension: usize,
}

impl ModelEmbedder {
    pub fn new(client: ModelClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            dimension: EMBEDDING_DIM,
        }
    }
}

#[async_trait]
impl Embedder for ModelEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        let vectors = self
            .client
            .embed(&self.model, texts)
            .await
            .map_err(|e| AppError::Retrieval(format!("Embedding call failed: {e}")))?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(AppError::Retrieval(format!(
                "embedding model '{}' produced {} dimensions, expected {}",
                self.model,
                bad.len(),
                self.dimension
            )));
        }

        Ok(vectors)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CachedEmbedder: key/value cache in front of any embedder
// ────────────────────────────────────────────────────────────────────────────

/// String key/value store with per-entry expiry, holding JSON-encoded vectors.
#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> redis::RedisResult<()>;
}

/// Redis-backed cache; the multiplexed connection is opened on first use.
pub struct RedisEmbeddingCache {
    client: redis::Client,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisEmbeddingCache {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        self.connection
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await
            .cloned()
    }
}

#[async_trait]
impl EmbeddingCache for RedisEmbeddingCache {
    async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> redis::RedisResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex(key, value, ttl_secs).await
    }
}

/// Caches single-text embeddings. Batch calls bypass the cache.
///
/// Cache failures are logged and ignored: a Redis outage degrades to uncached
/// embedding, never to a failed request.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Arc<dyn EmbeddingCache>,
    ttl_secs: u64,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, redis: redis::Client, ttl_secs: u64) -> Self {
        Self::with_cache(inner, Arc::new(RedisEmbeddingCache::new(redis)), ttl_secs)
    }

    pub fn with_cache(
        inner: Arc<dyn Embedder>,
        cache: Arc<dyn EmbeddingCache>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        self.inner.embed_batch(texts).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let key = cache_key(self.model(), text);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<Vec<f32>>(&cached) {
                Ok(vector) => {
                    debug!("Embedding cache hit: {key}");
                    return Ok(vector);
                }
                Err(e) => warn!("Discarding unreadable cached embedding {key}: {e}"),
            },
            Ok(None) => debug!("Embedding cache miss: {key}"),
            Err(e) => warn!("Embedding cache unavailable: {e}"),
        }

        let vector = self.inner.embed(text).await?;

        match serde_json::to_string(&vector) {
            Ok(serialized) => {
                if let Err(e) = self.cache.set(&key, &serialized, self.ttl_secs).await {
                    warn!("Failed to cache embedding {key}: {e}");
                }
            }
            Err(e) => warn!("Failed to serialize embedding for cache: {e}"),
        }

        Ok(vector)
    }
}

/// `embedding:{model}:{sha256(text)}`
pub fn cache_key(model: &str, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("embedding:{}:{}", model, hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::retrieval::context::tests::{letter_vector, LetterEmbedder};

    #[derive(Default)]
    struct MemoryCache {
        entries: Mutex<HashMap<String, (String, u64)>>,
    }

    impl MemoryCache {
        fn insert(&self, key: String, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key, (value.to_string(), 0));
        }

        fn entry(&self, key: &str) -> Option<(String, u64)> {
            self.entries.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl EmbeddingCache for MemoryCache {
        async fn get(&self, key: &str) -> redis::RedisResult<Option<String>> {
            Ok(self.entry(key).map(|(value, _)| value))
        }

        async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> redis::RedisResult<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl_secs));
            Ok(())
        }
    }

    /// Counts calls into `LetterEmbedder`.
    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &str {
            LetterEmbedder.model()
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LetterEmbedder.embed_batch(texts).await
        }
    }

    #[test]
    fn test_cache_key_is_namespaced_by_model() {
        let a = cache_key("all-minilm", "Rust engineer");
        let b = cache_key("nomic-embed-text", "Rust engineer");
        assert_ne!(a, b);
        assert!(a.starts_with("embedding:all-minilm:"));
        // sha256 hex digest
        assert_eq!(a.len(), "embedding:all-minilm:".len() + 64);
    }

    #[test]
    fn test_cache_key_is_stable() {
        assert_eq!(cache_key("m", "text"), cache_key("m", "text"));
        assert_ne!(cache_key("m", "text"), cache_key("m", "Text"));
    }

    #[tokio::test]
    async fn test_model_embedder_rejects_wrong_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.5, 0.5]]})),
            )
            .mount(&server)
            .await;

        let embedder = ModelEmbedder::new(ModelClient::new(server.uri()), "tiny");
        let err = embedder.embed("query").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_model_embedder_accepts_expected_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [vec![0.01_f32; EMBEDDING_DIM]]
            })))
            .mount(&server)
            .await;

        let embedder = ModelEmbedder::new(ModelClient::new(server.uri()), "all-minilm");
        let vector = embedder.embed("query").await.unwrap();
        assert_eq!(vector.len(), EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_inner_embedder() {
        let redis = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let embedder = CachedEmbedder::new(Arc::new(LetterEmbedder), redis, 60);

        let vector = embedder.embed("abc").await.unwrap();
        assert_eq!(vector, letter_vector("abc"));
    }

    #[tokio::test]
    async fn test_miss_stores_vector_and_next_call_hits() {
        let inner = Arc::new(CountingEmbedder::default());
        let cache = Arc::new(MemoryCache::default());
        let embedder = CachedEmbedder::with_cache(inner.clone(), cache.clone(), 3600);

        let first = embedder.embed("python developer").await.unwrap();
        let second = embedder.embed("python developer").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        let (stored, ttl) = cache
            .entry(&cache_key("letters", "python developer"))
            .unwrap();
        assert_eq!(serde_json::from_str::<Vec<f32>>(&stored).unwrap(), first);
        assert_eq!(ttl, 3600);
    }

    #[tokio::test]
    async fn test_cached_vector_is_returned_without_inner_call() {
        let inner = Arc::new(CountingEmbedder::default());
        let cache = Arc::new(MemoryCache::default());
        cache.insert(cache_key("letters", "abc"), "[0.25,0.5,1.0]");
        let embedder = CachedEmbedder::with_cache(inner.clone(), cache, 60);

        let vector = embedder.embed("abc").await.unwrap();
        assert_eq!(vector, vec![0.25, 0.5, 1.0]);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_cached_value_is_replaced() {
        let inner = Arc::new(CountingEmbedder::default());
        let cache = Arc::new(MemoryCache::default());
        let key = cache_key("letters", "abc");
        cache.insert(key.clone(), "not a vector");
        let embedder = CachedEmbedder::with_cache(inner.clone(), cache.clone(), 60);

        let vector = embedder.embed("abc").await.unwrap();
        assert_eq!(vector, letter_vector("abc"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        let (stored, _) = cache.entry(&key).unwrap();
        assert_eq!(serde_json::from_str::<Vec<f32>>(&stored).unwrap(), vector);
    }
}
