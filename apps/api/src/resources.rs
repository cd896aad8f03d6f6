//! Process-wide model and store handles.
//!
//! Each handle is built on first use and memoised for the life of the process.
//! The first caller pays the availability check against the model server (or
//! the schema bootstrap for the store); later callers get the same `Arc`.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::generation::generator::{ModelGenerator, TextGenerator};
use crate::generation::pipeline::Capabilities;
use crate::llm_client::ModelClient;
use crate::retrieval::embedder::{CachedEmbedder, Embedder, ModelEmbedder};
use crate::retrieval::pg_store::PgSnippetStore;
use crate::retrieval::store::SnippetStore;

pub struct Resources {
    client: ModelClient,
    embedding_model: String,
    generation_model: String,
    collection: String,
    db: Option<PgPool>,
    redis: Option<redis::Client>,
    cache_ttl_secs: u64,
    embedder: OnceCell<Arc<dyn Embedder>>,
    generator: OnceCell<Arc<dyn TextGenerator>>,
    store: OnceCell<Arc<dyn SnippetStore>>,
}

impl Resources {
    pub fn new(
        config: &Config,
        client: ModelClient,
        db: Option<PgPool>,
        redis: Option<redis::Client>,
    ) -> Self {
        Self {
            client,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            collection: config.snippet_collection.clone(),
            db,
            redis,
            cache_ttl_secs: config.embedding_cache_ttl_secs,
            embedder: OnceCell::new(),
            generator: OnceCell::new(),
            store: OnceCell::new(),
        }
    }

    /// Uses `store` instead of opening the PostgreSQL collection.
    pub fn with_store(mut self, store: Arc<dyn SnippetStore>) -> Self {
        self.store = OnceCell::new_with(Some(store));
        self
    }

    pub async fn embedder(&self) -> Result<Arc<dyn Embedder>, AppError> {
        self.embedder
            .get_or_try_init(|| async {
                self.probe(&self.embedding_model).await?;

                let model: Arc<dyn Embedder> = Arc::new(ModelEmbedder::new(
                    self.client.clone(),
                    self.embedding_model.clone(),
                ));
                let embedder: Arc<dyn Embedder> = match &self.redis {
                    Some(redis) => {
                        info!("Embedding cache enabled (ttl {}s)", self.cache_ttl_secs);
                        Arc::new(CachedEmbedder::new(model, redis.clone(), self.cache_ttl_secs))
                    }
                    None => model,
                };
                Ok::<_, AppError>(embedder)
            })
            .await
            .cloned()
    }

    pub async fn generator(&self) -> Result<Arc<dyn TextGenerator>, AppError> {
        self.generator
            .get_or_try_init(|| async {
                self.probe(&self.generation_model).await?;
                let generator: Arc<dyn TextGenerator> = Arc::new(ModelGenerator::new(
                    self.client.clone(),
                    self.generation_model.clone(),
                ));
                Ok::<_, AppError>(generator)
            })
            .await
            .cloned()
    }

    pub async fn snippet_store(&self) -> Result<Arc<dyn SnippetStore>, AppError> {
        self.store
            .get_or_try_init(|| async {
                let pool = self.db.clone().ok_or_else(|| {
                    AppError::Retrieval("no database configured for the snippet store".to_string())
                })?;
                let store = PgSnippetStore::load_or_create(pool, &self.collection).await?;
                let store: Arc<dyn SnippetStore> = Arc::new(store);
                Ok::<_, AppError>(store)
            })
            .await
            .cloned()
    }

    /// Resolves all three handles at once.
    pub async fn loaded(&self) -> Result<LoadedResources, AppError> {
        Ok(LoadedResources {
            embedder: self.embedder().await?,
            store: self.snippet_store().await?,
            generator: self.generator().await?,
        })
    }

    async fn probe(&self, model: &str) -> Result<(), AppError> {
        info!("Loading model '{}'...", model);
        self.client
            .ensure_model(model)
            .await
            .map_err(|e| AppError::ModelLoad(e.to_string()))?;
        info!("Model '{}' ready", model);
        Ok(())
    }
}

/// Owned handles for one request; borrow them as `Capabilities`.
pub struct LoadedResources {
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn SnippetStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl LoadedResources {
    pub fn capabilities(&self) -> Capabilities<'_> {
        Capabilities {
            embedder: self.embedder.as_ref(),
            store: self.store.as_ref(),
            generator: self.generator.as_ref(),
        }
    }
}
