use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::resources::Resources;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub s3_bucket: String,
    /// Lazily-loaded models and snippet store, shared across requests.
    pub resources: Arc<Resources>,
}
