use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Idempotent schema bootstrap, one statement per entry.
const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS vector",
    r#"
    CREATE TABLE IF NOT EXISTS snippets (
        collection  TEXT        NOT NULL,
        id          TEXT        NOT NULL,
        document    TEXT        NOT NULL,
        embedding   vector(384) NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS snippets_embedding_hnsw
        ON snippets USING hnsw (embedding vector_cosine_ops)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resumes (
        id               UUID        PRIMARY KEY,
        job_role         TEXT        NOT NULL,
        experience_level TEXT,
        industry         TEXT,
        detected_skills  TEXT[]      NOT NULL DEFAULT '{}',
        sections         JSONB       NOT NULL,
        context          TEXT        NOT NULL,
        retrieved_count  INT         NOT NULL,
        s3_prefix        TEXT,
        created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Creates the pgvector extension and the snippet / résumé tables if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    Ok(())
}
