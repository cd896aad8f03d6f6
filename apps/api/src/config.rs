use anyhow::{Context, Result};

const DEFAULT_MODEL_SERVER_URL: &str = "http://localhost:11434";
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_GENERATION_MODEL: &str = "flan-t5-large";
const DEFAULT_COLLECTION: &str = "resume_blocks";

/// Object storage settings. Only `serve` requires them; the CLI commands run without.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Not needed by `generate --offline-store`; see `require_database_url`.
    pub database_url: Option<String>,
    pub snippet_collection: String,
    /// Embedding cache is disabled when unset.
    pub redis_url: Option<String>,
    pub embedding_cache_ttl_secs: u64,
    pub s3: Option<S3Config>,
    pub model_server_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            snippet_collection: env_or("SNIPPET_COLLECTION", DEFAULT_COLLECTION),
            redis_url: optional_env("REDIS_URL"),
            embedding_cache_ttl_secs: env_or("EMBEDDING_CACHE_TTL_SECS", "86400")
                .parse::<u64>()
                .context("EMBEDDING_CACHE_TTL_SECS must be a whole number of seconds")?,
            s3: s3_from_env(),
            model_server_url: env_or("MODEL_SERVER_URL", DEFAULT_MODEL_SERVER_URL),
            embedding_model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            generation_model: env_or("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        match &self.database_url {
            Some(url) => Ok(url),
            None => anyhow::bail!("Required environment variable 'DATABASE_URL' is not set"),
        }
    }

    /// Returns the S3 settings or fails naming the first missing variable.
    pub fn require_s3(&self) -> Result<&S3Config> {
        match &self.s3 {
            Some(s3) => Ok(s3),
            None => {
                for key in S3_KEYS {
                    require_env(key)?;
                }
                anyhow::bail!("S3 configuration is incomplete")
            }
        }
    }
}

const S3_KEYS: [&str; 4] = [
    "S3_BUCKET",
    "S3_ENDPOINT",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
];

fn s3_from_env() -> Option<S3Config> {
    Some(S3Config {
        bucket: optional_env("S3_BUCKET")?,
        endpoint: optional_env("S3_ENDPOINT")?,
        access_key_id: optional_env("AWS_ACCESS_KEY_ID")?,
        secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY")?,
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: Option<&str>) -> Config {
        Config {
            database_url: database_url.map(str::to_string),
            snippet_collection: DEFAULT_COLLECTION.to_string(),
            redis_url: None,
            embedding_cache_ttl_secs: 86400,
            s3: None,
            model_server_url: DEFAULT_MODEL_SERVER_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_database_url_is_only_required_on_demand() {
        let offline = config(None);
        let err = offline.require_database_url().unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let online = config(Some("postgres://localhost/resumes"));
        assert_eq!(
            online.require_database_url().unwrap(),
            "postgres://localhost/resumes"
        );
    }
}
