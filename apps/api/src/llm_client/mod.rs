/// Model client: the single point of entry for all model-server calls.
///
/// ARCHITECTURAL RULE: No other module may call the model server directly.
/// Embedding and generation both go through this module; the retrieval and
/// generation layers only see the `Embedder` / `TextGenerator` traits.
///
/// Speaks the Ollama HTTP API (`/api/embed`, `/api/generate`, `/api/show`).
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Model '{0}' is not available on the model server")]
    ModelNotFound(String),

    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),
}

/// Sampling options forwarded verbatim to the model server.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repeat_penalty: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    #[serde(default)]
    details: Option<ModelDetails>,
}

#[derive(Debug, Deserialize)]
struct ModelDetails {
    #[serde(default)]
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// The single model-server client shared by the embedder and the generator.
/// Retries connection failures, 429 and 5xx with exponential backoff.
#[derive(Clone)]
pub struct ModelClient {
    client: Client,
    base_url: String,
    backoff: Duration,
}

impl ModelClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Overrides the first retry delay; later retries double it.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Single-shot, non-streaming completion.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerateResponse, LlmError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options,
        };
        let response: GenerateResponse = self.post_json("/api/generate", &body).await?;

        debug!(
            "Generation succeeded: model={}, prompt_tokens={:?}, output_tokens={:?}",
            model, response.prompt_eval_count, response.eval_count
        );

        Ok(response)
    }

    /// Embeds a batch of texts. Output order matches input order.
    pub async fn embed(&self, model: &str, inputs: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbedRequest {
            model,
            input: inputs,
        };
        let response: EmbedResponse = self.post_json("/api/embed", &body).await?;

        if response.embeddings.len() != inputs.len() {
            return Err(LlmError::UnexpectedShape(format!(
                "requested {} embeddings, received {}",
                inputs.len(),
                response.embeddings.len()
            )));
        }

        Ok(response.embeddings)
    }

    /// Confirms the model is present on the server. Used as the "load" step of
    /// the lazily-initialised model handles.
    pub async fn ensure_model(&self, model: &str) -> Result<(), LlmError> {
        let body = ShowRequest { model };
        match self.post_json::<_, ShowResponse>("/api/show", &body).await {
            Ok(show) => {
                debug!(
                    "Model {} available (family: {:?})",
                    model,
                    show.details.and_then(|d| d.family)
                );
                Ok(())
            }
            Err(LlmError::Api { status: 404, .. }) => Err(LlmError::ModelNotFound(model.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "Model server call to {} failed (attempt {}), retrying after {}ms...",
                    path,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Model server rate limited call to {}", path);
                last_error = Some(LlmError::RateLimited {
                    retries: MAX_RETRIES,
                });
                continue;
            }

            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Model server returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|e| e.error)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes).map_err(LlmError::Parse);
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::UnexpectedShape(format!("no attempt made to call {path}"))))
    }
}
