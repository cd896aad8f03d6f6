//! Section Generator: builds the section prompt, calls the model once and cleans the output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::cleaner::clean_text;
use crate::generation::prompts::build_section_prompt;
use crate::generation::section::SectionType;
use crate::llm_client::{GenerateOptions, ModelClient};

/// Fixed sampling configuration shared by every section call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens.
    pub max_length: u32,
    pub sampling_enabled: bool,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 400,
            sampling_enabled: true,
            temperature: 0.8,
            top_p: 0.9,
            repetition_penalty: 1.2,
        }
    }
}

impl GenerationConfig {
    /// With sampling disabled the server decodes greedily.
    pub fn to_options(&self) -> GenerateOptions {
        let (temperature, top_p) = if self.sampling_enabled {
            (self.temperature, self.top_p)
        } else {
            (0.0, 1.0)
        };
        GenerateOptions {
            num_predict: self.max_length,
            temperature,
            top_p,
            repeat_penalty: self.repetition_penalty,
        }
    }
}

/// Text-generation capability. Returns the first candidate only.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ModelGenerator (model-server backed)
// ────────────────────────────────────────────────────────────────────────────

pub struct ModelGenerator {
    client: ModelClient,
    model: String,
}

impl ModelGenerator {
    pub fn new(client: ModelClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ModelGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, AppError> {
        let response = self
            .client
            .generate(&self.model, prompt, &config.to_options())
            .await
            .map_err(|e| AppError::Generation(format!("model '{}': {e}", self.model)))?;
        Ok(response.response)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section generation
// ────────────────────────────────────────────────────────────────────────────

/// Raw model output for one section and its cleaned counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSection {
    pub section: SectionType,
    pub raw: String,
    pub cleaned: String,
}

/// Generates and cleans one section. A failure names the section and aborts
/// the caller's request.
pub async fn generate_section(
    generator: &dyn TextGenerator,
    job_role: &str,
    context: &str,
    section: SectionType,
    config: &GenerationConfig,
) -> Result<GeneratedSection, AppError> {
    let prompt = build_section_prompt(section, job_role, context);

    let raw = generator
        .generate(&prompt, config)
        .await
        .map_err(|e| match e {
            AppError::Generation(msg) => AppError::Generation(format!("{section} section: {msg}")),
            other => other,
        })?;
    let cleaned = clean_text(&raw);

    info!(
        "Generated {} section ({} chars raw, {} chars cleaned)",
        section,
        raw.len(),
        cleaned.len()
    );

    Ok(GeneratedSection {
        section,
        raw,
        cleaned,
    })
}
