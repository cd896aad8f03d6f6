//! Request orchestration: skills → retrieval → five-way section fan-out → assembly.
//!
//! The five section calls share only the read-only context string and run
//! concurrently. The first failure aborts the request; no partial resume is
//! ever returned.

use clap::ValueEnum;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::assembler::ResumeDocument;
use crate::generation::generator::{generate_section, GenerationConfig, TextGenerator};
use crate::generation::section::SectionType;
use crate::retrieval::context::{assemble_context, RagDebugInfo, TOP_K};
use crate::retrieval::embedder::Embedder;
use crate::retrieval::skills::detect_skills;
use crate::retrieval::store::SnippetStore;

/// Shown instead of generating when no job role was supplied.
pub const USAGE_INSTRUCTIONS: [&str; 4] = [
    "Enter the job role you are targeting, e.g. \"Senior Python Developer\".",
    "Optionally choose an experience level and an industry focus.",
    "Submit to generate the five resume sections from matching snippets.",
    "Download the result as TXT, PDF or DOCX.",
];

/// Collected from the user and echoed back. Not consumed by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry Level")]
    #[value(name = "entry")]
    Entry,
    #[serde(rename = "Mid Level")]
    #[value(name = "mid")]
    Mid,
    #[serde(rename = "Senior Level")]
    #[value(name = "senior")]
    Senior,
    #[serde(rename = "Lead/Manager")]
    #[value(name = "lead")]
    Lead,
}

/// Collected from the user and echoed back. Not consumed by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Industry {
    Technology,
    Finance,
    Healthcare,
    #[serde(rename = "E-commerce")]
    #[value(name = "e-commerce")]
    Ecommerce,
    Education,
    General,
}

impl ExperienceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level",
            ExperienceLevel::Mid => "Mid Level",
            ExperienceLevel::Senior => "Senior Level",
            ExperienceLevel::Lead => "Lead/Manager",
        }
    }
}

impl Industry {
    pub fn label(&self) -> &'static str {
        match self {
            Industry::Technology => "Technology",
            Industry::Finance => "Finance",
            Industry::Healthcare => "Healthcare",
            Industry::Ecommerce => "E-commerce",
            Industry::Education => "Education",
            Industry::General => "General",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub industry: Option<Industry>,
}

/// Borrowed capabilities for one pipeline run.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub embedder: &'a dyn Embedder,
    pub store: &'a dyn SnippetStore,
    pub generator: &'a dyn TextGenerator,
}

#[derive(Debug, Clone)]
pub struct ResumeOutcome {
    pub job_role: String,
    pub detected_skills: Vec<&'static str>,
    pub context: String,
    pub document: ResumeDocument,
    pub rag_debug: RagDebugInfo,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// Blank role: nothing was generated.
    AwaitingInput,
    Generated(Box<ResumeOutcome>),
}

/// Runs one generation request end to end.
pub async fn run_pipeline(
    request: &GenerateRequest,
    caps: Capabilities<'_>,
    config: &GenerationConfig,
) -> Result<PipelineOutcome, AppError> {
    let job_role = request.job_role.trim();
    if job_role.is_empty() {
        info!("Empty job role; returning usage instructions");
        return Ok(PipelineOutcome::AwaitingInput);
    }

    let detected_skills = detect_skills(job_role);
    info!("Detected skills for '{}': {:?}", job_role, detected_skills);

    let retrieval = assemble_context(job_role, caps.embedder, caps.store, TOP_K).await?;
    let context = retrieval.context();

    let generated = try_join_all(
        SectionType::ALL
            .into_iter()
            .map(|section| generate_section(caps.generator, job_role, &context, section, config)),
    )
    .await?;

    let document = ResumeDocument::assemble(generated)?;
    let rag_debug = RagDebugInfo::new(&retrieval, &context);

    info!(
        "Resume generated for '{}' from {} retrieved snippets",
        job_role,
        rag_debug.retrieved_count
    );

    Ok(PipelineOutcome::Generated(Box::new(ResumeOutcome {
        job_role: job_role.to_string(),
        detected_skills,
        context,
        document,
        rag_debug,
    })))
}
