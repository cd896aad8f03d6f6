//! Axum route handlers for the Generation API.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::storage::{
    artifact_key, artifact_prefix, delete_artifacts, download_artifact, upload_artifacts,
    StoredArtifact,
};
use crate::export::{export_filename, render_all, ExportFormat};
use crate::generation::assembler::SectionView;
use crate::generation::generator::GenerationConfig;
use crate::generation::pipeline::{
    run_pipeline, ExperienceLevel, GenerateRequest, Industry, PipelineOutcome, USAGE_INSTRUCTIONS,
};
use crate::models::resume::{fetch_resume, insert_resume, NewResume, ResumeRow};
use crate::retrieval::context::RagDebugInfo;
use crate::retrieval::skills::detect_skills;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateResponse {
    AwaitingInput { instructions: Vec<&'static str> },
    Generated(Box<GeneratedResume>),
}

#[derive(Debug, Serialize)]
pub struct GeneratedResume {
    pub resume_id: Uuid,
    pub job_role: String,
    pub experience_level: Option<ExperienceLevel>,
    pub industry: Option<Industry>,
    pub detected_skills: Vec<&'static str>,
    pub sections: Vec<SectionView>,
    pub full_text: String,
    pub downloads: Vec<StoredArtifact>,
    pub rag_debug: RagDebugInfo,
}

#[derive(Debug, Deserialize)]
pub struct SkillsQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub query: String,
    pub skills: Vec<&'static str>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/generate
///
/// Full pipeline: skills → retrieval → five sections → exports → S3 → DB row.
/// A blank role returns the usage instructions instead of an error.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if request.job_role.trim().is_empty() {
        return Ok(Json(awaiting_input()));
    }

    let loaded = state.resources.loaded().await?;
    let outcome =
        match run_pipeline(&request, loaded.capabilities(), &GenerationConfig::default()).await? {
            PipelineOutcome::Generated(outcome) => outcome,
            PipelineOutcome::AwaitingInput => return Ok(Json(awaiting_input())),
        };

    let resume_id = Uuid::new_v4();
    let artifacts = render_all(&outcome.document, &outcome.job_role)?;
    let downloads = upload_artifacts(&state.s3, &state.s3_bucket, resume_id, artifacts).await?;

    let inserted = insert_resume(
        &state.db,
        &NewResume {
            id: resume_id,
            outcome: &outcome,
            experience_level: request.experience_level.map(|l| l.label()),
            industry: request.industry.map(|i| i.label()),
            s3_prefix: Some(artifact_prefix(resume_id)),
        },
    )
    .await;

    if let Err(e) = inserted {
        // Uploaded objects with no row pointing at them are unreachable.
        let removed = delete_artifacts(&state.s3, &state.s3_bucket, resume_id, &downloads).await;
        warn!("Resume {} not persisted; removed {} of {} uploaded artifacts", resume_id, removed, downloads.len());
        return Err(e.into());
    }

    info!("Resume {} persisted for '{}'", resume_id, outcome.job_role);

    let outcome = *outcome;
    Ok(Json(GenerateResponse::Generated(Box::new(GeneratedResume {
        resume_id,
        job_role: outcome.job_role,
        experience_level: request.experience_level,
        industry: request.industry,
        detected_skills: outcome.detected_skills,
        sections: outcome.document.views(),
        full_text: outcome.document.to_plain_text(),
        downloads,
        rag_debug: outcome.rag_debug,
    }))))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    let resume = fetch_resume(&state.db, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;
    Ok(Json(resume))
}

/// GET /api/v1/resumes/:id/download/:format
///
/// Streams the stored artifact back with an attachment disposition.
pub async fn handle_download(
    State(state): State<AppState>,
    Path((resume_id, format)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format.parse()?;

    let resume = fetch_resume(&state.db, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;
    let prefix = resume
        .s3_prefix
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} has no stored exports")))?;

    let filename = export_filename(&resume.job_role, format);
    let bytes = download_artifact(&state.s3, &state.s3_bucket, &artifact_key(&prefix, &filename)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/skills/detect?query=...
pub async fn handle_detect_skills(Query(params): Query<SkillsQuery>) -> Json<SkillsResponse> {
    let skills = detect_skills(&params.query);
    Json(SkillsResponse {
        query: params.query,
        skills,
    })
}

fn awaiting_input() -> GenerateResponse {
    GenerateResponse::AwaitingInput {
        instructions: USAGE_INSTRUCTIONS.to_vec(),
    }
}
