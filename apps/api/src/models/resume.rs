use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::generation::pipeline::ResumeOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub job_role: String,
    pub experience_level: Option<String>,
    pub industry: Option<String>,
    pub detected_skills: Vec<String>,
    /// `ResumeDocument` as JSON.
    pub sections: Value,
    pub context: String,
    pub retrieved_count: i32,
    pub s3_prefix: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values written for a freshly generated résumé.
#[derive(Debug, Clone)]
pub struct NewResume<'a> {
    pub id: Uuid,
    pub outcome: &'a ResumeOutcome,
    pub experience_level: Option<&'static str>,
    pub industry: Option<&'static str>,
    pub s3_prefix: Option<String>,
}

pub async fn insert_resume(pool: &PgPool, resume: &NewResume<'_>) -> Result<ResumeRow, sqlx::Error> {
    let sections = serde_json::to_value(&resume.outcome.document)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    let skills: Vec<String> = resume
        .outcome
        .detected_skills
        .iter()
        .map(|s| s.to_string())
        .collect();

    sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, job_role, experience_level, industry, detected_skills, sections,
             context, retrieved_count, s3_prefix)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(resume.id)
    .bind(&resume.outcome.job_role)
    .bind(resume.experience_level)
    .bind(resume.industry)
    .bind(&skills)
    .bind(&sections)
    .bind(&resume.outcome.context)
    .bind(resume.outcome.rag_debug.retrieved_count as i32)
    .bind(&resume.s3_prefix)
    .fetch_one(pool)
    .await
}

pub async fn fetch_resume(pool: &PgPool, id: Uuid) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
