//! S3 storage for rendered export artifacts, keyed `resumes/{id}/{filename}`.

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{ExportArtifact, ExportFormat};

pub fn artifact_prefix(resume_id: Uuid) -> String {
    format!("resumes/{resume_id}")
}

pub fn artifact_key(prefix: &str, filename: &str) -> String {
    format!("{prefix}/{filename}")
}

/// API path that streams a stored artifact back to the client.
pub fn download_path(resume_id: Uuid, format: ExportFormat) -> String {
    format!("/api/v1/resumes/{resume_id}/download/{format}")
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub content_type: &'static str,
    pub size_bytes: usize,
    pub download_url: String,
}

pub async fn upload_artifacts(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    resume_id: Uuid,
    artifacts: Vec<ExportArtifact>,
) -> Result<Vec<StoredArtifact>, AppError> {
    let prefix = artifact_prefix(resume_id);
    let mut stored = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let key = artifact_key(&prefix, &artifact.filename);
        let size_bytes = artifact.bytes.len();

        s3.put_object()
            .bucket(bucket)
            .key(&key)
            .content_type(artifact.content_type())
            .body(ByteStream::from(artifact.bytes))
            .send()
            .await
            .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded {} ({} bytes) to s3://{}/{}", artifact.format, size_bytes, bucket, key);

        stored.push(StoredArtifact {
            format: artifact.format,
            content_type: artifact.format.content_type(),
            filename: artifact.filename,
            size_bytes,
            download_url: download_path(resume_id, artifact.format),
        });
    }

    Ok(stored)
}

/// Best-effort removal of uploaded artifacts whose résumé row was never
/// written. Failures are logged; returns how many objects were deleted.
pub async fn delete_artifacts(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    resume_id: Uuid,
    artifacts: &[StoredArtifact],
) -> usize {
    let prefix = artifact_prefix(resume_id);
    let mut deleted = 0;

    for artifact in artifacts {
        let key = artifact_key(&prefix, &artifact.filename);
        match s3.delete_object().bucket(bucket).key(&key).send().await {
            Ok(_) => deleted += 1,
            Err(e) => warn!("Failed to delete orphaned artifact s3://{}/{}: {}", bucket, key, e),
        }
    }

    deleted
}

pub async fn download_artifact(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
) -> Result<Bytes, AppError> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| {
            if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                AppError::NotFound(format!("Artifact {key} not found"))
            } else {
                AppError::S3(format!("download of {key} failed: {e}"))
            }
        })?;

    let data = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("reading {key} failed: {e}")))?;
    Ok(data.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::{BehaviorVersion, Region};
    use aws_sdk_s3::config::retry::RetryConfig;
    use aws_sdk_s3::config::Credentials;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn s3_client(server: &MockServer) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("minio", "minio123", None, None, "test"))
            .endpoint_url(server.uri())
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    fn stored(format: ExportFormat) -> StoredArtifact {
        StoredArtifact {
            format,
            filename: crate::export::export_filename("SRE", format),
            content_type: format.content_type(),
            size_bytes: 1,
            download_url: download_path(Uuid::nil(), format),
        }
    }

    #[test]
    fn test_keys_nest_under_resume_prefix() {
        let id = Uuid::nil();
        let prefix = artifact_prefix(id);
        assert_eq!(prefix, "resumes/00000000-0000-0000-0000-000000000000");
        assert_eq!(
            artifact_key(&prefix, "resume_sre.pdf"),
            "resumes/00000000-0000-0000-0000-000000000000/resume_sre.pdf"
        );
    }

    #[test]
    fn test_download_path_uses_format_extension() {
        assert_eq!(
            download_path(Uuid::nil(), ExportFormat::Docx),
            "/api/v1/resumes/00000000-0000-0000-0000-000000000000/download/docx"
        );
    }

    #[tokio::test]
    async fn test_delete_artifacts_removes_every_uploaded_key() {
        let server = MockServer::start().await;
        for filename in ["resume_sre.txt", "resume_sre.pdf", "resume_sre.docx"] {
            Mock::given(method("DELETE"))
                .and(path(format!(
                    "/resumes/resumes/00000000-0000-0000-0000-000000000000/{filename}"
                )))
                .respond_with(ResponseTemplate::new(204))
                .expect(1)
                .mount(&server)
                .await;
        }

        let artifacts: Vec<StoredArtifact> = ExportFormat::ALL.iter().copied().map(stored).collect();
        let deleted = delete_artifacts(&s3_client(&server), "resumes", Uuid::nil(), &artifacts).await;
        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn test_delete_artifacts_tolerates_failures() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let artifacts = vec![stored(ExportFormat::Pdf)];
        let deleted = delete_artifacts(&s3_client(&server), "resumes", Uuid::nil(), &artifacts).await;
        assert_eq!(deleted, 0);
    }
}
