// Export: renders an assembled resume as TXT, PDF or DOCX.
// Rendering is pure; `storage` moves the rendered bytes to and from S3.

pub mod docx;
pub mod font_metrics;
pub mod pdf;
pub mod storage;
pub mod text;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::assembler::ResumeDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Txt, ExportFormat::Pdf, ExportFormat::Docx];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(AppError::Validation(format!(
                "unsupported export format '{other}' (expected txt, pdf or docx)"
            ))),
        }
    }
}

/// `resume_{role}.{ext}` with whitespace replaced by underscores and the role lowercased.
pub fn export_filename(job_role: &str, format: ExportFormat) -> String {
    let slug: String = job_role
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase();
    format!("resume_{slug}.{}", format.extension())
}

/// A rendered file ready to be stored or streamed.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

pub fn render(document: &ResumeDocument, format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Txt => Ok(text::render_text(document).into_bytes()),
        ExportFormat::Pdf => pdf::render_pdf(document),
        ExportFormat::Docx => docx::render_docx(document),
    }
}

/// Renders every format. Any failure aborts the whole export.
pub fn render_all(document: &ResumeDocument, job_role: &str) -> Result<Vec<ExportArtifact>, AppError> {
    ExportFormat::ALL
        .into_iter()
        .map(|format| {
            Ok(ExportArtifact {
                format,
                filename: export_filename(job_role, format),
                bytes: render(document, format)?,
            })
        })
        .collect()
}
