//! DOCX exporter built on docx-rs. One Heading1 paragraph per non-empty
//! section, one body paragraph per content line.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run, Style, StyleType};

use crate::errors::AppError;
use crate::generation::assembler::{ResumeDocument, DOCUMENT_TITLE};

const TITLE_STYLE: &str = "Title";
const HEADING_STYLE: &str = "Heading1";
/// Run sizes are in half-points.
const TITLE_SIZE: usize = 32;
const HEADING_SIZE: usize = 28;
const BODY_SIZE: usize = 22;
const HEADING_COLOR: &str = "00008B";

pub fn render_docx(document: &ResumeDocument) -> Result<Vec<u8>, AppError> {
    let mut docx = Docx::new()
        .add_style(
            Style::new(TITLE_STYLE, StyleType::Paragraph)
                .name("Title")
                .size(TITLE_SIZE)
                .bold(),
        )
        .add_style(
            Style::new(HEADING_STYLE, StyleType::Paragraph)
                .name("Heading 1")
                .size(HEADING_SIZE)
                .bold()
                .color(HEADING_COLOR),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(DOCUMENT_TITLE))
                .style(TITLE_STYLE),
        );

    for (section, content) in document.non_empty_sections() {
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(section.heading()))
                .style(HEADING_STYLE),
        );
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            docx = docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_text(line.trim()).size(BODY_SIZE)),
            );
        }
        // Spacer between sections.
        docx = docx.add_paragraph(Paragraph::new());
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| AppError::Export(format!("DOCX packaging failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generation::generator::GeneratedSection;
    use crate::generation::section::SectionType;
    use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};

    /// `(style id, text)` for every top-level paragraph.
    pub fn paragraphs(bytes: &[u8]) -> Vec<(Option<String>, String)> {
        let docx = read_docx(bytes).unwrap();
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => {
                    let text = p
                        .children
                        .iter()
                        .filter_map(|pc| match pc {
                            ParagraphChild::Run(run) => Some(
                                run.children
                                    .iter()
                                    .filter_map(|rc| match rc {
                                        RunChild::Text(t) => Some(t.text.clone()),
                                        _ => None,
                                    })
                                    .collect::<String>(),
                            ),
                            _ => None,
                        })
                        .collect::<String>();
                    let style = p.property.style.as_ref().map(|s| s.val.clone());
                    Some((style, text))
                }
                _ => None,
            })
            .collect()
    }

    fn document(skills: &str) -> ResumeDocument {
        let sections = SectionType::ALL
            .iter()
            .map(|s| GeneratedSection {
                section: *s,
                raw: String::new(),
                cleaned: match s {
                    SectionType::Skills => skills.to_string(),
                    other => format!("{} for a data engineer.", other.heading()),
                },
            })
            .collect();
        ResumeDocument::assemble(sections).unwrap()
    }

    #[test]
    fn test_docx_headings_use_heading1_in_order() {
        let bytes = render_docx(&document("Python, SQL.")).unwrap();
        let paras = paragraphs(&bytes);

        assert_eq!(paras[0], (Some(TITLE_STYLE.to_string()), DOCUMENT_TITLE.to_string()));

        let headings: Vec<String> = paras
            .iter()
            .filter(|(style, _)| style.as_deref() == Some(HEADING_STYLE))
            .map(|(_, text)| text.clone())
            .collect();
        let expected: Vec<String> = SectionType::ALL.iter().map(|s| s.heading().to_string()).collect();
        assert_eq!(headings, expected);
    }

    #[test]
    fn test_docx_omits_empty_section() {
        let bytes = render_docx(&document("  ")).unwrap();
        let paras = paragraphs(&bytes);
        assert!(paras.iter().all(|(_, text)| text != "Technical Skills"));
        assert!(paras.iter().any(|(_, text)| text == "Work Experience"));
    }

    #[test]
    fn test_docx_body_lines_become_paragraphs() {
        let bytes = render_docx(&document("Python.\nKubernetes.")).unwrap();
        let paras = paragraphs(&bytes);
        let texts: Vec<&str> = paras.iter().map(|(_, t)| t.as_str()).collect();
        assert!(texts.contains(&"Python."));
        assert!(texts.contains(&"Kubernetes."));
    }
}
