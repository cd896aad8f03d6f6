//! Resume Assembler: canonical-order aggregation of cleaned sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::generator::GeneratedSection;
use crate::generation::section::SectionType;

/// Title shared by every export format.
pub const DOCUMENT_TITLE: &str = "Professional Resume";

/// Cleaned content keyed by section. Iteration is always canonical order,
/// whatever order the sections were generated in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    sections: BTreeMap<SectionType, String>,
}

/// A single section as exposed to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub section: SectionType,
    pub heading: &'static str,
    pub content: String,
}

impl ResumeDocument {
    /// Builds a document from exactly one generated section per type.
    pub fn assemble(generated: Vec<GeneratedSection>) -> Result<Self, AppError> {
        let mut sections = BTreeMap::new();
        for g in generated {
            if sections.insert(g.section, g.cleaned).is_some() {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "section '{}' generated more than once",
                    g.section
                )));
            }
        }

        if let Some(missing) = SectionType::ALL.iter().find(|s| !sections.contains_key(*s)) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "section '{missing}' was not generated"
            )));
        }

        Ok(Self { sections })
    }

    pub fn get(&self, section: SectionType) -> &str {
        self.sections.get(&section).map(String::as_str).unwrap_or("")
    }

    /// All five sections in canonical order, empty ones included.
    pub fn sections(&self) -> impl Iterator<Item = (SectionType, &str)> + '_ {
        SectionType::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Sections with content, in canonical order. Section-aware exporters skip
    /// empty sections entirely.
    pub fn non_empty_sections(&self) -> impl Iterator<Item = (SectionType, &str)> + '_ {
        self.sections().filter(|(_, content)| !content.trim().is_empty())
    }

    pub fn views(&self) -> Vec<SectionView> {
        self.sections()
            .map(|(section, content)| SectionView {
                section,
                heading: section.heading(),
                content: content.to_string(),
            })
            .collect()
    }

    /// Flat text form. Every heading is present even when its section is empty.
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("# {DOCUMENT_TITLE}\n");
        for (section, content) in self.sections() {
            out.push_str(&format!("\n## {}\n{}\n", section.heading(), content));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated(section: SectionType, text: &str) -> GeneratedSection {
        GeneratedSection {
            section,
            raw: text.to_string(),
            cleaned: text.to_string(),
        }
    }

    fn full_out_of_order() -> Vec<GeneratedSection> {
        vec![
            generated(SectionType::Education, "BSc Computer Science."),
            generated(SectionType::Skills, "Python, SQL."),
            generated(SectionType::Summary, "Backend engineer."),
            generated(SectionType::Projects, "Payments platform."),
            generated(SectionType::Experience, "Led API team."),
        ]
    }

    #[test]
    fn test_sections_iterate_in_canonical_order() {
        let doc = ResumeDocument::assemble(full_out_of_order()).unwrap();
        let order: Vec<SectionType> = doc.sections().map(|(s, _)| s).collect();
        assert_eq!(order, SectionType::ALL.to_vec());
    }

    #[test]
    fn test_plain_text_headings_in_canonical_order() {
        let doc = ResumeDocument::assemble(full_out_of_order()).unwrap();
        let text = doc.to_plain_text();

        let positions: Vec<usize> = [
            "## Professional Summary",
            "## Work Experience",
            "## Technical Skills",
            "## Key Projects",
            "## Education",
        ]
        .iter()
        .map(|h| text.find(h).unwrap_or_else(|| panic!("missing {h}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.starts_with("# Professional Resume\n"));
        assert!(text.contains("## Professional Summary\nBackend engineer.\n"));
    }

    #[test]
    fn test_plain_text_keeps_heading_of_empty_section() {
        let mut sections = full_out_of_order();
        sections[3] = generated(SectionType::Projects, "");
        let doc = ResumeDocument::assemble(sections).unwrap();

        assert!(doc.to_plain_text().contains("## Key Projects\n\n"));
        assert!(doc
            .non_empty_sections()
            .all(|(s, _)| s != SectionType::Projects));
        assert_eq!(doc.non_empty_sections().count(), 4);
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let mut sections = full_out_of_order();
        sections.pop();
        assert!(ResumeDocument::assemble(sections).is_err());
    }

    #[test]
    fn test_duplicate_section_is_rejected() {
        let mut sections = full_out_of_order();
        sections.push(generated(SectionType::Summary, "Again."));
        assert!(ResumeDocument::assemble(sections).is_err());
    }

    #[test]
    fn test_document_round_trips_through_json() {
        let doc = ResumeDocument::assemble(full_out_of_order()).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["sections"]["summary"], "Backend engineer.");
        let back: ResumeDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
