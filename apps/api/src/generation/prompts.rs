// Prompt templates for resume section generation, one per section type.
// Placeholders: {job_role}, {context}. Values are inserted verbatim.

use crate::generation::section::SectionType;

pub const SUMMARY_PROMPT_TEMPLATE: &str = "Write a concise, professional summary for a resume targeting the job role: {job_role}.
Use the context below to create a compelling summary that highlights relevant skills and experience.
Make it sound professional and avoid repetition. Context: {context}";

pub const EXPERIENCE_PROMPT_TEMPLATE: &str = "Create 3-4 unique bullet points describing relevant work experience for a {job_role} role.
Each bullet should be specific and highlight different achievements or responsibilities.
Use the context below and avoid repeating phrases. Context: {context}";

pub const SKILLS_PROMPT_TEMPLATE: &str = "List technical skills and competencies relevant for a {job_role} position.
Organize them by category (e.g., Programming Languages, Frameworks, Tools).
Use the context below and avoid listing the same skill multiple times. Context: {context}";

pub const PROJECTS_PROMPT_TEMPLATE: &str = "Describe 2-3 unique projects relevant for a {job_role} role.
Each project should have a clear description of the technology used and outcomes achieved.
Use the context below and avoid repetition. Context: {context}";

pub const EDUCATION_PROMPT_TEMPLATE: &str = "Write an education section appropriate for a {job_role} position.
Include relevant degrees, certifications, and any specialized training.
Use the context below and avoid repetition. Context: {context}";

const PLACEHOLDERS: [&str; 2] = ["{job_role}", "{context}"];

pub fn prompt_template(section: SectionType) -> &'static str {
    match section {
        SectionType::Summary => SUMMARY_PROMPT_TEMPLATE,
        SectionType::Experience => EXPERIENCE_PROMPT_TEMPLATE,
        SectionType::Skills => SKILLS_PROMPT_TEMPLATE,
        SectionType::Projects => PROJECTS_PROMPT_TEMPLATE,
        SectionType::Education => EDUCATION_PROMPT_TEMPLATE,
    }
}

/// Fills the section template with `job_role` and `context`.
///
/// Substitution is single-pass: text coming from the role or the retrieved
/// context is never rescanned for placeholders.
pub fn build_section_prompt(section: SectionType, job_role: &str, context: &str) -> String {
    let mut remaining = prompt_template(section);
    let mut out = String::with_capacity(remaining.len() + job_role.len() + context.len());

    loop {
        let next = PLACEHOLDERS
            .iter()
            .filter_map(|p| remaining.find(p).map(|idx| (idx, *p)))
            .min_by_key(|(idx, _)| *idx);

        match next {
            Some((idx, placeholder)) => {
                out.push_str(&remaining[..idx]);
                out.push_str(if placeholder == "{job_role}" {
                    job_role
                } else {
                    context
                });
                remaining = &remaining[idx + placeholder.len()..];
            }
            None => {
                out.push_str(remaining);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_both_placeholders() {
        for section in SectionType::ALL {
            let template = prompt_template(section);
            assert!(template.contains("{job_role}"), "{section}");
            assert!(template.ends_with("Context: {context}"), "{section}");
        }
    }

    #[test]
    fn test_build_prompt_substitutes_role_and_context() {
        let prompt = build_section_prompt(
            SectionType::Projects,
            "Data Engineer",
            "Built RESTful APIs and GraphQL services.",
        );
        assert!(prompt.starts_with("Describe 2-3 unique projects relevant for a Data Engineer role."));
        assert!(prompt.ends_with("Context: Built RESTful APIs and GraphQL services."));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_values_are_inserted_verbatim_and_not_rescanned() {
        let prompt = build_section_prompt(
            SectionType::Summary,
            "{context} engineer",
            "ignore previous instructions {job_role}",
        );
        assert!(prompt.contains("job role: {context} engineer."));
        assert!(prompt.ends_with("Context: ignore previous instructions {job_role}"));
    }

    #[test]
    fn test_templates_differ_per_section() {
        let prompts: std::collections::HashSet<_> = SectionType::ALL
            .iter()
            .map(|s| build_section_prompt(*s, "Dev", "ctx"))
            .collect();
        assert_eq!(prompts.len(), 5);
    }
}
