//! Skill Detector: maps a free-text job role onto a fixed skill vocabulary.
//!
//! Pure substring matching against the lowercased query. No LLM, no I/O.

/// (lowercase keyword, canonical label) in declaration order.
///
/// Several keywords may share a label (`ml` / `machine learning`); each matching
/// keyword contributes its label, so a shared label can appear more than once.
pub const SKILL_KEYWORDS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("java", "Java"),
    ("react", "React"),
    ("node.js", "Node.js"),
    ("aws", "AWS"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("machine learning", "Machine Learning"),
    ("ml", "Machine Learning"),
    ("ai", "AI"),
    ("data science", "Data Science"),
    ("sql", "SQL"),
    ("nosql", "NoSQL"),
    ("git", "Git"),
    ("agile", "Agile"),
    ("scrum", "Scrum"),
    ("devops", "DevOps"),
    ("frontend", "Frontend"),
    ("backend", "Backend"),
    ("full-stack", "Full-Stack"),
    ("cloud", "Cloud Computing"),
    ("microservices", "Microservices"),
];

/// Returns the canonical labels of every keyword found anywhere in `query`,
/// in table order, one entry per matching keyword. Empty or unmatched queries
/// yield an empty vec.
pub fn detect_skills(query: &str) -> Vec<&'static str> {
    let query = query.to_lowercase();
    let mut found: Vec<&'static str> = Vec::new();

    for (keyword, label) in SKILL_KEYWORDS {
        if query.contains(keyword) {
            found.push(*label);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_detects_nothing() {
        assert!(detect_skills("").is_empty());
        assert!(detect_skills("   ").is_empty());
    }

    #[test]
    fn test_python_reported_exactly_once_any_case() {
        for query in ["python", "PYTHON dev", "Senior PyThOn engineer, python scripting"] {
            let skills = detect_skills(query);
            assert_eq!(
                skills.iter().filter(|s| **s == "Python").count(),
                1,
                "query: {query}"
            );
        }
    }

    #[test]
    fn test_senior_python_ml_role() {
        let skills = detect_skills("Senior Python Developer with ML experience");
        assert_eq!(skills, vec!["Python", "Machine Learning"]);
    }

    #[test]
    fn test_output_follows_table_order_not_query_order() {
        let skills = detect_skills("Kubernetes and Docker on AWS");
        assert_eq!(skills, vec!["AWS", "Docker", "Kubernetes"]);
    }

    #[test]
    fn test_shared_label_reported_per_keyword() {
        let skills = detect_skills("machine learning engineer, ml ops");
        assert_eq!(skills, vec!["Machine Learning", "Machine Learning"]);
    }

    #[test]
    fn test_substring_matches_inside_words() {
        // "javascript" contains "java"; both labels are reported.
        let skills = detect_skills("JavaScript developer");
        assert_eq!(skills, vec!["JavaScript", "Java"]);
    }

    #[test]
    fn test_unrelated_query_detects_nothing() {
        assert!(detect_skills("Pastry chef").is_empty());
    }
}
