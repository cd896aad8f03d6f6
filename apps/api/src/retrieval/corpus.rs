//! Canned résumé-snippet corpus and the one-shot loading job that embeds it
//! into the Snippet Store.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::AppError;
use crate::retrieval::embedder::Embedder;
use crate::retrieval::store::SnippetStore;

pub const RESUME_SNIPPETS: &[&str] = &[
    // Programming
    "Skilled in Python, Flask, and REST APIs. Developed scalable backend services.",
    "Proficient in JavaScript, React, and Node.js for full-stack development.",
    "Experienced in Java, Spring Boot, and microservices architecture.",
    "Strong knowledge of C++, data structures, and algorithms.",
    "Familiar with TypeScript, Angular, and modern frontend frameworks.",
    // Data science & ML
    "Experienced in data analysis using Pandas, NumPy, and Excel.",
    "Built ML models for regression, classification, and clustering tasks.",
    "Experience using Hugging Face Transformers and NLP techniques.",
    "Skilled in TensorFlow and PyTorch for deep learning applications.",
    "Proficient in data visualization with Matplotlib, Seaborn, and Plotly.",
    "Experience with scikit-learn for machine learning pipelines.",
    // Cloud & DevOps
    "Familiarity with cloud platforms like AWS and GCP.",
    "Experience with Docker containerization and Kubernetes orchestration.",
    "Proficient in CI/CD pipelines using Jenkins and GitHub Actions.",
    "Knowledge of infrastructure as code using Terraform and CloudFormation.",
    // Database & backend
    "Experience with SQL databases including PostgreSQL and MySQL.",
    "Familiar with NoSQL databases like MongoDB and Redis.",
    "Built RESTful APIs and GraphQL services.",
    "Experience with message queues like RabbitMQ and Apache Kafka.",
    // Frontend & UI/UX
    "Designed responsive UIs using React and integrated with backend APIs.",
    "Experience with CSS frameworks like Bootstrap and Tailwind CSS.",
    "Skilled in creating accessible and user-friendly interfaces.",
    "Proficient in modern JavaScript (ES6+) and async programming.",
    // Soft skills
    "Strong communication and team collaboration skills.",
    "Experience leading cross-functional teams and mentoring junior developers.",
    "Excellent problem-solving abilities and analytical thinking.",
    "Proven track record of delivering projects on time and within budget.",
    "Strong presentation skills and ability to explain technical concepts to non-technical stakeholders.",
    // Project management
    "Experience with Agile methodologies including Scrum and Kanban.",
    "Proficient in project management tools like Jira and Asana.",
    "Track record of managing multiple projects simultaneously.",
    "Experience with stakeholder management and requirement gathering.",
    // Version control & tools
    "Proficient in version control using Git and collaborative tools like GitHub.",
    "Experience with code review processes and maintaining code quality.",
    "Familiar with IDEs like VS Code, IntelliJ, and PyCharm.",
    "Knowledge of testing frameworks and TDD practices.",
    // Industry experience
    "5+ years of experience in software development and system architecture.",
    "Experience working in fast-paced startup environments.",
    "Background in fintech with knowledge of payment processing systems.",
    "Experience in e-commerce platforms and customer-facing applications.",
    "Knowledge of cybersecurity best practices and secure coding standards.",
    // Education & certifications
    "Bachelor's degree in Computer Science or related field.",
    "Certified AWS Solutions Architect with hands-on cloud experience.",
    "Completed advanced courses in machine learning and data science.",
    "Active participation in open-source projects and tech communities.",
    // Leadership & innovation
    "Led technical initiatives that improved system performance by 40%.",
    "Mentored 5+ junior developers and conducted technical interviews.",
    "Introduced new technologies that reduced development time by 30%.",
    "Experience with technical architecture decisions and system design.",
    // Research & development
    "Published research papers in machine learning and computer vision.",
    "Experience with cutting-edge technologies like blockchain and IoT.",
    "Contributed to open-source projects with 1000+ GitHub stars.",
    "Experience with research and development in emerging technologies.",
];

/// How snippet ids are assigned at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Hex SHA-256 of the snippet text. Re-running the loader is a no-op.
    #[default]
    ContentHash,
    /// `"0".."n-1"` per run. Re-running against a populated collection
    /// collides with the existing ids.
    Sequential,
}

impl IdStrategy {
    pub fn assign(&self, documents: &[&str]) -> Vec<String> {
        match self {
            IdStrategy::ContentHash => documents
                .iter()
                .map(|d| hex::encode(Sha256::digest(d.as_bytes())))
                .collect(),
            IdStrategy::Sequential => (0..documents.len()).map(|i| i.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadReport {
    pub collection: String,
    pub cleared: usize,
    pub submitted: usize,
    pub inserted: usize,
    /// Snippets whose id was already present.
    pub skipped: usize,
    pub total_in_store: usize,
}

/// Embeds `documents` in one batch and adds them to `store`.
/// With `reset`, the collection is emptied first.
pub async fn load_snippets(
    documents: &[&str],
    embedder: &dyn Embedder,
    store: &dyn SnippetStore,
    strategy: IdStrategy,
    reset: bool,
) -> Result<LoadReport, AppError> {
    let cleared = if reset { store.clear().await? } else { 0 };
    if cleared > 0 {
        info!("Cleared {} snippets from '{}'", cleared, store.collection());
    }

    let embeddings = embedder.embed_batch(documents).await?;
    let ids = strategy.assign(documents);
    let owned: Vec<String> = documents.iter().map(|d| d.to_string()).collect();

    let inserted = store.add(&owned, &embeddings, &ids).await?;
    let total_in_store = store.count().await?;

    info!(
        "Loaded {} of {} snippets into '{}' ({} already present)",
        inserted,
        documents.len(),
        store.collection(),
        documents.len() - inserted
    );

    Ok(LoadReport {
        collection: store.collection().to_string(),
        cleared,
        submitted: documents.len(),
        inserted,
        skipped: documents.len() - inserted,
        total_in_store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::context::tests::{LetterEmbedder, LETTER_DIM};
    use crate::retrieval::store::InMemorySnippetStore;

    #[test]
    fn test_corpus_has_unique_snippets() {
        let mut seen = std::collections::HashSet::new();
        for snippet in RESUME_SNIPPETS {
            assert!(seen.insert(*snippet), "duplicate snippet: {snippet}");
        }
        assert_eq!(RESUME_SNIPPETS.len(), 53);
    }

    #[test]
    fn test_content_hash_ids_are_unique_and_stable() {
        let a = IdStrategy::ContentHash.assign(RESUME_SNIPPETS);
        let b = IdStrategy::ContentHash.assign(RESUME_SNIPPETS);
        assert_eq!(a, b);
        let unique: std::collections::HashSet<_> = a.iter().collect();
        assert_eq!(unique.len(), RESUME_SNIPPETS.len());
        assert!(a.iter().all(|id| id.len() == 64));
    }

    #[test]
    fn test_sequential_ids_start_at_zero() {
        let ids = IdStrategy::Sequential.assign(&["a", "b", "c"]);
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_content_hash_loading_is_idempotent() {
        let store = InMemorySnippetStore::new("resume_blocks", LETTER_DIM);

        let first = load_snippets(RESUME_SNIPPETS, &LetterEmbedder, &store, IdStrategy::ContentHash, false)
            .await
            .unwrap();
        let second = load_snippets(RESUME_SNIPPETS, &LetterEmbedder, &store, IdStrategy::ContentHash, false)
            .await
            .unwrap();

        assert_eq!(first.inserted, 53);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 53);
        assert_eq!(second.total_in_store, 53);
    }

    #[tokio::test]
    async fn test_sequential_ids_collide_on_rerun_with_new_content() {
        let store = InMemorySnippetStore::new("resume_blocks", LETTER_DIM);
        load_snippets(&["first run"], &LetterEmbedder, &store, IdStrategy::Sequential, false)
            .await
            .unwrap();

        let report = load_snippets(&["second run"], &LetterEmbedder, &store, IdStrategy::Sequential, false)
            .await
            .unwrap();

        // id "0" already exists, so the new snippet is dropped.
        assert_eq!(report.inserted, 0);
        assert_eq!(report.total_in_store, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_before_loading() {
        let store = InMemorySnippetStore::new("resume_blocks", LETTER_DIM);
        load_snippets(&["old"], &LetterEmbedder, &store, IdStrategy::Sequential, false)
            .await
            .unwrap();

        let report = load_snippets(&["new"], &LetterEmbedder, &store, IdStrategy::Sequential, true)
            .await
            .unwrap();

        assert_eq!(report.cleared, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(store.query(&crate::retrieval::context::tests::letter_vector("new"), 1).await.unwrap(), vec!["new"]);
    }
}
