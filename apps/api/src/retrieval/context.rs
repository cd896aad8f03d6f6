//! Context Assembler: embeds the role once and joins the top-K snippets into one context string.

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::retrieval::embedder::Embedder;
use crate::retrieval::store::SnippetStore;

/// Number of snippets retrieved per request.
pub const TOP_K: usize = 8;

/// Characters of context shown in the debug summary before truncation.
const CONTEXT_PREVIEW_CHARS: usize = 500;

/// Snippets retrieved for one query, in the store's rank order.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub query: String,
    pub documents: Vec<String>,
}

impl RetrievalResult {
    /// All retrieved documents joined with a single space.
    pub fn context(&self) -> String {
        self.documents.join(" ")
    }

    pub fn retrieved_count(&self) -> usize {
        self.documents.len()
    }
}

/// Retrieval summary surfaced alongside a generated resume.
#[derive(Debug, Clone, Serialize)]
pub struct RagDebugInfo {
    pub context_preview: String,
    pub query: String,
    pub retrieved_count: usize,
}

impl RagDebugInfo {
    pub fn new(retrieval: &RetrievalResult, context: &str) -> Self {
        Self {
            context_preview: preview(context, CONTEXT_PREVIEW_CHARS),
            query: retrieval.query.clone(),
            retrieved_count: retrieval.retrieved_count(),
        }
    }
}

/// Embeds `job_role` and fetches the `k` nearest snippets.
///
/// An empty role is passed through unchanged. Embedding or store failures
/// abort with `AppError::Retrieval`; no fallback context is synthesised.
pub async fn assemble_context(
    job_role: &str,
    embedder: &dyn Embedder,
    store: &dyn SnippetStore,
    k: usize,
) -> Result<RetrievalResult, AppError> {
    let query_embedding = embedder.embed(job_role).await?;
    let documents = store.query(&query_embedding, k).await?;

    info!(
        "Retrieved {} snippets from '{}' (k={})",
        documents.len(),
        store.collection(),
        k
    );

    Ok(RetrievalResult {
        query: job_role.to_string(),
        documents,
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
