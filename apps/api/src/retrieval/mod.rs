// Retrieval half of the pipeline: skill detection, embedding, snippet storage,
// and context assembly. All model-server calls go through llm_client.

pub mod context;
pub mod corpus;
pub mod embedder;
pub mod pg_store;
pub mod skills;
pub mod store;
