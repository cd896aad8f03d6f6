// Generation half of the pipeline: prompts, section generation, cleaning,
// assembly, and request orchestration.
// All model-server calls go through llm_client via the TextGenerator trait.

pub mod assembler;
pub mod cleaner;
pub mod generator;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod section;
