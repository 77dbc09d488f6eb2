// Recommendation pipeline: classify the query, build the prompt, invoke the
// completion service, repair and parse its output, normalize to typed results.
// All completion calls go through llm_client.

pub mod categories;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
pub mod repair;

pub use pipeline::{Advisor, AdvisorError};
