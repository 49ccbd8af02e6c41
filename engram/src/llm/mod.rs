mod api;
pub mod prompts;
mod provider;

pub use api::LlmApiClient;
pub use provider::{first_json_substring, CompletionOptions, LlmBackend, LlmProvider};
