pub mod models;

pub use models::{create_model, DummyModel, OpenAiModel};

/// Settings for constructing a language model client. Unset fields fall back
/// to the OpenAI defaults (and the `OPENAI_API_KEY` environment variable).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}
