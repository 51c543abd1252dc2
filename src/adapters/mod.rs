// Adapters layer: concrete implementations for external systems (llm http, storage, terminal).

pub mod console;
pub mod gemini;
pub mod openai_compatible;
pub mod storage;

use crate::config::toml_config::{ProviderConfig, ProviderKind};
use crate::domain::ports::LlmBackend;
use crate::utils::error::Result;
use std::sync::Arc;

/// Build the backend a provider entry describes.
pub fn build_backend(name: &str, config: &ProviderConfig) -> Result<Arc<dyn LlmBackend>> {
    let backend: Arc<dyn LlmBackend> = match config.kind {
        ProviderKind::Gemini => Arc::new(gemini::GeminiBackend::new(name, config)?),
        ProviderKind::Openai => Arc::new(openai_compatible::OpenAiCompatibleBackend::new(
            name, config,
        )?),
    };
    tracing::debug!("Configured backend {} ({:?}, {})", name, config.kind, config.model);
    Ok(backend)
}
