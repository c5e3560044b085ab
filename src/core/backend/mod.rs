//! Analysis backends.
//!
//! A backend turns a system instruction plus a prepared text payload into
//! analysis text. Retry policy is internal to each backend; callers see only
//! success or a terminal error.

mod anthropic;

pub use anthropic::AnthropicBackend;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::{ArbordocError, Result};

/// Trait for backends that generate analysis text
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Generate analysis text for the given instruction and payload.
    ///
    /// Implementations may retry transient failures internally; an error
    /// means the retry budget is exhausted and is terminal for the node
    /// being processed.
    async fn generate(&self, system_instruction: &str, payload: &str) -> Result<String>;

    /// Human-readable backend name for logging
    fn backend_name(&self) -> &str;
}

/// Factory function to create the configured backend
pub fn create_backend(config: &LlmConfig) -> Result<Box<dyn AnalysisBackend>> {
    match config.provider.as_str() {
        "anthropic" => Ok(Box::new(AnthropicBackend::new(config)?)),
        _ => Err(ArbordocError::Config(format!(
            "Unsupported LLM provider: {}",
            config.provider
        ))),
    }
}
