use anyhow::Result;
use async_trait::async_trait;

/// Provider-agnostic text generation: one prompt in, raw model text out.
///
/// Callers own all parsing of the returned text — providers give no schema
/// guarantee, so downstream code must treat the output as untrusted data.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
