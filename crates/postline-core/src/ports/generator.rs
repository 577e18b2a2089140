//! Content generator port - abstraction over generative-language APIs.

use async_trait::async_trait;

/// Produces raw text for a prompt. Parsing the text is the caller's job.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Generator errors.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generator is not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Generator returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed generator response: {0}")]
    MalformedResponse(String),
}
