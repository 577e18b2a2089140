//! Publishing port - abstraction over the social network the worker posts to.

use async_trait::async_trait;

/// Entry point to the publishing service. Each worker tick authenticates once
/// and reuses the session for every due post of that tick.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn authenticate(&self) -> Result<Box<dyn PublishSession>, PublishError>;
}

/// An authenticated session.
#[async_trait]
pub trait PublishSession: Send + Sync {
    /// Publish `text`, returning the service's identifier for the new post.
    async fn publish(&self, text: &str) -> Result<String, PublishError>;
}

/// Publishing errors.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Publishing credentials are not configured")]
    MissingCredentials,

    #[error("Authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Publishing service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Publishing service returned no post identifier")]
    MissingIdentifier,
}
