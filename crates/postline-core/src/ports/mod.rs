//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod generator;
mod publisher;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use generator::{ContentGenerator, GeneratorError};
pub use publisher::{PublishError, PublishSession, Publisher};
pub use repository::{
    BlogPostRepository, CalendarEntry, LabelRepository, PostRepository, UserRepository,
};
