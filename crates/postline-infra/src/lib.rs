//! # Postline Infrastructure
//!
//! Concrete implementations of the ports defined in `postline-core`.
//! This crate contains the database, the in-memory store, and the external
//! service integrations (content generation and publishing).
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory store only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `http-adapters` - Gemini generator and LinkedIn publisher via reqwest

pub mod database;
pub mod memory;
pub mod telemetry;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "http-adapters")]
pub mod generator;

#[cfg(feature = "http-adapters")]
pub mod publisher;

// Re-exports - In-Memory
pub use database::DatabaseConnections;
pub use memory::InMemoryStore;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtTokenService};

#[cfg(feature = "http-adapters")]
pub use generator::{GeminiConfig, GeminiGenerator};

#[cfg(feature = "http-adapters")]
pub use publisher::{LinkedInConfig, LinkedInPublisher};
