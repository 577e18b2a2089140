//! # Postline Core
//!
//! The domain layer of Postline.
//! Posts, labels and blog posts, the publication lifecycle, parsing of generated
//! text, and the ports that infrastructure must implement. No infrastructure
//! dependencies live here.

pub mod content;
pub mod domain;
pub mod error;
pub mod ports;
pub mod publication;

pub use error::{DomainError, RepoError};
