//! SeaORM entities, one module per table.

pub mod blog_post;
pub mod label;
pub mod post;
pub mod user;
