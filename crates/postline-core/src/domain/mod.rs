//! Domain entities - the core business objects.

mod blog;
mod label;
mod post;
mod user;

pub mod generated;

pub use blog::{BlogPost, NewBlogPost};
pub use label::{Label, NewLabel};
pub use post::{DraftPost, Post, PostEdit, PostStatus};
pub use user::{NewUser, User};
