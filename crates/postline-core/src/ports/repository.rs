use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    BlogPost, DraftPost, Label, NewBlogPost, NewLabel, NewUser, Post, PostStatus, User,
};
use crate::error::RepoError;

/// A scheduled post together with the color of its label, if any.
#[derive(Debug, Clone)]
pub struct CalendarEntry {
    pub post: Post,
    pub label_color: Option<String>,
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user. A taken username is a `RepoError::Constraint`.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
}

/// Post repository. Every user-facing method is scoped by owner.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Post>, RepoError>;

    /// All of a user's posts, newest first.
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Post>, RepoError>;

    /// A user's scheduled posts with their label colors.
    async fn list_calendar(&self, owner: i64) -> Result<Vec<CalendarEntry>, RepoError>;

    /// Insert drafts in a single transaction: either all are stored or none.
    async fn create_drafts(
        &self,
        owner: i64,
        drafts: Vec<DraftPost>,
    ) -> Result<Vec<Post>, RepoError>;

    /// Persist a user edit (content, label and lifecycle columns) if the row is
    /// still owned by `post.user_id`, in `expected` status and at `post.version`.
    /// On success `post.version` is advanced to the stored version.
    /// Returns `false` when the row changed or disappeared in the meantime.
    async fn save_edit(&self, post: &mut Post, expected: PostStatus)
    -> Result<bool, RepoError>;

    /// Persist only the lifecycle columns (status, schedule, external id,
    /// attempt bookkeeping) if the row is still in `expected` status and at
    /// `post.version`. On success `post.version` is advanced.
    async fn save_lifecycle(
        &self,
        post: &mut Post,
        expected: PostStatus,
    ) -> Result<bool, RepoError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError>;

    /// Scheduled posts of every user whose time has come, in id order.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;
}

/// Label repository.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// A user's labels ordered by name.
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Label>, RepoError>;

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Label>, RepoError>;

    async fn create(&self, owner: i64, label: NewLabel) -> Result<Label, RepoError>;

    /// Clear the label from the user's posts and delete it, atomically.
    /// Returns whether a label was removed.
    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError>;
}

/// Blog post repository.
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// A user's blog posts, newest first.
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<BlogPost>, RepoError>;

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<BlogPost>, RepoError>;

    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        title: String,
        content: String,
    ) -> Result<Option<BlogPost>, RepoError>;

    /// Insert a blog post and drafts linked to it in a single transaction.
    async fn create_with_posts(
        &self,
        owner: i64,
        blog: NewBlogPost,
        drafts: Vec<DraftPost>,
    ) -> Result<(BlogPost, Vec<Post>), RepoError>;
}
