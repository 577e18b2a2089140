//! In-memory store.
//!
//! Used when `DATABASE_URL` is not set and by tests. Implements every
//! repository port with the same ownership, ordering and compare-and-set
//! semantics as the PostgreSQL repositories.
//! Note: data is lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use postline_core::domain::{
    BlogPost, DraftPost, Label, NewBlogPost, NewLabel, NewUser, Post, PostStatus, User,
};
use postline_core::error::RepoError;
use postline_core::ports::{
    BlogPostRepository, CalendarEntry, LabelRepository, PostRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    labels: BTreeMap<i64, Label>,
    blog_posts: BTreeMap<i64, BlogPost>,
    posts: BTreeMap<i64, Post>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_drafts(
        &mut self,
        owner: i64,
        blog_post_id: Option<i64>,
        drafts: Vec<DraftPost>,
    ) -> Vec<Post> {
        let now = Utc::now();
        drafts
            .into_iter()
            .map(|draft| {
                let post = Post {
                    id: self.allocate_id(),
                    user_id: owner,
                    text: draft.text,
                    hashtags: draft.hashtags,
                    status: PostStatus::Draft,
                    scheduled_for: None,
                    label_id: None,
                    blog_post_id,
                    external_id: None,
                    publish_attempts: 0,
                    last_publish_error: None,
                    version: 0,
                    created_at: now,
                };
                self.posts.insert(post.id, post.clone());
                post
            })
            .collect()
    }
}

/// Thread-safe in-memory implementation of all repositories.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(RepoError::Constraint(format!(
                "username '{}' is taken",
                new.username
            )));
        }

        let user = User {
            id: tables.allocate_id(),
            username: new.username,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&id)
            .filter(|p| p.user_id == owner)
            .cloned())
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        newest_first(&mut posts, |p| (p.created_at, p.id));
        Ok(posts)
    }

    async fn list_calendar(&self, owner: i64) -> Result<Vec<CalendarEntry>, RepoError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<CalendarEntry> = tables
            .posts
            .values()
            .filter(|p| {
                p.user_id == owner
                    && p.status == PostStatus::Scheduled
                    && p.scheduled_for.is_some()
            })
            .map(|p| CalendarEntry {
                post: p.clone(),
                label_color: p
                    .label_id
                    .and_then(|id| tables.labels.get(&id))
                    .map(|l| l.color.clone()),
            })
            .collect();
        entries.sort_by_key(|e| (e.post.scheduled_for, e.post.id));
        Ok(entries)
    }

    async fn create_drafts(
        &self,
        owner: i64,
        drafts: Vec<DraftPost>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_drafts(owner, None, drafts))
    }

    async fn save_edit(
        &self,
        post: &mut Post,
        expected: PostStatus,
    ) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.posts.get_mut(&post.id).filter(|p| {
            p.user_id == post.user_id && p.status == expected && p.version == post.version
        }) else {
            return Ok(false);
        };

        stored.text = post.text.clone();
        stored.hashtags = post.hashtags.clone();
        stored.label_id = post.label_id;
        copy_lifecycle(stored, post);
        Ok(true)
    }

    async fn save_lifecycle(
        &self,
        post: &mut Post,
        expected: PostStatus,
    ) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables
            .posts
            .get_mut(&post.id)
            .filter(|p| p.status == expected && p.version == post.version)
        else {
            return Ok(false);
        };

        copy_lifecycle(stored, post);
        Ok(true)
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.get(&id).is_some_and(|p| p.user_id == owner) {
            tables.posts.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|p| p.is_due(now))
            .cloned()
            .collect())
    }
}

/// Copy the lifecycle columns and advance the version on both copies.
fn copy_lifecycle(stored: &mut Post, post: &mut Post) {
    post.version = post.version.saturating_add(1);
    stored.version = post.version;
    stored.status = post.status;
    stored.scheduled_for = post.scheduled_for;
    stored.external_id = post.external_id.clone();
    stored.publish_attempts = post.publish_attempts;
    stored.last_publish_error = post.last_publish_error.clone();
}

#[async_trait]
impl LabelRepository for InMemoryStore {
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Label>, RepoError> {
        let tables = self.tables.read().await;
        let mut labels: Vec<Label> = tables
            .labels
            .values()
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(labels)
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Label>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .labels
            .get(&id)
            .filter(|l| l.user_id == owner)
            .cloned())
    }

    async fn create(&self, owner: i64, new: NewLabel) -> Result<Label, RepoError> {
        let mut tables = self.tables.write().await;
        let label = Label {
            id: tables.allocate_id(),
            user_id: owner,
            name: new.name,
            color: new.color,
            created_at: Utc::now(),
        };
        tables.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.labels.get(&id).is_some_and(|l| l.user_id == owner) {
            return Ok(false);
        }

        tables.labels.remove(&id);
        for post in tables.posts.values_mut() {
            if post.label_id == Some(id) {
                post.label_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl BlogPostRepository for InMemoryStore {
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<BlogPost>, RepoError> {
        let tables = self.tables.read().await;
        let mut blogs: Vec<BlogPost> = tables
            .blog_posts
            .values()
            .filter(|b| b.user_id == owner)
            .cloned()
            .collect();
        newest_first(&mut blogs, |b| (b.created_at, b.id));
        Ok(blogs)
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<BlogPost>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .blog_posts
            .get(&id)
            .filter(|b| b.user_id == owner)
            .cloned())
    }

    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        title: String,
        content: String,
    ) -> Result<Option<BlogPost>, RepoError> {
        let mut tables = self.tables.write().await;
        let Some(blog) = tables
            .blog_posts
            .get_mut(&id)
            .filter(|b| b.user_id == owner)
        else {
            return Ok(None);
        };

        blog.title = title;
        blog.content = content;
        Ok(Some(blog.clone()))
    }

    async fn create_with_posts(
        &self,
        owner: i64,
        blog: NewBlogPost,
        drafts: Vec<DraftPost>,
    ) -> Result<(BlogPost, Vec<Post>), RepoError> {
        let mut tables = self.tables.write().await;
        let blog = BlogPost {
            id: tables.allocate_id(),
            user_id: owner,
            title: blog.title,
            content: blog.content,
            created_at: Utc::now(),
        };
        tables.blog_posts.insert(blog.id, blog.clone());
        let posts = tables.insert_drafts(owner, Some(blog.id), drafts);
        Ok((blog, posts))
    }
}
