//! Generated content: prompt, generate, parse, persist.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::generated::{self, ParseError};
use crate::domain::{BlogPost, Post};
use crate::error::RepoError;
use crate::ports::{BlogPostRepository, ContentGenerator, GeneratorError, PostRepository};

pub mod prompts {
    //! Prompt templates. The wording is incidental; the output format is not.

    use crate::domain::generated::{
        BLOG_CONTENT_END, BLOG_CONTENT_START, BLOG_TITLE_END, BLOG_TITLE_START, POST_END,
        POST_SEPARATOR, POST_START,
    };

    pub fn post_batch(topic: &str) -> String {
        format!(
            "Write three distinct LinkedIn posts about: {topic}\n\n\
             Each post is a few short paragraphs followed by a final line of 3-5 hashtags.\n\
             Separate the posts with a line containing only {POST_SEPARATOR}.\n\
             Reply with the posts only."
        )
    }

    pub fn blog_bundle(topic: &str) -> String {
        format!(
            "Write a blog article about: {topic}\n\n\
             Put the title between {BLOG_TITLE_START} and {BLOG_TITLE_END}.\n\
             Put the article body between {BLOG_CONTENT_START} and {BLOG_CONTENT_END}.\n\
             Then write three LinkedIn posts promoting the article, each between \
             {POST_START} and {POST_END}, each ending with a line of hashtags."
        )
    }
}

/// Why a generation request produced no records.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] RepoError),
}

/// A generated blog post and the drafts linked to it.
#[derive(Debug, Clone)]
pub struct GeneratedBlog {
    pub blog: BlogPost,
    pub posts: Vec<Post>,
}

/// Turns a topic into stored drafts. All writes of one request are atomic.
pub struct ContentService {
    generator: Arc<dyn ContentGenerator>,
    posts: Arc<dyn PostRepository>,
    blogs: Arc<dyn BlogPostRepository>,
}

impl ContentService {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        posts: Arc<dyn PostRepository>,
        blogs: Arc<dyn BlogPostRepository>,
    ) -> Self {
        Self {
            generator,
            posts,
            blogs,
        }
    }

    /// Generate a batch of draft posts about `topic`.
    pub async fn generate_posts(
        &self,
        owner: i64,
        topic: &str,
    ) -> Result<Vec<Post>, ContentError> {
        let topic = non_empty(topic)?;
        let raw = self
            .generator
            .generate(&prompts::post_batch(topic))
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = owner, error = %e, "Post generation failed")
            })?;

        let drafts = generated::parse_post_batch(&raw);
        if drafts.is_empty() {
            tracing::warn!(user_id = owner, "Generated text contained no posts");
            return Err(ParseError::NoPosts.into());
        }

        let posts = self
            .posts
            .create_drafts(owner, drafts)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = owner, error = %e, "Failed to store generated posts")
            })?;

        tracing::info!(user_id = owner, count = posts.len(), "Generated draft posts");
        Ok(posts)
    }

    /// Generate a blog article plus promotional drafts about `topic`.
    pub async fn generate_blog(
        &self,
        owner: i64,
        topic: &str,
    ) -> Result<GeneratedBlog, ContentError> {
        let topic = non_empty(topic)?;
        let raw = self
            .generator
            .generate(&prompts::blog_bundle(topic))
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = owner, error = %e, "Blog generation failed")
            })?;

        let bundle = generated::parse_blog_bundle(&raw).inspect_err(
            |e| tracing::warn!(user_id = owner, error = %e, "Generated blog text was incomplete"),
        )?;

        let (blog, posts) = self
            .blogs
            .create_with_posts(owner, bundle.blog, bundle.posts)
            .await
            .inspect_err(|e| {
                tracing::error!(user_id = owner, error = %e, "Failed to store generated blog")
            })?;

        tracing::info!(
            user_id = owner,
            blog_id = blog.id,
            posts = posts.len(),
            "Generated blog post"
        );
        Ok(GeneratedBlog { blog, posts })
    }
}

fn non_empty(topic: &str) -> Result<&str, ContentError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ContentError::EmptyTopic);
    }
    Ok(topic)
}
