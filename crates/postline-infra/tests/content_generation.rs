use std::sync::Arc;

use async_trait::async_trait;

use postline_core::content::{ContentError, ContentService};
use postline_core::domain::PostStatus;
use postline_core::domain::generated::ParseError;
use postline_core::ports::{BlogPostRepository, ContentGenerator, GeneratorError, PostRepository};
use postline_infra::InMemoryStore;

const OWNER: i64 = 3;

/// Generator double returning a canned reply.
struct CannedGenerator(Result<&'static str, u16>);

#[async_trait]
impl ContentGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(GeneratorError::Api {
                status,
                body: "quota exceeded".to_string(),
            }),
        }
    }
}

fn service(store: &Arc<InMemoryStore>, reply: Result<&'static str, u16>) -> ContentService {
    ContentService::new(
        Arc::new(CannedGenerator(reply)),
        store.clone(),
        store.clone(),
    )
}

async fn stored_posts(store: &InMemoryStore) -> usize {
    PostRepository::list_by_owner(store, OWNER).await.unwrap().len()
}

#[tokio::test]
async fn test_batch_creates_drafts() {
    let store = Arc::new(InMemoryStore::new());
    let reply = "Shipping beats polishing.\n#product #shipping\n---\nTalk to users.\n#startups";

    let posts = service(&store, Ok(reply))
        .generate_posts(OWNER, "product lessons")
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.status == PostStatus::Draft && p.user_id == OWNER));
    assert_eq!(posts[0].hashtags, "#product #shipping");
    assert_eq!(stored_posts(&store).await, 2);
}

#[tokio::test]
async fn test_empty_batch_stores_nothing() {
    let store = Arc::new(InMemoryStore::new());

    let result = service(&store, Ok("  \n---\n "))
        .generate_posts(OWNER, "anything")
        .await;

    assert!(matches!(result, Err(ContentError::Parse(ParseError::NoPosts))));
    assert_eq!(stored_posts(&store).await, 0);
}

#[tokio::test]
async fn test_generator_failure_stores_nothing() {
    let store = Arc::new(InMemoryStore::new());

    let result = service(&store, Err(429))
        .generate_posts(OWNER, "anything")
        .await;

    assert!(matches!(
        result,
        Err(ContentError::Generator(GeneratorError::Api { status: 429, .. }))
    ));
    assert_eq!(stored_posts(&store).await, 0);
}

#[tokio::test]
async fn test_blank_topic_is_rejected() {
    let store = Arc::new(InMemoryStore::new());

    let result = service(&store, Ok("unused")).generate_posts(OWNER, "   ").await;

    assert!(matches!(result, Err(ContentError::EmptyTopic)));
}

#[tokio::test]
async fn test_blog_bundle_links_posts() {
    let store = Arc::new(InMemoryStore::new());
    let reply = "<BLOG_TITLE_START>Async Rust<BLOG_TITLE_END>\n\
                 <BLOG_CONTENT_START>Futures are lazy.<BLOG_CONTENT_END>\n\
                 <POST_START>New post on async!\n#rust<POST_END>";

    let generated = service(&store, Ok(reply))
        .generate_blog(OWNER, "async rust")
        .await
        .unwrap();

    assert_eq!(generated.blog.title, "Async Rust");
    assert_eq!(generated.posts.len(), 1);
    assert_eq!(generated.posts[0].blog_post_id, Some(generated.blog.id));

    let blogs = BlogPostRepository::list_by_owner(store.as_ref(), OWNER)
        .await
        .unwrap();
    assert_eq!(blogs.len(), 1);
}

#[tokio::test]
async fn test_blog_without_title_stores_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let reply = "<BLOG_CONTENT_START>Body<BLOG_CONTENT_END>\n<POST_START>Teaser\n#x<POST_END>";

    let result = service(&store, Ok(reply))
        .generate_blog(OWNER, "missing title")
        .await;

    assert!(matches!(
        result,
        Err(ContentError::Parse(ParseError::MissingBlock("title")))
    ));
    assert_eq!(stored_posts(&store).await, 0);
    assert!(
        BlogPostRepository::list_by_owner(store.as_ref(), OWNER)
            .await
            .unwrap()
            .is_empty()
    );
}
