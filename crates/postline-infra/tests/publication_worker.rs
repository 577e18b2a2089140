use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use postline_core::domain::{DraftPost, Post, PostEdit, PostStatus};
use postline_core::ports::{PostRepository, PublishError, PublishSession, Publisher};
use postline_core::publication::{PublicationWorker, TickError, TickReport, WorkerConfig};
use postline_infra::InMemoryStore;

const OWNER: i64 = 1;

/// Publisher double. Texts containing "boom" fail. While a post is being
/// published its owner unschedules it ("edited"), moves it to tomorrow and the
/// publish fails ("moved"), or rewrites it in place ("reworded").
#[derive(Default)]
struct FakePublisher {
    reject_auth: bool,
    auth_calls: Mutex<usize>,
    published: Arc<Mutex<Vec<String>>>,
    store: Option<Arc<InMemoryStore>>,
}

struct FakeSession {
    published: Arc<Mutex<Vec<String>>>,
    store: Option<Arc<InMemoryStore>>,
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn authenticate(&self) -> Result<Box<dyn PublishSession>, PublishError> {
        *self.auth_calls.lock().unwrap() += 1;
        if self.reject_auth {
            return Err(PublishError::AuthenticationRejected("bad password".into()));
        }
        Ok(Box::new(FakeSession {
            published: self.published.clone(),
            store: self.store.clone(),
        }))
    }
}

#[async_trait]
impl PublishSession for FakeSession {
    async fn publish(&self, text: &str) -> Result<String, PublishError> {
        if text.contains("boom") {
            return Err(PublishError::Api {
                status: 500,
                body: "server error".into(),
            });
        }

        if text.contains("edited") {
            self.owner_edit("edited", |post| post.unschedule().unwrap())
                .await;
        }

        if text.contains("moved") {
            self.owner_edit("moved", |post| {
                post.schedule(Utc::now() + Duration::days(1)).unwrap()
            })
            .await;
            return Err(PublishError::Api {
                status: 503,
                body: "unavailable".into(),
            });
        }

        if text.contains("reworded") {
            self.owner_edit("reworded", |post| {
                let edit = PostEdit {
                    text: "Second draft".to_string(),
                    hashtags: post.hashtags.clone(),
                    label_id: post.label_id,
                    scheduled_for: post.scheduled_for,
                };
                post.apply_edit(edit).unwrap();
            })
            .await;
        }

        let mut published = self.published.lock().unwrap();
        published.push(text.to_string());
        Ok(format!("urn:li:share:{}", published.len()))
    }
}

impl FakeSession {
    /// Apply an owner edit to every stored post whose text contains `marker`.
    async fn owner_edit(&self, marker: &str, edit: fn(&mut Post)) {
        let Some(store) = &self.store else {
            return;
        };
        let posts = PostRepository::list_by_owner(store.as_ref(), OWNER)
            .await
            .unwrap();
        for mut post in posts.into_iter().filter(|p| p.text.contains(marker)) {
            let expected = post.status;
            edit(&mut post);
            assert!(store.save_edit(&mut post, expected).await.unwrap());
        }
    }
}

async fn scheduled(store: &InMemoryStore, text: &str, minutes_from_now: i64) -> Post {
    let mut post = store
        .create_drafts(OWNER, vec![DraftPost::new(text, "#test")])
        .await
        .unwrap()
        .remove(0);
    post.schedule(Utc::now() + Duration::minutes(minutes_from_now))
        .unwrap();
    assert!(store.save_edit(&mut post, PostStatus::Draft).await.unwrap());
    post
}

async fn reload(store: &InMemoryStore, id: i64) -> Post {
    PostRepository::find_owned(store, OWNER, id)
        .await
        .unwrap()
        .unwrap()
}

fn worker(
    store: Arc<InMemoryStore>,
    publisher: Arc<FakePublisher>,
    max_attempts: u32,
) -> PublicationWorker {
    PublicationWorker::new(
        store,
        publisher,
        WorkerConfig {
            max_attempts,
            ..WorkerConfig::default()
        },
    )
}

#[tokio::test]
async fn test_nothing_due_skips_authentication() {
    let store = Arc::new(InMemoryStore::new());
    scheduled(&store, "later", 30).await;
    let publisher = Arc::new(FakePublisher::default());

    let report = worker(store, publisher.clone(), 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(report, TickReport::default());
    assert_eq!(*publisher.auth_calls.lock().unwrap(), 0);
    assert!(publisher.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_failure_keeps_successes() {
    let store = Arc::new(InMemoryStore::new());
    let ok = scheduled(&store, "first", -5).await;
    let bad = scheduled(&store, "boom", -4).await;
    let also_ok = scheduled(&store, "third", -3).await;
    let publisher = Arc::new(FakePublisher::default());

    let report = worker(store.clone(), publisher.clone(), 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.due, 3);
    assert_eq!(report.published, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.exhausted, 0);
    assert_eq!(*publisher.auth_calls.lock().unwrap(), 1);

    let ok = reload(&store, ok.id).await;
    assert_eq!(ok.status, PostStatus::Posted);
    assert_eq!(ok.external_id.as_deref(), Some("urn:li:share:1"));

    let bad = reload(&store, bad.id).await;
    assert_eq!(bad.status, PostStatus::Scheduled);
    assert_eq!(bad.publish_attempts, 1);
    assert!(bad.last_publish_error.is_some());
    assert!(bad.check_invariants().is_ok());

    assert_eq!(reload(&store, also_ok.id).await.status, PostStatus::Posted);
}

#[tokio::test]
async fn test_outbound_text_joins_hashtags() {
    let store = Arc::new(InMemoryStore::new());
    scheduled(&store, "Hello world", -1).await;
    let publisher = Arc::new(FakePublisher::default());

    worker(store, publisher.clone(), 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(
        publisher.published.lock().unwrap().as_slice(),
        ["Hello world\n\n#test"]
    );
}

#[tokio::test]
async fn test_authentication_failure_changes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let post = scheduled(&store, "first", -1).await;
    let publisher = Arc::new(FakePublisher {
        reject_auth: true,
        ..FakePublisher::default()
    });

    let result = worker(store.clone(), publisher.clone(), 5)
        .run_tick(Utc::now())
        .await;

    assert!(matches!(result, Err(TickError::Authentication(_))));
    let post = reload(&store, post.id).await;
    assert_eq!(post.status, PostStatus::Scheduled);
    assert_eq!(post.publish_attempts, 0);
}

#[tokio::test]
async fn test_repeated_failures_reach_failed() {
    let store = Arc::new(InMemoryStore::new());
    let post = scheduled(&store, "boom", -1).await;
    let publisher = Arc::new(FakePublisher::default());
    let worker = worker(store.clone(), publisher, 2);

    let first = worker.run_tick(Utc::now()).await.unwrap();
    assert_eq!(first.failed, 1);
    assert_eq!(first.exhausted, 0);

    let second = worker.run_tick(Utc::now()).await.unwrap();
    assert_eq!(second.exhausted, 1);

    let post = reload(&store, post.id).await;
    assert_eq!(post.status, PostStatus::Failed);
    assert_eq!(post.scheduled_for, None);
    assert_eq!(post.publish_attempts, 2);
    assert!(post.check_invariants().is_ok());

    let third = worker.run_tick(Utc::now()).await.unwrap();
    assert_eq!(third, TickReport::default());
}

#[tokio::test]
async fn test_edit_during_tick_wins() {
    let store = Arc::new(InMemoryStore::new());
    let post = scheduled(&store, "edited", -1).await;
    let publisher = Arc::new(FakePublisher {
        store: Some(store.clone()),
        ..FakePublisher::default()
    });

    let report = worker(store.clone(), publisher, 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.published, 0);

    let post = reload(&store, post.id).await;
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.external_id, None);
}

#[tokio::test]
async fn test_posted_posts_are_not_republished() {
    let store = Arc::new(InMemoryStore::new());
    scheduled(&store, "once", -1).await;
    let publisher = Arc::new(FakePublisher::default());
    let worker = worker(store, publisher.clone(), 5);

    worker.run_tick(Utc::now()).await.unwrap();
    let second = worker.run_tick(Utc::now()).await.unwrap();

    assert_eq!(second.due, 0);
    assert_eq!(publisher.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reschedule_during_failed_publish_is_kept() {
    let store = Arc::new(InMemoryStore::new());
    let post = scheduled(&store, "moved", -1).await;
    let publisher = Arc::new(FakePublisher {
        store: Some(store.clone()),
        ..FakePublisher::default()
    });

    let report = worker(store.clone(), publisher, 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.failed, 0);

    let post = reload(&store, post.id).await;
    assert_eq!(post.status, PostStatus::Scheduled);
    assert!(post.scheduled_for.unwrap() > Utc::now() + Duration::hours(23));
    assert_eq!(post.publish_attempts, 0);
    assert_eq!(post.last_publish_error, None);
    assert!(!post.is_due(Utc::now()));
}

#[tokio::test]
async fn test_rewrite_during_publish_is_not_marked_posted() {
    let store = Arc::new(InMemoryStore::new());
    let post = scheduled(&store, "reworded", -1).await;
    let publisher = Arc::new(FakePublisher {
        store: Some(store.clone()),
        ..FakePublisher::default()
    });

    let report = worker(store.clone(), publisher, 5)
        .run_tick(Utc::now())
        .await
        .unwrap();

    assert_eq!(report.conflicts, 1);
    assert_eq!(report.published, 0);

    let post = reload(&store, post.id).await;
    assert_eq!(post.status, PostStatus::Scheduled);
    assert_eq!(post.text, "Second draft");
    assert_eq!(post.external_id, None);
}
