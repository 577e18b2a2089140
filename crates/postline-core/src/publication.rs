//! Scheduled publication worker.
//!
//! One tick selects every due post, authenticates once with the publisher and
//! publishes the posts one by one. Each outcome is committed on its own with a
//! compare-and-set on the row version read at selection time, so a failure
//! later in the tick never undoes an earlier success and a post edited,
//! rescheduled or deleted mid-tick is left as its owner left it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{Post, PostStatus};
use crate::error::RepoError;
use crate::ports::{PostRepository, PublishError, PublishSession, Publisher};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between ticks.
    pub interval: Duration,
    /// Consecutive failures before a post is marked `failed` (0 = never).
    pub max_attempts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

/// Counters for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub published: usize,
    pub failed: usize,
    /// Posts that reached the terminal `failed` state during this tick.
    pub exhausted: usize,
    /// Posts changed by someone else between selection and commit.
    pub conflicts: usize,
}

/// Errors that abort a whole tick.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("Could not load due posts: {0}")]
    Store(#[from] RepoError),

    #[error("Publisher authentication failed: {0}")]
    Authentication(#[from] PublishError),
}

pub struct PublicationWorker {
    posts: Arc<dyn PostRepository>,
    publisher: Arc<dyn Publisher>,
    config: WorkerConfig,
    tick_lock: Mutex<()>,
}

impl PublicationWorker {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        publisher: Arc<dyn Publisher>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            posts,
            publisher,
            config,
            tick_lock: Mutex::new(()),
        }
    }

    /// Run one tick as of `now`. Concurrent calls queue behind each other.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> Result<TickReport, TickError> {
        let _running = self.tick_lock.lock().await;

        let due = self.posts.find_due(now).await?;
        if due.is_empty() {
            tracing::debug!("No posts due for publishing");
            return Ok(TickReport::default());
        }
        tracing::info!(count = due.len(), "Found posts due for publishing");

        let session = self.publisher.authenticate().await?;

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };
        for post in due {
            self.publish_one(session.as_ref(), post, &mut report).await;
        }

        tracing::info!(
            due = report.due,
            published = report.published,
            failed = report.failed,
            exhausted = report.exhausted,
            conflicts = report.conflicts,
            "Publication tick finished"
        );
        Ok(report)
    }

    async fn publish_one(
        &self,
        session: &dyn PublishSession,
        mut post: Post,
        report: &mut TickReport,
    ) {
        let post_id = post.id;
        let outcome = match session.publish(&post.outbound_text()).await {
            Ok(external_id) => post.mark_posted(external_id).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let published = match outcome {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!(post_id, error = %reason, "Failed to publish post");
                if let Err(e) = post.record_publish_failure(reason, self.config.max_attempts) {
                    tracing::error!(post_id, error = %e, "Post left the scheduled state mid-tick");
                    report.failed += 1;
                    return;
                }
                false
            }
        };

        match self.posts.save_lifecycle(&mut post, PostStatus::Scheduled).await {
            Ok(true) if published => {
                report.published += 1;
                tracing::info!(
                    post_id,
                    external_id = post.external_id.as_deref().unwrap_or_default(),
                    "Published post"
                );
            }
            Ok(true) => {
                report.failed += 1;
                if post.status == PostStatus::Failed {
                    report.exhausted += 1;
                    tracing::error!(
                        post_id,
                        attempts = post.publish_attempts,
                        "Giving up on post after repeated publish failures"
                    );
                }
            }
            Ok(false) => {
                report.conflicts += 1;
                tracing::warn!(
                    post_id,
                    published,
                    "Post changed while publishing; result not recorded"
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(post_id, published, error = %e, "Failed to record publish outcome");
            }
        }
    }
}
