//! Post entity and its publication lifecycle.
//!
//! ```text
//! draft ──schedule──▶ scheduled ──mark_posted──▶ posted
//!   ▲                   │   │
//!   └────unschedule─────┘   └──record_publish_failure (exhausted)──▶ failed
//! ```
//!
//! `failed` posts can be scheduled again, which resets the attempt counter.
//! Every transition validates first and mutates after, so a rejected transition
//! leaves the post untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Posted,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Posted => "posted",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "posted" => Ok(PostStatus::Posted),
            "failed" => Ok(PostStatus::Failed),
            other => Err(DomainError::Validation(format!(
                "unknown post status '{other}'"
            ))),
        }
    }
}

/// Post entity - one piece of social content owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub hashtags: String,
    pub status: PostStatus,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub label_id: Option<i64>,
    pub blog_post_id: Option<i64>,
    /// Identifier returned by the publishing service.
    pub external_id: Option<String>,
    /// Consecutive failed publish attempts since the post was last scheduled.
    pub publish_attempts: u32,
    pub last_publish_error: Option<String>,
    /// Row version, advanced by every stored update. Compare-and-set writes
    /// only apply while the row is still at the version that was loaded.
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

/// Draft content before it is persisted, produced by manual entry or generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPost {
    pub text: String,
    pub hashtags: String,
}

impl DraftPost {
    pub fn new(text: impl Into<String>, hashtags: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hashtags: hashtags.into(),
        }
    }
}

/// A full edit of a post. A missing `scheduled_for` means the post goes back to draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub text: String,
    pub hashtags: String,
    pub label_id: Option<i64>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl Post {
    /// Attach a publication time. Times in the past are accepted; the next
    /// worker tick picks them up.
    pub fn schedule(&mut self, when: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_editable("schedule")?;
        self.status = PostStatus::Scheduled;
        self.scheduled_for = Some(when);
        self.publish_attempts = 0;
        self.last_publish_error = None;
        Ok(())
    }

    /// Drop the publication time and return to draft.
    pub fn unschedule(&mut self) -> Result<(), DomainError> {
        self.ensure_editable("unschedule")?;
        self.status = PostStatus::Draft;
        self.scheduled_for = None;
        self.publish_attempts = 0;
        self.last_publish_error = None;
        Ok(())
    }

    /// Rewrite content and re-derive the schedule in one step.
    ///
    /// Editing a scheduled post without supplying a time unschedules it.
    pub fn apply_edit(&mut self, edit: PostEdit) -> Result<(), DomainError> {
        self.ensure_editable("edit")?;
        self.text = edit.text;
        self.hashtags = edit.hashtags;
        self.label_id = edit.label_id;
        match edit.scheduled_for {
            Some(when) => self.schedule(when),
            None => self.unschedule(),
        }
    }

    /// Record a successful publication.
    pub fn mark_posted(&mut self, external_id: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_scheduled("mark as posted")?;
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "external identifier must not be empty".to_string(),
            ));
        }
        self.status = PostStatus::Posted;
        self.external_id = Some(external_id);
        self.last_publish_error = None;
        Ok(())
    }

    /// Record a failed publication attempt.
    ///
    /// The post stays scheduled (and is retried on the next tick) until
    /// `max_attempts` consecutive failures, then becomes `failed`.
    /// `max_attempts == 0` retries forever.
    pub fn record_publish_failure(
        &mut self,
        error: impl Into<String>,
        max_attempts: u32,
    ) -> Result<(), DomainError> {
        self.ensure_scheduled("record a failure for")?;
        self.publish_attempts = self.publish_attempts.saturating_add(1);
        self.last_publish_error = Some(error.into());
        if max_attempts > 0 && self.publish_attempts >= max_attempts {
            self.status = PostStatus::Failed;
            self.scheduled_for = None;
        }
        Ok(())
    }

    /// Whether the worker should publish this post at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_for.is_some_and(|at| at <= now)
    }

    /// Text sent to the publishing service.
    pub fn outbound_text(&self) -> String {
        let text = self.text.trim();
        let hashtags = self.hashtags.trim();
        if hashtags.is_empty() {
            text.to_string()
        } else {
            format!("{text}\n\n{hashtags}")
        }
    }

    /// Verify the status/field invariants.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let scheduled = self.status == PostStatus::Scheduled;
        if scheduled != self.scheduled_for.is_some() {
            return Err(DomainError::Internal(format!(
                "post {} is {} but scheduled_for is {:?}",
                self.id, self.status, self.scheduled_for
            )));
        }
        match self.status {
            PostStatus::Posted if self.external_id.is_none() => Err(DomainError::Internal(
                format!("post {} is posted without an external id", self.id),
            )),
            PostStatus::Failed if self.last_publish_error.is_none() => Err(
                DomainError::Internal(format!("post {} failed without an error", self.id)),
            ),
            _ => Ok(()),
        }
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), DomainError> {
        if self.status == PostStatus::Posted {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }

    fn ensure_scheduled(&self, action: &'static str) -> Result<(), DomainError> {
        if self.status != PostStatus::Scheduled {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn draft() -> Post {
        Post {
            id: 1,
            user_id: 7,
            text: "Shipping day".to_string(),
            hashtags: "#rust".to_string(),
            status: PostStatus::Draft,
            scheduled_for: None,
            label_id: None,
            blog_post_id: None,
            external_id: None,
            publish_attempts: 0,
            last_publish_error: None,
            version: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            PostStatus::Draft,
            PostStatus::Scheduled,
            PostStatus::Posted,
            PostStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_schedule_sets_time_and_status() {
        let mut post = draft();
        let when = Utc::now() + TimeDelta::hours(2);

        post.schedule(when).unwrap();

        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.scheduled_for, Some(when));
        post.check_invariants().unwrap();
    }

    #[test]
    fn test_schedule_into_the_past_is_due_immediately() {
        let mut post = draft();
        let now = Utc::now();
        post.schedule(now - TimeDelta::minutes(5)).unwrap();
        assert!(post.is_due(now));
    }

    #[test]
    fn test_reschedule_replaces_time() {
        let mut post = draft();
        let first = Utc::now() + TimeDelta::hours(1);
        let second = first + TimeDelta::days(1);
        post.schedule(first).unwrap();
        post.schedule(second).unwrap();
        assert_eq!(post.scheduled_for, Some(second));
    }

    #[test]
    fn test_edit_without_time_reverts_to_draft() {
        let mut post = draft();
        post.schedule(Utc::now() + TimeDelta::hours(1)).unwrap();

        post.apply_edit(PostEdit {
            text: "Rewritten".to_string(),
            hashtags: "#edited".to_string(),
            label_id: Some(3),
            scheduled_for: None,
        })
        .unwrap();

        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.scheduled_for, None);
        assert_eq!(post.text, "Rewritten");
        assert_eq!(post.label_id, Some(3));
        post.check_invariants().unwrap();
    }

    #[test]
    fn test_edit_with_time_schedules() {
        let mut post = draft();
        let when = Utc::now() + TimeDelta::hours(3);
        post.apply_edit(PostEdit {
            text: "Body".to_string(),
            hashtags: String::new(),
            label_id: None,
            scheduled_for: Some(when),
        })
        .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.scheduled_for, Some(when));
    }

    #[test]
    fn test_posted_post_rejects_edits() {
        let mut post = draft();
        post.schedule(Utc::now()).unwrap();
        post.mark_posted("urn:li:share:1").unwrap();
        let before = post.clone();

        let result = post.apply_edit(PostEdit {
            text: "too late".to_string(),
            hashtags: String::new(),
            label_id: None,
            scheduled_for: None,
        });

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                from: PostStatus::Posted,
                ..
            })
        ));
        assert_eq!(post, before);
    }

    #[test]
    fn test_mark_posted_requires_scheduled() {
        let mut post = draft();
        assert!(post.mark_posted("urn:li:share:1").is_err());
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[test]
    fn test_mark_posted_rejects_empty_identifier() {
        let mut post = draft();
        post.schedule(Utc::now()).unwrap();
        assert!(post.mark_posted("  ").is_err());
        assert_eq!(post.status, PostStatus::Scheduled);
    }

    #[test]
    fn test_failure_keeps_post_scheduled_until_exhausted() {
        let mut post = draft();
        let when = Utc::now();
        post.schedule(when).unwrap();

        post.record_publish_failure("timeout", 3).unwrap();
        post.record_publish_failure("timeout", 3).unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.scheduled_for, Some(when));
        assert_eq!(post.publish_attempts, 2);

        post.record_publish_failure("rejected", 3).unwrap();
        assert_eq!(post.status, PostStatus::Failed);
        assert_eq!(post.scheduled_for, None);
        assert_eq!(post.last_publish_error.as_deref(), Some("rejected"));
        post.check_invariants().unwrap();
    }

    #[test]
    fn test_zero_max_attempts_retries_forever() {
        let mut post = draft();
        post.schedule(Utc::now()).unwrap();
        for _ in 0..50 {
            post.record_publish_failure("down", 0).unwrap();
        }
        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.publish_attempts, 50);
    }

    #[test]
    fn test_rescheduling_failed_post_resets_attempts() {
        let mut post = draft();
        post.schedule(Utc::now()).unwrap();
        post.record_publish_failure("down", 1).unwrap();
        assert_eq!(post.status, PostStatus::Failed);

        post.schedule(Utc::now() + TimeDelta::hours(1)).unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert_eq!(post.publish_attempts, 0);
        assert_eq!(post.last_publish_error, None);
    }

    #[test]
    fn test_future_post_is_not_due() {
        let mut post = draft();
        let now = Utc::now();
        post.schedule(now + TimeDelta::seconds(1)).unwrap();
        assert!(!post.is_due(now));
        assert!(!draft().is_due(now));
    }

    #[test]
    fn test_outbound_text_joins_hashtags() {
        let post = draft();
        assert_eq!(post.outbound_text(), "Shipping day\n\n#rust");

        let bare = Post {
            hashtags: "  ".to_string(),
            ..draft()
        };
        assert_eq!(bare.outbound_text(), "Shipping day");
    }

    #[test]
    fn test_invariant_check_flags_inconsistent_rows() {
        let broken = Post {
            status: PostStatus::Scheduled,
            ..draft()
        };
        assert!(broken.check_invariants().is_err());

        let posted_without_id = Post {
            status: PostStatus::Posted,
            ..draft()
        };
        assert!(posted_without_id.check_invariants().is_err());
    }
}
