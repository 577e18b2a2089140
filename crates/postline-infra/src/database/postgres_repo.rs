//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, TransactionTrait, UpdateMany,
};

use postline_core::domain::{
    BlogPost, DraftPost, Label, NewBlogPost, NewLabel, NewUser, Post, PostStatus, User,
};
use postline_core::error::RepoError;
use postline_core::ports::{
    BlogPostRepository, CalendarEntry, LabelRepository, PostRepository, UserRepository,
};

use super::entity::blog_post::{self, Entity as BlogPostEntity};
use super::entity::label::{self, Entity as LabelEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL label repository.
pub type PostgresLabelRepository = PostgresBaseRepository<LabelEntity>;

/// PostgreSQL blog post repository.
pub type PostgresBlogPostRepository = PostgresBaseRepository<BlogPostEntity>;

fn db_time(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

fn db_counter(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Insert drafts on `conn`, which is a transaction in every caller.
async fn insert_drafts<C: ConnectionTrait>(
    conn: &C,
    owner: i64,
    blog_post_id: Option<i64>,
    drafts: Vec<DraftPost>,
) -> Result<Vec<Post>, DbErr> {
    let now = db_time(Utc::now());
    let mut created = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let model = post::ActiveModel {
            id: NotSet,
            user_id: Set(owner),
            post_text: Set(draft.text),
            hashtags: Set(draft.hashtags),
            status: Set(post::Status::Draft),
            scheduled_for: Set(None),
            label_id: Set(None),
            blog_post_id: Set(blog_post_id),
            linkedin_post_urn: Set(None),
            publish_attempts: Set(0),
            last_publish_error: Set(None),
            version: Set(0),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
        created.push(model.into());
    }

    Ok(created)
}

/// Add the lifecycle columns of `post` to an update and guard it on the
/// version `post` was loaded at.
fn set_lifecycle(update: UpdateMany<PostEntity>, post: &Post) -> UpdateMany<PostEntity> {
    update
        .col_expr(
            post::Column::Version,
            Expr::col(post::Column::Version).add(1),
        )
        .col_expr(
            post::Column::Status,
            Expr::value(post::Status::from(post.status)),
        )
        .col_expr(
            post::Column::ScheduledFor,
            Expr::value(post.scheduled_for.map(db_time)),
        )
        .col_expr(
            post::Column::LinkedinPostUrn,
            Expr::value(post.external_id.clone()),
        )
        .col_expr(
            post::Column::PublishAttempts,
            Expr::value(db_counter(post.publish_attempts)),
        )
        .col_expr(
            post::Column::LastPublishError,
            Expr::value(post.last_publish_error.clone()),
        )
        .filter(post::Column::Id.eq(post.id))
        .filter(post::Column::Version.eq(db_counter(post.version)))
}

/// Apply a guarded update result to the caller's copy.
fn applied(post: &mut Post, rows_affected: u64) -> bool {
    if rows_affected == 0 {
        return false;
    }
    post.version = post.version.saturating_add(1);
    true
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(new.username),
            password_hash: Set(new.password_hash),
            created_at: Set(db_time(Utc::now())),
        }
        .insert(&self.db)
        .await
        .map_err(repo_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .filter(post::Column::UserId.eq(owner))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::UserId.eq(owner))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_calendar(&self, owner: i64) -> Result<Vec<CalendarEntry>, RepoError> {
        let rows = PostEntity::find()
            .find_also_related(LabelEntity)
            .filter(post::Column::UserId.eq(owner))
            .filter(post::Column::Status.eq(post::Status::Scheduled))
            .filter(post::Column::ScheduledFor.is_not_null())
            .order_by_asc(post::Column::ScheduledFor)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(rows
            .into_iter()
            .map(|(post, label)| CalendarEntry {
                post: post.into(),
                label_color: label.map(|l| l.color),
            })
            .collect())
    }

    async fn create_drafts(
        &self,
        owner: i64,
        drafts: Vec<DraftPost>,
    ) -> Result<Vec<Post>, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let created = insert_drafts(&txn, owner, None, drafts)
            .await
            .map_err(repo_err)?;
        txn.commit().await.map_err(repo_err)?;

        tracing::debug!(user_id = owner, count = created.len(), "Inserted draft posts");
        Ok(created)
    }

    async fn save_edit(
        &self,
        post: &mut Post,
        expected: PostStatus,
    ) -> Result<bool, RepoError> {
        let update = PostEntity::update_many()
            .col_expr(post::Column::PostText, Expr::value(post.text.clone()))
            .col_expr(post::Column::Hashtags, Expr::value(post.hashtags.clone()))
            .col_expr(post::Column::LabelId, Expr::value(post.label_id));

        let result = set_lifecycle(update, post)
            .filter(post::Column::UserId.eq(post.user_id))
            .filter(post::Column::Status.eq(post::Status::from(expected)))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(applied(post, result.rows_affected))
    }

    async fn save_lifecycle(
        &self,
        post: &mut Post,
        expected: PostStatus,
    ) -> Result<bool, RepoError> {
        let result = set_lifecycle(PostEntity::update_many(), post)
            .filter(post::Column::Status.eq(post::Status::from(expected)))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        if result.rows_affected == 0 {
            tracing::debug!(post_id = post.id, version = post.version, "Stale lifecycle write");
        }
        Ok(applied(post, result.rows_affected))
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::UserId.eq(owner))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(post::Status::Scheduled))
            .filter(post::Column::ScheduledFor.lte(db_time(now)))
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LabelRepository for PostgresLabelRepository {
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<Label>, RepoError> {
        let result = LabelEntity::find()
            .filter(label::Column::UserId.eq(owner))
            .order_by_asc(label::Column::Name)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<Label>, RepoError> {
        let result = LabelEntity::find_by_id(id)
            .filter(label::Column::UserId.eq(owner))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, owner: i64, new: NewLabel) -> Result<Label, RepoError> {
        let model = label::ActiveModel {
            id: NotSet,
            user_id: Set(owner),
            name: Set(new.name),
            color: Set(new.color),
            created_at: Set(db_time(Utc::now())),
        }
        .insert(&self.db)
        .await
        .map_err(repo_err)?;

        Ok(model.into())
    }

    async fn delete_owned(&self, owner: i64, id: i64) -> Result<bool, RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;

        let unlinked = PostEntity::update_many()
            .col_expr(post::Column::LabelId, Expr::value(Option::<i64>::None))
            .filter(post::Column::LabelId.eq(id))
            .filter(post::Column::UserId.eq(owner))
            .exec(&txn)
            .await
            .map_err(repo_err)?;

        let deleted = LabelEntity::delete_many()
            .filter(label::Column::Id.eq(id))
            .filter(label::Column::UserId.eq(owner))
            .exec(&txn)
            .await
            .map_err(repo_err)?;

        txn.commit().await.map_err(repo_err)?;

        tracing::debug!(
            label_id = id,
            user_id = owner,
            posts_unlinked = unlinked.rows_affected,
            "Deleted label"
        );
        Ok(deleted.rows_affected > 0)
    }
}

#[async_trait]
impl BlogPostRepository for PostgresBlogPostRepository {
    async fn list_by_owner(&self, owner: i64) -> Result<Vec<BlogPost>, RepoError> {
        let result = BlogPostEntity::find()
            .filter(blog_post::Column::UserId.eq(owner))
            .order_by_desc(blog_post::Column::CreatedAt)
            .order_by_desc(blog_post::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_owned(&self, owner: i64, id: i64) -> Result<Option<BlogPost>, RepoError> {
        let result = BlogPostEntity::find_by_id(id)
            .filter(blog_post::Column::UserId.eq(owner))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_owned(
        &self,
        owner: i64,
        id: i64,
        title: String,
        content: String,
    ) -> Result<Option<BlogPost>, RepoError> {
        let Some(model) = BlogPostEntity::find_by_id(id)
            .filter(blog_post::Column::UserId.eq(owner))
            .one(&self.db)
            .await
            .map_err(repo_err)?
        else {
            return Ok(None);
        };

        let mut active: blog_post::ActiveModel = model.into();
        active.title = Set(title);
        active.content = Set(content);
        let updated = active.update(&self.db).await.map_err(repo_err)?;

        Ok(Some(updated.into()))
    }

    async fn create_with_posts(
        &self,
        owner: i64,
        blog: NewBlogPost,
        drafts: Vec<DraftPost>,
    ) -> Result<(BlogPost, Vec<Post>), RepoError> {
        let txn = self.db.begin().await.map_err(repo_err)?;

        let blog = blog_post::ActiveModel {
            id: NotSet,
            user_id: Set(owner),
            title: Set(blog.title),
            content: Set(blog.content),
            created_at: Set(db_time(Utc::now())),
        }
        .insert(&txn)
        .await
        .map_err(repo_err)?;

        let posts = insert_drafts(&txn, owner, Some(blog.id), drafts)
            .await
            .map_err(repo_err)?;

        txn.commit().await.map_err(repo_err)?;

        Ok((blog.into(), posts))
    }
}
