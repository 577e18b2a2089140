//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;

use postline_core::domain::PostStatus;

/// `posts.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => Status::Draft,
            PostStatus::Scheduled => Status::Scheduled,
            PostStatus::Posted => Status::Posted,
            PostStatus::Failed => Status::Failed,
        }
    }
}

impl From<Status> for PostStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => PostStatus::Draft,
            Status::Scheduled => PostStatus::Scheduled,
            Status::Posted => PostStatus::Posted,
            Status::Failed => PostStatus::Failed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub post_text: String,
    #[sea_orm(column_type = "Text")]
    pub hashtags: String,
    pub status: Status,
    pub scheduled_for: Option<DateTimeWithTimeZone>,
    pub label_id: Option<i64>,
    pub blog_post_id: Option<i64>,
    pub linkedin_post_urn: Option<String>,
    pub publish_attempts: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_publish_error: Option<String>,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::label::Entity",
        from = "Column::LabelId",
        to = "super::label::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Label,
    #[sea_orm(
        belongs_to = "super::blog_post::Entity",
        from = "Column::BlogPostId",
        to = "super::blog_post::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    BlogPost,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Label.def()
    }
}

impl Related<super::blog_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlogPost.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for postline_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            text: model.post_text,
            hashtags: model.hashtags,
            status: model.status.into(),
            scheduled_for: model.scheduled_for.map(Into::into),
            label_id: model.label_id,
            blog_post_id: model.blog_post_id,
            external_id: model.linkedin_post_urn,
            publish_attempts: u32::try_from(model.publish_attempts).unwrap_or_default(),
            last_publish_error: model.last_publish_error,
            version: u32::try_from(model.version).unwrap_or_default(),
            created_at: model.created_at.into(),
        }
    }
}
