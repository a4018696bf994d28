//! Post entity for SeaORM.

use sea_orm::{NotSet, Set};
use sea_orm::entity::prelude::*;

use blog_core::domain::{PostStatus, Slug};
use blog_core::error::RepoError;

/// `status` column, stored as `varchar(10)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Status {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
}

impl From<PostStatus> for Status {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => Status::Draft,
            PostStatus::Published => Status::Published,
        }
    }
}

impl From<Status> for PostStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => PostStatus::Draft,
            Status::Published => PostStatus::Published,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(indexed)]
    pub slug: String,
    pub author_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub publish: DateTimeWithTimeZone,
    pub created: DateTimeWithTimeZone,
    pub updated: DateTimeWithTimeZone,
    pub status: Status,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// `created` is written once, on insert.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.created = NotSet;
        }
        Ok(self)
    }
}

/// Conversion from SeaORM Model to Domain Post. Rows written outside the
/// application may carry a slug the domain rejects.
impl TryFrom<Model> for blog_core::domain::Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let slug = Slug::new(model.slug)
            .map_err(|e| RepoError::Query(format!("post {} has a malformed slug: {e}", model.id)))?;

        Ok(Self {
            id: model.id,
            title: model.title,
            slug,
            author_id: model.author_id,
            body: model.body,
            publish: model.publish.into(),
            created: model.created.into(),
            updated: model.updated.into(),
            status: model.status.into(),
        })
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<blog_core::domain::Post> for ActiveModel {
    fn from(post: blog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            slug: Set(post.slug.into()),
            author_id: Set(post.author_id),
            body: Set(post.body),
            publish: Set(post.publish.into()),
            created: Set(post.created.into()),
            updated: Set(post.updated.into()),
            status: Set(post.status.into()),
        }
    }
}
