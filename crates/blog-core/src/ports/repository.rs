use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Post, Slug, User};
use crate::error::RepoError;
use crate::query::{OrderingTerm, Page, PageRequest, PostFilter};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Delete the user together with their posts as one atomic step.
    /// Returns how many posts were removed.
    async fn delete_with_posts(&self, id: Uuid) -> Result<u64, RepoError>;
}

/// Post repository.
///
/// Deleting a user through [`UserRepository`] must also remove that user's
/// posts; [`UserRepository::delete_with_posts`] reports how many.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of posts matching `filter`, sorted by `ordering`.
    async fn list(
        &self,
        filter: &PostFilter,
        ordering: &[OrderingTerm],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// The post published on `date` (UTC) under `slug`.
    async fn find_by_date_and_slug(
        &self,
        date: NaiveDate,
        slug: &Slug,
    ) -> Result<Option<Post>, RepoError>;

    /// Whether another post already uses `slug` on `date`.
    async fn slug_taken(
        &self,
        date: NaiveDate,
        slug: &Slug,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError>;

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// Publish dates (UTC days) of every post matching `filter`.
    async fn publish_dates(&self, filter: &PostFilter) -> Result<Vec<NaiveDate>, RepoError>;
}
