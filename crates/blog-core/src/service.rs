//! Blog use cases, written against the repository ports.
//!
//! Every write goes through here so the post invariants hold regardless of
//! the backing store: the author has to exist, `(publish date, slug)` has to
//! be free, `created` is fixed at insert and `updated` moves forward.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::admin::{AdminConfig, ModelAdmin, PostAdmin};
use crate::domain::{NewPost, Post, PostChanges, PostStatus, Slug, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, UserRepository};
use crate::query::{DEFAULT_ORDERING, DrillDown, Page, PageRequest, PostFilter, PostQuery};

/// Page size of the public listing when the caller does not pick one.
pub const DEFAULT_PUBLIC_PER_PAGE: u64 = 10;

/// Result of an admin change-list request.
#[derive(Debug, Clone, Serialize)]
pub struct AdminListing {
    pub page: Page<Post>,
    /// Next level of the publish-date navigation, if any is left.
    pub drill_down: Option<DrillDown>,
}

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    admin: PostAdmin,
}

impl BlogService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self {
            posts,
            users,
            admin: PostAdmin,
        }
    }

    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig::from_admin(&self.admin)
    }

    pub async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let post = Post::new(input, Utc::now())?;

        self.ensure_author(post.author_id).await?;
        self.ensure_slug_free(&post, None).await?;

        let post = self.posts.insert(post).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "Post created");
        Ok(post)
    }

    pub async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Post, DomainError> {
        let mut post = self.get_post(id).await?;

        let author_changed = changes.author_id.is_some_and(|a| a != post.author_id);
        let key_changed = changes.slug.is_some() || changes.publish.is_some();

        post.apply(changes, Utc::now())?;

        if author_changed {
            self.ensure_author(post.author_id).await?;
        }
        if key_changed {
            self.ensure_slug_free(&post, Some(post.id)).await?;
        }

        let post = self.posts.update(post).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("post", id),
            other => other.into(),
        })?;
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), DomainError> {
        self.posts.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("post", id),
            other => other.into(),
        })?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    /// A published post by its permalink.
    pub async fn find_published(&self, date: NaiveDate, slug: &Slug) -> Result<Post, DomainError> {
        self.posts
            .find_by_date_and_slug(date, slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| {
                DomainError::not_found("post", format!("{}/{slug}", date.format("%Y/%m/%d")))
            })
    }

    /// Published posts, newest first.
    pub async fn list_published(&self, page: PageRequest) -> Result<Page<Post>, DomainError> {
        let filter = PostFilter::with_status(PostStatus::Published);
        Ok(self.posts.list(&filter, &DEFAULT_ORDERING, page).await?)
    }

    /// The admin change list, with the admin defaults applied.
    pub async fn admin_list(&self, query: PostQuery) -> Result<AdminListing, DomainError> {
        self.admin_list_at(query, Utc::now()).await
    }

    pub async fn admin_list_at(
        &self,
        query: PostQuery,
        now: DateTime<Utc>,
    ) -> Result<AdminListing, DomainError> {
        if let Some(term) = query.ordering.iter().find(|t| !self.admin.is_sortable(t.field)) {
            return Err(DomainError::Validation(format!(
                "cannot sort the {} list by '{}'",
                self.admin.model_name(),
                term.field
            )));
        }

        let ordering = if query.ordering.is_empty() {
            self.admin.ordering().to_vec()
        } else {
            query.ordering.clone()
        };
        let page = PageRequest::new(
            query.page.unwrap_or(1),
            query.per_page.unwrap_or_else(|| self.admin.list_per_page()),
        )?;

        let filter = query.resolve(now, self.admin.search_fields())?;
        let page = self.posts.list(&filter, &ordering, page).await?;

        let drill_down = match (self.admin.date_hierarchy(), query.hierarchy.next_level()) {
            (Some(_), Some(level)) => {
                let dates = self.posts.publish_dates(&filter).await?;
                Some(DrillDown::collect(level, dates))
            }
            _ => None,
        };

        Ok(AdminListing { page, drill_down })
    }

    pub async fn create_user(&self, username: String, email: String) -> Result<User, DomainError> {
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "username '{username}' is already taken"
            )));
        }

        let user = self.users.insert(User::new(username, email)?).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", id))
    }

    /// Delete a user together with every post they authored. Returns how many
    /// posts went with them.
    pub async fn delete_user(&self, id: Uuid) -> Result<u64, DomainError> {
        let removed = self.users.delete_with_posts(id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::not_found("user", id),
            other => other.into(),
        })?;

        tracing::info!(user_id = %id, cascaded_posts = removed, "User deleted");
        Ok(removed)
    }

    async fn ensure_author(&self, author_id: Uuid) -> Result<(), DomainError> {
        match self.users.find_by_id(author_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::MissingReference(format!(
                "author {author_id} does not exist"
            ))),
        }
    }

    async fn ensure_slug_free(&self, post: &Post, exclude: Option<Uuid>) -> Result<(), DomainError> {
        let date = post.publish_date();
        if self.posts.slug_taken(date, &post.slug, exclude).await? {
            tracing::debug!(slug = %post.slug, %date, "Slug already used on publish date");
            return Err(DomainError::Duplicate(format!(
                "slug '{}' is already used by a post published on {date}",
                post.slug
            )));
        }
        Ok(())
    }
}
