//! In-memory storage - used when no database is configured, and in tests.
//!
//! Users and posts live behind one lock so the store can enforce what the
//! PostgreSQL schema enforces: the author foreign key with cascading delete,
//! unique usernames and a unique `(publish date, slug)` pair.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Post, Slug, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};
use blog_core::query::{OrderingTerm, Page, PageRequest, PostFilter, sort_posts};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

impl Tables {
    fn check_post(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::MissingReference(format!(
                "author {} does not exist",
                post.author_id
            )));
        }

        let date = post.publish_date();
        let clash = self
            .posts
            .values()
            .any(|p| p.id != post.id && p.slug == post.slug && p.publish_date() == date);
        if clash {
            return Err(RepoError::Constraint(format!(
                "slug '{}' already used on {date}",
                post.slug
            )));
        }

        Ok(())
    }

    /// Drop the user and, like `ON DELETE CASCADE`, every post they wrote.
    fn remove_user(&mut self, id: Uuid) -> Result<u64, RepoError> {
        if self.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let before = self.posts.len();
        self.posts.retain(|_, post| post.author_id != id);
        Ok((before - self.posts.len()) as u64)
    }
}

/// Shared in-memory tables. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.contains_key(&user.id)
            || tables.users.values().any(|u| u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "user '{}' already exists",
                user.username
            )));
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "user '{}' already exists",
                user.username
            )));
        }

        let stored = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        *stored = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.delete_with_posts(id).await.map(|_| ())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn delete_with_posts(&self, id: Uuid) -> Result<u64, RepoError> {
        let removed = self.tables.write().await.remove_user(id)?;
        tracing::debug!(user_id = %id, removed_posts = removed, "Cascaded user deletion");
        Ok(removed)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} already exists", post.id)));
        }
        tables.check_post(&post)?;

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    /// `created` keeps its stored value whatever the caller passes.
    async fn update(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;

        let created = tables
            .posts
            .get(&post.id)
            .map(|p| p.created)
            .ok_or(RepoError::NotFound)?;
        post.created = created;
        tables.check_post(&post)?;

        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.tables.write().await.posts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        filter: &PostFilter,
        ordering: &[OrderingTerm],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let mut matching: Vec<Post> = {
            let tables = self.tables.read().await;
            tables
                .posts
                .values()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect()
        };
        sort_posts(&mut matching, ordering);

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn find_by_date_and_slug(
        &self,
        date: NaiveDate,
        slug: &Slug,
    ) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .find(|p| &p.slug == slug && p.publish_date() == date)
            .cloned())
    }

    async fn slug_taken(
        &self,
        date: NaiveDate,
        slug: &Slug,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().any(|p| {
            Some(p.id) != exclude && &p.slug == slug && p.publish_date() == date
        }))
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        sort_posts(&mut posts, &blog_core::query::DEFAULT_ORDERING);
        Ok(posts)
    }

    async fn publish_dates(&self, filter: &PostFilter) -> Result<Vec<NaiveDate>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|p| filter.matches(p))
            .map(Post::publish_date)
            .collect())
    }
}

#[cfg(test)]
mod tests;
