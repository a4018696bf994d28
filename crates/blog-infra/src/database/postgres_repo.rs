//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, TransactionTrait,
};
use uuid::Uuid;

use blog_core::domain::{Post, Slug, User};
use blog_core::error::RepoError;
use blog_core::ports::{PostRepository, UserRepository};
use blog_core::query::{DateRange, OrderingTerm, Page, PageRequest, PostField, PostFilter};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, convert_all, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        result.map(User::try_from).transpose()
    }

    /// Locks the user row first so no post can be attached to it while the
    /// cascade is counted.
    async fn delete_with_posts(&self, id: Uuid) -> Result<u64, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let locked = UserEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?;
        if locked.is_none() {
            return Err(RepoError::NotFound);
        }

        let removed = PostEntity::delete_many()
            .filter(post::Column::AuthorId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?
            .rows_affected;
        UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(user_id = %id, removed_posts = removed, "Cascaded user deletion");
        Ok(removed)
    }
}

fn column(field: PostField) -> post::Column {
    match field {
        PostField::Title => post::Column::Title,
        PostField::Slug => post::Column::Slug,
        PostField::Author => post::Column::AuthorId,
        PostField::Body => post::Column::Body,
        PostField::Publish => post::Column::Publish,
        PostField::Created => post::Column::Created,
        PostField::Updated => post::Column::Updated,
        PostField::Status => post::Column::Status,
    }
}

/// `%term%`, with LIKE wildcards in the term escaped by a backslash.
pub(crate) fn contains_text(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(contains_text(term)).escape('\\')
}

fn within(col: post::Column, range: &DateRange) -> Condition {
    Condition::all()
        .add(col.gte(range.start))
        .add(col.lt(range.end))
}

fn filtered(filter: &PostFilter) -> Select<PostEntity> {
    let mut cond = Condition::all();

    if let Some(status) = filter.status {
        cond = cond.add(post::Column::Status.eq(post::Status::from(status)));
    }
    if let Some(author_id) = filter.author_id {
        cond = cond.add(post::Column::AuthorId.eq(author_id));
    }
    for range in &filter.publish_ranges {
        cond = cond.add(within(post::Column::Publish, range));
    }
    if let Some(range) = &filter.created_range {
        cond = cond.add(within(post::Column::Created, range));
    }

    // Search terms are already lowercased.
    for term in filter.search.terms() {
        let any_field = filter
            .search_fields
            .iter()
            .fold(Condition::any(), |any, field| {
                any.add(
                    Expr::expr(Func::lower(Expr::col(column(*field))))
                        .like(contains_pattern(term)),
                )
            });
        cond = cond.add(any_field);
    }

    PostEntity::find().filter(cond)
}

fn on_day(date: NaiveDate, slug: &Slug) -> Select<PostEntity> {
    PostEntity::find()
        .filter(post::Column::Slug.eq(slug.as_str()))
        .filter(within(post::Column::Publish, &DateRange::day(date)))
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(
        &self,
        filter: &PostFilter,
        ordering: &[OrderingTerm],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = filtered(filter);
        let total = select.clone().count(&self.db).await.map_err(map_db_err)?;

        let mut select = select;
        for term in ordering {
            let order = if term.descending { Order::Desc } else { Order::Asc };
            select = select.order_by(column(term.field), order);
        }

        let rows = select
            .order_by_asc(post::Column::Id)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        tracing::debug!(total, page = page.page, "Listed posts");

        Ok(Page {
            items: convert_all(rows)?,
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
        let result = on_day(date, slug).one(&self.db).await.map_err(map_db_err)?;

        result.map(Post::try_from).transpose()
    }

    async fn slug_taken(
        &self,
        date: NaiveDate,
        slug: &Slug,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let mut select = on_day(date, slug);
        if let Some(id) = exclude {
            select = select.filter(post::Column::Id.ne(id));
        }

        let count = select.count(&self.db).await.map_err(map_db_err)?;
        Ok(count > 0)
    }

    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::Publish)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        convert_all(result)
    }

    async fn publish_dates(&self, filter: &PostFilter) -> Result<Vec<NaiveDate>, RepoError> {
        let stamps: Vec<sea_orm::prelude::DateTimeWithTimeZone> = filtered(filter)
            .select_only()
            .column(post::Column::Publish)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(stamps
            .into_iter()
            .map(|at| DateTime::<Utc>::from(at).date_naive())
            .collect())
    }
}
