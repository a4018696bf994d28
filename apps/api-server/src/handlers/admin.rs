//! Admin endpoints: the post change list, post editing and authors.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blog_core::domain::{NewPost, PostChanges, PostStatus, Slug, slugify};
use blog_core::error::DomainError;
use blog_core::query::{DateHierarchy, DateRangeFilter, PostQuery, parse_ordering};
use blog_shared::dto::{
    AdminListParams, AdminListResponse, CreatePostRequest, CreateUserRequest, DeleteUserResponse,
    DrillDownResponse, SlugSuggestion, SlugifyParams, UpdatePostRequest, UserResponse,
};

use super::{page_response, permalink, post_response};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/admin/posts/config
pub async fn admin_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.blog.admin_config())
}

/// GET /api/admin/posts
///
/// The change list: filters, search, ordering, paging and the publish-date
/// drill-down.
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<AdminListParams>,
) -> AppResult<HttpResponse> {
    let query = list_query(query.into_inner())?;
    let listing = state.blog.admin_list(query).await?;

    Ok(HttpResponse::Ok().json(AdminListResponse {
        page: page_response(listing.page),
        drill_down: listing.drill_down.map(|d| DrillDownResponse {
            level: d.level.as_str().to_string(),
            dates: d.dates,
        }),
    }))
}

/// POST /api/admin/posts
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let input = NewPost {
        title: req.title,
        slug: req.slug.map(Slug::new).transpose()?,
        author_id: req.author_id,
        body: req.body,
        publish: req.publish,
        status: parse_status(req.status.as_deref())?,
    };

    let post = state.blog.create_post(input).await?;
    Ok(HttpResponse::Created()
        .insert_header(("Location", permalink(&post)))
        .json(post_response(post)))
}

/// GET /api/admin/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.blog.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PATCH /api/admin/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let changes = PostChanges {
        title: req.title,
        slug: req.slug.map(Slug::new).transpose()?,
        author_id: req.author_id,
        body: req.body,
        publish: req.publish,
        status: parse_status(req.status.as_deref())?,
    };

    let post = state.blog.update_post(path.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.blog.delete_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/admin/slugify?title=...
///
/// What the slug field gets prepopulated with while the title is typed.
pub async fn suggest_slug(query: web::Query<SlugifyParams>) -> HttpResponse {
    HttpResponse::Ok().json(SlugSuggestion {
        slug: slugify(&query.title).map(String::from),
    })
}

/// POST /api/admin/users
pub async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state.blog.create_user(req.username, req.email).await?;

    Ok(HttpResponse::Created().json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.blog.get_user(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }))
}

/// DELETE /api/admin/users/{id}
///
/// Removes the user's posts too.
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let deleted_posts = state.blog.delete_user(id).await?;

    Ok(HttpResponse::Ok().json(DeleteUserResponse { id, deleted_posts }))
}

fn parse_status(raw: Option<&str>) -> Result<Option<PostStatus>, DomainError> {
    raw.map(str::parse).transpose()
}

fn parse_range(raw: Option<&str>) -> Result<Option<DateRangeFilter>, DomainError> {
    raw.map(str::parse).transpose()
}

fn list_query(params: AdminListParams) -> Result<PostQuery, DomainError> {
    Ok(PostQuery {
        status: parse_status(params.status.as_deref())?,
        author_id: params.author,
        publish: parse_range(params.publish.as_deref())?,
        created: parse_range(params.created.as_deref())?,
        hierarchy: DateHierarchy {
            year: params.year,
            month: params.month,
            day: params.day,
        },
        search: params.q.filter(|q| !q.trim().is_empty()),
        ordering: params
            .o
            .as_deref()
            .map(parse_ordering)
            .transpose()?
            .unwrap_or_default(),
        page: params.page,
        per_page: params.per_page,
    })
}
