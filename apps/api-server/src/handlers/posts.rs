//! Public post endpoints: the listing and the permalink page.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;

use blog_core::domain::Slug;
use blog_core::query::PageRequest;
use blog_core::service::DEFAULT_PUBLIC_PER_PAGE;
use blog_shared::dto::PageParams;

use super::{page_response, post_response};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/posts
///
/// Published posts, newest first.
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PUBLIC_PER_PAGE),
    )?;

    let posts = state.blog.list_published(page).await?;
    Ok(HttpResponse::Ok().json(page_response(posts)))
}

/// GET /api/posts/{year}/{month}/{day}/{slug}
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<(i32, u32, u32, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let not_found = || AppError::NotFound(format!("no post at {year}/{month}/{day}/{slug}"));

    // Impossible dates and malformed slugs cannot name a post.
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
    let slug = Slug::new(slug.clone()).map_err(|_| not_found())?;

    let post = state.blog.find_published(date, &slug).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}
