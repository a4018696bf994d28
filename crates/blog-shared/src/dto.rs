//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a post. `slug`, `publish` and `status` are optional;
/// the slug is derived from the title when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub author_id: Uuid,
    pub body: String,
    #[serde(default)]
    pub publish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Partial update of a post. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub author_id: Option<Uuid>,
    pub body: Option<String>,
    pub publish: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author_id: Uuid,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: String,
    /// Public permalink, `/api/posts/{year}/{month}/{day}/{slug}`.
    pub url: String,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub num_pages: u64,
}

/// Query string of the public listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Query string of the admin change list.
///
/// `publish` / `created` take `today`, `past_7_days`, `this_month` or
/// `this_year`; `year` / `month` / `day` drill into the publish date;
/// `q` is the search text; `o` a comma-separated ordering like `-publish`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminListParams {
    pub status: Option<String>,
    pub author: Option<Uuid>,
    pub publish: Option<String>,
    pub created: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub q: Option<String>,
    pub o: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Next step of the publish-date navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillDownResponse {
    /// `year`, `month` or `day`.
    pub level: String,
    pub dates: Vec<NaiveDate>,
}

/// Admin change list: a page of posts plus the date navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminListResponse {
    #[serde(flatten)]
    pub page: PageResponse<PostResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill_down: Option<DrillDownResponse>,
}

/// Query string of the slug suggestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugifyParams {
    pub title: String,
}

/// Proposed slug for a title; `None` when the title has nothing usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugSuggestion {
    pub slug: Option<String>,
}

/// Request to register an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of deleting a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub id: Uuid,
    /// Posts removed along with the user.
    pub deleted_posts: u64,
}
