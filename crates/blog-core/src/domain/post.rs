use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::{Slug, slugify};
use crate::error::DomainError;

/// Maximum title length, in characters.
pub const TITLE_MAX_LENGTH: usize = 250;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub const ALL: [PostStatus; 2] = [PostStatus::Draft, PostStatus::Published];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    /// Human-readable label shown in the admin.
    pub fn label(&self) -> &'static str {
        match self {
            PostStatus::Draft => "Draft",
            PostStatus::Published => "Published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::Validation(format!(
                "'{other}' is not a valid status (expected draft or published)"
            ))),
        }
    }
}

/// Post entity - one blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: Slug,
    pub author_id: Uuid,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: PostStatus,
}

/// Input for a new post. Missing optional fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<Slug>,
    pub author_id: Uuid,
    pub body: String,
    pub publish: Option<DateTime<Utc>>,
    pub status: Option<PostStatus>,
}

/// A partial edit of an existing post.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<Slug>,
    pub author_id: Option<Uuid>,
    pub body: Option<String>,
    pub publish: Option<DateTime<Utc>>,
    pub status: Option<PostStatus>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.author_id.is_none()
            && self.body.is_none()
            && self.publish.is_none()
            && self.status.is_none()
    }
}

impl Post {
    /// Create a post from `input`, stamping `created` and `updated` with `now`.
    pub fn new(input: NewPost, now: DateTime<Utc>) -> Result<Self, DomainError> {
        validate_title(&input.title)?;
        validate_body(&input.body)?;

        let slug = match input.slug {
            Some(slug) => slug,
            None => slugify(&input.title).ok_or_else(|| {
                DomainError::validation("slug is required and cannot be derived from the title")
            })?,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            title: input.title,
            slug,
            author_id: input.author_id,
            body: input.body,
            publish: input.publish.unwrap_or(now),
            created: now,
            updated: now,
            status: input.status.unwrap_or_default(),
        })
    }

    /// Apply `changes` in place. `created` is left alone; `updated` always
    /// moves forward, by at least one microsecond.
    pub fn apply(&mut self, changes: PostChanges, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(title) = &changes.title {
            validate_title(title)?;
        }
        if let Some(body) = &changes.body {
            validate_body(body)?;
        }

        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(slug) = changes.slug {
            self.slug = slug;
        }
        if let Some(author_id) = changes.author_id {
            self.author_id = author_id;
        }
        if let Some(body) = changes.body {
            self.body = body;
        }
        if let Some(publish) = changes.publish {
            self.publish = publish;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }

        self.updated = next_updated(self.updated, now);
        Ok(())
    }

    /// The UTC calendar day of `publish`; unique together with the slug.
    pub fn publish_date(&self) -> NaiveDate {
        self.publish.date_naive()
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Timestamps are stored with microsecond precision.
fn next_updated(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::microseconds(1);
    if now >= floor { now } else { floor }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::validation("title is required"));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(DomainError::Validation(format!(
            "title must be at most {TITLE_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_body(body: &str) -> Result<(), DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::validation("body is required"));
    }
    Ok(())
}
