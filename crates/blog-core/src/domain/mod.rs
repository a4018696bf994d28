//! Domain entities - the core business objects.

mod post;
mod slug;
mod user;

pub use post::{NewPost, Post, PostChanges, PostStatus, TITLE_MAX_LENGTH};
pub use slug::{SLUG_MAX_LENGTH, Slug, slugify};
pub use user::{USERNAME_MAX_LENGTH, User};
