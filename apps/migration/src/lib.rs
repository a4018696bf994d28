//! # Blog Migrations
//!
//! Explicit schema for the blog: the `users` table posts point at, and the
//! `posts` table with its length limits, status check, cascading author
//! foreign key and the `(publish date, slug)` uniqueness rule.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_posts::Migration),
        ]
    }
}
