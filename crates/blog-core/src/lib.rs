//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains the post model, listing rules and admin configuration
//! with zero infrastructure dependencies.

pub mod admin;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod service;

pub use error::{DomainError, RepoError};
pub use service::BlogService;
