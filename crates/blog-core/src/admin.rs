//! Admin display configuration.
//!
//! Declares how a model is listed in the administrative console: which
//! columns show up, which can be filtered and searched, and the default sort.
//! The admin API reads this once and applies it verbatim.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::query::{OrderingTerm, PostField};

/// Default page size of the admin change list.
pub const DEFAULT_LIST_PER_PAGE: u64 = 100;

/// Presentation preferences for one model in the admin console.
pub trait ModelAdmin: Send + Sync {
    type Field: Copy + PartialEq + fmt::Display + 'static;

    /// Get the model name
    fn model_name(&self) -> &'static str;

    /// Columns shown in the list view
    fn list_display(&self) -> &'static [Self::Field];

    /// Columns offered as sidebar filters
    fn list_filter(&self) -> &'static [Self::Field] {
        &[]
    }

    /// Columns the search box looks in
    fn search_fields(&self) -> &'static [Self::Field] {
        &[]
    }

    /// Fields proposed from other fields while editing (target, sources)
    fn prepopulated_fields(&self) -> &'static [(Self::Field, &'static [Self::Field])] {
        &[]
    }

    /// Foreign keys edited through an id lookup instead of a dropdown
    fn raw_id_fields(&self) -> &'static [Self::Field] {
        &[]
    }

    /// Date column used for year/month/day navigation
    fn date_hierarchy(&self) -> Option<Self::Field> {
        None
    }

    /// Default sort of the list view
    fn ordering(&self) -> &'static [OrderingTerm<Self::Field>] {
        &[]
    }

    fn list_per_page(&self) -> u64 {
        DEFAULT_LIST_PER_PAGE
    }

    /// Whether the list view may be sorted by `field`.
    fn is_sortable(&self, field: Self::Field) -> bool {
        self.list_display().contains(&field) || self.ordering().iter().any(|t| t.field == field)
    }

    fn is_filterable(&self, field: Self::Field) -> bool {
        self.list_filter().contains(&field)
    }
}

/// Admin configuration for blog posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostAdmin;

impl ModelAdmin for PostAdmin {
    type Field = PostField;

    fn model_name(&self) -> &'static str {
        "post"
    }

    fn list_display(&self) -> &'static [PostField] {
        &[
            PostField::Title,
            PostField::Slug,
            PostField::Author,
            PostField::Publish,
            PostField::Status,
        ]
    }

    fn list_filter(&self) -> &'static [PostField] {
        &[
            PostField::Status,
            PostField::Created,
            PostField::Publish,
            PostField::Author,
        ]
    }

    fn search_fields(&self) -> &'static [PostField] {
        &[PostField::Title, PostField::Body]
    }

    fn prepopulated_fields(&self) -> &'static [(PostField, &'static [PostField])] {
        const SLUG_FROM: &[PostField] = &[PostField::Title];
        &[(PostField::Slug, SLUG_FROM)]
    }

    fn raw_id_fields(&self) -> &'static [PostField] {
        &[PostField::Author]
    }

    fn date_hierarchy(&self) -> Option<PostField> {
        Some(PostField::Publish)
    }

    fn ordering(&self) -> &'static [OrderingTerm<PostField>] {
        const ORDERING: &[OrderingTerm] = &[
            OrderingTerm::asc(PostField::Status),
            OrderingTerm::asc(PostField::Publish),
        ];
        ORDERING
    }
}

/// Serializable snapshot of a [`ModelAdmin`], handed to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminConfig {
    pub model: String,
    pub list_display: Vec<String>,
    pub list_filter: Vec<String>,
    pub search_fields: Vec<String>,
    pub prepopulated_fields: BTreeMap<String, Vec<String>>,
    pub raw_id_fields: Vec<String>,
    pub date_hierarchy: Option<String>,
    pub ordering: Vec<String>,
    pub list_per_page: u64,
}

impl AdminConfig {
    pub fn from_admin<A: ModelAdmin>(admin: &A) -> Self {
        fn names<F: fmt::Display>(fields: &[F]) -> Vec<String> {
            fields.iter().map(ToString::to_string).collect()
        }

        Self {
            model: admin.model_name().to_string(),
            list_display: names(admin.list_display()),
            list_filter: names(admin.list_filter()),
            search_fields: names(admin.search_fields()),
            prepopulated_fields: admin
                .prepopulated_fields()
                .iter()
                .map(|(target, sources)| (target.to_string(), names(sources)))
                .collect(),
            raw_id_fields: names(admin.raw_id_fields()),
            date_hierarchy: admin.date_hierarchy().map(|f| f.to_string()),
            ordering: names(admin.ordering()),
            list_per_page: admin.list_per_page(),
        }
    }
}
