//! Listing rules: filters, search, ordering and pagination over posts.
//!
//! A [`PostQuery`] is what a caller asks for (relative date filters, raw
//! search text, a date drill-down). Resolving it against a clock yields a
//! [`PostFilter`] with concrete UTC ranges, which is what repositories
//! evaluate.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Post, PostStatus};
use crate::error::DomainError;

/// Upper bound on `per_page` for any listing.
pub const MAX_PER_PAGE: u64 = 500;

/// A column of the post table that listings can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostField {
    Title,
    Slug,
    Author,
    Body,
    Publish,
    Created,
    Updated,
    Status,
}

impl PostField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostField::Title => "title",
            PostField::Slug => "slug",
            PostField::Author => "author",
            PostField::Body => "body",
            PostField::Publish => "publish",
            PostField::Created => "created",
            PostField::Updated => "updated",
            PostField::Status => "status",
        }
    }

    fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            PostField::Title => a.title.cmp(&b.title),
            PostField::Slug => a.slug.cmp(&b.slug),
            PostField::Author => a.author_id.cmp(&b.author_id),
            PostField::Body => a.body.cmp(&b.body),
            PostField::Publish => a.publish.cmp(&b.publish),
            PostField::Created => a.created.cmp(&b.created),
            PostField::Updated => a.updated.cmp(&b.updated),
            PostField::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }

    fn text<'a>(&self, post: &'a Post) -> Option<&'a str> {
        match self {
            PostField::Title => Some(&post.title),
            PostField::Slug => Some(post.slug.as_str()),
            PostField::Body => Some(&post.body),
            PostField::Status => Some(post.status.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for PostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "title" => PostField::Title,
            "slug" => PostField::Slug,
            "author" => PostField::Author,
            "body" => PostField::Body,
            "publish" => PostField::Publish,
            "created" => PostField::Created,
            "updated" => PostField::Updated,
            "status" => PostField::Status,
            other => {
                return Err(DomainError::Validation(format!("unknown field '{other}'")));
            }
        })
    }
}

/// One sort key. Written as `field` (ascending) or `-field` (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingTerm<F = PostField> {
    pub field: F,
    pub descending: bool,
}

impl<F> OrderingTerm<F> {
    pub const fn asc(field: F) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub const fn desc(field: F) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

impl<F: fmt::Display> fmt::Display for OrderingTerm<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

impl FromStr for OrderingTerm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(name) => Ok(Self::desc(name.parse()?)),
            None => Ok(Self::asc(s.parse()?)),
        }
    }
}

/// Newest first.
pub const DEFAULT_ORDERING: [OrderingTerm; 1] = [OrderingTerm::desc(PostField::Publish)];

/// Parse a comma-separated ordering such as `status,-publish`.
pub fn parse_ordering(raw: &str) -> Result<Vec<OrderingTerm>, DomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Stable sort by `terms`, falling back to the id so results are total.
pub fn sort_posts(posts: &mut [Post], terms: &[OrderingTerm]) {
    posts.sort_by(|a, b| {
        terms
            .iter()
            .map(|term| {
                let ord = term.field.compare(a, b);
                if term.descending { ord.reverse() } else { ord }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });
}

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// The 24 hours of `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, date + Duration::days(1))
    }

    fn days(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            start: midnight(from),
            end: midnight(to),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// Relative choices offered for date columns in the admin sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRangeFilter {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "past_7_days")]
    PastSevenDays,
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "this_year")]
    ThisYear,
}

impl DateRangeFilter {
    pub const ALL: [DateRangeFilter; 4] = [
        DateRangeFilter::Today,
        DateRangeFilter::PastSevenDays,
        DateRangeFilter::ThisMonth,
        DateRangeFilter::ThisYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRangeFilter::Today => "today",
            DateRangeFilter::PastSevenDays => "past_7_days",
            DateRangeFilter::ThisMonth => "this_month",
            DateRangeFilter::ThisYear => "this_year",
        }
    }

    /// Resolve against `now`, in UTC.
    pub fn range(&self, now: DateTime<Utc>) -> Result<DateRange, DomainError> {
        let today = now.date_naive();
        let tomorrow = today + Duration::days(1);
        let out_of_range = || DomainError::Internal(format!("date out of range near {today}"));

        let range = match self {
            DateRangeFilter::Today => DateRange::days(today, tomorrow),
            DateRangeFilter::PastSevenDays => DateRange::days(today - Duration::days(7), tomorrow),
            DateRangeFilter::ThisMonth => {
                let first = today.with_day(1).ok_or_else(out_of_range)?;
                DateRange::days(first, first_of_next_month(first).ok_or_else(out_of_range)?)
            }
            DateRangeFilter::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(out_of_range)?;
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).ok_or_else(out_of_range)?;
                DateRange::days(first, next)
            }
        };
        Ok(range)
    }
}

impl FromStr for DateRangeFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown date filter '{s}'")))
    }
}

/// Granularity of a date drill-down level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLevel {
    Year,
    Month,
    Day,
}

impl DateLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateLevel::Year => "year",
            DateLevel::Month => "month",
            DateLevel::Day => "day",
        }
    }

    /// First day of the period `date` falls in.
    pub fn truncate(&self, date: NaiveDate) -> NaiveDate {
        match self {
            DateLevel::Year => date.with_ordinal(1).unwrap_or(date),
            DateLevel::Month => date.with_day(1).unwrap_or(date),
            DateLevel::Day => date,
        }
    }
}

/// Year / month / day navigation over the publish date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateHierarchy {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DateHierarchy {
    /// The selected period, or `None` when nothing is selected.
    pub fn range(&self) -> Result<Option<DateRange>, DomainError> {
        let invalid = || DomainError::Validation(format!("invalid date selection {self:?}"));

        match (self.year, self.month, self.day) {
            (None, None, None) => Ok(None),
            (Some(y), None, None) => {
                let first = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(invalid)?;
                let next = NaiveDate::from_ymd_opt(y + 1, 1, 1).ok_or_else(invalid)?;
                Ok(Some(DateRange::days(first, next)))
            }
            (Some(y), Some(m), None) => {
                let first = NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(invalid)?;
                let next = first_of_next_month(first).ok_or_else(invalid)?;
                Ok(Some(DateRange::days(first, next)))
            }
            (Some(y), Some(m), Some(d)) => {
                let day = NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid)?;
                Ok(Some(DateRange::day(day)))
            }
            _ => Err(invalid()),
        }
    }

    /// The level offered for further navigation, if any.
    pub fn next_level(&self) -> Option<DateLevel> {
        match (self.year, self.month, self.day) {
            (None, _, _) => Some(DateLevel::Year),
            (Some(_), None, _) => Some(DateLevel::Month),
            (Some(_), Some(_), None) => Some(DateLevel::Day),
            (Some(_), Some(_), Some(_)) => None,
        }
    }
}

/// Distinct periods one level below the current drill-down selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrillDown {
    pub level: DateLevel,
    pub dates: Vec<NaiveDate>,
}

impl DrillDown {
    /// Collapse raw publish dates into sorted, distinct periods of `level`.
    pub fn collect(level: DateLevel, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().map(|d| level.truncate(d)).collect();
        dates.sort_unstable();
        dates.dedup();
        Self { level, dates }
    }
}

/// Search box input. Terms are whitespace separated; double quotes group a
/// phrase. Every term has to match at least one searched field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    pub fn parse(raw: &str) -> Self {
        let mut terms = Vec::new();
        let mut current = String::new();
        let mut quoted = false;

        for c in raw.chars() {
            match c {
                '"' => {
                    quoted = !quoted;
                    push_term(&mut terms, &mut current);
                }
                c if c.is_whitespace() && !quoted => push_term(&mut terms, &mut current),
                c => current.extend(c.to_lowercase()),
            }
        }
        push_term(&mut terms, &mut current);

        Self(terms)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercased terms.
    pub fn terms(&self) -> &[String] {
        &self.0
    }

    /// Whether every term occurs, case-insensitively, in one of `haystacks`.
    pub fn matches<'a>(&self, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
        let lowered: Vec<String> = haystacks.into_iter().map(str::to_lowercase).collect();
        self.0
            .iter()
            .all(|term| lowered.iter().any(|h| h.contains(term.as_str())))
    }
}

fn push_term(terms: &mut Vec<String>, current: &mut String) {
    let term = current.trim();
    if !term.is_empty() {
        terms.push(term.to_string());
    }
    current.clear();
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Result<Self, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("page numbers start at 1"));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(DomainError::Validation(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        // Offsets end up as SQL BIGINT.
        let in_range = (page - 1)
            .checked_mul(per_page)
            .is_some_and(|offset| offset <= i64::MAX as u64);
        if !in_range {
            return Err(DomainError::Validation(format!("page {page} is out of range")));
        }
        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page.max(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// What a caller asks a listing for.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub publish: Option<DateRangeFilter>,
    pub created: Option<DateRangeFilter>,
    pub hierarchy: DateHierarchy,
    pub search: Option<String>,
    /// Empty means "use the listing's default ordering".
    pub ordering: Vec<OrderingTerm>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PostQuery {
    /// Resolve relative filters against `now`. `search_fields` are the
    /// columns the search text is matched against.
    pub fn resolve(
        &self,
        now: DateTime<Utc>,
        search_fields: &[PostField],
    ) -> Result<PostFilter, DomainError> {
        let mut publish_ranges = Vec::new();
        if let Some(filter) = self.publish {
            publish_ranges.push(filter.range(now)?);
        }
        if let Some(range) = self.hierarchy.range()? {
            publish_ranges.push(range);
        }

        let created_range = self.created.map(|f| f.range(now)).transpose()?;

        let search = self
            .search
            .as_deref()
            .map(SearchTerms::parse)
            .unwrap_or_default();

        if let Some(field) = search_fields.iter().find(|f| !f.is_searchable()) {
            return Err(DomainError::Internal(format!("'{field}' is not a text column")));
        }

        Ok(PostFilter {
            status: self.status,
            author_id: self.author_id,
            publish_ranges,
            created_range,
            search,
            search_fields: search_fields.to_vec(),
        })
    }
}

impl PostField {
    pub fn is_searchable(&self) -> bool {
        matches!(
            self,
            PostField::Title | PostField::Slug | PostField::Body | PostField::Status
        )
    }
}

/// Concrete predicate a repository evaluates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    /// All ranges must contain `publish`.
    pub publish_ranges: Vec<DateRange>,
    pub created_range: Option<DateRange>,
    pub search: SearchTerms,
    pub search_fields: Vec<PostField>,
}

impl PostFilter {
    /// Only posts with the given status.
    pub fn with_status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.author_id.is_some_and(|a| a != post.author_id) {
            return false;
        }
        if !self.publish_ranges.iter().all(|r| r.contains(post.publish)) {
            return false;
        }
        if self.created_range.is_some_and(|r| !r.contains(post.created)) {
            return false;
        }
        if !self.search.is_empty() {
            let haystacks = self.search_fields.iter().filter_map(|f| f.text(post));
            if !self.search.matches(haystacks) {
                return false;
            }
        }
        true
    }
}
