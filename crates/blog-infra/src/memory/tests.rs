use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use blog_core::domain::{NewPost, Post, PostChanges, PostStatus, Slug, User};
use blog_core::error::{DomainError, RepoError};
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};
use blog_core::query::{
    DateHierarchy, DateLevel, DateRangeFilter, OrderingTerm, PageRequest, PostField, PostQuery,
};
use blog_core::BlogService;

use super::InMemoryStore;

fn service(store: &InMemoryStore) -> BlogService {
    BlogService::new(Arc::new(store.posts()), Arc::new(store.users()))
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn draft(author_id: Uuid, title: &str, publish: DateTime<Utc>) -> NewPost {
    NewPost {
        title: title.to_string(),
        slug: None,
        author_id,
        body: format!("All about {title}"),
        publish: Some(publish),
        status: None,
    }
}

fn published(author_id: Uuid, title: &str, publish: DateTime<Utc>) -> NewPost {
    NewPost {
        status: Some(PostStatus::Published),
        ..draft(author_id, title, publish)
    }
}

async fn author(blog: &BlogService, name: &str) -> User {
    blog.create_user(name.to_string(), format!("{name}@example.com"))
        .await
        .unwrap()
}

#[tokio::test]
async fn creates_post_with_defaults() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    let post = blog
        .create_post(NewPost {
            title: "Who was Django Reinhardt?".to_string(),
            author_id: user.id,
            body: "A guitarist.".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(post.slug.as_str(), "who-was-django-reinhardt");
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.created, post.updated);
    assert_eq!(blog.get_post(post.id).await.unwrap(), post);
}

#[tokio::test]
async fn slug_is_unique_per_publish_date() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    blog.create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    let same_day = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 1, 22)))
        .await;
    assert!(matches!(same_day, Err(DomainError::Duplicate(_))));

    let next_day = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 2, 9)))
        .await
        .unwrap();
    assert_eq!(next_day.slug.as_str(), "hello");
}

#[tokio::test]
async fn moving_a_post_onto_a_taken_date_is_rejected() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    blog.create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();
    let other = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 2, 9)))
        .await
        .unwrap();

    let moved = blog
        .update_post(
            other.id,
            PostChanges {
                publish: Some(at(2024, 3, 1, 18)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(moved, Err(DomainError::Duplicate(_))));

    // re-saving a post under its own key is fine
    let retitled = blog
        .update_post(
            other.id,
            PostChanges {
                title: Some("Hello again".to_string()),
                publish: Some(at(2024, 3, 2, 10)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(retitled.slug.as_str(), "hello");
}

#[tokio::test]
async fn created_is_immutable_and_updated_increases() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    let post = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    let mut last = post.updated;
    for i in 0..3 {
        let edited = blog
            .update_post(
                post.id,
                PostChanges {
                    body: Some(format!("revision {i}")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.created, post.created);
        assert!(edited.updated > last);
        last = edited.updated;
    }
}

#[tokio::test]
async fn storage_keeps_created_even_if_caller_tampers() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;
    let post = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    let mut tampered = post.clone();
    tampered.created = post.created - Duration::days(365);
    let saved = store.posts().update(tampered).await.unwrap();

    assert_eq!(saved.created, post.created);
}

#[tokio::test]
async fn author_must_exist() {
    let store = InMemoryStore::new();
    let blog = service(&store);

    let result = blog
        .create_post(draft(Uuid::new_v4(), "Orphan", at(2024, 3, 1, 9)))
        .await;
    assert!(matches!(result, Err(DomainError::MissingReference(_))));

    let user = author(&blog, "alice").await;
    let post = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();
    let reassigned = blog
        .update_post(
            post.id,
            PostChanges {
                author_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(reassigned, Err(DomainError::MissingReference(_))));
}

#[tokio::test]
async fn storage_rejects_dangling_author_directly() {
    let store = InMemoryStore::new();
    let post = Post::new(draft(Uuid::new_v4(), "Orphan", at(2024, 3, 1, 9)), Utc::now()).unwrap();

    let result = store.posts().insert(post).await;
    assert!(matches!(result, Err(RepoError::MissingReference(_))));
}

#[tokio::test]
async fn deleting_a_user_cascades_to_exactly_their_posts() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let alice = author(&blog, "alice").await;
    let bob = author(&blog, "bob").await;

    for day in 1..=3 {
        blog.create_post(draft(alice.id, "Alice writes", at(2024, 3, day, 9)))
            .await
            .unwrap();
    }
    let bobs = blog
        .create_post(draft(bob.id, "Bob writes", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    let removed = blog.delete_user(alice.id).await.unwrap();
    assert_eq!(removed, 3);

    let posts = store.posts();
    assert!(posts.find_by_author(alice.id).await.unwrap().is_empty());
    assert_eq!(posts.find_by_author(bob.id).await.unwrap(), vec![bobs]);
    assert!(matches!(
        blog.get_user(alice.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn cascade_count_comes_from_the_delete_itself() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let alice = author(&blog, "alice").await;

    blog.create_post(draft(alice.id, "Before", at(2024, 3, 1, 9)))
        .await
        .unwrap();
    // Written straight to storage, as a concurrent request would.
    let late = Post::new(draft(alice.id, "Late arrival", at(2024, 3, 2, 9)), Utc::now()).unwrap();
    store.posts().insert(late).await.unwrap();

    assert_eq!(store.users().delete_with_posts(alice.id).await.unwrap(), 2);
    assert!(store.posts().find_by_author(alice.id).await.unwrap().is_empty());
    assert!(matches!(
        store.users().delete_with_posts(alice.id).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    author(&blog, "alice").await;

    let again = blog
        .create_user("alice".to_string(), "other@example.com".to_string())
        .await;
    assert!(matches!(again, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn public_listing_is_published_newest_first() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    blog.create_post(published(user.id, "T2", at(2024, 3, 2, 9)))
        .await
        .unwrap();
    blog.create_post(published(user.id, "T1", at(2024, 3, 1, 9)))
        .await
        .unwrap();
    blog.create_post(published(user.id, "T3", at(2024, 3, 3, 9)))
        .await
        .unwrap();
    blog.create_post(draft(user.id, "Hidden", at(2024, 3, 4, 9)))
        .await
        .unwrap();

    let page = blog
        .list_published(PageRequest::new(1, 10).unwrap())
        .await
        .unwrap();

    let titles: Vec<_> = page.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["T3", "T2", "T1"]);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn admin_listing_orders_by_status_then_publish() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    blog.create_post(published(user.id, "pub-late", at(2024, 5, 1, 9)))
        .await
        .unwrap();
    blog.create_post(draft(user.id, "draft-late", at(2024, 4, 1, 9)))
        .await
        .unwrap();
    blog.create_post(published(user.id, "pub-early", at(2024, 1, 1, 9)))
        .await
        .unwrap();
    blog.create_post(draft(user.id, "draft-early", at(2024, 2, 1, 9)))
        .await
        .unwrap();

    let listing = blog.admin_list(PostQuery::default()).await.unwrap();

    let titles: Vec<_> = listing.page.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["draft-early", "draft-late", "pub-early", "pub-late"]);
    assert_eq!(listing.page.per_page, 100);

    let drill = listing.drill_down.unwrap();
    assert_eq!(drill.level, DateLevel::Year);
    assert_eq!(drill.dates, vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()]);
}

#[tokio::test]
async fn admin_listing_filters_and_searches() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let alice = author(&blog, "alice").await;
    let bob = author(&blog, "bob").await;

    blog.create_post(published(alice.id, "Gypsy jazz", at(2024, 6, 10, 9)))
        .await
        .unwrap();
    blog.create_post(draft(alice.id, "Django tips", at(2024, 6, 14, 9)))
        .await
        .unwrap();
    blog.create_post(published(bob.id, "Rust ownership", at(2023, 1, 5, 9)))
        .await
        .unwrap();

    let now = at(2024, 6, 15, 12);

    let by_author = blog
        .admin_list_at(
            PostQuery {
                author_id: Some(bob.id),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(by_author.page.total, 1);

    let this_week = blog
        .admin_list_at(
            PostQuery {
                publish: Some(DateRangeFilter::PastSevenDays),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(this_week.page.total, 2);

    // body is searched too: "All about Gypsy jazz"
    let search = blog
        .admin_list_at(
            PostQuery {
                search: Some("ABOUT jazz".to_string()),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    let titles: Vec<_> = search.page.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Gypsy jazz"]);

    let drafts = blog
        .admin_list_at(
            PostQuery {
                status: Some(PostStatus::Draft),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(drafts.page.items[0].title, "Django tips");
}

#[tokio::test]
async fn admin_drill_down_by_month() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    for (month, day) in [(1, 3), (1, 20), (4, 2)] {
        blog.create_post(draft(user.id, "Entry", at(2024, month, day, 9)))
            .await
            .unwrap();
    }
    blog.create_post(draft(user.id, "Old entry", at(2023, 12, 31, 9)))
        .await
        .unwrap();

    let listing = blog
        .admin_list(PostQuery {
            hierarchy: DateHierarchy {
                year: Some(2024),
                month: None,
                day: None,
            },
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(listing.page.total, 3);
    let drill = listing.drill_down.unwrap();
    assert_eq!(drill.level, DateLevel::Month);
    assert_eq!(
        drill.dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        ]
    );
}

#[tokio::test]
async fn admin_ordering_must_use_list_columns() {
    let store = InMemoryStore::new();
    let blog = service(&store);

    let result = blog
        .admin_list(PostQuery {
            ordering: vec![OrderingTerm::desc(PostField::Body)],
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    let result = blog
        .admin_list(PostQuery {
            ordering: vec![OrderingTerm::desc(PostField::Title)],
            ..Default::default()
        })
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn permalink_only_resolves_published_posts() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    let live = blog
        .create_post(published(user.id, "Live", at(2024, 3, 1, 9)))
        .await
        .unwrap();
    blog.create_post(draft(user.id, "Secret", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let found = blog
        .find_published(day, &Slug::new("live").unwrap())
        .await
        .unwrap();
    assert_eq!(found.id, live.id);

    let hidden = blog.find_published(day, &Slug::new("secret").unwrap()).await;
    assert!(matches!(hidden, Err(DomainError::NotFound { .. })));

    let wrong_day = blog
        .find_published(day.succ_opt().unwrap(), &Slug::new("live").unwrap())
        .await;
    assert!(wrong_day.is_err());
}

#[tokio::test]
async fn delete_post_twice() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;
    let post = blog
        .create_post(draft(user.id, "Hello", at(2024, 3, 1, 9)))
        .await
        .unwrap();

    blog.delete_post(post.id).await.unwrap();
    assert!(matches!(
        blog.delete_post(post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn pagination_slices_results() {
    let store = InMemoryStore::new();
    let blog = service(&store);
    let user = author(&blog, "alice").await;

    for day in 1..=5 {
        blog.create_post(published(user.id, "Daily", at(2024, 3, day, 9)))
            .await
            .unwrap();
    }

    let page = blog
        .list_published(PageRequest::new(2, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.num_pages(), 3);
    let days: Vec<_> = page.items.iter().map(|p| p.publish_date()).collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        ]
    );
}
