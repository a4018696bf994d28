use std::collections::BTreeMap;

use blog_core::domain::{Post, PostStatus, User};
use blog_core::error::RepoError;
use blog_core::ports::{BaseRepository, PostRepository, UserRepository};
use blog_core::query::{PageRequest, PostField, PostFilter, SearchTerms};
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveValue, DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value,
};
use uuid::Uuid;

use super::entity::{post, user};
use super::postgres_base::map_db_err;
use super::postgres_repo::{PostgresPostRepository, PostgresUserRepository, contains_text};

fn post_model(id: Uuid, author_id: Uuid, slug: &str) -> post::Model {
    let publish = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    post::Model {
        id,
        title: "Test Post".to_owned(),
        slug: slug.to_owned(),
        author_id,
        body: "Content".to_owned(),
        publish: publish.into(),
        created: publish.into(),
        updated: publish.into(),
        status: post::Status::Published,
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id, "test-post")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.slug.as_str(), "test-post");
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_malformed_slug_is_a_query_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(Uuid::new_v4(), Uuid::new_v4(), "not a slug")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Result<Option<Post>, RepoError> = repo.find_by_id(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::Query(_))));
}

#[tokio::test]
async fn test_find_by_author() {
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            post_model(Uuid::new_v4(), author_id, "first"),
            post_model(Uuid::new_v4(), author_id, "second"),
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let posts = repo.find_by_author(author_id).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.author_id == author_id));
}

#[tokio::test]
async fn test_delete_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_insert_and_find_user() {
    let now = Utc::now();
    let model = user::Model {
        id: Uuid::new_v4(),
        username: "reinhardt".to_owned(),
        email: "django@example.com".to_owned(),
        created_at: now.into(),
        updated_at: now.into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()], vec![model.clone()]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let saved: User = repo.insert(User::try_from(model.clone()).unwrap()).await.unwrap();
    assert_eq!(saved.username, "reinhardt");

    let found = repo.find_by_username("reinhardt").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(model.id));
}

#[tokio::test]
async fn test_update_never_writes_created() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let active: post::ActiveModel = Post::try_from(post_model(Uuid::new_v4(), Uuid::new_v4(), "kept"))
        .unwrap()
        .into();

    let on_update = active.clone().before_save(&db, false).await.unwrap();
    assert!(matches!(on_update.created, ActiveValue::NotSet));

    let on_insert = active.before_save(&db, true).await.unwrap();
    assert!(matches!(on_insert.created, ActiveValue::Set(_)));
}

#[test]
fn test_error_mapping() {
    assert!(matches!(map_db_err(DbErr::RecordNotUpdated), RepoError::NotFound));
    assert!(matches!(
        map_db_err(DbErr::Custom("boom".to_owned())),
        RepoError::Query(_)
    ));
}

fn user_model(username: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: Uuid::new_v4(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[test]
fn test_like_wildcards_are_escaped() {
    assert_eq!(contains_text("django"), "%django%");
    assert_eq!(contains_text("50%_off"), r"%50\%\_off%");
    assert_eq!(contains_text(r"a\b"), r"%a\\b%");
}

#[tokio::test]
async fn test_search_lowercases_every_field() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![BTreeMap::from([("num_items", Value::from(1i64))])]])
        .append_query_results([vec![post_model(Uuid::new_v4(), Uuid::new_v4(), "found")]])
        .into_connection();
    let repo = PostgresPostRepository::new(db.clone());

    let filter = PostFilter {
        search: SearchTerms::parse("100%"),
        search_fields: vec![PostField::Title, PostField::Body],
        ..Default::default()
    };
    let page = repo
        .list(&filter, &[], PageRequest::new(1, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].slug.as_str(), "found");

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains(r#"LOWER(\"title\") LIKE"#), "{log}");
    assert!(log.contains(r#"LOWER(\"body\") LIKE"#), "{log}");
    assert!(log.contains("ESCAPE"), "{log}");
    assert!(log.contains(r"100\\%"), "{log}");
}

#[tokio::test]
async fn test_publish_dates_are_utc_days() {
    // 23:30 in New York is already the next day in UTC.
    let evening = FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 1, 23, 30, 0)
        .unwrap();
    let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap().fixed_offset();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            BTreeMap::from([("publish", Value::from(evening))]),
            BTreeMap::from([("publish", Value::from(morning))]),
        ]])
        .into_connection();
    let repo = PostgresPostRepository::new(db);

    let dates = repo.publish_dates(&PostFilter::default()).await.unwrap();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ]
    );
}

#[tokio::test]
async fn test_delete_with_posts_counts_inside_transaction() {
    let model = user_model("fred");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection();
    let repo = PostgresUserRepository::new(db.clone());

    assert_eq!(repo.delete_with_posts(model.id).await.unwrap(), 2);

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("FOR UPDATE"), "{log}");
    assert!(log.contains(r#"DELETE FROM \"posts\""#), "{log}");
    assert!(log.contains(r#"DELETE FROM \"users\""#), "{log}");
}

#[tokio::test]
async fn test_delete_with_posts_missing_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let repo = PostgresUserRepository::new(db);

    let result = repo.delete_with_posts(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}
