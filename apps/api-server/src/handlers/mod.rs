//! HTTP handlers and route configuration.

mod admin;
mod health;
mod posts;


use actix_web::web;
use blog_core::domain::Post;
use blog_core::query::Page;
use blog_shared::dto::{PageResponse, PostResponse};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            // Public site
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route(
                        "/{year}/{month}/{day}/{slug}",
                        web::get().to(posts::post_detail),
                    ),
            )
            // Admin
            .service(
                web::scope("/admin")
                    .route("/slugify", web::get().to(admin::suggest_slug))
                    .service(
                        web::scope("/posts")
                            .route("/config", web::get().to(admin::admin_config))
                            .route("", web::get().to(admin::list_posts))
                            .route("", web::post().to(admin::create_post))
                            .route("/{id}", web::get().to(admin::get_post))
                            .route("/{id}", web::patch().to(admin::update_post))
                            .route("/{id}", web::delete().to(admin::delete_post)),
                    )
                    .service(
                        web::scope("/users")
                            .route("", web::post().to(admin::create_user))
                            .route("/{id}", web::get().to(admin::get_user))
                            .route("/{id}", web::delete().to(admin::delete_user)),
                    ),
            ),
    );
}

/// `/api/posts/{year}/{month}/{day}/{slug}` for `post`.
pub(crate) fn permalink(post: &Post) -> String {
    format!(
        "/api/posts/{}/{}",
        post.publish_date().format("%Y/%m/%d"),
        post.slug
    )
}

pub(crate) fn post_response(post: Post) -> PostResponse {
    let url = permalink(&post);
    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug.into(),
        author_id: post.author_id,
        body: post.body,
        publish: post.publish,
        created: post.created,
        updated: post.updated,
        status: post.status.as_str().to_string(),
        url,
    }
}

pub(crate) fn page_response(page: Page<Post>) -> PageResponse<PostResponse> {
    let num_pages = page.num_pages();
    let page = page.map(post_response);
    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        num_pages,
    }
}
