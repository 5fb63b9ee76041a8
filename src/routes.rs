// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, blog, comment, notification, user},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges the public and session-guarded route groups.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store handle + config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/get-user/{user_id}", get(user::get_user_profile))
        .route("/search-users", get(user::search_users))
        .route("/latest-blogs", get(blog::latest_blogs))
        .route("/trending-blogs", get(blog::trending_blogs))
        .route("/search-blogs", get(blog::search_blogs))
        .route("/get-blog/{blog_id}", get(blog::get_blog))
        .route("/get-blog-comments", get(comment::get_blog_comments))
        .route("/get-replies", get(comment::get_replies));

    let protected_routes = Router::new()
        .route("/change-password", post(auth::change_password))
        .route("/get-user", get(user::get_own_profile))
        .route("/update-profile", post(user::update_profile))
        .route("/create-blog", post(blog::create_blog))
        .route("/get-user-blogs", get(blog::get_user_blogs))
        .route("/delete-blog", delete(blog::delete_blog))
        .route("/like-blog", post(blog::like_blog))
        .route("/is-liked-by-user", get(blog::is_liked_by_user))
        .route("/add-comment", post(comment::add_comment))
        .route("/delete-comment", delete(comment::delete_comment))
        .route(
            "/reconcile-blog-comments",
            post(comment::reconcile_blog_comments),
        )
        .route("/notifications", get(notification::get_notifications))
        .route("/mark-notification", post(notification::mark_notification))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
