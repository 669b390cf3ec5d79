use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mount the user endpoints on `router`; handlers reach the service through an extension.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let users = Router::new()
        // GET /users - active users, POST /users - create
        .route(
            "/users",
            get(handlers::list_active_users).post(handlers::create_user),
        )
        .route("/users/search", get(handlers::search_users))
        .route(
            "/users/by-username/{username}",
            get(handlers::get_user_by_username),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::deactivate_user),
        )
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/metrics", get(handlers::metrics))
        .layer(Extension(service));

    router.merge(users)
}
