use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::api::problem::{internal_error, Problem, ProblemResponse};
use modkit::XRequestId;
use tracing::{debug, info};

use crate::api::rest::dto::{CacheStatsDto, CreateUserReq, SearchQuery, UpdateUserReq, UserDto};
use crate::api::rest::error::{map_domain_error, map_json_rejection};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

fn problem(e: &DomainError, uri: &Uri, headers: &HeaderMap) -> ProblemResponse {
    map_domain_error(e, uri.path(), XRequestId::from_headers(headers))
}

fn body_problem(rejection: &JsonRejection, uri: &Uri, headers: &HeaderMap) -> ProblemResponse {
    map_json_rejection(rejection, uri.path(), XRequestId::from_headers(headers))
}

/// List all active users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "users.list_active_users",
    responses(
        (status = 200, description = "Active users in ascending id order", body = [UserDto]),
        (status = 500, description = "Internal error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn list_active_users(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    debug!("Listing active users");
    let users = svc
        .get_all_active_users()
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "users.create_user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Validation failed", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Username or email already taken", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn create_user(
    uri: Uri,
    headers: HeaderMap,
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let Json(req_body) = body.map_err(|r| body_problem(&r, &uri, &headers))?;
    info!(username = %req_body.username, "Creating user");
    let user = svc
        .create_user(req_body.into())
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// Search users by full name
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    operation_id = "users.search_users_by_name",
    params(SearchQuery),
    responses(
        (status = 200, description = "Users whose full name contains the fragment", body = [UserDto]),
        (status = 500, description = "Internal error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn search_users(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<SearchQuery>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    let users = svc
        .search_users_by_name(&query.name)
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Get a user by username (resolved on the worker pool)
#[utoipa::path(
    get,
    path = "/users/by-username/{username}",
    tag = "users",
    operation_id = "users.get_user_by_username",
    params(("username" = String, Path, description = "Exact username")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "No user with that username", body = Problem, content_type = "application/problem+json"),
        (status = 503, description = "Worker pool saturated", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_user_by_username(
    Extension(svc): Extension<Arc<Service>>,
    Path(username): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<UserDto>, ProblemResponse> {
    let user = svc
        .get_user_by_username_async(username)
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(Json(UserDto::from(user)))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.get_user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal error", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<UserDto>, ProblemResponse> {
    let user = svc
        .get_user(id)
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(Json(UserDto::from(user)))
}

/// Update an existing user (partial)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.update_user",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "Updated user", body = UserDto),
        (status = 400, description = "Validation failed", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Username or email already taken", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn update_user(
    uri: Uri,
    headers: HeaderMap,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let Json(req_body) = body.map_err(|r| body_problem(&r, &uri, &headers))?;
    info!(user_id = id, "Updating user");
    let user = svc
        .update_user(id, req_body.into())
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(Json(UserDto::from(user)))
}

/// Deactivate a user (soft delete)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.deactivate_user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "Not found", body = Problem, content_type = "application/problem+json")
    )
)]
pub async fn deactivate_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<i64>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<StatusCode, ProblemResponse> {
    info!(user_id = id, "Deactivating user");
    svc.deactivate_user(id)
        .await
        .map_err(|e| problem(&e, &uri, &headers))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cache statistics
#[utoipa::path(
    get,
    path = "/cache/stats",
    tag = "cache",
    operation_id = "users.cache_stats",
    responses((status = 200, description = "Current cache counters", body = CacheStatsDto))
)]
pub async fn cache_stats(Extension(svc): Extension<Arc<Service>>) -> Json<CacheStatsDto> {
    Json(svc.cache_stats().into())
}

/// Prometheus metrics
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    operation_id = "users.metrics",
    responses((status = 200, description = "Prometheus text exposition", content_type = "text/plain", body = String))
)]
pub async fn metrics(Extension(svc): Extension<Arc<Service>>) -> Response {
    match svc.metrics().render().await {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            internal_error("Failed to encode metrics").into_response()
        }
    }
}
