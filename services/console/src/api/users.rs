//! User API handlers.
//!
//! # Purpose
//! CRUD over console users. Users carry exactly one role; there are no
//! passwords here, credentials live with the identity resolver.
use crate::api::error::{ApiError, api_validation_error, from_store_error};
use crate::api::{json_body, path_id};
use crate::app::AppState;
use crate::model::{ListQuery, Page, User, UserRequest};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("q" = Option<String>, Query, description = "Case-insensitive name filter")
    ),
    responses(
        (status = 200, description = "List users", body = crate::model::UserPage)
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<User>>, ApiError> {
    let page = state
        .store
        .list_users(&ListQuery::from_params(&params))
        .await
        .map_err(|err| from_store_error("failed to list users", err))?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let id = path_id(path)?;
    let user = state
        .store
        .get_user(id)
        .await
        .map_err(|err| from_store_error("failed to load user", err))?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload or unknown role", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let user = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let user = state
        .store
        .create_user(user)
        .await
        .map_err(|err| from_store_error("failed to create user", err))?;
    tracing::info!(user_id = user.id, role_id = user.role_id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User replaced", body = User),
        (status = 400, description = "Invalid payload or unknown role", body = crate::api::types::ErrorResponse),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let id = path_id(path)?;
    let user = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let user = state
        .store
        .update_user(id, user)
        .await
        .map_err(|err| from_store_error("failed to update user", err))?;
    tracing::info!(user_id = user.id, role_id = user.role_id, blocked = user.blocked, "user updated");
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;
    state
        .store
        .delete_user(id)
        .await
        .map_err(|err| from_store_error("failed to delete user", err))?;
    tracing::info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
