//! Role API handlers.
//!
//! # Purpose
//! CRUD over roles with their two membership sets. Payload validation
//! happens in `crate::model::role`; duplicate, membership, and protection
//! rules are enforced atomically by the store.
use crate::api::error::{ApiError, api_validation_error, from_store_error};
use crate::api::{json_body, path_id};
use crate::app::AppState;
use crate::model::{ListQuery, Page, Role, RoleCreateRequest, RoleUpdateRequest};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/roles",
    tag = "roles",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("q" = Option<String>, Query, description = "Case-insensitive name filter")
    ),
    responses(
        (status = 200, description = "List roles", body = crate::model::RolePage)
    )
)]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<Role>>, ApiError> {
    let page = state
        .store
        .list_roles(&ListQuery::from_params(&params))
        .await
        .map_err(|err| from_store_error("failed to list roles", err))?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/v1/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = Role),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_role(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Role>, ApiError> {
    let id = path_id(path)?;
    let role = state
        .store
        .get_role(id)
        .await
        .map_err(|err| from_store_error("failed to load role", err))?;
    Ok(Json(role))
}

#[utoipa::path(
    post,
    path = "/v1/roles",
    tag = "roles",
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid payload, duplicate name, or unknown permission", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    body: Result<Json<RoleCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let role = state
        .store
        .create_role(draft)
        .await
        .map_err(|err| from_store_error("failed to create role", err))?;
    tracing::info!(role_id = role.id, role = %role.role_type, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// Replace a role's name, description, and both membership sets.
///
/// Membership lists absent from the payload clear that membership kind.
#[utoipa::path(
    put,
    path = "/v1/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Role id")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Invalid payload, duplicate name, unknown permission, or super admin type change", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_role(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<RoleUpdateRequest>, JsonRejection>,
) -> Result<Json<Role>, ApiError> {
    let id = path_id(path)?;
    let changes = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let role = state
        .store
        .update_role(id, changes)
        .await
        .map_err(|err| from_store_error("failed to update role", err))?;
    tracing::info!(role_id = role.id, role = %role.role_type, "role updated");
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/v1/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 400, description = "Role is protected", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Role is assigned to users", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_role(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;
    state
        .store
        .delete_role(id)
        .await
        .map_err(|err| from_store_error("failed to delete role", err))?;
    tracing::info!(role_id = id, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}
