//! API permission catalog handlers.
//!
//! # Purpose
//! CRUD over `(method, route)` permissions. Deleting an entry detaches it
//! from every role in the same store operation.
use crate::api::error::{ApiError, api_validation_error, from_store_error};
use crate::api::{json_body, path_id};
use crate::app::AppState;
use crate::model::{ApiPermission, ApiPermissionRequest, ListQuery, Page};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/permissions",
    tag = "permissions",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size"),
        ("q" = Option<String>, Query, description = "Case-insensitive name filter")
    ),
    responses(
        (status = 200, description = "List API permissions", body = crate::model::ApiPermissionPage)
    )
)]
pub(crate) async fn list_permissions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<ApiPermission>>, ApiError> {
    let page = state
        .store
        .list_permissions(&ListQuery::from_params(&params))
        .await
        .map_err(|err| from_store_error("failed to list permissions", err))?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/v1/permissions/{id}",
    tag = "permissions",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 200, description = "API permission", body = ApiPermission),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_permission(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiPermission>, ApiError> {
    let id = path_id(path)?;
    let permission = state
        .store
        .get_permission(id)
        .await
        .map_err(|err| from_store_error("failed to load permission", err))?;
    Ok(Json(permission))
}

#[utoipa::path(
    post,
    path = "/v1/permissions",
    tag = "permissions",
    request_body = ApiPermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = ApiPermission),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_permission(
    State(state): State<AppState>,
    body: Result<Json<ApiPermissionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let permission = state
        .store
        .create_permission(permission)
        .await
        .map_err(|err| from_store_error("failed to create permission", err))?;
    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    put,
    path = "/v1/permissions/{id}",
    tag = "permissions",
    params(("id" = i64, Path, description = "Permission id")),
    request_body = ApiPermissionRequest,
    responses(
        (status = 200, description = "Permission replaced", body = ApiPermission),
        (status = 400, description = "Invalid payload", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_permission(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ApiPermissionRequest>, JsonRejection>,
) -> Result<Json<ApiPermission>, ApiError> {
    let id = path_id(path)?;
    let permission = json_body(body)?
        .validate()
        .map_err(|message| api_validation_error(&message))?;
    let permission = state
        .store
        .update_permission(id, permission)
        .await
        .map_err(|err| from_store_error("failed to update permission", err))?;
    Ok(Json(permission))
}

#[utoipa::path(
    delete,
    path = "/v1/permissions/{id}",
    tag = "permissions",
    params(("id" = i64, Path, description = "Permission id")),
    responses(
        (status = 204, description = "Permission deleted and detached from roles"),
        (status = 404, description = "Permission not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_permission(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;
    state
        .store
        .delete_permission(id)
        .await
        .map_err(|err| from_store_error("failed to delete permission", err))?;
    tracing::info!(permission_id = id, "api permission deleted");
    Ok(StatusCode::NO_CONTENT)
}
