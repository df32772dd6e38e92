//! Caller profile and UI affordance handlers.
//!
//! # Purpose
//! `GET /v1/me` returns the authenticated caller with their role and the
//! menu sections their client permissions allow. `GET /v1/me/affordances`
//! answers whether a given UI path may be rendered. Both need only
//! authentication; they describe the caller rather than act on the catalog.
use crate::api::error::{ApiError, api_unauthorized, api_validation_error, from_store_error};
use crate::api::types::{AffordanceResponse, MeResponse};
use crate::app::AppState;
use crate::auth::principal::Principal;
use axum::Extension;
use axum::Json;
use axum::extract::{Query, State};
use gatehouse_authz::{can_render, menu_for};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "me",
    responses(
        (status = 200, description = "Caller profile, role, and menu", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn me(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
) -> Result<Json<MeResponse>, ApiError> {
    let Extension(principal) = principal.ok_or_else(|| api_unauthorized("authentication required"))?;
    let user = state
        .store
        .get_user(principal.user_id)
        .await
        .map_err(|err| from_store_error("failed to load user", err))?;
    let role = state
        .store
        .get_role(user.role_id)
        .await
        .map_err(|err| from_store_error("failed to load role", err))?;
    let menu = menu_for(&role.menu_entries());
    Ok(Json(MeResponse {
        user,
        role: role.summary(),
        menu,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/me/affordances",
    tag = "me",
    params(("path" = String, Query, description = "UI path to check")),
    responses(
        (status = 200, description = "Whether the caller may render the path", body = AffordanceResponse),
        (status = 400, description = "Missing path", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn affordances(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AffordanceResponse>, ApiError> {
    let Extension(principal) = principal.ok_or_else(|| api_unauthorized("authentication required"))?;
    let path = params
        .get("path")
        .map(|path| path.trim())
        .filter(|path| !path.is_empty())
        .ok_or_else(|| api_validation_error("path is required"))?
        .to_string();
    let role = state
        .store
        .get_role(principal.role_id)
        .await
        .map_err(|err| from_store_error("failed to load role", err))?;
    let allowed = can_render(&role.menu_entries(), role.is_super_admin(), &path);
    Ok(Json(AffordanceResponse { path, allowed }))
}
