//! Bootstrap API handler.
//!
//! # Purpose
//! Seeds a fresh console: creates the super-admin role and the first admin
//! user, then returns a bearer token for that user. Served on a separate
//! internal listener and guarded by a shared bootstrap token.
//!
//! # Key invariants
//! - Runs once: an existing super-admin role means the console is initialized.
//! - The bootstrap token is compared in constant time and never logged.
use crate::api::error::{
    ApiError, api_conflict, api_internal_message, api_not_enabled, api_unauthorized,
    api_validation_error, from_store_error,
};
use crate::api::json_body;
use crate::api::types::{BootstrapInitializeRequest, BootstrapInitializeResponse};
use crate::app::AppState;
use crate::model::{RoleDraft, UserRequest};
use crate::store::StoreError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use gatehouse_authz::SUPER_ADMIN_TYPE;

pub const BOOTSTRAP_TOKEN_HEADER: &str = "X-Gatehouse-Bootstrap-Token";
const SUPER_ADMIN_NAME: &str = "Super Admin";

#[utoipa::path(
    post,
    path = "/internal/bootstrap/initialize",
    tag = "bootstrap",
    request_body = BootstrapInitializeRequest,
    responses(
        (status = 201, description = "Console initialized", body = BootstrapInitializeResponse),
        (status = 400, description = "Validation error", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid bootstrap token", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Bootstrap not enabled", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Already initialized", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn initialize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<BootstrapInitializeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.bootstrap_enabled {
        return Err(api_not_enabled("bootstrap not enabled"));
    }
    ensure_bootstrap_authorized(&state, &headers)?;
    let body = json_body(body)?;

    // Validated before anything is written; the role id is filled in below.
    let mut user = UserRequest {
        name: body.name,
        email: body.email,
        role_id: 1,
        blocked: false,
    }
    .validate()
    .map_err(|message| api_validation_error(&message))?;

    let existing = state
        .store
        .find_role_by_type(SUPER_ADMIN_TYPE)
        .await
        .map_err(|err| from_store_error("failed to check bootstrap state", err))?;
    if existing.is_some() {
        return Err(already_initialized());
    }

    let role = match state
        .store
        .create_role(RoleDraft {
            name: SUPER_ADMIN_NAME.to_string(),
            description: Some("Full access to every console route".to_string()),
            permission_ids: Vec::new(),
            client_permission_ids: Vec::new(),
        })
        .await
    {
        Ok(role) => role,
        // A concurrent bootstrap created it first.
        Err(StoreError::DuplicateName(_)) => return Err(already_initialized()),
        Err(err) => return Err(from_store_error("failed to create super admin role", err)),
    };

    user.role_id = role.id;
    let user = state
        .store
        .create_user(user)
        .await
        .map_err(|err| from_store_error("failed to create admin user", err))?;

    let token = state.tokens.mint(user.id).map_err(|err| {
        tracing::error!(error = %err, "failed to mint bootstrap token");
        api_internal_message("failed to mint token")
    })?;
    tracing::info!(user_id = user.id, role_id = role.id, "console bootstrapped");

    Ok((
        StatusCode::CREATED,
        Json(BootstrapInitializeResponse {
            user_id: user.id,
            role_id: role.id,
            token,
        }),
    ))
}

fn already_initialized() -> ApiError {
    api_conflict("already_initialized", "console already initialized")
}

fn ensure_bootstrap_authorized(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = match headers.get(BOOTSTRAP_TOKEN_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| api_unauthorized("invalid bootstrap token"))?,
        None => return Err(api_unauthorized("missing bootstrap token")),
    };

    let expected = state
        .bootstrap_token
        .as_ref()
        .ok_or_else(|| api_internal_message("bootstrap token missing"))?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(api_unauthorized("invalid bootstrap token"));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
