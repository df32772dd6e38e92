//! API error types and helpers.
//!
//! # Purpose
//! Every handler returns [`ApiError`], built through the helpers below, so
//! error bodies share one shape: `{ "code", "message", "request_id" }`.
//!
//! # Key invariants
//! - `code` is stable and machine-readable; `message` is for humans.
//! - Storage failures are logged server-side and surface only as `internal`.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// 404 for endpoints switched off by configuration.
pub fn api_not_enabled(message: &str) -> ApiError {
    // NOT_FOUND so disabled surfaces look absent.
    api_error(StatusCode::NOT_FOUND, "not_enabled", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

/// Log `err` and return a generic 500.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "console storage error");
    api_internal_message(message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn api_duplicate_name(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "duplicate_name", message)
}

pub fn api_protected_role(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "protected_role", message)
}

pub fn api_unknown_permission(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "unknown_permission", message)
}

pub fn api_role_in_use(message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, "role_in_use", message)
}

/// Map a store failure onto the error taxonomy.
///
/// `context` is the message used when the failure is internal, for example
/// "failed to update role".
pub fn from_store_error(context: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(what) => api_not_found(&format!("{what} not found")),
        StoreError::DuplicateName(name) => {
            api_duplicate_name(&format!("a role named {name} already exists"))
        }
        StoreError::ProtectedRole(name) => {
            api_protected_role(&format!("role {name} cannot be deleted"))
        }
        err @ StoreError::UnknownPermission { .. } => api_unknown_permission(&err.to_string()),
        err @ StoreError::RoleInUse { .. } => api_role_in_use(&err.to_string()),
        err @ StoreError::UnknownRole(_) => api_validation_error(&err.to_string()),
        StoreError::Conflict(message) => api_conflict("already_exists", &message),
        err @ StoreError::Unexpected(_) => api_internal(context, &err),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        api_validation_error(&rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        api_validation_error(&rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PermissionKind;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.code, "not_found");

        let not_enabled = api_not_enabled("disabled");
        assert_eq!(not_enabled.status, StatusCode::NOT_FOUND);
        assert_eq!(not_enabled.body.code, "not_enabled");

        let conflict = api_conflict("already_exists", "conflict");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.body.code, "already_exists");

        let unauthorized = api_unauthorized("nope");
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.body.code, "unauthorized");

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.code, "forbidden");

        let validation = api_validation_error("bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
        assert!(validation.body.request_id.is_none());
    }

    #[test]
    fn store_errors_follow_the_taxonomy() {
        let cases = [
            (StoreError::NotFound("role 4".into()), StatusCode::NOT_FOUND, "not_found"),
            (
                StoreError::DuplicateName("Editor".into()),
                StatusCode::BAD_REQUEST,
                "duplicate_name",
            ),
            (
                StoreError::ProtectedRole("Super Admin".into()),
                StatusCode::BAD_REQUEST,
                "protected_role",
            ),
            (
                StoreError::UnknownPermission {
                    kind: PermissionKind::Api,
                    ids: vec![9],
                },
                StatusCode::BAD_REQUEST,
                "unknown_permission",
            ),
            (
                StoreError::RoleInUse {
                    role_id: 2,
                    users: 3,
                },
                StatusCode::CONFLICT,
                "role_in_use",
            ),
            (StoreError::UnknownRole(5), StatusCode::BAD_REQUEST, "validation_error"),
            (
                StoreError::Conflict("email taken".into()),
                StatusCode::CONFLICT,
                "already_exists",
            ),
            (
                StoreError::Unexpected(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
            ),
        ];
        for (err, status, code) in cases {
            let api = from_store_error("failed", err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
        }
    }

    #[test]
    fn unknown_permission_message_lists_ids() {
        let api = from_store_error(
            "failed",
            StoreError::UnknownPermission {
                kind: PermissionKind::Client,
                ids: vec![7, 8],
            },
        );
        assert_eq!(api.body.message, "unknown client permission ids: [7, 8]");
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = from_store_error(
            "storage failed",
            StoreError::Unexpected(anyhow::anyhow!("password=hunter2")),
        );
        assert_eq!(api.body.message, "storage failed");
    }
}
