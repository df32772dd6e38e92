//! HTTP API request/response types.
//!
//! # Purpose
//! Payload shapes owned by the HTTP layer rather than the domain model, plus
//! the common error body. Domain records (`Role`, `User`, ...) serialize
//! directly from `crate::model`.
use crate::model::{RoleSummary, User};
use gatehouse_authz::MenuSection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct FeatureFlags {
    pub durable_storage: bool,
    pub strict_membership: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SystemInfo {
    pub api_version: String,
    pub backend: String,
    pub features: FeatureFlags,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Caller profile with the menu their role may render.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
    pub role: RoleSummary,
    #[schema(value_type = Vec<Object>)]
    pub menu: Vec<MenuSection>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AffordanceResponse {
    pub path: String,
    pub allowed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BootstrapInitializeRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BootstrapInitializeResponse {
    pub user_id: i64,
    pub role_id: i64,
    pub token: String,
}
