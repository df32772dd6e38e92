//! Console HTTP API module.
//!
//! # Purpose
//! Route handler modules plus the extractor helpers that turn axum
//! rejections into the console's error body.
pub mod bootstrap;
pub mod client_permissions;
pub mod error;
pub mod me;
pub mod openapi;
pub mod permissions;
pub mod roles;
pub mod system;
pub mod types;
pub mod users;

use crate::api::error::ApiError;
use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = body?;
    Ok(value)
}

pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    let Path(id) = path?;
    Ok(id)
}
