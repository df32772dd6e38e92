//! Console domain model.
//!
//! # Purpose
//! Records persisted by the console stores and the request payloads that
//! create or change them. Request payloads validate themselves into the
//! `New*`/`*Draft` shapes the stores accept, so stores never see raw input.
//!
//! # Key invariants
//! - Identifiers are store-assigned `i64` values, unique per record kind.
//! - API permission routes and client permission paths are stored normalized.
pub mod client_permission;
pub mod permission;
pub mod role;
pub mod user;

pub use client_permission::{ClientPermission, ClientPermissionRequest, NewClientPermission};
pub use permission::{ApiPermission, ApiPermissionRequest, NewApiPermission};
pub use role::{Role, RoleChanges, RoleCreateRequest, RoleDraft, RoleSummary, RoleUpdateRequest};
pub use user::{NewUser, User, UserRequest};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Shared identity of catalog records: every record can be identified and
/// described, and paging/search are written once against this trait.
pub trait CatalogEntry {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
    /// Short human-readable summary used in logs.
    fn describe(&self) -> String;
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(
    RolePage = Page<Role>,
    ApiPermissionPage = Page<ApiPermission>,
    ClientPermissionPage = Page<ClientPermission>,
    UserPage = Page<User>
)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub pages: u32,
    pub limit: u32,
    pub total: u64,
}

/// Listing parameters as supplied by the caller; unset fields fall back to
/// store defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
}

impl ListQuery {
    /// Build from raw query parameters. Unparseable numbers are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let number = |key: &str| {
            params
                .get(key)
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|value| *value > 0)
        };
        let q = params
            .get("q")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            page: number("page"),
            limit: number("limit"),
            q,
        }
    }
}

/// Trim optional free text; blank becomes `None`.
pub(crate) fn clean_description(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn list_query_parses_known_fields() {
        let query = ListQuery::from_params(&params(&[("page", "2"), ("limit", "5"), ("q", " adm ")]));
        assert_eq!(
            query,
            ListQuery {
                page: Some(2),
                limit: Some(5),
                q: Some("adm".to_string()),
            }
        );
    }

    #[test]
    fn list_query_ignores_garbage() {
        let query = ListQuery::from_params(&params(&[("page", "zero"), ("limit", "0"), ("q", "  ")]));
        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  x ").unwrap(), "x");
        assert_eq!(required("name", "   ").unwrap_err(), "name is required");
    }

    #[test]
    fn clean_description_drops_blank() {
        assert_eq!(clean_description(Some("  ".to_string())), None);
        assert_eq!(
            clean_description(Some(" hi ".to_string())),
            Some("hi".to_string())
        );
        assert_eq!(clean_description(None), None);
    }
}
