//! API route permissions.
use super::{CatalogEntry, clean_description, required};
use chrono::{DateTime, Utc};
use gatehouse_authz::{HttpMethod, RouteGrant, validate_route};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Grant to call `method` on `route`. `route` may be a `:param`/`*` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiPermission {
    pub id: i64,
    pub name: String,
    #[schema(value_type = String, example = "GET")]
    pub method: HttpMethod,
    #[schema(example = "/v1/roles/:id")]
    pub route: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiPermission {
    pub fn grant(&self) -> RouteGrant {
        RouteGrant::new(self.method, &self.route)
    }
}

impl CatalogEntry for ApiPermission {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method, self.route)
    }
}

/// Create/replace payload for an API permission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiPermissionRequest {
    pub name: String,
    #[schema(example = "GET")]
    pub method: String,
    pub route: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validated API permission fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiPermission {
    pub name: String,
    pub method: HttpMethod,
    pub route: String,
    pub description: Option<String>,
}

impl ApiPermissionRequest {
    pub fn validate(self) -> Result<NewApiPermission, String> {
        let name = required("name", &self.name)?;
        let method = self
            .method
            .trim()
            .parse::<HttpMethod>()
            .map_err(|err| err.to_string())?;
        required("route", &self.route)?;
        let route = validate_route(&self.route).map_err(|err| err.to_string())?;
        Ok(NewApiPermission {
            name,
            method,
            route,
            description: clean_description(self.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, route: &str) -> ApiPermissionRequest {
        ApiPermissionRequest {
            name: " List roles ".to_string(),
            method: method.to_string(),
            route: route.to_string(),
            description: Some(String::new()),
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let permission = request("GET", "/v1/roles/").validate().expect("valid");
        assert_eq!(permission.name, "List roles");
        assert_eq!(permission.method, HttpMethod::Get);
        assert_eq!(permission.route, "/v1/roles");
        assert_eq!(permission.description, None);
    }

    #[test]
    fn validate_rejects_unknown_method() {
        let err = request("PATCH", "/v1/roles").validate().unwrap_err();
        assert!(err.contains("invalid method"));
        let err = request("get", "/v1/roles").validate().unwrap_err();
        assert!(err.contains("invalid method"));
    }

    #[test]
    fn validate_rejects_bad_route() {
        assert_eq!(request("GET", " ").validate().unwrap_err(), "route is required");
        assert!(request("GET", "v1/roles").validate().unwrap_err().contains("invalid route"));
    }

    #[test]
    fn describe_and_grant_use_method_and_route() {
        let now = Utc::now();
        let permission = ApiPermission {
            id: 1,
            name: "Role detail".to_string(),
            method: HttpMethod::Put,
            route: "/v1/roles/:id".to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(permission.describe(), "PUT /v1/roles/:id");
        assert_eq!(permission.grant(), RouteGrant::new(HttpMethod::Put, "/v1/roles/:id"));
    }
}
