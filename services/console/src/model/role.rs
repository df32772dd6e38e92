//! Roles and role mutation payloads.
//!
//! # Key invariants
//! - `role_type` is always `derive_role_type(name)`; it is serialized as `type`.
//! - `permissions` are ordered by id, `client_permissions` by `(sort, id)`.
//! - Update payloads replace both permission sets; an omitted list clears
//!   that kind.
use super::{ApiPermission, CatalogEntry, ClientPermission, clean_description};
use chrono::{DateTime, Utc};
use gatehouse_authz::{IdList, MenuEntry, RoleGrants, is_super_admin, normalize_role_name};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub role_type: String,
    pub description: Option<String>,
    pub permissions: Vec<ApiPermission>,
    pub client_permissions: Vec<ClientPermission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_super_admin(&self) -> bool {
        is_super_admin(&self.role_type)
    }

    /// Project the role onto the evaluator's input.
    pub fn grants(&self) -> RoleGrants {
        RoleGrants::new(
            self.role_type.clone(),
            self.permissions.iter().map(ApiPermission::grant).collect(),
        )
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        self.client_permissions
            .iter()
            .map(ClientPermission::menu_entry)
            .collect()
    }

    pub fn summary(&self) -> RoleSummary {
        RoleSummary {
            id: self.id,
            name: self.name.clone(),
            role_type: self.role_type.clone(),
        }
    }
}

impl CatalogEntry for Role {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.role_type.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub role_type: String,
}

/// Create payload. Identifier lists accept a scalar or an array of numbers or
/// numeric strings; blanks are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "permission")]
    #[schema(value_type = Vec<i64>)]
    pub permission_ids: IdList,
    #[serde(default, alias = "client_permission")]
    #[schema(value_type = Vec<i64>)]
    pub client_permission_ids: IdList,
}

/// Update payload. `name` absent keeps the current name; `description`
/// absent keeps the current value and `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, alias = "permission")]
    #[schema(value_type = Vec<i64>)]
    pub permission_ids: IdList,
    #[serde(default, alias = "client_permission")]
    #[schema(value_type = Vec<i64>)]
    pub client_permission_ids: IdList,
}

/// Validated create input; the store derives the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Vec<i64>,
    pub client_permission_ids: Vec<i64>,
}

/// Validated update input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub permission_ids: Vec<i64>,
    pub client_permission_ids: Vec<i64>,
}

impl RoleCreateRequest {
    pub fn validate(self) -> Result<RoleDraft, String> {
        let name = normalize_role_name(&self.name).map_err(|err| err.to_string())?;
        Ok(RoleDraft {
            name,
            description: clean_description(self.description),
            permission_ids: self.permission_ids.normalize().map_err(|err| err.to_string())?,
            client_permission_ids: self
                .client_permission_ids
                .normalize()
                .map_err(|err| err.to_string())?,
        })
    }
}

impl RoleUpdateRequest {
    pub fn validate(self) -> Result<RoleChanges, String> {
        let name = self
            .name
            .as_deref()
            .map(normalize_role_name)
            .transpose()
            .map_err(|err| err.to_string())?;
        Ok(RoleChanges {
            name,
            description: self.description.map(clean_description),
            permission_ids: self.permission_ids.normalize().map_err(|err| err.to_string())?,
            client_permission_ids: self
                .client_permission_ids
                .normalize()
                .map_err(|err| err.to_string())?,
        })
    }
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_authz::{HttpMethod, RouteGrant};

    #[test]
    fn create_request_accepts_form_style_ids() {
        let request: RoleCreateRequest = serde_json::from_value(serde_json::json!({
            "name": "  Content Editor ",
            "permission": ["3", 1, null, "", 0, 3],
            "client_permission": "7"
        }))
        .expect("payload");
        let draft = request.validate().expect("valid");
        assert_eq!(draft.name, "Content Editor");
        assert_eq!(draft.permission_ids, vec![3, 1]);
        assert_eq!(draft.client_permission_ids, vec![7]);
    }

    #[test]
    fn create_request_rejects_blank_name_and_bad_ids() {
        let request = RoleCreateRequest {
            name: "   ".to_string(),
            description: None,
            permission_ids: IdList::default(),
            client_permission_ids: IdList::default(),
        };
        assert!(request.validate().is_err());

        let request: RoleCreateRequest = serde_json::from_value(serde_json::json!({
            "name": "Editor",
            "permission_ids": ["abc"]
        }))
        .expect("payload");
        assert!(request.validate().unwrap_err().contains("invalid identifier"));
    }

    #[test]
    fn update_request_distinguishes_absent_and_null_description() {
        let absent: RoleUpdateRequest =
            serde_json::from_value(serde_json::json!({})).expect("payload");
        assert_eq!(absent.validate().expect("valid").description, None);

        let cleared: RoleUpdateRequest =
            serde_json::from_value(serde_json::json!({ "description": null })).expect("payload");
        assert_eq!(cleared.validate().expect("valid").description, Some(None));

        let set: RoleUpdateRequest =
            serde_json::from_value(serde_json::json!({ "description": " ops " }))
                .expect("payload");
        assert_eq!(
            set.validate().expect("valid").description,
            Some(Some("ops".to_string()))
        );
    }

    #[test]
    fn update_request_without_lists_clears_both_kinds() {
        let changes = RoleUpdateRequest::default().validate().expect("valid");
        assert!(changes.permission_ids.is_empty());
        assert!(changes.client_permission_ids.is_empty());
        assert_eq!(changes.name, None);
    }

    #[test]
    fn grants_follow_permissions() {
        let now = Utc::now();
        let role = Role {
            id: 2,
            name: "Viewer".to_string(),
            role_type: "VIEWER".to_string(),
            description: None,
            permissions: vec![ApiPermission {
                id: 1,
                name: "List roles".to_string(),
                method: HttpMethod::Get,
                route: "/v1/roles".to_string(),
                description: None,
                created_at: now,
                updated_at: now,
            }],
            client_permissions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let grants = role.grants();
        assert_eq!(grants.grants, vec![RouteGrant::new(HttpMethod::Get, "/v1/roles")]);
        assert!(!role.is_super_admin());
        let json = serde_json::to_value(&role).expect("json");
        assert_eq!(json["type"], "VIEWER");
    }
}
