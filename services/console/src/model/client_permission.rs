//! UI (client) permissions: menu entries a role may render.
use super::{CatalogEntry, clean_description, required};
use chrono::{DateTime, Utc};
use gatehouse_authz::{MenuEntry, validate_route};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClientPermission {
    pub id: i64,
    pub name: String,
    pub menu: String,
    #[schema(example = "/admin/roles")]
    pub path: String,
    pub sort: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientPermission {
    pub fn menu_entry(&self) -> MenuEntry {
        MenuEntry {
            id: self.id,
            name: self.name.clone(),
            menu: self.menu.clone(),
            path: self.path.clone(),
            sort: self.sort,
        }
    }
}

impl CatalogEntry for ClientPermission {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{} {}", self.menu, self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientPermissionRequest {
    pub name: String,
    pub menu: String,
    pub path: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClientPermission {
    pub name: String,
    pub menu: String,
    pub path: String,
    pub sort: i32,
    pub description: Option<String>,
}

impl ClientPermissionRequest {
    pub fn validate(self) -> Result<NewClientPermission, String> {
        let name = required("name", &self.name)?;
        let menu = required("menu", &self.menu)?;
        required("path", &self.path)?;
        let path = validate_route(&self.path)
            .map_err(|_| format!("invalid path: {}", self.path))?;
        Ok(NewClientPermission {
            name,
            menu,
            path,
            sort: self.sort,
            description: clean_description(self.description),
        })
    }
}
