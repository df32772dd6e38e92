//! Console users. Each user holds exactly one role.
use super::{CatalogEntry, required};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogEntry for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.email.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub role_id: i64,
    #[serde(default)]
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    /// Lowercased.
    pub email: String,
    pub role_id: i64,
    pub blocked: bool,
}

impl UserRequest {
    pub fn validate(self) -> Result<NewUser, String> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?.to_lowercase();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email || email.chars().any(char::is_whitespace) {
            return Err(format!("invalid email: {}", self.email.trim()));
        }
        if self.role_id <= 0 {
            return Err("role_id is required".to_string());
        }
        Ok(NewUser {
            name,
            email,
            role_id: self.role_id,
            blocked: self.blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, role_id: i64) -> UserRequest {
        UserRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            role_id,
            blocked: false,
        }
    }

    #[test]
    fn validate_lowercases_email() {
        let user = request(" Ada@Example.COM ", 1).validate().expect("valid");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn validate_rejects_bad_email_and_role() {
        assert!(request("ada", 1).validate().unwrap_err().starts_with("invalid email"));
        assert!(request("@example.com", 1).validate().is_err());
        assert_eq!(
            request("ada@example.com", 0).validate().unwrap_err(),
            "role_id is required"
        );
    }
}
