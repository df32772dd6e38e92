use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("invalid method: {0}")]
    InvalidMethod(String),
    #[error("invalid route: {0}")]
    InvalidRoute(String),
    #[error("role name must not be empty")]
    EmptyRoleName,
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::InvalidMethod("PATCH".to_string()),
            AuthzError::InvalidRoute("roles".to_string()),
            AuthzError::EmptyRoleName,
            AuthzError::InvalidIdentifier("abc".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn invalid_method_names_the_literal() {
        let err = AuthzError::InvalidMethod("PATCH".to_string());
        assert_eq!(err.to_string(), "invalid method: PATCH");
    }
}
