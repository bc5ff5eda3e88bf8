use crate::pos::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not connected to the POS catalog")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(#[from] CatalogError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Convenience constructor for validation failures raised by hand-written checks.
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }

    /// True for failures caused by bad user input. The caller should keep the
    /// submitted form so it can be corrected.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }

    /// True for failures talking to the external catalog.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn validation_errors_convert_to_validation_variant() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));

        let err: ServiceError = errors.into();
        assert!(err.is_validation());
        assert!(!err.is_connection());
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn catalog_failures_are_connection_errors() {
        let err: ServiceError = CatalogError::Status {
            status: 401,
            path: "/items".into(),
        }
        .into();
        assert!(err.is_connection());
        assert_eq!(
            err.to_string(),
            "Connection failed: POS API error: 401 on /items"
        );
    }
}
