//! Status store error types.

use thiserror::Error;

use mediaq_models::ValidationError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status from the Firestore REST API to a store error.
    pub fn from_http_status(status: u16, msg: String) -> Self {
        match status {
            401 => Self::Auth(msg),
            403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            409 => Self::AlreadyExists(msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// HTTP status this error corresponds to, for metrics labels.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            StoreError::Validation(_) => Some(400),
            StoreError::Auth(_) => Some(401),
            StoreError::PermissionDenied(_) => Some(403),
            StoreError::NotFound(_) => Some(404),
            StoreError::AlreadyExists(_) => Some(409),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert!(matches!(
            StoreError::from_http_status(404, "x".into()),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_http_status(409, "x".into()),
            StoreError::AlreadyExists(_)
        ));
        assert!(matches!(
            StoreError::from_http_status(500, "x".into()),
            StoreError::RequestFailed(_)
        ));
    }

    #[test]
    fn validation_error_converts() {
        let err: StoreError = ValidationError::BlankTitle.into();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.http_status(), Some(400));
    }
}
