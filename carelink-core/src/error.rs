//! Unified error handling
//!
//! Structured error types shared by the domain store and the service
//! layers. Web-facing translation into the JSON error envelope lives in
//! the web crate; this taxonomy carries everything that translation
//! needs (a machine-readable code and an optional client-facing
//! message).

use thiserror::Error;

pub type CareResult<T> = Result<T, CareError>;

/// Main error type for the carelink domain layers.
#[derive(Error, Debug)]
pub enum CareError {
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Unique-constraint and similar write conflicts. The client-facing
    /// message is deliberately vague so schema details do not leak.
    #[error("integrity violation: {message}")]
    Integrity { message: String },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CareError {
    pub fn storage(message: impl Into<String>) -> Self {
        CareError::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CareError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CareError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        CareError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        CareError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        CareError::Integrity {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CareError::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CareError::NotFound { .. })
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, CareError::Integrity { .. })
    }

    /// Machine-readable code used by the API error envelope.
    pub fn error_type(&self) -> &'static str {
        match self {
            CareError::Storage { .. } => "storage_error",
            CareError::Validation { .. } => "validation_error",
            CareError::NotFound { .. } => "not_found",
            CareError::Integrity { .. } => "integrity_error",
            CareError::Internal { .. } => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifiers() {
        assert!(CareError::not_found("shift").is_not_found());
        assert!(CareError::integrity("duplicate key").is_integrity());
        assert!(!CareError::validation("bad email").is_not_found());
    }

    #[test]
    fn error_types_are_stable() {
        assert_eq!(CareError::integrity("x").error_type(), "integrity_error");
        assert_eq!(CareError::not_found("x").error_type(), "not_found");
    }
}
