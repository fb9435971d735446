//! Error types module
//!
//! All failures surfaced by the workflows are unified under the `AppError`
//! enum. Each variant self-describes its HTTP presentation through the
//! `ErrorMetadata` trait so the API layer renders every error the same way.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "persistence_error")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage connectivity error: {0}")]
    StorageConnectivity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Full internal message, including the source chain where present.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {}", message, source)
            }
            other => other.to_string(),
        }
    }

    /// Human-readable error category, used as a structured log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::InvalidFileType(_) => "InvalidFileType",
            AppError::InvalidPayload(_) => "InvalidPayload",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Persistence(_) => "Persistence",
            AppError::StorageConnectivity(_) => "StorageConnectivity",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::Validation(_)
            | AppError::InvalidFileType(_)
            | AppError::InvalidPayload(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::NotFound(_) => 404,
            AppError::Persistence(_)
            | AppError::StorageConnectivity(_)
            | AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidFileType(_) => "invalid_file_type",
            AppError::InvalidPayload(_) => "invalid_payload",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Persistence(_) => "persistence_error",
            AppError::StorageConnectivity(_) => "storage_connectivity_error",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "internal_error",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::StorageConnectivity(_) | AppError::Persistence(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Persistence(_) => "Persistence operation failed".to_string(),
            AppError::StorageConnectivity(_) => "File storage is unavailable".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        // Persistence and connectivity messages can carry connection strings
        // or share credentials; never echo them to clients in production.
        matches!(
            self,
            AppError::Persistence(_)
                | AppError::StorageConnectivity(_)
                | AppError::Internal(_)
                | AppError::InternalWithSource { .. }
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_)
            | AppError::InvalidFileType(_)
            | AppError::InvalidPayload(_)
            | AppError::NotFound(_) => LogLevel::Debug,
            AppError::Unauthorized(_) => LogLevel::Warn,
            AppError::Persistence(_)
            | AppError::StorageConnectivity(_)
            | AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_400() {
        let err = AppError::Validation("JobID is required".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "validation_error");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn persistence_errors_hide_details_from_clients() {
        let err = AppError::Persistence("login failed for user 'sa'".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Persistence operation failed");
        assert!(err.detailed_message().contains("login failed"));
    }

    #[test]
    fn source_chain_is_preserved_in_detailed_message() {
        let source = anyhow::anyhow!("connection reset by peer");
        let err = AppError::InternalWithSource {
            message: "sending notification".to_string(),
            source,
        };
        let detail = err.detailed_message();
        assert!(detail.contains("sending notification"));
        assert!(detail.contains("connection reset"));
    }
}
