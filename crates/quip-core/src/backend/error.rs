//! Backend error handling
//!
//! Provides typed errors for backend operations. Provisioning failures are a
//! distinct variant so callers can show setup instructions instead of a raw
//! transport error.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during backend operations
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend's storage has not been set up yet
    #[error("Storage is not provisioned: {detail}")]
    NotProvisioned { detail: String },

    /// Remote server rejected the request
    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Request never reached the server, or the response never arrived
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failed to read a local document
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a local document
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Local document exists but cannot be parsed
    #[error("Invalid document at '{path}': {detail}")]
    InvalidDocument { path: PathBuf, detail: String },

    /// Response body did not decode as the expected records
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Referenced record does not exist on the backend
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Multi-row write stopped partway; earlier rows were persisted
    #[error("Partial write: {completed} of {total} rows persisted")]
    PartialWrite { completed: usize, total: usize },

    /// Backend returned something the contract does not allow
    #[error("Unexpected backend response: {detail}")]
    Unexpected { detail: String },
}

impl BackendError {
    /// Check whether this error means the storage itself is missing
    ///
    /// Callers use this to swap a generic failure message for provisioning
    /// instructions.
    pub fn is_provisioning(&self) -> bool {
        matches!(self, BackendError::NotProvisioned { .. })
    }

    /// Create a read error with path context
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackendError::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error with path context
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackendError::Write {
            path: path.into(),
            source,
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioning_check() {
        let err = BackendError::NotProvisioned {
            detail: "table 'categories' does not exist".to_string(),
        };
        assert!(err.is_provisioning());

        let err = BackendError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_provisioning());
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::Http {
            status: 404,
            message: "Not Found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("Not Found"));
    }

    #[test]
    fn test_partial_write_display() {
        let err = BackendError::PartialWrite {
            completed: 1,
            total: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("1 of 2"));
    }

    #[test]
    fn test_not_found_display() {
        let id = Uuid::new_v4();
        let err = BackendError::NotFound {
            entity: "category",
            id,
        };
        let msg = err.to_string();
        assert!(msg.contains("category"));
        assert!(msg.contains(&id.to_string()));
    }

    #[test]
    fn test_read_constructor() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = BackendError::read("/data/store/abc.json", io_err);
        assert!(matches!(err, BackendError::Read { .. }));
        assert!(err.to_string().contains("/data/store/abc.json"));
    }
}
