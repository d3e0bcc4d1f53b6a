//! # Error Types
//!
//! Structured error types for carbon_core. The calculation engine itself only
//! ever fails on an unusable quantity; every other unknown input degrades to a
//! documented default. The remaining variants belong to request validation and
//! ledger persistence.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::errors::{CarbonError, CarbonResult};
//!
//! fn check_quantity(quantity: f64) -> CarbonResult<f64> {
//!     if quantity < 0.0 {
//!         return Err(CarbonError::invalid_input(
//!             "quantity",
//!             quantity.to_string(),
//!             "Quantity must not be negative",
//!         ));
//!     }
//!     Ok(quantity)
//! }
//!
//! assert!(check_quantity(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for carbon_core operations
pub type CarbonResult<T> = Result<T, CarbonError>;

/// Structured error type for calculation, validation and ledger operations.
///
/// Each variant carries enough context to build a user-facing message and a
/// machine-readable code.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CarbonError {
    /// The quantity could not be converted to a finite number
    #[error("Invalid quantity: '{value}' is not a valid number")]
    InvalidQuantity { value: String },

    /// An input value is invalid (wrong type, out of range, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// The request body itself is unusable (not a JSON object, not JSON at all)
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Ledger file is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CarbonError {
    /// Create an InvalidQuantity error
    pub fn invalid_quantity(value: impl Into<String>) -> Self {
        CarbonError::InvalidQuantity {
            value: value.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CarbonError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CarbonError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        CarbonError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CarbonError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CarbonError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CarbonError::SerializationError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CarbonError::FileLocked { .. })
    }

    /// True for errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CarbonError::InvalidQuantity { .. }
                | CarbonError::InvalidInput { .. }
                | CarbonError::MissingField { .. }
                | CarbonError::InvalidRequest { .. }
        )
    }

    /// HTTP-equivalent status: 400 for validation failures, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.is_validation() {
            400
        } else {
            500
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CarbonError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            CarbonError::InvalidInput { .. } => "INVALID_INPUT",
            CarbonError::MissingField { .. } => "MISSING_FIELD",
            CarbonError::InvalidRequest { .. } => "INVALID_REQUEST",
            CarbonError::FileError { .. } => "FILE_ERROR",
            CarbonError::FileLocked { .. } => "FILE_LOCKED",
            CarbonError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CarbonError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CarbonError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CarbonError {
    fn from(err: serde_json::Error) -> Self {
        CarbonError::serialization(err.to_string())
    }
}
