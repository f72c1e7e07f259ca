//! Error types for the item catalog
//!
//! Two layers:
//! - [`StoreError`]: anything the key-value store (or its WAL) can report
//! - [`CatalogError`]: the small taxonomy the repository and service speak

use thiserror::Error;

/// Result type alias using CatalogError
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for store-level operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a [`KeyValueStore`](crate::store::KeyValueStore)
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL partial write at offset {offset}")]
    WalPartialWrite { offset: u64 },

    // -------------------------------------------------------------------------
    // Schema Errors
    // -------------------------------------------------------------------------
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Type mismatch on attribute {attribute}: {reason}")]
    TypeMismatch { attribute: String, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Availability Errors
    // -------------------------------------------------------------------------
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Error taxonomy for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Caller input malformed or missing; raised before any store call
    #[error("{message}")]
    Validation { fields: Vec<String>, message: String },

    /// Well-formed request, no matching record
    #[error("item not found: id={item_id} course={course}")]
    NotFound { item_id: String, course: String },

    /// Store-side index or configuration mismatch
    #[error("schema error: {0}")]
    Schema(String),

    /// Transient or fatal store failure
    #[error(transparent)]
    StoreUnavailable(StoreError),
}

impl CatalogError {
    /// Validation failure for absent (or empty) required fields
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let message = format!("missing required fields: {}", fields.join(", "));
        CatalogError::Validation { fields, message }
    }

    /// Validation failure for a present but unusable field
    pub fn invalid_field(field: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        let field = field.into();
        let message = format!("invalid field {}: {}", field, reason);
        CatalogError::Validation {
            fields: vec![field],
            message,
        }
    }

    /// Field names carried by a validation failure, empty otherwise
    pub fn fields(&self) -> &[String] {
        match self {
            CatalogError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Schema(message) => CatalogError::Schema(message),
            other => CatalogError::StoreUnavailable(other),
        }
    }
}
