use thiserror::Error;

/// Storage-specific error types for the attendance ledger.
///
/// Everything except `Database`/`Migration` is caller-correctable: bad
/// input, a duplicate enrollment, or a lookup of a key that does not exist.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The template slot is already assigned to an enrolled identity.
    #[error("Slot {slot} is already enrolled")]
    DuplicateSlot { slot: i64 },

    /// The external id is already assigned to an enrolled identity.
    #[error("External id {external_id:?} is already enrolled")]
    DuplicateExternalId { external_id: String },

    /// Slot number outside the sensor's supported range.
    #[error("Slot id must be 1-127, got {value}")]
    InvalidSlot { value: u32 },

    /// A required text field was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Visit recording referenced an identity key that does not exist.
    #[error("No identity with key {identity_id}")]
    UnknownIdentity { identity_id: i64 },

    /// Database connection or query execution failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<fingerlog_core::Error> for StorageError {
    fn from(error: fingerlog_core::Error) -> Self {
        match error {
            fingerlog_core::Error::InvalidSlot { value } => Self::InvalidSlot { value },
            fingerlog_core::Error::InvalidInput(message) => Self::InvalidInput(message),
        }
    }
}

/// Specialized result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
