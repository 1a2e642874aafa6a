#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{Identity, NewIdentity};
use chrono::Utc;
use fingerlog_core::SlotId;
use sqlx::SqlitePool;

/// Repository trait for Identity entity operations
///
/// This trait defines the contract for enrolled-identity data access,
/// enabling testability through mock implementations and separation of
/// business logic from persistence.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024 feature),
/// eliminating the need for the async-trait crate while maintaining
/// full async/await support in trait methods.
pub trait IdentityRepository: Send + Sync {
    /// Register a new identity.
    ///
    /// The uniqueness check and the insert are a single atomic unit: two
    /// concurrent registrations for the same slot or external id yield
    /// exactly one success and one `Duplicate*` failure.
    async fn register(&self, new: &NewIdentity) -> StorageResult<Identity>;

    /// Find an identity by its sensor template slot.
    async fn find_by_slot(&self, slot: SlotId) -> StorageResult<Option<Identity>>;

    /// Find an identity by its technical key.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Identity>>;

    /// List all identities, ordered by name.
    async fn list_all(&self) -> StorageResult<Vec<Identity>>;

    /// Check whether a slot is already enrolled (pre-validation helper).
    async fn slot_exists(&self, slot: SlotId) -> StorageResult<bool>;

    /// Check whether an external id is already enrolled (pre-validation helper).
    async fn external_id_exists(&self, external_id: &str) -> StorageResult<bool>;
}

/// SQLite implementation of IdentityRepository
pub struct SqliteIdentityRepository {
    pool: SqlitePool,
}

impl SqliteIdentityRepository {
    /// Create a new SQLite identity repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Map a failed insert to the caller-correctable duplicate errors.
    ///
    /// SQLite reports which UNIQUE constraint fired in the error message
    /// (`UNIQUE constraint failed: identities.slot_id`), which is the only
    /// way to tell the two apart after a single atomic INSERT.
    fn map_insert_error(error: sqlx::Error, new: &NewIdentity) -> StorageError {
        if let sqlx::Error::Database(db_error) = &error
            && db_error.is_unique_violation()
        {
            let message = db_error.message();
            if message.contains("slot_id") {
                return StorageError::DuplicateSlot {
                    slot: i64::from(new.slot.get()),
                };
            }
            if message.contains("external_id") {
                return StorageError::DuplicateExternalId {
                    external_id: new.external_id.clone(),
                };
            }
        }
        StorageError::Database(error)
    }
}

impl IdentityRepository for SqliteIdentityRepository {
    async fn register(&self, new: &NewIdentity) -> StorageResult<Identity> {
        new.validate()?;

        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities (slot_id, name, external_id, portrait, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, slot_id, name, external_id, portrait, created_at
            "#,
        )
        .bind(i64::from(new.slot.get()))
        .bind(new.name.trim())
        .bind(new.external_id.trim())
        .bind(&new.portrait)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, new))?;

        Ok(identity)
    }

    async fn find_by_slot(&self, slot: SlotId) -> StorageResult<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, slot_id, name, external_id, portrait, created_at
            FROM identities
            WHERE slot_id = ?
            "#,
        )
        .bind(i64::from(slot.get()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, slot_id, name, external_id, portrait, created_at
            FROM identities
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn list_all(&self) -> StorageResult<Vec<Identity>> {
        let identities = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, slot_id, name, external_id, portrait, created_at
            FROM identities
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }

    async fn slot_exists(&self, slot: SlotId) -> StorageResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM identities WHERE slot_id = ?")
            .bind(i64::from(slot.get()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn external_id_exists(&self, external_id: &str) -> StorageResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM identities WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }
}
