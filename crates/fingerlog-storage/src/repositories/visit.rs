#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{VisitEntry, VisitFilter, VisitRecord};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Repository trait for VisitRecord entity operations
///
/// Visits form the append-only attendance log: one row per successful
/// detection-to-identity resolution, individually deletable, never mutated.
pub trait VisitRepository: Send + Sync {
    /// Append a visit for the given identity key.
    ///
    /// The record id and `observed_at` timestamp are store-assigned.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIdentity` if the key does not reference an enrolled
    /// identity. The pipeline resolves before recording, so this is a
    /// defensive check backed by the foreign key constraint.
    async fn record(&self, identity_id: i64) -> StorageResult<VisitRecord>;

    /// Query visits joined with their identities, newest first.
    async fn query(&self, filter: &VisitFilter) -> StorageResult<Vec<VisitEntry>>;

    /// Fetch a single visit by record id.
    async fn find(&self, record_id: i64) -> StorageResult<Option<VisitEntry>>;

    /// Delete a visit by record id.
    ///
    /// Returns `true` if a record existed and was removed. Idempotent:
    /// deleting a missing id returns `false` and changes nothing.
    async fn delete(&self, record_id: i64) -> StorageResult<bool>;
}

/// SQLite implementation of VisitRepository
pub struct SqliteVisitRepository {
    pool: SqlitePool,
}

const ENTRY_SELECT: &str = "SELECT v.id AS record_id, i.name, i.external_id, i.slot_id, \
     i.portrait, v.observed_at \
     FROM visits v \
     JOIN identities i ON i.id = v.identity_id";

impl SqliteVisitRepository {
    /// Create a new SQLite visit repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl VisitRepository for SqliteVisitRepository {
    async fn record(&self, identity_id: i64) -> StorageResult<VisitRecord> {
        let record = sqlx::query_as::<_, VisitRecord>(
            r#"
            INSERT INTO visits (identity_id, observed_at)
            VALUES (?, ?)
            RETURNING id, identity_id, observed_at
            "#,
        )
        .bind(identity_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(db_error) = &error
                && db_error.is_foreign_key_violation()
            {
                return StorageError::UnknownIdentity { identity_id };
            }
            StorageError::Database(error)
        })?;

        Ok(record)
    }

    async fn query(&self, filter: &VisitFilter) -> StorageResult<Vec<VisitEntry>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ENTRY_SELECT);
        let mut prefix = " WHERE ";

        if let Some(from) = filter.from {
            builder.push(prefix).push("v.observed_at >= ").push_bind(from);
            prefix = " AND ";
        }
        if let Some(to) = filter.to {
            builder.push(prefix).push("v.observed_at <= ").push_bind(to);
            prefix = " AND ";
        }
        if let Some(text) = &filter.text {
            let pattern = format!("%{}%", text.to_lowercase());
            builder
                .push(prefix)
                .push("(LOWER(i.name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(i.external_id) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        // Newest first; id breaks ties in favor of the later insert.
        builder.push(" ORDER BY v.observed_at DESC, v.id DESC");

        let entries = builder
            .build_query_as::<VisitEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn find(&self, record_id: i64) -> StorageResult<Option<VisitEntry>> {
        let entry = sqlx::query_as::<_, VisitEntry>(&format!("{ENTRY_SELECT} WHERE v.id = ?"))
            .bind(record_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn delete(&self, record_id: i64) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM visits WHERE id = ?")
            .bind(record_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
