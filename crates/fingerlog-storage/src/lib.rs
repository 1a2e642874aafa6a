//! Storage layer for the fingerlog attendance system.
//!
//! This crate provides SQLite-backed persistence for enrolled identities and
//! their recorded visits.
//!
//! # Architecture
//!
//! The storage layer uses a repository pattern with the following components:
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`IdentityRepository`], [`VisitRepository`] - Data access traits
//! - [`models`] - Row types plus the [`VisitFilter`] query input
//!
//! # Integrity Invariants
//!
//! - `slot_id` and `external_id` are each unique across identities,
//!   enforced by UNIQUE constraints so the check-and-insert is one atomic
//!   unit even under concurrent registration attempts
//! - every visit references an existing identity (foreign keys enabled on
//!   every connection)
//! - no operation leaves a partially-written row; failed inserts persist
//!   nothing
//!
//! # Examples
//!
//! ```no_run
//! use fingerlog_core::SlotId;
//! use fingerlog_storage::{Database, DatabaseConfig, NewIdentity, VisitFilter};
//! use fingerlog_storage::repositories::{
//!     IdentityRepository, SqliteIdentityRepository, SqliteVisitRepository, VisitRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("attendance.db")).await?;
//!
//! let identities = SqliteIdentityRepository::new(db.pool().clone());
//! let visits = SqliteVisitRepository::new(db.pool().clone());
//!
//! let slot = SlotId::new(5)?;
//! let identity = identities
//!     .register(&NewIdentity::new(slot, "Ada Lovelace", "S-1815"))
//!     .await?;
//!
//! let visit = visits.record(identity.id).await?;
//! println!("recorded visit {} at {}", visit.id, visit.observed_at);
//!
//! for entry in visits.query(&VisitFilter::new().text("lovelace")).await? {
//!     println!("{} - {}", entry.observed_at, entry.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{Identity, NewIdentity, VisitEntry, VisitFilter, VisitRecord};
pub use repositories::{
    IdentityRepository, SqliteIdentityRepository, SqliteVisitRepository, VisitRepository,
};
