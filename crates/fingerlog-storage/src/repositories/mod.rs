//! Repository traits and SQLite implementations.

pub mod identity;
pub mod visit;

pub use identity::{IdentityRepository, SqliteIdentityRepository};
pub use visit::{SqliteVisitRepository, VisitRepository};
