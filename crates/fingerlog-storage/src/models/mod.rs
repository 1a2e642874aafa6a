//! Data models for the attendance ledger.

pub mod identity;
pub mod visit;

pub use identity::{Identity, NewIdentity};
pub use visit::{VisitEntry, VisitFilter, VisitRecord};
