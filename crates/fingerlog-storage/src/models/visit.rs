use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded visit: a successful resolution of a detection event to an
/// enrolled identity.
///
/// Append-only: rows are never mutated, only individually deletable by id.
/// `observed_at` is assigned by the store at insert time (UTC), so it is
/// non-decreasing in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VisitRecord {
    /// Auto-increment primary key.
    pub id: i64,

    /// Technical key of the owning identity.
    pub identity_id: i64,

    /// When the detection was recorded.
    pub observed_at: DateTime<Utc>,
}

/// A visit joined with its identity, as returned by historical queries.
///
/// This is the row shape the UI renders: record id for deletion, the
/// person's details for display, and the timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VisitEntry {
    /// Visit record id.
    pub record_id: i64,

    /// Identity display name.
    pub name: String,

    /// Identity external id.
    pub external_id: String,

    /// Sensor template slot of the identity.
    pub slot_id: i64,

    /// Identity portrait blob, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Vec<u8>>,

    /// When the visit was recorded.
    pub observed_at: DateTime<Utc>,
}

/// Filter for historical visit queries.
///
/// All criteria are optional and combine with AND semantics. Time bounds
/// are inclusive; the text filter matches case-insensitively as a substring
/// of the identity's name or external id.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use fingerlog_storage::models::VisitFilter;
///
/// let filter = VisitFilter::new()
///     .from(Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap())
///     .text("lovelace");
/// assert!(filter.to.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VisitFilter {
    /// Inclusive lower bound on `observed_at`.
    pub from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on `observed_at`.
    pub to: Option<DateTime<Utc>>,

    /// Case-insensitive substring matched against name or external id.
    pub text: Option<String>,
}

impl VisitFilter {
    /// Create an empty filter matching every visit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive lower time bound.
    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the inclusive upper time bound.
    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the text filter.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether the filter matches everything.
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.text.is_none()
    }
}
