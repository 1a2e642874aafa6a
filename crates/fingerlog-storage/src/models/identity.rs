use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use fingerlog_core::SlotId;
use serde::{Deserialize, Serialize};

/// An enrolled person.
///
/// Created once when enrollment completes; immutable thereafter. The core
/// never deletes identities.
///
/// # Fields
///
/// * `id` - Technical key, referenced by visits
/// * `slot_id` - Sensor template slot (unique, 1-127); the natural join
///   key between sensor output and this record
/// * `name` - Display name, non-empty
/// * `external_id` - Institutional id (unique, non-empty)
/// * `portrait` - Optional opaque image blob
/// * `created_at` - Enrollment time, UTC
///
/// # Examples
///
/// ```no_run
/// use fingerlog_storage::models::Identity;
///
/// # fn show(identity: &Identity) {
/// println!("{} (slot {})", identity.name, identity.slot_id);
/// if let Some(slot) = identity.slot() {
///     assert_eq!(i64::from(slot.get()), identity.slot_id);
/// }
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    /// Technical primary key.
    pub id: i64,

    /// Sensor template slot, stored raw. Use [`slot`](Self::slot) for the
    /// validated form.
    pub slot_id: i64,

    /// Display name.
    pub name: String,

    /// Institutional id (e.g. a student or employee number).
    pub external_id: String,

    /// Optional portrait image, stored as an opaque blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Vec<u8>>,

    /// Enrollment timestamp.
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// The template slot as a validated [`SlotId`].
    ///
    /// Returns `None` only if the stored value is corrupt; the schema's
    /// CHECK constraint keeps it in range on every write path.
    pub fn slot(&self) -> Option<SlotId> {
        SlotId::try_from(self.slot_id).ok()
    }

    /// Whether a portrait blob is stored for this identity.
    pub fn has_portrait(&self) -> bool {
        self.portrait.is_some()
    }
}

/// Input for registering a new identity.
///
/// # Examples
///
/// ```
/// use fingerlog_core::SlotId;
/// use fingerlog_storage::models::NewIdentity;
///
/// let new = NewIdentity::new(SlotId::new(5).unwrap(), "Ada Lovelace", "S-1815")
///     .portrait(vec![0xFF, 0xD8]);
/// assert_eq!(new.slot.get(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Target template slot; uniqueness is enforced at insert.
    pub slot: SlotId,

    /// Display name, must be non-empty after trimming.
    pub name: String,

    /// Institutional id, must be non-empty after trimming; unique.
    pub external_id: String,

    /// Optional portrait blob.
    pub portrait: Option<Vec<u8>>,
}

impl NewIdentity {
    /// Create a new registration input without a portrait.
    pub fn new(slot: SlotId, name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
            external_id: external_id.into(),
            portrait: None,
        }
    }

    /// Attach a portrait blob.
    pub fn portrait(mut self, portrait: Vec<u8>) -> Self {
        self.portrait = Some(portrait);
        self
    }

    /// Validate the text fields before touching the database.
    pub(crate) fn validate(&self) -> StorageResult<()> {
        if self.name.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        if self.external_id.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "external id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(value: u8) -> SlotId {
        SlotId::new(value).unwrap()
    }

    #[test]
    fn test_validate_accepts_reasonable_input() {
        let new = NewIdentity::new(slot(1), "Ada", "S-1");
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let new = NewIdentity::new(slot(1), "   ", "S-1");
        assert!(matches!(
            new.validate(),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_external_id() {
        let new = NewIdentity::new(slot(1), "Ada", "");
        assert!(matches!(
            new.validate(),
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_identity_slot_helper() {
        let identity = Identity {
            id: 1,
            slot_id: 64,
            name: "Ada".to_string(),
            external_id: "S-1".to_string(),
            portrait: None,
            created_at: Utc::now(),
        };
        assert_eq!(identity.slot().unwrap().get(), 64);
        assert!(!identity.has_portrait());
    }
}
