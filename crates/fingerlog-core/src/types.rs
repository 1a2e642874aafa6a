use crate::{
    Result,
    constants::{MAX_SLOT_ID, MIN_SLOT_ID},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingerprint template slot (1-127).
///
/// The sensor stores one template per slot and reports detections by slot
/// number. The slot is the join key between sensor output and an enrolled
/// identity, assigned by the operator at enrollment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u8);

impl SlotId {
    /// Create a new slot id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlot` if the value is outside the valid
    /// range (1-127).
    pub fn new(value: u8) -> Result<Self> {
        if !(MIN_SLOT_ID..=MAX_SLOT_ID).contains(&value) {
            return Err(Error::InvalidSlot {
                value: u32::from(value),
            });
        }
        Ok(SlotId(value))
    }

    /// Get the raw slot number as u8.
    #[must_use]
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: u8 = s.parse().map_err(|_| Error::InvalidInput(format!(
            "Invalid slot id: {s}"
        )))?;
        SlotId::new(value)
    }
}

impl TryFrom<i64> for SlotId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let value = u8::try_from(value).map_err(|_| Error::InvalidSlot {
            value: value.clamp(0, i64::from(u32::MAX)) as u32,
        })?;
        SlotId::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(42)]
    #[case(127)]
    fn test_valid_slot_ids(#[case] value: u8) {
        let slot = SlotId::new(value).unwrap();
        assert_eq!(slot.get(), value);
        assert_eq!(slot.to_string(), value.to_string());
    }

    #[rstest]
    #[case(0)]
    #[case(128)]
    #[case(255)]
    fn test_invalid_slot_ids(#[case] value: u8) {
        assert!(SlotId::new(value).is_err());
    }

    #[test]
    fn test_from_str() {
        let slot: SlotId = "64".parse().unwrap();
        assert_eq!(slot.get(), 64);

        assert!("0".parse::<SlotId>().is_err());
        assert!("abc".parse::<SlotId>().is_err());
        assert!("".parse::<SlotId>().is_err());
    }

    #[test]
    fn test_try_from_i64() {
        assert_eq!(SlotId::try_from(5_i64).unwrap().get(), 5);
        assert!(SlotId::try_from(0_i64).is_err());
        assert!(SlotId::try_from(300_i64).is_err());
        assert!(SlotId::try_from(-1_i64).is_err());
    }

    #[test]
    fn test_ordering() {
        let a = SlotId::new(3).unwrap();
        let b = SlotId::new(7).unwrap();
        assert!(a < b);
    }
}
