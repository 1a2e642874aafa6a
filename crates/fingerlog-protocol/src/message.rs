use fingerlog_core::SlotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason string reported for a two-scan mismatch during enrollment.
pub const MISMATCH_REASON: &str = "mismatch";

/// A typed message decoded from one line of sensor output.
///
/// Produced by [`decode_line`](crate::decode_line) and consumed exactly once
/// by the attendance pipeline. Lines that match none of the known patterns
/// yield no message at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMessage {
    /// A fingerprint matched the template stored in the given slot.
    Detection(SlotId),

    /// A detection line carried a number outside the sensor's template
    /// range (1-127). A firmware glitch, but still forwarded so the
    /// consumer can report it instead of silently dropping the event.
    OutOfRangeDetection { slot: u32 },

    /// An enrollment attempt finished, successfully or not.
    Enrollment(EnrollmentOutcome),
}

impl DeviceMessage {
    /// Get the detected slot if this is an in-range detection message.
    pub fn as_detection(&self) -> Option<SlotId> {
        match self {
            Self::Detection(slot) => Some(*slot),
            Self::OutOfRangeDetection { .. } | Self::Enrollment(_) => None,
        }
    }
}

/// Terminal outcome of an enrollment attempt as reported by the sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    /// Both scans matched and the template was stored.
    Success,

    /// Enrollment failed with a firmware-reported reason.
    Failure { reason: String },
}

impl EnrollmentOutcome {
    /// Build the failure outcome for a two-scan mismatch.
    pub fn mismatch() -> Self {
        Self::Failure {
            reason: MISMATCH_REASON.to_string(),
        }
    }

    /// Whether this outcome represents a successful enrollment.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for EnrollmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure { reason } => write!(f, "failure ({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_detection() {
        let slot = SlotId::new(9).unwrap();
        assert_eq!(DeviceMessage::Detection(slot).as_detection(), Some(slot));
        assert_eq!(
            DeviceMessage::OutOfRangeDetection { slot: 128 }.as_detection(),
            None
        );
        assert_eq!(
            DeviceMessage::Enrollment(EnrollmentOutcome::Success).as_detection(),
            None
        );
    }

    #[test]
    fn test_mismatch_outcome() {
        let outcome = EnrollmentOutcome::mismatch();
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_string(), "failure (mismatch)");
    }
}
