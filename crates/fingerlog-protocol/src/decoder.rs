//! Line decoder for sensor output.
//!
//! The firmware has no framing beyond newlines and no machine-readable
//! message format; recognition is by exact marker substrings anywhere in
//! the line. Markers are checked in priority order and the first match wins.
//!
//! A detection line whose number does not parse at all decodes to nothing.
//! A number that parses but falls outside the sensor's template range still
//! surfaces, as [`DeviceMessage::OutOfRangeDetection`], so the consumer can
//! report the event instead of losing it.

use crate::message::{DeviceMessage, EnrollmentOutcome};
use fingerlog_core::SlotId;
use fingerlog_core::constants::{
    DETECTION_MARKER, ENROLLMENT_MISMATCH_MARKER, ENROLLMENT_SUCCESS_MARKER,
};

/// Decode one line of sensor output into a typed message.
///
/// Returns `None` for informational lines and for detection lines whose
/// slot number cannot be parsed as an integer. Stateless and side-effect
/// free.
///
/// # Examples
///
/// ```
/// use fingerlog_protocol::{DeviceMessage, EnrollmentOutcome, decode_line};
///
/// let msg = decode_line("✓ ACCESS GRANTED - ID #42 detected!").unwrap();
/// assert!(matches!(msg, DeviceMessage::Detection(slot) if slot.get() == 42));
///
/// let msg = decode_line("Enrollment successful!").unwrap();
/// assert_eq!(msg, DeviceMessage::Enrollment(EnrollmentOutcome::Success));
///
/// assert!(decode_line("Waiting for valid finger...").is_none());
/// ```
pub fn decode_line(line: &str) -> Option<DeviceMessage> {
    if let Some(rest) = line.split_once(DETECTION_MARKER).map(|(_, rest)| rest) {
        return extract_slot(rest).map(|value| match SlotId::try_from(i64::from(value)) {
            Ok(slot) => DeviceMessage::Detection(slot),
            Err(_) => DeviceMessage::OutOfRangeDetection { slot: value },
        });
    }

    if line.contains(ENROLLMENT_SUCCESS_MARKER) {
        return Some(DeviceMessage::Enrollment(EnrollmentOutcome::Success));
    }

    if line.contains(ENROLLMENT_MISMATCH_MARKER) {
        return Some(DeviceMessage::Enrollment(EnrollmentOutcome::mismatch()));
    }

    None
}

/// Extract the number immediately following the detection marker.
///
/// The number runs up to the next whitespace (or end of line). Anything
/// that does not parse as an unsigned integer yields `None`; range
/// checking is the caller's concern.
fn extract_slot(rest: &str) -> Option<u32> {
    let token = rest.split_whitespace().next()?;
    token.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("✓ ACCESS GRANTED - ID #3 detected!", 3)]
    #[case("ACCESS GRANTED - ID #1", 1)]
    #[case("ACCESS GRANTED - ID #127 detected!", 127)]
    #[case("noise before ACCESS GRANTED - ID #42 noise after", 42)]
    fn test_detection_lines(#[case] line: &str, #[case] expected_slot: u8) {
        let msg = decode_line(line).unwrap();
        assert_eq!(msg.as_detection().unwrap().get(), expected_slot);
    }

    #[rstest]
    #[case("ACCESS GRANTED - ID #abc detected!")]
    #[case("ACCESS GRANTED - ID #")]
    #[case("ACCESS GRANTED - ID # 5")]
    #[case("ACCESS GRANTED - ID #-3 detected!")]
    fn test_unparseable_detection_lines_yield_nothing(#[case] line: &str) {
        assert!(decode_line(line).is_none());
    }

    #[rstest]
    #[case("ACCESS GRANTED - ID #0 detected!", 0)]
    #[case("ACCESS GRANTED - ID #128 detected!", 128)]
    #[case("ACCESS GRANTED - ID #4000000 detected!", 4_000_000)]
    fn test_out_of_range_slots_still_surface(#[case] line: &str, #[case] expected: u32) {
        // The number parses but no template can live there; the event must
        // reach the consumer anyway so it can be reported.
        let msg = decode_line(line).unwrap();
        assert_eq!(msg, DeviceMessage::OutOfRangeDetection { slot: expected });
        assert!(msg.as_detection().is_none());
    }

    #[test]
    fn test_enrollment_success() {
        let msg = decode_line("Enrollment successful! Template stored.").unwrap();
        assert_eq!(msg, DeviceMessage::Enrollment(EnrollmentOutcome::Success));
    }

    #[test]
    fn test_enrollment_mismatch() {
        let msg = decode_line("Fingerprints did not match, try again").unwrap();
        assert_eq!(
            msg,
            DeviceMessage::Enrollment(EnrollmentOutcome::mismatch())
        );
    }

    #[rstest]
    #[case("")]
    #[case("random noise")]
    #[case("Adafruit Fingerprint sensor ready")]
    #[case("Place finger on sensor...")]
    #[case("ID 42")]
    fn test_informational_lines_yield_nothing(#[case] line: &str) {
        assert!(decode_line(line).is_none());
    }

    #[test]
    fn test_detection_takes_priority_over_enrollment_markers() {
        // First match wins when a line somehow carries both markers.
        let line = "ACCESS GRANTED - ID #7 Enrollment successful!";
        let msg = decode_line(line).unwrap();
        assert_eq!(msg.as_detection().unwrap().get(), 7);
    }

    #[test]
    fn test_slot_terminated_by_punctuation_is_rejected() {
        // The token runs to the next whitespace; trailing punctuation
        // attached to the number makes it unparseable.
        assert!(decode_line("ACCESS GRANTED - ID #5! done").is_none());
        assert!(decode_line("ACCESS GRANTED - ID #5, done").is_none());
    }
}
