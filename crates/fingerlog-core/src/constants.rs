//! Shared constants for the fingerprint sensor protocol and attendance core.
//!
//! The attached sensor module speaks a line-oriented ASCII protocol over a
//! serial connection. The host selects the firmware mode with single-character
//! commands and the firmware reports results as free-text lines containing
//! well-known marker substrings.
//!
//! # Wire Protocol Summary
//!
//! | Direction   | Payload                        | Meaning                       |
//! |-------------|--------------------------------|-------------------------------|
//! | host→device | `d\n`                          | enter detection mode          |
//! | host→device | `e\n`                          | enter enrollment mode         |
//! | host→device | `<slot>\n` (~0.5s after `e`)   | target slot for enrollment    |
//! | host→device | `m\n`                          | return to idle/menu           |
//! | device→host | line with `ACCESS GRANTED - ID #<n>` | detection of slot `<n>` |
//! | device→host | line with `Enrollment successful!`   | enrollment completed    |
//! | device→host | line with `Fingerprints did not match` | enrollment mismatch   |
//! | device→host | any other line                 | informational, ignored        |
//!
//! These values are fixed by the sensor firmware. Changing them breaks
//! compatibility with deployed devices.

use std::time::Duration;

// ============================================================================
// Mode Commands (host → device)
// ============================================================================

/// Command that switches the sensor into continuous detection mode.
pub const CMD_DETECTION: &str = "d";

/// Command that switches the sensor into enrollment mode.
///
/// Must be followed by the decimal slot number after
/// [`ENROLLMENT_SLOT_DELAY`] to let the firmware switch modes.
pub const CMD_ENROLLMENT: &str = "e";

/// Command that returns the sensor to its idle menu.
pub const CMD_MENU: &str = "m";

// ============================================================================
// Output Markers (device → host)
// ============================================================================

/// Marker emitted by the firmware on a successful detection.
///
/// The template slot number follows the marker, terminated by whitespace,
/// e.g. `"ACCESS GRANTED - ID #3 detected!"`.
pub const DETECTION_MARKER: &str = "ACCESS GRANTED - ID #";

/// Marker emitted when enrollment completed successfully.
pub const ENROLLMENT_SUCCESS_MARKER: &str = "Enrollment successful!";

/// Marker emitted when the two enrollment scans did not match.
pub const ENROLLMENT_MISMATCH_MARKER: &str = "Fingerprints did not match";

// ============================================================================
// Slot Range
// ============================================================================

/// Minimum fingerprint template slot supported by the sensor.
pub const MIN_SLOT_ID: u8 = 1;

/// Maximum fingerprint template slot supported by the sensor.
pub const MAX_SLOT_ID: u8 = 127;

// ============================================================================
// Timing
// ============================================================================

/// Default serial baud rate (documented fallback, overridable at construction).
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Settle delay applied after opening the serial port.
///
/// The microcontroller resets when the port opens and needs time to boot
/// before it accepts commands.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Delay between the enrollment command and the slot number.
///
/// The firmware needs this long to switch modes before it reads the slot.
pub const ENROLLMENT_SLOT_DELAY: Duration = Duration::from_millis(500);

/// Poll interval for the background listener when no line is available.
pub const LISTENER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on how long `stop_listening` waits for the listener task
/// to exit before aborting it.
pub const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Capacity of the bounded decoded-event channel between the listener
/// and its consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_single_characters() {
        for cmd in [CMD_DETECTION, CMD_ENROLLMENT, CMD_MENU] {
            assert_eq!(cmd.len(), 1);
            assert!(cmd.is_ascii());
        }
    }

    #[test]
    fn test_slot_range_is_sane() {
        assert!(MIN_SLOT_ID < MAX_SLOT_ID);
        assert_eq!(MIN_SLOT_ID, 1);
        assert_eq!(MAX_SLOT_ID, 127);
    }

    #[test]
    fn test_slot_delay_shorter_than_settle_delay() {
        assert!(ENROLLMENT_SLOT_DELAY < SETTLE_DELAY);
    }
}
