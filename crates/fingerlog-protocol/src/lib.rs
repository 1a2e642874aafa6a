//! Sensor output decoder for the fingerlog attendance system.
//!
//! The fingerprint sensor firmware reports everything as free-text ASCII
//! lines. Only a handful of line shapes carry meaning for the host; the rest
//! are human-readable chatter (boot banners, prompts, progress messages).
//!
//! This crate is the single place that knows which substrings matter. It is
//! deliberately free of I/O so it can be unit tested without a real or fake
//! serial connection: the device crate's listener feeds raw lines in, typed
//! [`DeviceMessage`] values come out.
//!
//! # Examples
//!
//! ```
//! use fingerlog_protocol::{DeviceMessage, decode_line};
//!
//! let msg = decode_line("✓ ACCESS GRANTED - ID #3 detected!").unwrap();
//! assert!(matches!(msg, DeviceMessage::Detection(slot) if slot.get() == 3));
//!
//! // Informational lines decode to nothing.
//! assert!(decode_line("Place finger on sensor...").is_none());
//! ```

pub mod decoder;
pub mod message;

pub use decoder::decode_line;
pub use message::{DeviceMessage, EnrollmentOutcome};
