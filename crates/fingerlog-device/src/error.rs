//! Error types for the serial device layer.
//!
//! Transport failures (open, read, write) and session-state violations are
//! kept in one taxonomy because callers handle them the same way: surface an
//! actionable message and, for transport errors, offer a reconnect.

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur while talking to the fingerprint sensor.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Opening the serial port failed (bad path, permissions, device absent).
    #[error("Failed to open serial port: {message}")]
    OpenFailed { message: String },

    /// Operation attempted on a link that was closed.
    #[error("Serial link is not open")]
    NotOpen,

    /// Session operation attempted while not connected.
    #[error("Device session is not connected")]
    NotConnected,

    /// The device went away mid-conversation (unplugged, stream ended).
    #[error("Device disconnected: {message}")]
    Disconnected { message: String },

    /// Enumerating serial ports failed.
    #[error("Port enumeration failed: {message}")]
    Enumeration { message: String },

    /// Generic I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Create a new open-failed error.
    pub fn open_failed(message: impl Into<String>) -> Self {
        Self::OpenFailed {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::Disconnected {
            message: message.into(),
        }
    }

    /// Create a new enumeration error.
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration {
            message: message.into(),
        }
    }

    /// Whether reconnecting is a plausible recovery for this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotConnected)
    }
}
