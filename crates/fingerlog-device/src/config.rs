//! Serial connection configuration.
//!
//! There is deliberately no `Default` for [`SerialConfig`]: the port path is
//! installation-specific and must be passed in by the caller. Only the baud
//! rate carries a documented fallback ([`DEFAULT_BAUD_RATE`]), matching the
//! sensor firmware's fixed rate.

use crate::error::{DeviceError, Result};
use fingerlog_core::constants::{DEFAULT_BAUD_RATE, SETTLE_DELAY};
use std::time::Duration;

/// Connection parameters for the fingerprint sensor's serial port.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g. `/dev/ttyUSB0`, `COM4`).
    pub port: String,

    /// Baud rate. The stock firmware talks at 9600.
    pub baud_rate: u32,

    /// Delay applied after opening the port, before the device is
    /// considered ready. Models the microcontroller's boot time.
    pub settle_delay: Duration,
}

impl SerialConfig {
    /// Create a configuration for the given port with default baud rate
    /// and settle delay.
    ///
    /// # Examples
    ///
    /// ```
    /// use fingerlog_device::SerialConfig;
    ///
    /// let config = SerialConfig::new("/dev/ttyUSB0");
    /// assert_eq!(config.baud_rate, 9600);
    /// ```
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Set the baud rate.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the post-open settle delay.
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

/// List the serial ports visible on this machine.
///
/// # Errors
///
/// Returns `DeviceError::Enumeration` if the platform port scan fails.
pub fn available_ports() -> Result<Vec<String>> {
    let ports =
        tokio_serial::available_ports().map_err(|e| DeviceError::enumeration(e.to_string()))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SerialConfig::new("COM4");
        assert_eq!(config.port, "COM4");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.settle_delay, SETTLE_DELAY);
    }

    #[test]
    fn test_config_builder() {
        let config = SerialConfig::new("/dev/ttyACM0")
            .baud_rate(57600)
            .settle_delay(Duration::from_millis(100));

        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 57600);
        assert_eq!(config.settle_delay, Duration::from_millis(100));
    }
}
