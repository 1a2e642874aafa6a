//! Stateful façade over the serial link and its listener.
//!
//! [`DeviceSession`] is the only type the rest of the system talks to. It
//! owns the link and the background listener, tracks the connection state,
//! and exposes the sensor's mode commands plus a single subscription point
//! for decoded events.

use crate::config::SerialConfig;
use crate::error::{DeviceError, Result};
use crate::link::{AnyLink, Link, SerialLink};
use crate::listener::{EventSink, Listener, ListenerNotice};
use fingerlog_core::SlotId;
use fingerlog_core::constants::{
    CMD_DETECTION, CMD_ENROLLMENT, CMD_MENU, ENROLLMENT_SLOT_DELAY, EVENT_CHANNEL_CAPACITY,
};
use fingerlog_protocol::DeviceMessage;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Lifecycle state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No open link; every command fails with `NotConnected`.
    Disconnected,

    /// Link open and settled; commands and listening are allowed.
    Connected,
}

/// Session over the fingerprint sensor.
///
/// # Examples
///
/// ```
/// use fingerlog_device::{DeviceSession, MockLink};
/// use fingerlog_core::SlotId;
///
/// #[tokio::main]
/// async fn main() -> fingerlog_device::Result<()> {
///     let (link, handle) = MockLink::new();
///     let mut session = DeviceSession::attach(link);
///
///     session.enter_enrollment_mode(SlotId::new(5).unwrap()).await?;
///     assert_eq!(handle.written().await, vec!["e\n".to_string(), "5\n".to_string()]);
///
///     session.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct DeviceSession {
    link: Option<AnyLink>,
    listener: Listener,
    sink: EventSink,
    notice_tx: mpsc::Sender<ListenerNotice>,
    notice_rx: Option<mpsc::Receiver<ListenerNotice>>,
    state: ConnectionState,
}

impl DeviceSession {
    /// Open the configured serial port and wait out the settle delay.
    ///
    /// The sensor's microcontroller resets when the port opens; commands
    /// sent before the settle delay elapses are lost.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::OpenFailed` if the port cannot be opened.
    pub async fn connect(config: &SerialConfig) -> Result<Self> {
        let link = SerialLink::open(config)?;
        info!(port = %config.port, baud = config.baud_rate, "serial link opened, settling");
        tokio::time::sleep(config.settle_delay).await;
        Ok(Self::attach(link))
    }

    /// Wrap an already-open link in a connected session.
    ///
    /// Used directly with [`MockLink`](crate::mock::MockLink) in tests; the
    /// serial path goes through [`connect`](Self::connect).
    pub fn attach(link: impl Into<AnyLink>) -> Self {
        let (notice_tx, notice_rx) = mpsc::channel(4);
        Self {
            link: Some(link.into()),
            listener: Listener::new(),
            sink: EventSink::new(),
            notice_tx,
            notice_rx: Some(notice_rx),
            state: ConnectionState::Connected,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the session is connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether the background listener is currently running.
    pub fn is_listening(&self) -> bool {
        self.listener.is_running()
    }

    /// Register the consumer for decoded events, replacing any previous
    /// one. The replacement takes effect for subsequent events only;
    /// events already sitting in the old channel stay there.
    pub async fn subscribe(&mut self) -> mpsc::Receiver<DeviceMessage> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.sink.replace(tx).await;
        rx
    }

    /// Take the receiver for terminal listener notices.
    ///
    /// Returns `None` after the first call; there is one notice consumer.
    pub fn take_notices(&mut self) -> Option<mpsc::Receiver<ListenerNotice>> {
        self.notice_rx.take()
    }

    /// Switch the sensor into continuous detection mode and start the
    /// background listener.
    pub async fn enter_detection_mode(&mut self) -> Result<()> {
        self.link()?.write_command(CMD_DETECTION).await?;
        info!("entered detection mode");
        self.start_listening()
    }

    /// Switch the sensor into enrollment mode targeting `slot`.
    ///
    /// Writes the enrollment command, waits for the firmware to switch
    /// modes, then writes the decimal slot number. Does not start the
    /// listener; enrollment drivers decide whether to observe responses.
    pub async fn enter_enrollment_mode(&mut self, slot: SlotId) -> Result<()> {
        let link = self.link()?.clone();
        link.write_command(CMD_ENROLLMENT).await?;
        tokio::time::sleep(ENROLLMENT_SLOT_DELAY).await;
        link.write_command(&slot.to_string()).await?;
        info!(%slot, "entered enrollment mode");
        Ok(())
    }

    /// Return the sensor to its idle menu.
    pub async fn return_to_menu(&mut self) -> Result<()> {
        self.link()?.write_command(CMD_MENU).await?;
        debug!("returned device to menu");
        Ok(())
    }

    /// Start the background listener. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::NotConnected` if the session is disconnected.
    pub fn start_listening(&mut self) -> Result<()> {
        let link = self.link()?.clone();
        self.listener
            .start(link, self.sink.clone(), self.notice_tx.clone());
        Ok(())
    }

    /// Stop the background listener and wait for it to exit. Idempotent;
    /// safe to call while disconnected or when listening never started.
    pub async fn stop_listening(&mut self) {
        self.listener.stop().await;
    }

    /// Stop listening, close the link, and mark the session disconnected.
    ///
    /// Always succeeds and is safe to call from any state, any number of
    /// times.
    pub async fn disconnect(&mut self) {
        self.listener.stop().await;
        if let Some(link) = self.link.take() {
            link.close().await;
        }
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Disconnected;
            info!("device session disconnected");
        }
    }

    /// The open link, or `NotConnected` when the session state forbids
    /// commands.
    fn link(&self) -> Result<&AnyLink> {
        if self.state != ConnectionState::Connected {
            return Err(DeviceError::NotConnected);
        }
        self.link.as_ref().ok_or(DeviceError::NotConnected)
    }
}
