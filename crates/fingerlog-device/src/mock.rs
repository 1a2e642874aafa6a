//! Scriptable in-memory link for testing and development.
//!
//! [`MockLink`] implements the [`Link`](crate::link::Link) contract without
//! hardware. A paired [`MockLinkHandle`] scripts the device side: queue
//! output lines, make reads fail, and inspect the commands the host wrote.

use crate::error::{DeviceError, Result};
use crate::link::Link;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MockState {
    /// Scripted device output, consumed one line per read.
    lines: VecDeque<String>,

    /// When set, every read returns this line — the link never runs dry.
    repeat: Option<String>,

    /// When set, every read fails with a disconnect carrying this message.
    fail_message: Option<String>,

    /// Commands written by the host, newline terminator included.
    written: Vec<String>,
}

/// In-memory mock of the sensor's serial link.
///
/// # Examples
///
/// ```
/// use fingerlog_device::{Link, MockLink};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> fingerlog_device::Result<()> {
///     let (link, handle) = MockLink::new();
///
///     handle.queue_line("ACCESS GRANTED - ID #3 detected!").await;
///
///     let line = link.read_line(Duration::from_millis(10)).await?;
///     assert_eq!(line.as_deref(), Some("ACCESS GRANTED - ID #3 detected!"));
///
///     link.write_command("d").await?;
///     assert_eq!(handle.written().await, vec!["d\n".to_string()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
    open: Arc<AtomicBool>,
}

impl MockLink {
    /// Create a new open mock link and its controlling handle.
    pub fn new() -> (Self, MockLinkHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let open = Arc::new(AtomicBool::new(true));

        let link = Self {
            state: state.clone(),
            open: open.clone(),
        };
        let handle = MockLinkHandle { state, open };

        (link, handle)
    }
}

impl Link for MockLink {
    async fn read_line(&self, timeout: Duration) -> Result<Option<String>> {
        {
            let mut state = self.state.lock().await;
            if !self.is_open() {
                return Err(DeviceError::NotOpen);
            }
            if let Some(message) = &state.fail_message {
                return Err(DeviceError::disconnected(message.clone()));
            }
            if let Some(line) = state.lines.pop_front() {
                return Ok(Some(line));
            }
            if let Some(line) = &state.repeat {
                return Ok(Some(line.clone()));
            }
        }

        // Nothing pending: model the bounded poll by waiting out the
        // timeout, then take anything that was queued meanwhile.
        tokio::time::sleep(timeout).await;

        let mut state = self.state.lock().await;
        if !self.is_open() {
            return Err(DeviceError::NotOpen);
        }
        if let Some(message) = &state.fail_message {
            return Err(DeviceError::disconnected(message.clone()));
        }
        Ok(state.lines.pop_front())
    }

    async fn write_command(&self, command: &str) -> Result<()> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen);
        }
        let mut state = self.state.lock().await;
        state.written.push(format!("{command}\n"));
        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Handle for scripting a [`MockLink`] from the test side.
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    state: Arc<Mutex<MockState>>,
    open: Arc<AtomicBool>,
}

impl MockLinkHandle {
    /// Queue one line of device output.
    pub async fn queue_line(&self, line: impl Into<String>) {
        self.state.lock().await.lines.push_back(line.into());
    }

    /// Make the link return this line on every read from now on,
    /// simulating a device that always has data pending.
    pub async fn repeat_line(&self, line: impl Into<String>) {
        self.state.lock().await.repeat = Some(line.into());
    }

    /// Make every subsequent read fail with a disconnect error.
    pub async fn fail_reads(&self, message: impl Into<String>) {
        self.state.lock().await.fail_message = Some(message.into());
    }

    /// Commands written by the host so far, newline terminators included.
    pub async fn written(&self) -> Vec<String> {
        self.state.lock().await.written.clone()
    }

    /// Whether the host has closed the link.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_returns_queued_lines_in_order() {
        let (link, handle) = MockLink::new();
        handle.queue_line("first").await;
        handle.queue_line("second").await;

        let timeout = Duration::from_millis(5);
        assert_eq!(link.read_line(timeout).await.unwrap().as_deref(), Some("first"));
        assert_eq!(link.read_line(timeout).await.unwrap().as_deref(), Some("second"));
        assert_eq!(link.read_line(timeout).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_repeat_line_never_runs_dry() {
        let (link, handle) = MockLink::new();
        handle.repeat_line("noise").await;

        for _ in 0..5 {
            let line = link.read_line(Duration::from_millis(1)).await.unwrap();
            assert_eq!(line.as_deref(), Some("noise"));
        }
    }

    #[tokio::test]
    async fn test_fail_reads() {
        let (link, handle) = MockLink::new();
        handle.fail_reads("device unplugged").await;

        let error = link.read_line(Duration::from_millis(1)).await.unwrap_err();
        assert!(matches!(error, DeviceError::Disconnected { .. }));
    }

    #[tokio::test]
    async fn test_closed_link_rejects_operations() {
        let (link, handle) = MockLink::new();
        link.close().await;
        link.close().await; // idempotent

        assert!(!handle.is_open());
        assert!(matches!(
            link.read_line(Duration::from_millis(1)).await,
            Err(DeviceError::NotOpen)
        ));
        assert!(matches!(
            link.write_command("d").await,
            Err(DeviceError::NotOpen)
        ));
    }

    #[tokio::test]
    async fn test_written_commands_include_terminator() {
        let (link, handle) = MockLink::new();
        link.write_command("e").await.unwrap();
        link.write_command("42").await.unwrap();

        assert_eq!(
            handle.written().await,
            vec!["e\n".to_string(), "42\n".to_string()]
        );
    }
}
