//! Serial link transport.
//!
//! [`Link`] is the contract between the session/listener and the physical
//! connection. It uses native `async fn` methods (Edition 2024 RPITIT) and
//! is therefore not object safe; dynamic dispatch goes through the
//! [`AnyLink`] enum wrapper instead, which keeps spawned listener futures
//! concrete and `Send`.

#![allow(async_fn_in_trait)]

use crate::config::SerialConfig;
use crate::error::{DeviceError, Result};
use crate::mock::MockLink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_serial::SerialStream;
use tracing::debug;

/// Transport contract for the line-oriented sensor protocol.
///
/// Implementations must tolerate one reader and one writer operating
/// concurrently; `read_line` and `write_command` may be called from
/// different tasks at the same time.
pub trait Link: Send + Sync {
    /// Read one line, waiting at most `timeout` for it to complete.
    ///
    /// Returns `Ok(None)` when the timeout elapses without a full line
    /// (partial input is retained for the next call), `Ok(Some(line))`
    /// with the trailing newline and carriage return stripped otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is closed, the stream ends, or the
    /// underlying transport fails.
    async fn read_line(&self, timeout: Duration) -> Result<Option<String>>;

    /// Write a command, appending the newline terminator.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::NotOpen` if the link was closed, or an I/O
    /// error from the transport.
    async fn write_command(&self, command: &str) -> Result<()>;

    /// Release the transport. Idempotent; later reads and writes fail
    /// with `DeviceError::NotOpen`.
    async fn close(&self);

    /// Whether the link is currently open.
    fn is_open(&self) -> bool;
}

/// Reader half plus the partial line carried across timed-out reads.
struct ReaderState {
    reader: BufReader<ReadHalf<SerialStream>>,
    partial: Vec<u8>,
}

/// Real serial transport over a `tokio-serial` stream.
///
/// The stream is split into reader and writer halves behind separate async
/// mutexes so the background listener can block in a read while the session
/// writes mode commands. Cloning is cheap and shares the same port.
#[derive(Clone)]
pub struct SerialLink {
    reader: Arc<Mutex<ReaderState>>,
    writer: Arc<Mutex<WriteHalf<SerialStream>>>,
    open: Arc<AtomicBool>,
}

impl SerialLink {
    /// Open the serial port described by `config`.
    ///
    /// The post-open settle delay is the session's responsibility, not the
    /// link's; this returns as soon as the OS hands over the port.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::OpenFailed` if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let builder = tokio_serial::new(&config.port, config.baud_rate);
        let stream = SerialStream::open(&builder)
            .map_err(|e| DeviceError::open_failed(format!("{}: {e}", config.port)))?;

        let (read_half, write_half) = tokio::io::split(stream);

        Ok(Self {
            reader: Arc::new(Mutex::new(ReaderState {
                reader: BufReader::new(read_half),
                partial: Vec::new(),
            })),
            writer: Arc::new(Mutex::new(write_half)),
            open: Arc::new(AtomicBool::new(true)),
        })
    }
}

impl Link for SerialLink {
    async fn read_line(&self, timeout: Duration) -> Result<Option<String>> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen);
        }

        let deadline = Instant::now() + timeout;
        let mut state = self.reader.lock().await;
        let ReaderState { reader, partial } = &mut *state;

        // fill_buf/consume instead of read_line: fill_buf is cancellation
        // safe, so a timed-out read never loses bytes already received.
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let available = match tokio::time::timeout(remaining, reader.fill_buf()).await {
                Err(_) => return Ok(None),
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => return Err(DeviceError::Io(e)),
            };

            if available.is_empty() {
                return Err(DeviceError::disconnected("serial stream reached end of input"));
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    partial.extend_from_slice(&available[..newline]);
                    reader.consume(newline + 1);

                    let line = String::from_utf8_lossy(partial)
                        .trim_end_matches('\r')
                        .to_string();
                    partial.clear();
                    return Ok(Some(line));
                }
                None => {
                    let consumed = available.len();
                    partial.extend_from_slice(available);
                    reader.consume(consumed);
                }
            }
        }
    }

    async fn write_command(&self, command: &str) -> Result<()> {
        if !self.is_open() {
            return Err(DeviceError::NotOpen);
        }

        let payload = format!("{command}\n");
        let mut writer = self.writer.lock().await;
        writer.write_all(payload.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "serial writer shutdown failed during close");
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Enum wrapper for link dispatch.
///
/// `Link` is not object safe (native async trait methods), so the listener
/// and session hold this enum instead of a trait object. The pattern keeps
/// listener futures `Send` without boxing.
#[derive(Clone)]
pub enum AnyLink {
    /// Real serial transport.
    Serial(SerialLink),

    /// Scriptable in-memory transport.
    Mock(MockLink),
}

impl Link for AnyLink {
    async fn read_line(&self, timeout: Duration) -> Result<Option<String>> {
        match self {
            Self::Serial(link) => link.read_line(timeout).await,
            Self::Mock(link) => link.read_line(timeout).await,
        }
    }

    async fn write_command(&self, command: &str) -> Result<()> {
        match self {
            Self::Serial(link) => link.write_command(command).await,
            Self::Mock(link) => link.write_command(command).await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Serial(link) => link.close().await,
            Self::Mock(link) => link.close().await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Serial(link) => link.is_open(),
            Self::Mock(link) => link.is_open(),
        }
    }
}

impl From<SerialLink> for AnyLink {
    fn from(link: SerialLink) -> Self {
        Self::Serial(link)
    }
}

impl From<MockLink> for AnyLink {
    fn from(link: MockLink) -> Self {
        Self::Mock(link)
    }
}
