//! Serial device layer for the fingerlog attendance system.
//!
//! This crate owns everything that touches the fingerprint sensor: the
//! physical serial link, the background listener that turns raw output lines
//! into typed events, and the stateful session façade that the rest of the
//! system talks to.
//!
//! # Architecture
//!
//! - [`Link`] - transport contract: timed line reads, newline-terminated
//!   command writes, idempotent close
//! - [`SerialLink`] - real transport over a `tokio-serial` stream
//! - [`MockLink`] - scriptable in-memory transport for tests and development
//! - `Listener` (internal) - background task polling the link and decoding
//!   lines via `fingerlog-protocol`
//! - [`DeviceSession`] - the façade: connect/disconnect lifecycle, mode
//!   commands, and the single event subscription point
//!
//! # Concurrency Model
//!
//! Exactly two actors touch the link: the caller's task (commands) and the
//! listener task (reads). The link keeps its reader and writer halves behind
//! separate async mutexes so neither blocks the other. Decoded events cross
//! the task boundary only through a bounded `mpsc` channel; listener
//! failures cross it only as [`ListenerNotice`] values. Consumer code is
//! never called directly from the listener task.
//!
//! # Examples
//!
//! ```no_run
//! use fingerlog_device::{DeviceSession, SerialConfig};
//!
//! # async fn example() -> fingerlog_device::Result<()> {
//! let config = SerialConfig::new("/dev/ttyUSB0").baud_rate(9600);
//! let mut session = DeviceSession::connect(&config).await?;
//!
//! let mut events = session.subscribe().await;
//! session.enter_detection_mode().await?;
//!
//! while let Some(message) = events.recv().await {
//!     println!("decoded: {message:?}");
//! }
//!
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod listener;
pub mod mock;
pub mod session;

pub use config::{SerialConfig, available_ports};
pub use error::{DeviceError, Result};
pub use link::{AnyLink, Link, SerialLink};
pub use listener::ListenerNotice;
pub use mock::{MockLink, MockLinkHandle};
pub use session::{ConnectionState, DeviceSession};
