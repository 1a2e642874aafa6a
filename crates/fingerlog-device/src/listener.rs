//! Background listener turning raw sensor lines into typed events.
//!
//! The listener is a single tokio task owned by the session. It polls the
//! link with a bounded timeout, decodes each complete line, and delivers
//! decoded messages through the session's event sink. It never calls
//! consumer code directly; everything crosses the task boundary through
//! channels.
//!
//! Lifecycle: `start` and `stop` are both idempotent. `stop` signals the
//! task, then joins it bounded by [`LISTENER_STOP_TIMEOUT`]; if the join
//! times out the task is aborted and awaited, so no event delivery can
//! happen after `stop` returns. A link error terminates the task from the
//! inside after emitting one [`ListenerNotice::Failed`].

use crate::error::DeviceError;
use crate::link::{AnyLink, Link};
use fingerlog_core::constants::{LISTENER_POLL_INTERVAL, LISTENER_STOP_TIMEOUT};
use fingerlog_protocol::{DeviceMessage, decode_line};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Terminal notification from the listener task to the session owner.
#[derive(Debug)]
pub enum ListenerNotice {
    /// The listener hit a link error and exited.
    Failed(DeviceError),
}

/// Replaceable destination for decoded events.
///
/// The session swaps the sender when the consumer re-subscribes; the swap
/// takes effect for subsequent events only. With no subscriber registered,
/// events are discarded.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: Arc<RwLock<Option<mpsc::Sender<DeviceMessage>>>>,
}

impl EventSink {
    pub(crate) fn new() -> Self {
        Self {
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a new consumer, replacing any previous one.
    pub(crate) async fn replace(&self, tx: mpsc::Sender<DeviceMessage>) {
        *self.tx.write().await = Some(tx);
    }

    /// Deliver one message to the current consumer, if any.
    pub(crate) async fn deliver(&self, message: DeviceMessage) {
        let tx = self.tx.read().await.clone();
        match tx {
            Some(tx) => {
                if tx.send(message).await.is_err() {
                    debug!("event consumer dropped; message discarded");
                }
            }
            None => trace!("no event consumer registered; message discarded"),
        }
    }
}

/// Handle to the background listener task.
pub(crate) struct Listener {
    handle: Option<JoinHandle<()>>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl Listener {
    pub(crate) fn new() -> Self {
        Self {
            handle: None,
            stop_tx: None,
        }
    }

    /// Whether the background task is currently alive.
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the background task. No-op if it is already running.
    pub(crate) fn start(
        &mut self,
        link: AnyLink,
        sink: EventSink,
        notices: mpsc::Sender<ListenerNotice>,
    ) {
        if self.is_running() {
            debug!("listener already running; start ignored");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        self.handle = Some(tokio::spawn(listen_loop(link, sink, notices, stop_rx)));
        self.stop_tx = Some(stop_tx);
    }

    /// Signal the task and wait for it to exit. No-op if already stopped.
    ///
    /// Bounded: if the task does not exit within
    /// [`LISTENER_STOP_TIMEOUT`] it is aborted and awaited, so no delivery
    /// happens after this returns.
    pub(crate) async fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }

        let Some(mut handle) = self.handle.take() else {
            return;
        };

        if tokio::time::timeout(LISTENER_STOP_TIMEOUT, &mut handle)
            .await
            .is_err()
        {
            warn!("listener did not stop within timeout; aborting task");
            handle.abort();
            let _ = handle.await;
        }
    }
}

/// The listener task body.
///
/// One iteration per poll interval: read with timeout, decode, deliver.
/// The stop signal is observed within one poll interval because the read
/// arm's timeout bounds each await.
async fn listen_loop(
    link: AnyLink,
    sink: EventSink,
    notices: mpsc::Sender<ListenerNotice>,
    mut stop_rx: watch::Receiver<bool>,
) {
    debug!("listener started");

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            read = link.read_line(LISTENER_POLL_INTERVAL) => match read {
                Ok(Some(line)) => match decode_line(&line) {
                    Some(message) => {
                        debug!(?message, "decoded device message");
                        sink.deliver(message).await;
                    }
                    None => trace!(line = %line, "informational device line"),
                },
                Ok(None) => {}
                Err(error) => {
                    warn!(error = %error, "listener terminating on link error");
                    if notices.try_send(ListenerNotice::Failed(error)).is_err() {
                        debug!("listener notice channel unavailable; error dropped");
                    }
                    break;
                }
            }
        }
    }

    debug!("listener stopped");
}
