//! Detection handling: resolve a sensor slot to an identity and append a
//! visit.
//!
//! Each detection is handled independently, exactly once, in strict
//! lookup-before-write order: a visit is only ever recorded after the slot
//! resolved to an enrolled identity, so no visit can reference an unknown
//! slot. A detection of an unenrolled slot is a normal, reportable outcome,
//! not an error.

use crate::error::PipelineResult;
use fingerlog_core::SlotId;
use fingerlog_protocol::{DeviceMessage, EnrollmentOutcome};
use fingerlog_storage::models::{Identity, VisitRecord};
use fingerlog_storage::repositories::{
    IdentityRepository, SqliteIdentityRepository, SqliteVisitRepository, VisitRepository,
};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Terminal outcome of one detection event.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    /// The slot resolved to an enrolled identity and a visit was recorded.
    Recognized {
        identity: Identity,
        visit: VisitRecord,
    },

    /// No identity is enrolled under the detected number; nothing was
    /// written. Raw because the sensor can glitch and report a number
    /// outside the template range, and those detections are reported too.
    Unrecognized { slot: u32 },
}

impl DetectionOutcome {
    /// Whether the detection resolved to an enrolled identity.
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Recognized { .. })
    }
}

/// Event surfaced to the pipeline's consumer (typically the UI shell).
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A detection was processed to its terminal outcome.
    Detection(DetectionOutcome),

    /// The sensor reported an enrollment outcome; forwarded untouched.
    Enrollment(EnrollmentOutcome),
}

/// Glue between the device session's event stream and the store.
///
/// Holds no state between events; all persistence goes through the
/// repositories.
///
/// # Examples
///
/// ```no_run
/// use fingerlog_pipeline::AttendancePipeline;
/// use fingerlog_core::SlotId;
/// # async fn example(pool: sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = AttendancePipeline::new(pool);
///
/// let outcome = pipeline.handle_detection(SlotId::new(3)?).await?;
/// if outcome.is_recognized() {
///     println!("visit recorded");
/// }
/// # Ok(())
/// # }
/// ```
pub struct AttendancePipeline {
    identities: SqliteIdentityRepository,
    visits: SqliteVisitRepository,
}

impl AttendancePipeline {
    /// Create a pipeline over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            identities: SqliteIdentityRepository::new(pool.clone()),
            visits: SqliteVisitRepository::new(pool),
        }
    }

    /// Process one detection to its terminal outcome.
    ///
    /// Lookup happens before any write; an unenrolled slot records nothing.
    pub async fn handle_detection(&self, slot: SlotId) -> PipelineResult<DetectionOutcome> {
        match self.identities.find_by_slot(slot).await? {
            Some(identity) => {
                let visit = self.visits.record(identity.id).await?;
                info!(%slot, name = %identity.name, visit_id = visit.id, "visit recorded");
                Ok(DetectionOutcome::Recognized { identity, visit })
            }
            None => {
                info!(%slot, "detection for unenrolled slot");
                Ok(DetectionOutcome::Unrecognized {
                    slot: u32::from(slot.get()),
                })
            }
        }
    }

    /// Process one decoded device message.
    pub async fn handle_message(&self, message: DeviceMessage) -> PipelineResult<PipelineEvent> {
        match message {
            DeviceMessage::Detection(slot) => Ok(PipelineEvent::Detection(
                self.handle_detection(slot).await?,
            )),
            DeviceMessage::OutOfRangeDetection { slot } => {
                // No template can live outside 1-127, so there is nothing
                // to look up; report the event without touching the store.
                info!(slot, "detection outside template range");
                Ok(PipelineEvent::Detection(DetectionOutcome::Unrecognized {
                    slot,
                }))
            }
            DeviceMessage::Enrollment(outcome) => Ok(PipelineEvent::Enrollment(outcome)),
        }
    }

    /// Drain the device session's event channel until it closes, forwarding
    /// terminal outcomes to `outcomes`.
    ///
    /// This is the consumer side of the listener's hand-off: it runs on its
    /// own task, so consumer code is never entered from the listener.
    /// Processing errors are logged and skipped; the loop only ends when
    /// either channel closes.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<DeviceMessage>,
        outcomes: mpsc::Sender<PipelineEvent>,
    ) {
        while let Some(message) = events.recv().await {
            match self.handle_message(message).await {
                Ok(event) => {
                    if outcomes.send(event).await.is_err() {
                        debug!("outcome consumer dropped; pipeline loop ending");
                        break;
                    }
                }
                Err(e) => error!(error = %e, "failed to process device message"),
            }
        }
        debug!("pipeline loop ended");
    }
}
