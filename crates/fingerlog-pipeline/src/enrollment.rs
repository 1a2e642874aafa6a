//! Guided enrollment: the scripted conversation that captures a fingerprint
//! and registers the identity.
//!
//! The sensor firmware runs its own enrollment dialogue over the serial
//! line: place finger, first scan, remove, place again, model build. The
//! [`EnrollmentDriver`] mirrors that dialogue as a timed phase sequence for
//! progress reporting, while simultaneously listening for the firmware's
//! own verdict. A printed verdict resolves the run early in either
//! direction; if the firmware stays silent (older firmware only prints on
//! mismatch), the timed sequence completing counts as success.
//!
//! Registration happens only after the capture succeeded, so a failed scan
//! never leaves a row behind.

use crate::error::{PipelineError, PipelineResult};
use fingerlog_device::DeviceSession;
use fingerlog_protocol::{DeviceMessage, EnrollmentOutcome};
use fingerlog_storage::StorageError;
use fingerlog_storage::models::{Identity, NewIdentity};
use fingerlog_storage::repositories::{IdentityRepository, SqliteIdentityRepository};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One step of the enrollment dialogue.
///
/// The first six phases track the firmware's script; `Complete` and
/// `Failed` are terminal and include the registration result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentPhase {
    /// Switching the sensor into enrollment mode.
    Preparing,
    /// Waiting for the finger to land on the sensor window.
    PlaceFinger,
    /// First image capture.
    FirstScan,
    /// Finger must be lifted between the two captures.
    RemoveFinger,
    /// Second image capture.
    PlaceAgain,
    /// Firmware is merging the two captures into a template.
    BuildingModel,
    /// Template stored and identity registered.
    Complete,
    /// The two captures did not match, or the firmware reported an error.
    Failed,
}

impl EnrollmentPhase {
    /// The non-terminal phases, in dialogue order.
    const SCRIPT: [EnrollmentPhase; 6] = [
        Self::Preparing,
        Self::PlaceFinger,
        Self::FirstScan,
        Self::RemoveFinger,
        Self::PlaceAgain,
        Self::BuildingModel,
    ];

    /// Overall progress in percent when this phase begins.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Preparing => 10,
            Self::PlaceFinger => 30,
            Self::FirstScan => 50,
            Self::RemoveFinger => 70,
            Self::PlaceAgain => 80,
            Self::BuildingModel => 90,
            Self::Complete | Self::Failed => 100,
        }
    }

    /// Operator-facing prompt for this phase.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Preparing => "Preparing sensor...",
            Self::PlaceFinger => "Place finger on the sensor",
            Self::FirstScan => "Scanning...",
            Self::RemoveFinger => "Remove finger",
            Self::PlaceAgain => "Place the same finger again",
            Self::BuildingModel => "Building fingerprint model...",
            Self::Complete => "Enrollment complete",
            Self::Failed => "Enrollment failed",
        }
    }

    /// How long the firmware dwells in this phase.
    fn dwell(&self) -> Duration {
        match self {
            Self::PlaceFinger | Self::RemoveFinger | Self::BuildingModel => {
                Duration::from_secs(2)
            }
            Self::FirstScan | Self::PlaceAgain => Duration::from_secs(3),
            Self::Preparing | Self::Complete | Self::Failed => Duration::ZERO,
        }
    }

    /// Whether this phase ends the dialogue.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Progress report emitted as the dialogue advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentUpdate {
    pub phase: EnrollmentPhase,
    pub progress: u8,
}

impl From<EnrollmentPhase> for EnrollmentUpdate {
    fn from(phase: EnrollmentPhase) -> Self {
        Self {
            phase,
            progress: phase.progress(),
        }
    }
}

/// Runs one enrollment end to end: duplicate pre-checks, the device
/// dialogue, and the final registration.
pub struct EnrollmentDriver {
    identities: SqliteIdentityRepository,
}

impl EnrollmentDriver {
    /// Create a driver over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            identities: SqliteIdentityRepository::new(pool),
        }
    }

    /// Enroll `new` through `session`.
    ///
    /// Duplicate slot and external-id checks run before any device command,
    /// so a doomed enrollment never makes the operator scan a finger. The
    /// session's subscriber is replaced for the duration of the run.
    ///
    /// Progress updates are best-effort; a dropped receiver does not abort
    /// the enrollment.
    ///
    /// # Errors
    ///
    /// - [`StorageError::DuplicateSlot`] / [`StorageError::DuplicateExternalId`]
    ///   from the pre-checks, with nothing written to the device
    /// - [`PipelineError::EnrollmentFailed`] when the firmware reports a
    ///   capture mismatch; no identity is registered
    /// - device errors from the mode switches
    pub async fn run(
        &self,
        session: &mut DeviceSession,
        new: NewIdentity,
        progress: mpsc::Sender<EnrollmentUpdate>,
    ) -> PipelineResult<Identity> {
        if self.identities.slot_exists(new.slot).await? {
            return Err(StorageError::DuplicateSlot {
                slot: i64::from(new.slot.get()),
            }
            .into());
        }
        if self.identities.external_id_exists(&new.external_id).await? {
            return Err(StorageError::DuplicateExternalId {
                external_id: new.external_id.clone(),
            }
            .into());
        }

        let mut events = session.subscribe().await;
        session.enter_enrollment_mode(new.slot).await?;
        session.start_listening()?;

        // Walk the timed script while watching for the firmware's printed
        // verdict; whichever resolves first wins. The script completing
        // without a verdict is the silent-success case.
        let outcome = tokio::select! {
            outcome = Self::next_outcome(&mut events) => outcome,
            _ = Self::walk_script(&progress) => EnrollmentOutcome::Success,
        };

        session.stop_listening().await;
        if let Err(e) = session.return_to_menu().await {
            warn!(error = %e, "could not return device to menu after enrollment");
        }

        match outcome {
            EnrollmentOutcome::Success => {
                let identity = self.identities.register(&new).await?;
                info!(slot = %new.slot, name = %identity.name, "enrollment complete");
                let _ = progress.send(EnrollmentPhase::Complete.into()).await;
                Ok(identity)
            }
            EnrollmentOutcome::Failure { reason } => {
                info!(slot = %new.slot, %reason, "enrollment failed");
                let _ = progress.send(EnrollmentPhase::Failed.into()).await;
                Err(PipelineError::EnrollmentFailed { reason })
            }
        }
    }

    /// Emit the scripted phases, dwelling in each for as long as the
    /// firmware does.
    async fn walk_script(progress: &mpsc::Sender<EnrollmentUpdate>) {
        for phase in EnrollmentPhase::SCRIPT {
            let _ = progress.send(phase.into()).await;
            tokio::time::sleep(phase.dwell()).await;
        }
    }

    /// Wait for the firmware's enrollment verdict, skipping any stray
    /// detection events. Pends forever if the event channel closes, so the
    /// timed script decides.
    async fn next_outcome(events: &mut mpsc::Receiver<DeviceMessage>) -> EnrollmentOutcome {
        loop {
            match events.recv().await {
                Some(DeviceMessage::Enrollment(outcome)) => return outcome,
                Some(_) => continue,
                None => std::future::pending::<()>().await,
            }
        }
    }
}
