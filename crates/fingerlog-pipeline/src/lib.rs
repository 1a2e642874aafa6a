//! Business logic for the fingerlog attendance system.
//!
//! Sits between the device session and the store:
//!
//! - [`AttendancePipeline`] consumes decoded device events, resolves
//!   detections to enrolled identities, and records visits
//! - [`EnrollmentDriver`] runs the guided enrollment dialogue and registers
//!   the identity once the capture succeeds
//!
//! # Examples
//!
//! ```no_run
//! use fingerlog_device::{DeviceSession, SerialConfig};
//! use fingerlog_pipeline::AttendancePipeline;
//! use fingerlog_storage::{Database, DatabaseConfig};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("attendance.db")).await?;
//! let pipeline = AttendancePipeline::new(db.pool().clone());
//!
//! let mut session = DeviceSession::connect(&SerialConfig::new("/dev/ttyUSB0")).await?;
//! let events = session.subscribe().await;
//! session.enter_detection_mode().await?;
//!
//! let (outcome_tx, mut outcome_rx) = mpsc::channel(32);
//! tokio::spawn(async move { pipeline.run(events, outcome_tx).await });
//!
//! while let Some(event) = outcome_rx.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod attendance;
pub mod enrollment;
pub mod error;

pub use attendance::{AttendancePipeline, DetectionOutcome, PipelineEvent};
pub use enrollment::{EnrollmentDriver, EnrollmentPhase, EnrollmentUpdate};
pub use error::{PipelineError, PipelineResult};
