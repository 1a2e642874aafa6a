use fingerlog_device::DeviceError;
use fingerlog_storage::StorageError;
use thiserror::Error;

/// Errors from the attendance pipeline and enrollment driver.
///
/// Device and storage failures pass through transparently; the only error
/// the pipeline adds itself is a firmware-reported enrollment failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Device communication failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The sensor reported that enrollment did not complete.
    #[error("Enrollment failed: {reason}")]
    EnrollmentFailed { reason: String },
}

/// Specialized result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrollment_failed_display() {
        let error = PipelineError::EnrollmentFailed {
            reason: "mismatch".to_string(),
        };
        assert_eq!(error.to_string(), "Enrollment failed: mismatch");
    }

    #[test]
    fn test_device_error_passes_through() {
        let error: PipelineError = DeviceError::NotConnected.into();
        assert_eq!(error.to_string(), "Device session is not connected");
    }
}
