use thiserror::Error;

/// Errors shared across the attendance core crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Slot number outside the sensor's supported template range.
    #[error("Slot id must be {min}-{max}, got {value}", min = crate::constants::MIN_SLOT_ID, max = crate::constants::MAX_SLOT_ID)]
    InvalidSlot { value: u32 },

    /// A required text field was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
