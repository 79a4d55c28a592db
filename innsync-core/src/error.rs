//! Error types for the innsync ecosystem.

use thiserror::Error;

/// Errors that can occur in innsync operations.
///
/// The variants fall into two classes with very different handling:
/// validation errors (`InvalidRange`, `Overlap`, `UnknownRoom`,
/// `ReadOnly`) are rejected synchronously before any state is mutated,
/// while everything else is reported after the optimistic local change
/// has already been committed and never rolls it back.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("End date must be after start date.")]
    InvalidRange,

    #[error("These dates overlap an existing booking.")]
    Overlap,

    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Signed in read-only; bookings cannot be changed")]
    ReadOnly,

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("No backup found")]
    NoBackupFound,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookingError {
    /// True for failures raised before any state was mutated.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BookingError::InvalidRange
                | BookingError::Overlap
                | BookingError::UnknownRoom(_)
                | BookingError::ReadOnly
        )
    }
}

/// Result type alias for innsync operations.
pub type BookingResult<T> = Result<T, BookingError>;
