//! Virtual-controller bus error types.

use crate::common::ErrorSeverity;

/// Virtual-controller bus errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// The bus driver is not installed or cannot be reached.
    ///
    /// The engine disables Stage 5, surfaces a user-visible flag, and
    /// keeps the rest of the pipeline running.
    #[error("Virtual controller bus unavailable: {0}")]
    Unavailable(String),

    /// Creating a virtual controller failed.
    #[error("Failed to create virtual controller for slot {slot}: {reason}")]
    CreateFailed {
        /// Virtual slot index 0..3
        slot: u8,
        /// Failure reason
        reason: String,
    },

    /// Submitting a report to a connected controller failed.
    #[error("Report submission failed for slot {slot}: {reason}")]
    SubmitFailed {
        /// Virtual slot index 0..3
        slot: u8,
        /// Failure reason
        reason: String,
    },

    /// The controller connected but never reported its OS slot index
    /// within the bounded wait.
    #[error("Virtual controller for slot {0} did not report an OS slot index")]
    SlotUnresolved(u8),

    /// The handle is not (or no longer) known to the bus.
    #[error("Unknown virtual controller handle: {0}")]
    UnknownHandle(u64),
}

impl BusError {
    /// Classify the severity of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Missing driver degrades the engine but does not stop it.
            BusError::Unavailable(_) => ErrorSeverity::Warning,
            BusError::SlotUnresolved(_) => ErrorSeverity::Warning,
            BusError::CreateFailed { .. }
            | BusError::SubmitFailed { .. }
            | BusError::UnknownHandle(_) => ErrorSeverity::Error,
        }
    }
}
