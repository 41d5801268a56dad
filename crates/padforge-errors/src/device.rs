//! Physical-device error types.
//!
//! Errors from enumeration, opening, raw sampling, and force-feedback
//! submission. One device failing must never disturb the others, so the
//! pipeline catches these per device and keeps going.

use crate::common::ErrorSeverity;

/// Physical-device errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    /// Opening a device at an enumeration index failed; the record stays offline.
    #[error("Failed to open device at index {index}: {reason}")]
    OpenFailed {
        /// Enumeration index reported by the OS input library
        index: usize,
        /// Failure reason
        reason: String,
    },

    /// Sampling raw state failed; the device is skipped for this cycle.
    #[error("Sampling failed on device {device}: {reason}")]
    SampleFailed {
        /// Instance identifier
        device: String,
        /// Failure reason
        reason: String,
    },

    /// The driver handle reports the device is no longer attached.
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// A rumble or haptic-effect submission failed.
    #[error("Force feedback failed on device {device}: {reason}")]
    ForceFeedbackFailed {
        /// Instance identifier
        device: String,
        /// Failure reason
        reason: String,
    },

    /// The native-controller back-end rejected a slot operation.
    #[error("Native controller slot {slot} error: {reason}")]
    NativeSlot {
        /// Slot index 0..3
        slot: u8,
        /// Failure reason
        reason: String,
    },

    /// A capability the caller relied on is not present on this device.
    #[error("Device {device} lacks capability: {capability}")]
    MissingCapability {
        /// Instance identifier
        device: String,
        /// Capability name
        capability: &'static str,
    },
}

impl DeviceError {
    /// Classify the severity of this error.
    ///
    /// Sampling and open failures are expected operational noise
    /// (unplugged cables, drivers mid-update) and classify as warnings.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::OpenFailed { .. }
            | DeviceError::SampleFailed { .. }
            | DeviceError::Disconnected(_) => ErrorSeverity::Warning,
            DeviceError::ForceFeedbackFailed { .. } | DeviceError::NativeSlot { .. } => {
                ErrorSeverity::Error
            }
            DeviceError::MissingCapability { .. } => ErrorSeverity::Error,
        }
    }
}
