//! Top-level error type, severity classification, and stage identifiers.

use core::fmt;

use crate::{BusError, DeviceError};

/// Top-level error type that can wrap all PadForge sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum PadForgeError {
    /// Physical-device errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Virtual-controller bus errors
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors (unparseable descriptors, broken checksum links)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A condition the pipeline treats as unreachable was observed.
    /// Reported and survived, never panicked on.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// The pipeline thread itself failed and the engine stopped.
    #[error("Fatal: {0}")]
    Fatal(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl PadForgeError {
    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PadForgeError::Device(e) => e.severity(),
            PadForgeError::Bus(e) => e.severity(),
            PadForgeError::Io(_) => ErrorSeverity::Error,
            PadForgeError::Config(_) => ErrorSeverity::Warning,
            PadForgeError::Invariant(_) => ErrorSeverity::Error,
            PadForgeError::Fatal(_) => ErrorSeverity::Fatal,
            PadForgeError::Other(_) => ErrorSeverity::Error,
        }
    }

    /// Whether the pipeline may keep running after reporting this error.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Fatal
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        PadForgeError::Config(msg.into())
    }

    /// Create an invariant-violation error with a message.
    pub fn invariant(msg: impl Into<String>) -> Self {
        PadForgeError::Invariant(msg.into())
    }

    /// Create a fatal error with a message.
    pub fn fatal(msg: impl Into<String>) -> Self {
        PadForgeError::Fatal(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        PadForgeError::Other(msg.into())
    }
}

impl From<std::io::Error> for PadForgeError {
    fn from(e: std::io::Error) -> Self {
        PadForgeError::Io(e)
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, degraded but functional (skipped device, ignored binding)
    Warning = 1,
    /// Error, operation failed but the pipeline continues
    Error = 2,
    /// Fatal, the engine stops
    Fatal = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Fatal => write!(f, "fatal"),
        }
    }
}

/// Pipeline stage identifier carried by error events.
///
/// The six stages run strictly in order within each polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: device discovery and open/close
    Enumerate = 1,
    /// Stage 2: raw sampling and rumble application
    Read = 2,
    /// Stage 3: per-assignment translation
    Map = 3,
    /// Stage 4: per-slot merging
    Combine = 4,
    /// Stage 5: virtual-controller submission
    Output = 5,
    /// Stage 6: state surfacing for display
    Readback = 6,
}

impl Stage {
    /// Stage number as reported in error events (1..=6).
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Enumerate => write!(f, "enumerate"),
            Stage::Read => write!(f, "read"),
            Stage::Map => write!(f, "map"),
            Stage::Combine => write!(f, "combine"),
            Stage::Output => write!(f, "output"),
            Stage::Readback => write!(f, "readback"),
        }
    }
}
