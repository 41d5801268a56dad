//! Convenience re-exports for error handling.
//!
//! ```
//! use padforge_errors::prelude::*;
//! ```

pub use crate::bus::BusError;
pub use crate::common::{ErrorSeverity, PadForgeError, Stage};
pub use crate::device::DeviceError;
pub use crate::Result;
