//! Centralized error types for PadForge
//!
//! This crate provides a unified error handling system for the PadForge
//! project, shared by the polling pipeline and the crates around it.
//!
//! # Architecture
//!
//! The error system is organized into several modules:
//!
//! - [`common`]: Top-level error type, severity classification, and the
//!   pipeline stage identifier carried by error events
//! - [`device`]: Physical-device errors (enumeration, sampling, rumble)
//! - [`bus`]: Virtual-controller bus errors
//!
//! # Pipeline policy
//!
//! Per-entity work inside a pipeline stage catches its own errors and
//! reports them through the engine's error-event stream; per-cycle work
//! never unwinds the polling thread. Only errors classified
//! [`ErrorSeverity::Fatal`] stop the scheduler loop.
//!
//! # Example
//!
//! ```
//! use padforge_errors::prelude::*;
//!
//! fn open_device(index: usize) -> Result<()> {
//!     if index >= 64 {
//!         return Err(DeviceError::OpenFailed {
//!             index,
//!             reason: "enumeration index out of range".into(),
//!         }
//!         .into());
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bus;
pub mod common;
pub mod device;
pub mod prelude;

pub use bus::BusError;
pub use common::{ErrorSeverity, PadForgeError, Stage};
pub use device::DeviceError;

/// A specialized `Result` type for PadForge operations.
pub type Result<T> = std::result::Result<T, PadForgeError>;
