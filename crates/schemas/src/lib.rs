//! Shared value types for the PadForge input translation engine.
//!
//! This crate holds the data model every other crate agrees on: the
//! normalized gamepad output shape, raw input snapshots, device
//! capabilities and classification, deterministic device identity, and
//! the persisted settings entities. It has no behavior beyond pure value
//! manipulation so the pipeline crates and the persistence layer can
//! depend on it without dragging each other in.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod device;
pub mod entities;
pub mod gamepad;
pub mod identity;
pub mod raw_state;

pub use device::{DeviceCapabilities, DeviceClass};
pub use entities::{DeviceEntry, UserSetting};
pub use gamepad::{buttons, Vibration, XboxGamepad};
pub use identity::{product_guid, InstanceId, ProductGuid};
pub use raw_state::{RawInputState, AXIS_CENTER, HAT_CENTERED, MAX_AXES, MAX_BUTTONS, MAX_HATS, MAX_SLIDERS};

/// Number of virtual controller slots exposed to games.
pub const SLOT_COUNT: usize = 4;
