//! Physical device handling for PadForge.
//!
//! This crate defines the contracts the pipeline polls against, the OS
//! input library ([`InputBackend`]/[`DeviceDriver`]) and the native
//! XInput-class back-end ([`NativeBackend`]), together with the
//! [`PhysicalDevice`] record that tracks one real device across its
//! online/offline lifecycle, and the conversions from driver samples to
//! the fixed [`RawInputState`] snapshot shape.
//!
//! Platform implementations live behind the traits; the [`mock`] module
//! provides scriptable in-memory implementations that let the entire
//! pipeline run headless under test.
//!
//! [`RawInputState`]: padforge_schemas::RawInputState

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod convert;
pub mod device;
pub mod mock;
pub mod native;
pub mod supplemental;

pub use backend::{
    DeviceDescriptor, DeviceDriver, DriverSample, EffectId, HapticEffect, InputBackend,
};
pub use convert::{
    axis_to_unsigned, fill_axes_and_sliders, hat_bits_to_centidegrees, native_pad_to_raw,
    native_trigger_to_axis, sample_to_raw, HAT_DOWN, HAT_LEFT, HAT_RIGHT, HAT_UP,
};
pub use device::PhysicalDevice;
pub use native::{is_native_xbox, NativeBackend, NativePadState, XBOX_VENDOR_ID};
pub use supplemental::SupplementalButtons;
