//! The virtual controller bus contract.
//!
//! A [`VirtualBus`] implementation wraps a user-mode virtual-gamepad bus
//! driver: it plugs virtual Xbox 360 controllers in and out, accepts one
//! report per cycle, reports which OS XInput slot each controller
//! landed on, and delivers the rumble feedback games send to the
//! controller. Feedback callbacks fire on the driver's thread, so
//! handlers must only do lock-free publication.
//!
//! [`MockBus`] is the in-memory implementation the test suites run the
//! pipeline against.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod mock;

use padforge_errors::BusError;
use padforge_schemas::XboxGamepad;

pub use mock::MockBus;

/// Opaque handle to one virtual controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusHandle(pub u64);

/// Rumble feedback callback: `(large_motor, small_motor)` as the bus
/// driver reports them, byte magnitudes 0–255. Fires on a driver
/// thread.
pub type FeedbackFn = Box<dyn Fn(u8, u8) + Send + Sync>;

/// A user-mode virtual Xbox 360 controller bus.
pub trait VirtualBus: Send {
    /// Allocate a controller. It stays unplugged until
    /// [`VirtualBus::connect`].
    fn create(&mut self) -> Result<BusHandle, BusError>;

    /// Plug the controller into the bus. The OS assigns it an XInput
    /// slot asynchronously; poll [`VirtualBus::slot_index`].
    fn connect(&mut self, handle: BusHandle) -> Result<(), BusError>;

    /// Unplug and free the controller.
    fn disconnect(&mut self, handle: BusHandle) -> Result<(), BusError>;

    /// Submit one report.
    fn submit(&mut self, handle: BusHandle, report: &XboxGamepad) -> Result<(), BusError>;

    /// The OS XInput slot the controller landed on, once known.
    fn slot_index(&self, handle: BusHandle) -> Option<u8>;

    /// Register the rumble feedback handler for a controller.
    fn set_feedback_handler(&mut self, handle: BusHandle, handler: FeedbackFn)
        -> Result<(), BusError>;
}
