//! The PadForge polling pipeline.
//!
//! A dedicated thread runs six stages in order every cycle (1 ms by
//! default): enumerate physical devices, read their raw state and apply
//! queued rumble, map each device-to-slot assignment to a per-assignment
//! gamepad value, combine assignments per slot, submit to the virtual
//! controllers, and surface the combined state for display.
//!
//! # Shared-state discipline
//!
//! The pipeline thread exclusively owns driver handles, force-feedback
//! state, and the virtual controllers. The device collection and the
//! assignment list are shared under locks (the assignment list is
//! double-buffered: consumers publish a new snapshot, the pipeline swaps
//! at a cycle boundary). Combined outputs are published through
//! cycle-counter-guarded snapshots; per-slot vibration arrives from bus
//! driver threads through relaxed 32-bit stores.
//!
//! # Stepping vs running
//!
//! [`Pipeline`] is the synchronous core: [`Pipeline::run_cycle`] executes
//! one cycle, which is what the tests drive. [`Engine`] wraps it in the
//! scheduler loop on a named thread with cooperative shutdown.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod assignments;
pub mod engine;
pub mod events;
pub mod pipeline;
pub mod shared;
pub mod slots;
pub mod stages;

pub use assignments::{AssignmentSet, SharedAssignments, SlotAssignment};
pub use engine::{Engine, EngineConfig, EngineHandles};
pub use events::{EngineEvent, ErrorEvent, EventBus};
pub use pipeline::{Pipeline, PipelineShared};
pub use shared::{CombinedSnapshots, LoopbackSet, VibrationSlots};

/// Default number of consecutive inactive cycles a virtual controller
/// survives before it is destroyed (≈10 s at 1 kHz).
pub const DEFAULT_GRACE_CYCLES: u32 = 10_000;
