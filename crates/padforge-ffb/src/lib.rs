//! Force-feedback routing.
//!
//! Games rumble the virtual controller; this crate decides what, if
//! anything, to send to the physical actuator: it applies the mapping
//! configuration's gain chain and motor swap, suppresses bit-identical
//! re-submissions (re-issuing an unchanged rumble restarts the hardware
//! effect and produces audible gaps), and picks the command family the
//! device understands.
//!
//! The split is planner/executor: [`FfState::plan`] is pure and returns
//! the command to run, the pipeline executes it against the driver and
//! [`commit`](FfState::commit)s on success, so the recorded last-sent
//! pair only ever reflects what actually reached the device.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod router;

pub use router::{FfCommand, FfPlan, FfRoute, FfState, apply_gains};
