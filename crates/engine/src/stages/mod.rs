//! The six pipeline stages, one module each.
//!
//! Every stage exposes `run(&mut Pipeline)` and follows the same error
//! policy: per-entity work is caught and reported through the event
//! bus, per-cycle work never unwinds the polling thread.

pub mod combine;
pub mod enumerate;
pub mod map;
pub mod output;
pub mod read;
pub mod readback;
