//! Mapping configuration and raw-to-gamepad translation.
//!
//! This crate owns everything between a sampled [`RawInputState`] and a
//! per-assignment [`XboxGamepad`]: the textual descriptor grammar that
//! names one raw input element, the static table of the 21 gamepad
//! outputs, the mapping configuration (descriptors plus stick dead-zones
//! and force-feedback parameters), and the pure translation function the
//! pipeline's map stage runs per assignment.
//!
//! # Descriptor grammar
//!
//! ```text
//! descriptor  := prefix? SPACE? kind SPACE index (SPACE direction)?
//! prefix      := 'I' | 'H' | 'IH'
//! kind        := 'Axis' | 'Slider' | 'Button' | 'POV'
//! direction   := 'Up' | 'Down' | 'Left' | 'Right'
//! ```
//!
//! An empty descriptor means "no binding"; the output stays neutral.
//!
//! [`RawInputState`]: padforge_schemas::RawInputState
//! [`XboxGamepad`]: padforge_schemas::XboxGamepad

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod descriptor;
pub mod mapper;
pub mod output;

pub use config::{ForceEffectStyle, ForceParams, MappingConfig, StickZone};
pub use descriptor::{parse_binding, MappingError, PovDirection, SourceKind, SourceRef};
pub use mapper::{apply_modifiers, apply_radial_deadzone, map_assignment, read_source};
pub use output::{OutputDef, OutputKind, PadOutput, OUTPUTS, OUTPUT_COUNT};
