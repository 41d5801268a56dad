//! Stage 6: surface combined state for display and telemetry.

use padforge_schemas::SLOT_COUNT;

use crate::pipeline::Pipeline;

/// Publish this cycle's combined values into the shared snapshots.
/// Consumers read them at display cadence; a read between cycles sees
/// the previous coherent value, never a torn one.
pub fn run(p: &mut Pipeline) {
    for slot in 0..SLOT_COUNT {
        p.combined_out.publish(slot, p.combined[slot]);
    }
}
