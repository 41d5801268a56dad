//! Stage 5: drive the virtual controllers.

use padforge_schemas::SLOT_COUNT;

use crate::pipeline::Pipeline;

/// Feed each slot's state machine with this cycle's activity and
/// combined report. Attach/detach decisions, grace counting, and
/// feedback registration all live in the slot manager.
pub fn run(p: &mut Pipeline) {
    for slot in 0..SLOT_COUNT {
        let report = p.combined[slot];
        p.slots.drive(slot, p.slot_active[slot], &report);
    }
}
