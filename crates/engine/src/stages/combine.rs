//! Stage 4: merge per-assignment outputs into one value per slot.

use padforge_schemas::{XboxGamepad, SLOT_COUNT};

use crate::pipeline::Pipeline;

/// Merge the staging buffers of each slot's online enabled assignments:
/// buttons OR together, triggers take the maximum, and each stick goes
/// to the contributor with the greatest deflection (lowest sort order
/// wins ties, deterministically).
pub fn run(p: &mut Pipeline) {
    for slot in 0..SLOT_COUNT {
        let mut combined = XboxGamepad::NEUTRAL;
        // Magnitude of the currently chosen stick pair; strict
        // "greater than" keeps the earliest (lowest sort order) winner
        // because members iterate in sort order.
        let mut best_left: u64 = 0;
        let mut best_right: u64 = 0;

        for &i in &p.slot_members[slot] {
            if !p.staging_online[i] {
                continue;
            }
            let pad = &p.staging[i];

            combined.buttons |= pad.buttons;
            combined.left_trigger = combined.left_trigger.max(pad.left_trigger);
            combined.right_trigger = combined.right_trigger.max(pad.right_trigger);

            let left = pad.left_stick_magnitude_sq();
            if left > best_left {
                best_left = left;
                combined.thumb_lx = pad.thumb_lx;
                combined.thumb_ly = pad.thumb_ly;
            }
            let right = pad.right_stick_magnitude_sq();
            if right > best_right {
                best_right = right;
                combined.thumb_rx = pad.thumb_rx;
                combined.thumb_ry = pad.thumb_ry;
            }
        }

        p.combined[slot] = combined;
    }
}
