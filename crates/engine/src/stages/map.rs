//! Stage 3: per-assignment translation.

use std::sync::Arc;

use padforge_mapping::map_assignment;
use padforge_schemas::{XboxGamepad, SLOT_COUNT};

use crate::pipeline::Pipeline;

/// Translate every enabled assignment whose device is online into its
/// staging buffer, and note which slots are active this cycle.
pub fn run(p: &mut Pipeline) {
    let devices = Arc::clone(&p.devices);
    let guard = devices.lock();

    p.slot_active = [false; SLOT_COUNT];

    for (i, assignment) in p.assignments.list.iter().enumerate() {
        let mut staged = XboxGamepad::NEUTRAL;
        let mut online = false;

        if assignment.enabled && usize::from(assignment.slot) < SLOT_COUNT {
            if let Some(record) = guard
                .iter()
                .find(|d| d.instance_id == assignment.instance_id)
            {
                if record.is_online() && record.enabled {
                    staged = map_assignment(&record.raw, &assignment.config);
                    online = true;
                    p.slot_active[usize::from(assignment.slot)] = true;
                }
            }
        }

        p.staging[i] = staged;
        p.staging_online[i] = online;
    }
}
