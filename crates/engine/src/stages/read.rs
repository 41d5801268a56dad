//! Stage 2: raw sampling and force-feedback application.

use std::sync::Arc;

use padforge_devices::{native_pad_to_raw, sample_to_raw, PhysicalDevice};
use padforge_errors::{DeviceError, Stage};
use padforge_ffb::{FfCommand, FfRoute};
use padforge_schemas::SLOT_COUNT;

use crate::events::EngineEvent;
use crate::pipeline::Pipeline;

/// Sample every online device into its live snapshot, then route the
/// queued per-slot vibration to its actuator. One device failing never
/// disturbs the others.
pub fn run(p: &mut Pipeline) {
    // The guard is taken through a local clone of the Arc so the rest
    // of the context stays borrowable while records are in hand.
    let devices = Arc::clone(&p.devices);
    let mut guard = devices.lock();

    for record in guard.iter_mut() {
        if !record.is_online() {
            continue;
        }
        let id = record.instance_id.clone();
        let before = record.raw;

        if let Err(e) = sample_device(p, record) {
            p.events.error(Stage::Read, Some(id), e.to_string());
            continue;
        }

        if let Some(&supp_slot) = p.supplemental_map.get(&id) {
            let base = usize::from(record.capabilities.buttons);
            p.supplemental.merge_into(supp_slot, &mut record.raw, base);
        }

        if record.raw != before {
            p.events.publish(EngineEvent::StateChanged(id.clone()));
        }

        apply_force_feedback(p, record);
    }
}

fn sample_device(p: &mut Pipeline, record: &mut PhysicalDevice) -> Result<(), DeviceError> {
    if record.instance_id.is_xinput() {
        let slot = record.last_index as u8;
        let state = p.native.read(slot)?;
        native_pad_to_raw(&state, &mut record.raw);
    } else if let Some(driver) = record.driver_mut() {
        let sample = driver.sample()?;
        sample_to_raw(&sample, record.capabilities, &mut record.raw);
    }
    Ok(())
}

/// Route the slot's queued vibration through the device's mapping
/// gains and down whichever force path the hardware has.
fn apply_force_feedback(p: &mut Pipeline, record: &mut PhysicalDevice) {
    if !record.capabilities.force_feedback() {
        return;
    }
    let id = record.instance_id.clone();

    // The first enabled assignment (lowest sort order) decides which
    // slot's vibration this device plays and with which parameters.
    let Some(assignment) = p
        .assignments
        .list
        .iter()
        .filter(|a| a.enabled && a.instance_id == id && usize::from(a.slot) < SLOT_COUNT)
        .min_by_key(|a| a.sort_order)
    else {
        return;
    };

    let vibration = p.vibration.load(usize::from(assignment.slot));
    let params = assignment.config.force;
    let route = if record.capabilities.rumble {
        FfRoute::Rumble
    } else {
        FfRoute::Haptic
    };

    let state = p.ff.entry(id.clone()).or_default();
    let Some(plan) = state.plan(vibration, &params, route) else {
        return;
    };

    let result = if id.is_xinput() {
        let slot = record.last_index as u8;
        match plan.command {
            FfCommand::Rumble { left, right } => {
                p.native.set_vibration(slot, left, right).map(|()| None)
            }
            FfCommand::RumbleStop => p.native.set_vibration(slot, 0, 0).map(|()| None),
            // Native pads have no haptic path; the route above never
            // selects one for them.
            _ => Ok(None),
        }
    } else if let Some(driver) = record.driver_mut() {
        match plan.command {
            // Duration 0 is the driver's "retain until next call" form,
            // so a stalled pipeline never clips rumble mid-effect.
            FfCommand::Rumble { left, right } => driver.rumble(left, right, 0).map(|()| None),
            FfCommand::RumbleStop => driver.rumble_stop().map(|()| None),
            FfCommand::EffectStart(effect) => driver.effect_run(effect).map(Some),
            FfCommand::EffectUpdate(effect_id, effect) => {
                driver.effect_update(effect_id, effect).map(|()| None)
            }
            FfCommand::EffectStop(effect_id) => driver.effect_stop(effect_id).map(|()| None),
        }
    } else {
        Ok(None)
    };

    match result {
        Ok(started) => {
            if let Some(state) = p.ff.get_mut(&id) {
                state.commit(&plan, &params, started);
            }
        }
        Err(e) => p.events.error(Stage::Read, Some(id), e.to_string()),
    }
}
