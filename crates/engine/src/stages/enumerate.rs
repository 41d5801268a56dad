//! Stage 1: device discovery, open/close, native pad probing.

use padforge_devices::{is_native_xbox, PhysicalDevice};
use padforge_errors::Stage;
use padforge_schemas::InstanceId;

use crate::events::EngineEvent;
use crate::pipeline::Pipeline;

/// Maintain the device collection: open newcomers, retire the departed,
/// and probe the native slots not occupied by our own virtual pads.
pub fn run(p: &mut Pipeline) {
    let mut changed = false;

    changed |= scan_joystick_backend(p);
    changed |= scan_native_slots(p);

    if changed {
        p.events.publish(EngineEvent::DevicesChanged);
    }
}

fn scan_joystick_backend(p: &mut Pipeline) -> bool {
    let mut changed = false;
    let count = p.input.device_count();
    let mut seen: Vec<InstanceId> = Vec::with_capacity(count);

    for index in 0..count {
        let Some(descriptor) = p.input.descriptor(index) else {
            continue;
        };

        // Native pads are read exclusively through the XInput back-end;
        // letting both paths open the same hardware would double inputs.
        if is_native_xbox(descriptor.vendor_id, descriptor.product_id) {
            continue;
        }

        let id = match &descriptor.path {
            Some(path) => {
                InstanceId::from_path(path, descriptor.vendor_id, descriptor.product_id)
            }
            None => InstanceId::from_triple(descriptor.vendor_id, descriptor.product_id, index),
        };
        seen.push(id.clone());

        let known = {
            let mut devices = p.devices.lock();
            match devices.iter_mut().find(|d| d.instance_id == id) {
                Some(record) => {
                    record.last_index = index;
                    Some(record.is_online() && record.still_attached())
                }
                None => None,
            }
        };

        if known == Some(true) {
            continue;
        }

        // New record, or a known one that needs (re)opening. The open
        // happens outside the collection lock; the result is attached
        // under a fresh lock.
        match p.input.open(index) {
            Ok(driver) => {
                let mut devices = p.devices.lock();
                match devices.iter().position(|d| d.instance_id == id) {
                    Some(i) => {
                        let record = &mut devices[i];
                        record.attach(driver);
                        tracing::info!(device = %id, name = %record.name, "device reopened");
                    }
                    None => {
                        let mut record = PhysicalDevice::from_descriptor(id.clone(), &descriptor);
                        record.last_index = index;
                        record.attach(driver);
                        tracing::info!(device = %id, name = %record.name, "device discovered");
                        devices.push(record);
                    }
                }
                changed = true;
            }
            Err(e) => {
                p.events.error(Stage::Enumerate, Some(id.clone()), e.to_string());
            }
        }
    }

    // Retire records that vanished from enumeration or whose driver
    // reports the hardware gone. The record itself survives.
    let mut offlined: Vec<InstanceId> = Vec::new();
    {
        let mut devices = p.devices.lock();
        for record in devices.iter_mut() {
            if record.instance_id.is_xinput() || !record.is_online() {
                continue;
            }
            if !seen.contains(&record.instance_id) || !record.still_attached() {
                record.detach();
                offlined.push(record.instance_id.clone());
                changed = true;
            }
        }
    }
    for id in offlined {
        if let Some(ff) = p.ff.get_mut(&id) {
            ff.reset();
        }
        tracing::info!(device = %id, "device offline");
    }

    changed
}

fn scan_native_slots(p: &mut Pipeline) -> bool {
    let mut changed = false;

    for slot in 0..4u8 {
        // Loopback prevention: never enumerate an OS slot our own
        // virtual controller occupies.
        if p.loopback.contains(slot) {
            continue;
        }

        let connected = p.native.probe(slot);
        let id = InstanceId::xinput(slot);

        let went_offline = {
            let mut devices = p.devices.lock();
            let position = devices.iter().position(|d| d.instance_id == id);
            match (position, connected) {
                (None, true) => {
                    let mut record = PhysicalDevice::native_pad(slot);
                    record.native_online = true;
                    tracing::info!(slot, "native pad connected");
                    devices.push(record);
                    changed = true;
                    false
                }
                (Some(i), true) => {
                    let record = &mut devices[i];
                    if !record.native_online {
                        record.native_online = true;
                        changed = true;
                        tracing::info!(slot, "native pad reconnected");
                    }
                    false
                }
                (Some(i), false) => {
                    let record = &mut devices[i];
                    if record.native_online {
                        record.detach();
                        changed = true;
                        tracing::info!(slot, "native pad disconnected");
                        true
                    } else {
                        false
                    }
                }
                (None, false) => false,
            }
        };

        if went_offline {
            if let Some(ff) = p.ff.get_mut(&id) {
                ff.reset();
            }
        }
    }

    changed
}
