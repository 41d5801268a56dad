//! Scriptable in-memory backends.
//!
//! These implement the platform contracts over shared handles so a test
//! can plug devices in and out, move their inputs, and inspect the
//! force-feedback commands the pipeline issued, all without hardware.

use std::sync::Arc;

use parking_lot::Mutex;

use padforge_errors::DeviceError;
use padforge_schemas::{DeviceCapabilities, DeviceClass};

use crate::backend::{
    DeviceDescriptor, DeviceDriver, DriverSample, EffectId, HapticEffect, InputBackend,
};
use crate::native::{NativeBackend, NativePadState};

/// A force-feedback command recorded by a mock driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedFf {
    /// `rumble(low, high, duration_ms)`
    Rumble(u16, u16, u32),
    /// `effect_run`
    EffectRun(HapticEffect),
    /// `effect_update`
    EffectUpdate(EffectId, HapticEffect),
    /// `effect_stop`
    EffectStop(EffectId),
}

/// Shared mutable state of one mock device.
#[derive(Debug)]
pub struct MockDeviceState {
    /// Descriptor returned during enumeration
    pub descriptor: DeviceDescriptor,
    /// Declared capabilities
    pub capabilities: DeviceCapabilities,
    /// Whether the device is currently plugged in
    pub attached: bool,
    /// Whether `open` should fail
    pub fail_open: bool,
    /// Whether `sample` should fail
    pub fail_sample: bool,
    /// The sample the driver returns
    pub sample: DriverSample,
    /// Every force-feedback command the pipeline issued, in order
    pub ff_log: Vec<RecordedFf>,
    next_effect: u32,
}

/// Cloneable handle a test keeps to drive one mock device.
#[derive(Debug, Clone)]
pub struct MockDeviceHandle(Arc<Mutex<MockDeviceState>>);

impl MockDeviceHandle {
    /// Build a device with the given identity and capabilities.
    pub fn new(name: &str, vendor_id: u16, product_id: u16, capabilities: DeviceCapabilities) -> Self {
        Self(Arc::new(Mutex::new(MockDeviceState {
            descriptor: DeviceDescriptor {
                path: Some(format!("mock/{vendor_id:04x}:{product_id:04x}/{name}")),
                name: name.to_string(),
                vendor_id,
                product_id,
                version: 0x0100,
                class: DeviceClass::Gamepad,
            },
            capabilities,
            attached: true,
            fail_open: false,
            fail_sample: false,
            sample: DriverSample::default(),
            ff_log: Vec::new(),
            next_effect: 1,
        })))
    }

    /// Run a closure against the shared state.
    pub fn with<R>(&self, f: impl FnOnce(&mut MockDeviceState) -> R) -> R {
        f(&mut self.0.lock())
    }

    /// Plug the device out (the driver starts reporting not-attached).
    pub fn unplug(&self) {
        self.0.lock().attached = false;
    }

    /// Plug the device back in.
    pub fn replug(&self) {
        self.0.lock().attached = true;
    }

    /// Set one button in the sample.
    pub fn set_button(&self, index: usize, pressed: bool) {
        let mut state = self.0.lock();
        if pressed {
            state.sample.buttons[index / 8] |= 1 << (index % 8);
        } else {
            state.sample.buttons[index / 8] &= !(1 << (index % 8));
        }
    }

    /// Set one signed axis in the sample.
    pub fn set_axis(&self, index: usize, value: i16) {
        self.0.lock().sample.axes[index] = value;
    }

    /// Set one hat bitmask in the sample.
    pub fn set_hat(&self, index: usize, bits: u8) {
        self.0.lock().sample.hats[index] = bits;
    }

    /// Count of rumble submissions (not effect commands).
    pub fn rumble_count(&self) -> usize {
        self.0
            .lock()
            .ff_log
            .iter()
            .filter(|c| matches!(c, RecordedFf::Rumble(..)))
            .count()
    }

    /// The full force-feedback command log.
    pub fn ff_log(&self) -> Vec<RecordedFf> {
        self.0.lock().ff_log.clone()
    }
}

struct MockDriver {
    state: Arc<Mutex<MockDeviceState>>,
}

impl DeviceDriver for MockDriver {
    fn still_attached(&self) -> bool {
        self.state.lock().attached
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.state.lock().capabilities
    }

    fn sample(&mut self) -> Result<DriverSample, DeviceError> {
        let state = self.state.lock();
        if state.fail_sample {
            return Err(DeviceError::SampleFailed {
                device: state.descriptor.name.clone(),
                reason: "mock sample failure".into(),
            });
        }
        if !state.attached {
            return Err(DeviceError::Disconnected(state.descriptor.name.clone()));
        }
        Ok(state.sample)
    }

    fn rumble(&mut self, low: u16, high: u16, duration_ms: u32) -> Result<(), DeviceError> {
        self.state
            .lock()
            .ff_log
            .push(RecordedFf::Rumble(low, high, duration_ms));
        Ok(())
    }

    fn effect_run(&mut self, effect: HapticEffect) -> Result<EffectId, DeviceError> {
        let mut state = self.state.lock();
        let id = EffectId(state.next_effect);
        state.next_effect += 1;
        state.ff_log.push(RecordedFf::EffectRun(effect));
        Ok(id)
    }

    fn effect_update(&mut self, id: EffectId, effect: HapticEffect) -> Result<(), DeviceError> {
        self.state
            .lock()
            .ff_log
            .push(RecordedFf::EffectUpdate(id, effect));
        Ok(())
    }

    fn effect_stop(&mut self, id: EffectId) -> Result<(), DeviceError> {
        self.state.lock().ff_log.push(RecordedFf::EffectStop(id));
        Ok(())
    }
}

/// An [`InputBackend`] over a shared, test-mutable device list.
#[derive(Debug, Clone, Default)]
pub struct MockInputBackend {
    devices: Arc<Mutex<Vec<MockDeviceHandle>>>,
}

impl MockInputBackend {
    /// An empty backend; add devices with [`MockInputBackend::add`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a device to the enumeration order and return its handle.
    pub fn add(&self, device: MockDeviceHandle) -> MockDeviceHandle {
        self.devices.lock().push(device.clone());
        device
    }

    /// Remove a device from enumeration entirely (as opposed to
    /// unplugging it, which keeps the index but fails attachment).
    pub fn remove(&self, device: &MockDeviceHandle) {
        self.devices
            .lock()
            .retain(|d| !Arc::ptr_eq(&d.0, &device.0));
    }
}

impl InputBackend for MockInputBackend {
    fn device_count(&mut self) -> usize {
        self.devices.lock().len()
    }

    fn descriptor(&mut self, index: usize) -> Option<DeviceDescriptor> {
        self.devices
            .lock()
            .get(index)
            .map(|d| d.0.lock().descriptor.clone())
    }

    fn open(&mut self, index: usize) -> Result<Box<dyn DeviceDriver>, DeviceError> {
        let devices = self.devices.lock();
        let device = devices.get(index).ok_or(DeviceError::OpenFailed {
            index,
            reason: "index out of range".into(),
        })?;
        let state = device.0.lock();
        if state.fail_open || !state.attached {
            return Err(DeviceError::OpenFailed {
                index,
                reason: "mock open failure".into(),
            });
        }
        drop(state);
        Ok(Box::new(MockDriver {
            state: Arc::clone(&device.0),
        }))
    }
}

/// Shared state of the mock native back-end.
#[derive(Debug, Default)]
struct MockNativeState {
    connected: [bool; 4],
    pads: [NativePadState; 4],
    vibrations: Vec<(u8, u16, u16)>,
}

/// A [`NativeBackend`] with four scriptable slots.
#[derive(Debug, Clone, Default)]
pub struct MockNativeBackend {
    state: Arc<Mutex<MockNativeState>>,
}

impl MockNativeBackend {
    /// All slots start disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect or disconnect a slot.
    pub fn set_connected(&self, slot: u8, connected: bool) {
        self.state.lock().connected[usize::from(slot)] = connected;
    }

    /// Set the report a slot returns.
    pub fn set_state(&self, slot: u8, pad: NativePadState) {
        self.state.lock().pads[usize::from(slot)] = pad;
    }

    /// Every `set_vibration` call so far, as `(slot, left, right)`.
    pub fn vibrations(&self) -> Vec<(u8, u16, u16)> {
        self.state.lock().vibrations.clone()
    }
}

impl NativeBackend for MockNativeBackend {
    fn probe(&mut self, slot: u8) -> bool {
        usize::from(slot) < 4 && self.state.lock().connected[usize::from(slot)]
    }

    fn read(&mut self, slot: u8) -> Result<NativePadState, DeviceError> {
        let state = self.state.lock();
        if !state.connected[usize::from(slot)] {
            return Err(DeviceError::NativeSlot {
                slot,
                reason: "not connected".into(),
            });
        }
        Ok(state.pads[usize::from(slot)])
    }

    fn set_vibration(&mut self, slot: u8, left: u16, right: u16) -> Result<(), DeviceError> {
        self.state.lock().vibrations.push((slot, left, right));
        Ok(())
    }
}
