//! Scripted in-memory devices for `padforge run --demo`.
//!
//! Builds the engine over the mock backends with one virtual joystick
//! whose inputs move on their own, so the whole pipeline (enumeration,
//! mapping, combination, virtual output) can be watched without any
//! hardware or drivers.

use std::time::Duration;

use anyhow::Result;

use padforge_bus::MockBus;
use padforge_devices::mock::{MockDeviceHandle, MockInputBackend, MockNativeBackend};
use padforge_engine::{Engine, EngineConfig};
use padforge_schemas::DeviceCapabilities;

/// Vendor/product identity of the demo stick. Stable so saved settings
/// keep matching it across runs.
pub const DEMO_VID: u16 = 0x0F0F;
pub const DEMO_PID: u16 = 0x0001;

pub fn build_engine(config: EngineConfig) -> Result<Engine> {
    let input = MockInputBackend::new();
    let stick = input.add(MockDeviceHandle::new(
        "PadForge Demo Stick",
        DEMO_VID,
        DEMO_PID,
        DeviceCapabilities::new(2, 4).with_hats(1).with_rumble(),
    ));

    spawn_animator(stick);

    Ok(Engine::new(
        Box::new(input),
        Box::new(MockNativeBackend::new()),
        Box::new(MockBus::new()),
        config,
    ))
}

/// Move the demo stick in a slow circle and tap button 0 once a second.
fn spawn_animator(stick: MockDeviceHandle) {
    std::thread::Builder::new()
        .name("padforge-demo".into())
        .spawn(move || {
            let mut step = 0u32;
            loop {
                let angle = f64::from(step) * 0.05;
                let (sin, cos) = angle.sin_cos();
                stick.set_axis(0, (sin * 28_000.0) as i16);
                stick.set_axis(1, (cos * 28_000.0) as i16);
                stick.set_button(0, step % 60 < 30);
                step = step.wrapping_add(1);
                std::thread::sleep(Duration::from_millis(16));
            }
        })
        .ok();
}
