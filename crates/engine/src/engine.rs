//! The engine facade: thread lifecycle around the pipeline.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use padforge_bus::VirtualBus;
use padforge_devices::{InputBackend, NativeBackend};
use padforge_scheduler::CycleScheduler;

use crate::events::{EngineEvent, ErrorEvent, EventBus};
use crate::pipeline::{Pipeline, PipelineShared};
use crate::DEFAULT_GRACE_CYCLES;

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Polling period; 1 ms by default
    pub period: Duration,
    /// Consecutive inactive cycles before a virtual controller is
    /// destroyed
    pub grace_cycles: u32,
    /// How many cycles between frequency-updated events (≈1 s at 1 kHz)
    pub frequency_publish_cycles: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1),
            grace_cycles: DEFAULT_GRACE_CYCLES,
            frequency_publish_cycles: 1_000,
        }
    }
}

/// The shared endpoints consumers hold while the engine runs.
pub type EngineHandles = PipelineShared;

/// Owns the pipeline thread and the cooperative shutdown flag.
///
/// ```no_run
/// use padforge_bus::MockBus;
/// use padforge_devices::mock::{MockInputBackend, MockNativeBackend};
/// use padforge_engine::{Engine, EngineConfig};
///
/// let mut engine = Engine::new(
///     Box::new(MockInputBackend::new()),
///     Box::new(MockNativeBackend::new()),
///     Box::new(MockBus::new()),
///     EngineConfig::default(),
/// );
/// let events = engine.handles().events.subscribe();
/// engine.start().expect("spawn");
/// // ... run ...
/// engine.stop();
/// # drop(events);
/// ```
pub struct Engine {
    handles: EngineHandles,
    config: EngineConfig,
    running: Arc<AtomicBool>,
    missing_driver: Arc<AtomicBool>,
    pipeline: Option<Pipeline>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Assemble an engine over the three platform backends.
    pub fn new(
        input: Box<dyn InputBackend>,
        native: Box<dyn NativeBackend>,
        bus: Box<dyn VirtualBus>,
        config: EngineConfig,
    ) -> Self {
        let handles = EngineHandles::default();
        let pipeline = Pipeline::new(input, native, bus, &handles, config.grace_cycles);
        let missing_driver = pipeline.missing_driver_flag();
        Self {
            handles,
            config,
            running: Arc::new(AtomicBool::new(false)),
            missing_driver,
            pipeline: Some(pipeline),
            thread: None,
        }
    }

    /// The shared endpoints: devices, assignments, combined outputs,
    /// events.
    pub fn handles(&self) -> &EngineHandles {
        &self.handles
    }

    /// Whether the pipeline thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether virtual output is degraded because the bus driver is
    /// missing.
    pub fn missing_driver(&self) -> bool {
        self.missing_driver.load(Ordering::Relaxed)
    }

    /// Spawn the pipeline thread.
    pub fn start(&mut self) -> std::io::Result<()> {
        let Some(mut pipeline) = self.pipeline.take() else {
            return Ok(()); // already started once
        };
        self.running.store(true, Ordering::Release);

        let running = Arc::clone(&self.running);
        let events = Arc::clone(&self.handles.events);
        let config = self.config.clone();

        let thread = std::thread::Builder::new()
            .name("padforge-pipeline".into())
            .spawn(move || pipeline_main(&mut pipeline, &running, &events, &config))?;
        self.thread = Some(thread);
        tracing::info!(period_us = self.config.period.as_micros() as u64, "engine started");
        Ok(())
    }

    /// Signal shutdown and join the pipeline thread. The loop observes
    /// the flag within one cycle; all virtual controllers detach before
    /// the thread exits.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(()) => tracing::info!("engine stopped"),
                Err(_) => tracing::error!("pipeline thread panicked during shutdown"),
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pipeline_main(
    pipeline: &mut Pipeline,
    running: &AtomicBool,
    events: &EventBus,
    config: &EngineConfig,
) {
    let mut scheduler = CycleScheduler::new(config.period);
    let mut cycles_until_publish = config.frequency_publish_cycles.max(1);

    while running.load(Ordering::Acquire) {
        let tick = scheduler.wait_for_tick();

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| pipeline.run_cycle()));
        if let Err(panic) = outcome {
            let message = panic_message(&panic);
            tracing::error!("pipeline cycle panicked: {message}");
            events.publish(EngineEvent::ErrorOccurred(ErrorEvent {
                message: format!("pipeline stopped: {message}"),
                stage: padforge_errors::Stage::Enumerate,
                device: None,
            }));
            running.store(false, Ordering::Release);
            break;
        }

        cycles_until_publish -= 1;
        if cycles_until_publish == 0 {
            cycles_until_publish = config.frequency_publish_cycles.max(1);
            if let Some(hz) = tick.measured_hz {
                events.publish(EngineEvent::FrequencyUpdated(hz));
            }
        }
    }

    pipeline.shutdown();
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padforge_bus::MockBus;
    use padforge_devices::mock::{MockInputBackend, MockNativeBackend};

    fn engine() -> Engine {
        Engine::new(
            Box::new(MockInputBackend::new()),
            Box::new(MockNativeBackend::new()),
            Box::new(MockBus::new()),
            EngineConfig {
                period: Duration::from_millis(1),
                ..EngineConfig::default()
            },
        )
    }

    #[test]
    fn start_and_stop_join_cleanly() {
        let mut engine = engine();
        engine.start().expect("spawn");
        assert!(engine.is_running());
        std::thread::sleep(Duration::from_millis(20));
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut engine = engine();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn devices_surface_through_handles() {
        let input = MockInputBackend::new();
        input.add(padforge_devices::mock::MockDeviceHandle::new(
            "Stick",
            0x046D,
            0xC215,
            padforge_schemas::DeviceCapabilities::new(2, 8),
        ));

        let mut engine = Engine::new(
            Box::new(input),
            Box::new(MockNativeBackend::new()),
            Box::new(MockBus::new()),
            EngineConfig::default(),
        );
        let events = engine.handles().events.subscribe();
        engine.start().expect("spawn");
        std::thread::sleep(Duration::from_millis(30));
        engine.stop();

        assert_eq!(engine.handles().devices.lock().len(), 1);
        let saw_devices_changed = events
            .try_iter()
            .any(|e| matches!(e, EngineEvent::DevicesChanged));
        assert!(saw_devices_changed);
    }
}
