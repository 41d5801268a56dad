//! Virtual-controller lifecycle, one state machine per slot.
//!
//! A slot is active while at least one online enabled assignment targets
//! it. Activation plugs a virtual controller into the bus and records
//! the OS XInput slot it lands on into the loopback set, so the
//! enumerator never reads our own output back as an input. Deactivation
//! starts a grace countdown instead of tearing down immediately:
//! destroying the controller severs the game's vibration binding, and a
//! transient enumeration gap must not cost the user that.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use padforge_bus::{BusHandle, VirtualBus};
use padforge_errors::{BusError, Stage};
use padforge_schemas::{Vibration, XboxGamepad, SLOT_COUNT};

use crate::events::EventBus;
use crate::shared::{LoopbackSet, VibrationSlots};

/// Hard ceiling on the wait for OS slot propagation after connect.
const SLOT_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug)]
enum Phase {
    Detached,
    Attached {
        handle: BusHandle,
        os_slot: Option<u8>,
        /// `Some(n)` while in grace: n consecutive inactive cycles seen
        grace: Option<u32>,
    },
}

/// The four per-slot state machines plus the bus they drive.
pub struct VirtualSlots {
    bus: Box<dyn VirtualBus>,
    phases: [Phase; SLOT_COUNT],
    grace_cycles: u32,
    vibration: Arc<VibrationSlots>,
    loopback: Arc<LoopbackSet>,
    events: Arc<EventBus>,
    /// Latched when the bus driver turns out to be missing: the output
    /// stage degrades to a no-op and the flag is surfaced to the UI.
    missing_driver: Arc<AtomicBool>,
    /// Sleep granularity while polling for slot propagation; tests with
    /// a mock bus shrink this to keep the bounded wait cheap.
    poll_interval: Duration,
}

impl std::fmt::Debug for VirtualSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualSlots")
            .field("phases", &self.phases)
            .field("grace_cycles", &self.grace_cycles)
            .finish_non_exhaustive()
    }
}

impl VirtualSlots {
    /// A manager with all slots detached.
    pub fn new(
        bus: Box<dyn VirtualBus>,
        grace_cycles: u32,
        vibration: Arc<VibrationSlots>,
        loopback: Arc<LoopbackSet>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            bus,
            phases: [Phase::Detached, Phase::Detached, Phase::Detached, Phase::Detached],
            grace_cycles: grace_cycles.max(1),
            vibration,
            loopback,
            events,
            missing_driver: Arc::new(AtomicBool::new(false)),
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Shrink the slot-propagation poll interval (test support).
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// The user-visible "bus driver missing" flag.
    pub fn missing_driver_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.missing_driver)
    }

    /// Whether virtual output is degraded to a no-op.
    pub fn is_disabled(&self) -> bool {
        self.missing_driver.load(Ordering::Relaxed)
    }

    /// Whether a virtual controller currently exists for the slot.
    pub fn is_attached(&self, slot: usize) -> bool {
        matches!(self.phases[slot], Phase::Attached { .. })
    }

    /// Drive one slot for one cycle.
    pub fn drive(&mut self, slot: usize, active: bool, report: &XboxGamepad) {
        if self.is_disabled() {
            return;
        }
        match (self.is_attached(slot), active) {
            (false, false) => {}
            (false, true) => {
                if let Some(phase) = self.attach(slot) {
                    self.phases[slot] = phase;
                    self.submit(slot, report);
                }
            }
            (true, true) => {
                if let Phase::Attached { grace, .. } = &mut self.phases[slot] {
                    *grace = None;
                }
                self.submit(slot, report);
            }
            (true, false) => {
                let inactive_cycles = match &self.phases[slot] {
                    Phase::Attached { grace, .. } => grace.map_or(1, |n| n.saturating_add(1)),
                    Phase::Detached => return,
                };
                if inactive_cycles >= self.grace_cycles {
                    self.detach(slot);
                } else {
                    if let Phase::Attached { grace, .. } = &mut self.phases[slot] {
                        *grace = Some(inactive_cycles);
                    }
                    // Keep the controller fed while it lingers.
                    self.submit(slot, &XboxGamepad::NEUTRAL);
                }
            }
        }
    }

    /// Tear down every attached controller, as on shutdown.
    pub fn detach_all(&mut self) {
        for slot in 0..SLOT_COUNT {
            if self.is_attached(slot) {
                self.detach(slot);
            }
        }
    }

    fn attach(&mut self, slot: usize) -> Option<Phase> {
        let handle = match self.bus.create() {
            Ok(handle) => handle,
            Err(e @ BusError::Unavailable(_)) => {
                // Missing driver: degrade once instead of failing every
                // cycle, and leave the rest of the pipeline running.
                self.missing_driver.store(true, Ordering::Relaxed);
                self.events
                    .error(Stage::Output, None, format!("virtual output disabled: {e}"));
                return None;
            }
            Err(e) => {
                self.events
                    .error(Stage::Output, None, format!("slot {slot}: {e}"));
                return None;
            }
        };
        if let Err(e) = self.bus.connect(handle) {
            self.events
                .error(Stage::Output, None, format!("slot {slot}: {e}"));
            let _ = self.bus.disconnect(handle);
            return None;
        }

        // Route game rumble for this virtual pad into the slot's cell.
        let vibration = Arc::clone(&self.vibration);
        if let Err(e) = self.bus.set_feedback_handler(
            handle,
            Box::new(move |large, small| {
                vibration.store(slot, Vibration::from_feedback_bytes(large, small));
            }),
        ) {
            self.events
                .error(Stage::Output, None, format!("slot {slot}: {e}"));
        }

        let os_slot = self.wait_for_os_slot(handle);
        match os_slot {
            Some(os_slot) => {
                self.loopback.insert(os_slot);
                tracing::info!(slot, os_slot, "virtual controller attached");
            }
            None => {
                self.events.error(
                    Stage::Output,
                    None,
                    format!("virtual controller for slot {slot} did not report an OS slot index"),
                );
            }
        }

        Some(Phase::Attached {
            handle,
            os_slot,
            grace: None,
        })
    }

    /// Bounded poll for the OS slot index. An expired wait does not
    /// abort the attachment; it only stops polling.
    fn wait_for_os_slot(&mut self, handle: BusHandle) -> Option<u8> {
        let deadline = Instant::now() + SLOT_WAIT;
        loop {
            if let Some(os_slot) = self.bus.slot_index(handle) {
                return Some(os_slot);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn detach(&mut self, slot: usize) {
        if let Phase::Attached { handle, os_slot, .. } =
            std::mem::replace(&mut self.phases[slot], Phase::Detached)
        {
            // Late propagation: the OS slot may have surfaced after the
            // bounded wait expired, so ask once more before letting go.
            let os_slot = os_slot.or_else(|| self.bus.slot_index(handle));
            if let Err(e) = self.bus.disconnect(handle) {
                self.events
                    .error(Stage::Output, None, format!("slot {slot}: {e}"));
            }
            if let Some(os_slot) = os_slot {
                self.loopback.remove(os_slot);
            }
            self.vibration.clear(slot);
            tracing::info!(slot, "virtual controller detached");
        }
    }

    fn submit(&mut self, slot: usize, report: &XboxGamepad) {
        if let Phase::Attached { handle, .. } = &self.phases[slot] {
            let handle = *handle;
            if let Err(e) = self.bus.submit(handle, report) {
                self.events
                    .error(Stage::Output, None, format!("slot {slot}: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padforge_bus::MockBus;

    fn slots_with(bus: MockBus, grace: u32) -> VirtualSlots {
        let mut slots = VirtualSlots::new(
            Box::new(bus),
            grace,
            Arc::new(VibrationSlots::new()),
            Arc::new(LoopbackSet::new()),
            Arc::new(EventBus::new()),
        );
        slots.set_poll_interval(Duration::from_micros(50));
        slots
    }

    #[test]
    fn activation_attaches_and_marks_loopback() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 10);
        let loopback = Arc::clone(&slots.loopback);

        slots.drive(0, true, &XboxGamepad::NEUTRAL);
        assert!(slots.is_attached(0));
        assert!(loopback.contains(0));
        assert_eq!(bus.connected_handles().len(), 1);
    }

    #[test]
    fn grace_holds_until_the_last_cycle() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 5);

        slots.drive(0, true, &XboxGamepad::NEUTRAL);
        for _ in 0..4 {
            slots.drive(0, false, &XboxGamepad::NEUTRAL);
            assert!(slots.is_attached(0), "destroyed inside the grace window");
        }
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        assert!(!slots.is_attached(0));
        assert!(bus.connected_handles().is_empty());
    }

    #[test]
    fn reactivation_resets_the_grace_counter() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 3);

        slots.drive(0, true, &XboxGamepad::NEUTRAL);
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        slots.drive(0, true, &XboxGamepad::NEUTRAL);

        // The counter restarted: two more inactive cycles are survivable.
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        assert!(slots.is_attached(0));
        slots.drive(0, false, &XboxGamepad::NEUTRAL);
        assert!(!slots.is_attached(0));
    }

    #[test]
    fn oscillation_at_the_boundary_destroys_at_most_once() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 2);

        slots.drive(0, true, &XboxGamepad::NEUTRAL);
        // Oscillate active/inactive: the counter never reaches 2.
        for _ in 0..20 {
            slots.drive(0, false, &XboxGamepad::NEUTRAL);
            slots.drive(0, true, &XboxGamepad::NEUTRAL);
        }
        assert!(slots.is_attached(0));
        assert_eq!(bus.connected_handles().len(), 1);
    }

    #[test]
    fn detach_clears_loopback_and_vibration() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 1);
        let loopback = Arc::clone(&slots.loopback);
        let vibration = Arc::clone(&slots.vibration);

        slots.drive(1, true, &XboxGamepad::NEUTRAL);
        vibration.store(1, Vibration::new(100, 100));

        slots.drive(1, false, &XboxGamepad::NEUTRAL);
        assert!(!slots.is_attached(1));
        assert_eq!(loopback.mask(), 0);
        assert_eq!(vibration.load(1), Vibration::OFF);
    }

    #[test]
    fn feedback_lands_in_the_slot_cell() {
        let bus = MockBus::new();
        let mut slots = slots_with(bus.clone(), 10);
        let vibration = Arc::clone(&slots.vibration);

        slots.drive(2, true, &XboxGamepad::NEUTRAL);
        let handle = bus.connected_handles()[0];
        bus.inject_feedback(handle, 2, 1);
        assert_eq!(vibration.load(2), Vibration::new(514, 257));
    }

    #[test]
    fn unavailable_bus_reports_and_stays_detached() {
        let bus = MockBus::new();
        bus.set_unavailable(true);
        let events = Arc::new(EventBus::new());
        let rx = events.subscribe();
        let mut slots = VirtualSlots::new(
            Box::new(bus),
            10,
            Arc::new(VibrationSlots::new()),
            Arc::new(LoopbackSet::new()),
            events,
        );

        slots.drive(0, true, &XboxGamepad::NEUTRAL);
        assert!(!slots.is_attached(0));
        assert!(matches!(
            rx.try_recv(),
            Ok(crate::events::EngineEvent::ErrorOccurred(_))
        ));
    }
}
