//! The pipeline context and cycle driver.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::Mutex;

use padforge_bus::VirtualBus;
use padforge_devices::{InputBackend, NativeBackend, PhysicalDevice, SupplementalButtons};
use padforge_errors::Stage;
use padforge_ffb::FfState;
use padforge_schemas::{InstanceId, XboxGamepad, SLOT_COUNT};

use crate::assignments::{AssignmentSet, SharedAssignments};
use crate::events::EventBus;
use crate::shared::{CombinedSnapshots, LoopbackSet, VibrationSlots};
use crate::slots::VirtualSlots;
use crate::stages;

/// Everything one polling cycle works on.
///
/// The pipeline thread owns this exclusively; the `Arc`ed members are
/// the documented sharing points with consumers. Stage modules under
/// [`crate::stages`] each expose `run(&mut Pipeline)` and are executed
/// in order by [`Pipeline::run_cycle`].
pub struct Pipeline {
    pub(crate) input: Box<dyn InputBackend>,
    pub(crate) native: Box<dyn NativeBackend>,

    /// Device collection, shared with consumers under the lock
    pub(crate) devices: Arc<Mutex<Vec<PhysicalDevice>>>,
    /// Per-device force-feedback state, pipeline-owned
    pub(crate) ff: HashMap<InstanceId, FfState>,

    /// The double-buffered assignment handle
    pub(crate) shared_assignments: Arc<SharedAssignments>,
    /// The snapshot this cycle maps against
    pub(crate) assignments: Arc<AssignmentSet>,
    pub(crate) assignments_generation: u64,

    /// Per-assignment staging outputs, parallel to `assignments.list`
    pub(crate) staging: Vec<XboxGamepad>,
    /// Whether the assignment's device was online when staged
    pub(crate) staging_online: Vec<bool>,
    /// Per-slot member indices, sorted by sort order; rebuilt on
    /// snapshot swap so the combine stage allocates nothing per cycle
    pub(crate) slot_members: [Vec<usize>; SLOT_COUNT],

    /// This cycle's combined outputs
    pub(crate) combined: [XboxGamepad; SLOT_COUNT],
    /// Whether each slot had ≥1 online enabled assignment this cycle
    pub(crate) slot_active: [bool; SLOT_COUNT],

    /// Readback snapshots for consumers
    pub(crate) combined_out: Arc<CombinedSnapshots>,
    /// Per-slot vibration from bus callbacks
    pub(crate) vibration: Arc<VibrationSlots>,
    /// OS slots occupied by our own virtual controllers
    pub(crate) loopback: Arc<LoopbackSet>,
    /// The four virtual-controller state machines
    pub(crate) slots: VirtualSlots,

    pub(crate) events: Arc<EventBus>,

    /// Auxiliary poller publication bank and the device → slot mapping
    pub(crate) supplemental: Arc<SupplementalButtons>,
    pub(crate) supplemental_map: HashMap<InstanceId, usize>,
}

/// The shared endpoints a [`Pipeline`] publishes into, handed to both
/// the pipeline and its consumers.
#[derive(Debug, Clone, Default)]
pub struct PipelineShared {
    /// Device collection
    pub devices: Arc<Mutex<Vec<PhysicalDevice>>>,
    /// Assignment handle
    pub assignments: Arc<SharedAssignments>,
    /// Combined-output snapshots
    pub combined: Arc<CombinedSnapshots>,
    /// Vibration cells
    pub vibration: Arc<VibrationSlots>,
    /// Loopback-occupied set
    pub loopback: Arc<LoopbackSet>,
    /// Supplemental button bank
    pub supplemental: Arc<SupplementalButtons>,
    /// Event bus
    pub events: Arc<EventBus>,
}

impl Pipeline {
    /// Assemble a pipeline over the given backends and shared endpoints.
    pub fn new(
        input: Box<dyn InputBackend>,
        native: Box<dyn NativeBackend>,
        bus: Box<dyn VirtualBus>,
        shared: &PipelineShared,
        grace_cycles: u32,
    ) -> Self {
        let slots = VirtualSlots::new(
            bus,
            grace_cycles,
            Arc::clone(&shared.vibration),
            Arc::clone(&shared.loopback),
            Arc::clone(&shared.events),
        );
        let mut pipeline = Self {
            input,
            native,
            devices: Arc::clone(&shared.devices),
            ff: HashMap::new(),
            shared_assignments: Arc::clone(&shared.assignments),
            assignments: shared.assignments.snapshot(),
            assignments_generation: shared.assignments.generation(),
            staging: Vec::new(),
            staging_online: Vec::new(),
            slot_members: Default::default(),
            combined: [XboxGamepad::NEUTRAL; SLOT_COUNT],
            slot_active: [false; SLOT_COUNT],
            combined_out: Arc::clone(&shared.combined),
            vibration: Arc::clone(&shared.vibration),
            loopback: Arc::clone(&shared.loopback),
            slots,
            events: Arc::clone(&shared.events),
            supplemental: Arc::clone(&shared.supplemental),
            supplemental_map: HashMap::new(),
        };
        pipeline.rebuild_assignment_buffers();
        pipeline
    }

    /// Route a supplemental poller slot's buttons into a device.
    pub fn map_supplemental(&mut self, device: InstanceId, slot: usize) {
        self.supplemental_map.insert(device, slot);
    }

    /// Shrink the virtual-slot poll interval (test support).
    pub fn set_slot_poll_interval(&mut self, interval: std::time::Duration) {
        self.slots.set_poll_interval(interval);
    }

    /// Run one full cycle: swap in any newly published assignment list,
    /// then stages 1 through 6 in order.
    ///
    /// A panicking stage is a should-be-unreachable condition: it is
    /// reported with its stage attribution and the cycle moves on, so
    /// one bad cycle never takes the polling thread down.
    pub fn run_cycle(&mut self) {
        self.refresh_assignments();

        const STAGES: [(Stage, fn(&mut Pipeline)); 6] = [
            (Stage::Enumerate, stages::enumerate::run),
            (Stage::Read, stages::read::run),
            (Stage::Map, stages::map::run),
            (Stage::Combine, stages::combine::run),
            (Stage::Output, stages::output::run),
            (Stage::Readback, stages::readback::run),
        ];

        for (stage, run) in STAGES {
            if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| run(self))) {
                let message = panic_text(&panic);
                self.events
                    .error(stage, None, format!("stage panicked: {message}"));
            }
        }
    }

    /// Tear down all virtual controllers, as on engine shutdown.
    pub fn shutdown(&mut self) {
        self.slots.detach_all();
    }

    /// The "bus driver missing" flag surfaced to the UI.
    pub fn missing_driver_flag(&self) -> Arc<std::sync::atomic::AtomicBool> {
        self.slots.missing_driver_flag()
    }

    /// Swap in a newer assignment snapshot if one was published.
    /// Returns true when the snapshot changed.
    pub(crate) fn refresh_assignments(&mut self) -> bool {
        let generation = self.shared_assignments.generation();
        if generation == self.assignments_generation {
            return false;
        }
        self.assignments = self.shared_assignments.snapshot();
        self.assignments_generation = generation;
        self.rebuild_assignment_buffers();
        true
    }

    fn rebuild_assignment_buffers(&mut self) {
        let len = self.assignments.list.len();
        self.staging.clear();
        self.staging.resize(len, XboxGamepad::NEUTRAL);
        self.staging_online.clear();
        self.staging_online.resize(len, false);
        for slot in 0..SLOT_COUNT {
            self.slot_members[slot] = self.assignments.slot_members(slot as u8);
        }
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
