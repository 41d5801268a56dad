//! Shared-state primitives between the pipeline and its consumers.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use padforge_schemas::{Vibration, XboxGamepad, SLOT_COUNT};

/// The per-slot combined outputs surfaced to consumers.
///
/// The readback stage is the only writer; the GUI and telemetry read at
/// display cadence from their own threads. A gamepad report is wider
/// than anything the platform can store atomically, so each slot pairs
/// its report with a cycle counter: the counter is odd exactly while
/// the report is being replaced, and a completed publication lands on
/// the next even value. A reader that loads an odd counter, or whose
/// counter moved between its two loads, caught the writer mid-report
/// and takes the report again; at 1 kHz the retry window is a handful
/// of stores, so readers never wait long and never observe half of one
/// cycle's report spliced onto half of another's.
pub struct CombinedSnapshots {
    cycles: [AtomicU32; SLOT_COUNT],
    reports: [UnsafeCell<XboxGamepad>; SLOT_COUNT],
}

// Safety: `reports` is only dereferenced under the cycle-counter
// protocol above. The single writer makes the counter odd before
// touching a report and even after; readers discard any report whose
// surrounding counter loads were odd or unequal. XboxGamepad is plain
// Copy data, so a discarded in-flight read has no side effects.
unsafe impl Sync for CombinedSnapshots {}

impl Default for CombinedSnapshots {
    fn default() -> Self {
        Self {
            cycles: [
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
            reports: [
                UnsafeCell::new(XboxGamepad::NEUTRAL),
                UnsafeCell::new(XboxGamepad::NEUTRAL),
                UnsafeCell::new(XboxGamepad::NEUTRAL),
                UnsafeCell::new(XboxGamepad::NEUTRAL),
            ],
        }
    }
}

impl std::fmt::Debug for CombinedSnapshots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for slot in 0..SLOT_COUNT {
            list.entry(&self.read(slot));
        }
        list.finish()
    }
}

impl CombinedSnapshots {
    /// All slots neutral.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a slot's combined report (readback stage only).
    pub fn publish(&self, slot: usize, report: XboxGamepad) {
        if slot >= SLOT_COUNT {
            return;
        }
        let cycle = &self.cycles[slot];
        let opened = cycle.load(Ordering::Relaxed).wrapping_add(1);
        cycle.store(opened, Ordering::Release);
        unsafe {
            *self.reports[slot].get() = report;
        }
        cycle.store(opened.wrapping_add(1), Ordering::Release);
    }

    /// Read a slot's combined report. Out-of-range slots read neutral.
    pub fn read(&self, slot: usize) -> XboxGamepad {
        if slot >= SLOT_COUNT {
            return XboxGamepad::NEUTRAL;
        }
        let cycle = &self.cycles[slot];
        loop {
            let before = cycle.load(Ordering::Acquire);
            if before & 1 == 0 {
                let report = unsafe { *self.reports[slot].get() };
                if cycle.load(Ordering::Acquire) == before {
                    return report;
                }
            }
            std::hint::spin_loop();
        }
    }
}

/// Per-slot vibration cells written by bus callback threads and drained
/// by the read stage. Both motors pack into one word so a callback is a
/// single relaxed store.
#[derive(Debug, Default)]
pub struct VibrationSlots {
    cells: [AtomicU32; SLOT_COUNT],
}

impl VibrationSlots {
    /// All motors off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a slot's vibration (bus callback threads).
    pub fn store(&self, slot: usize, vibration: Vibration) {
        if let Some(cell) = self.cells.get(slot) {
            cell.store(vibration.pack(), Ordering::Relaxed);
        }
    }

    /// Load a slot's current vibration (pipeline thread).
    pub fn load(&self, slot: usize) -> Vibration {
        self.cells
            .get(slot)
            .map(|cell| Vibration::unpack(cell.load(Ordering::Relaxed)))
            .unwrap_or(Vibration::OFF)
    }

    /// Clear a slot, as when its virtual controller is destroyed.
    pub fn clear(&self, slot: usize) {
        self.store(slot, Vibration::OFF);
    }
}

/// The set of OS XInput slots occupied by our own virtual controllers.
///
/// Written by the output stage when controllers come and go; read by the
/// enumerator to keep our own outputs from re-entering as inputs.
#[derive(Debug, Default)]
pub struct LoopbackSet {
    mask: Mutex<u8>,
}

impl LoopbackSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an OS slot as ours.
    pub fn insert(&self, os_slot: u8) {
        *self.mask.lock() |= 1 << os_slot;
    }

    /// Release an OS slot.
    pub fn remove(&self, os_slot: u8) {
        *self.mask.lock() &= !(1 << os_slot);
    }

    /// Whether an OS slot is ours.
    pub fn contains(&self, os_slot: u8) -> bool {
        *self.mask.lock() & (1 << os_slot) != 0
    }

    /// The whole mask.
    pub fn mask(&self) -> u8 {
        *self.mask.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padforge_schemas::buttons;

    #[test]
    fn slots_start_neutral_and_return_last_publish() {
        let combined = CombinedSnapshots::new();
        assert_eq!(combined.read(0), XboxGamepad::NEUTRAL);

        let report = XboxGamepad {
            buttons: buttons::A | buttons::START,
            left_trigger: 200,
            ..XboxGamepad::NEUTRAL
        };
        combined.publish(0, report);
        assert_eq!(combined.read(0), report);
        // Other slots are untouched.
        assert_eq!(combined.read(1), XboxGamepad::NEUTRAL);

        combined.publish(0, XboxGamepad::NEUTRAL);
        assert_eq!(combined.read(0), XboxGamepad::NEUTRAL);
    }

    #[test]
    fn out_of_range_slots_read_neutral() {
        let combined = CombinedSnapshots::new();
        combined.publish(SLOT_COUNT + 1, XboxGamepad {
            buttons: 0xFFFF,
            ..XboxGamepad::NEUTRAL
        });
        assert_eq!(combined.read(SLOT_COUNT + 1), XboxGamepad::NEUTRAL);
    }

    #[test]
    fn readers_never_see_a_report_from_two_cycles() {
        use std::sync::Arc;

        // The writer always publishes reports whose stick axes mirror
        // each other, so any spliced read shows up as a mismatch.
        let combined = Arc::new(CombinedSnapshots::new());
        let reader = {
            let combined = Arc::clone(&combined);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    let report = combined.read(2);
                    assert_eq!(report.thumb_lx, report.thumb_rx, "spliced report observed");
                    assert_eq!(report.left_trigger, report.right_trigger);
                }
            })
        };
        for i in 0..10_000u16 {
            let axis = i as i16;
            combined.publish(2, XboxGamepad {
                left_trigger: i as u8,
                right_trigger: i as u8,
                thumb_lx: axis,
                thumb_rx: axis,
                ..XboxGamepad::NEUTRAL
            });
        }
        reader.join().expect("reader thread");
    }

    #[test]
    fn vibration_slots_round_trip() {
        let slots = VibrationSlots::new();
        slots.store(2, Vibration::new(500, 200));
        assert_eq!(slots.load(2), Vibration::new(500, 200));
        assert_eq!(slots.load(0), Vibration::OFF);

        slots.clear(2);
        assert_eq!(slots.load(2), Vibration::OFF);
    }

    #[test]
    fn out_of_range_vibration_slot_is_inert() {
        let slots = VibrationSlots::new();
        slots.store(9, Vibration::new(1, 1));
        assert_eq!(slots.load(9), Vibration::OFF);
    }

    #[test]
    fn loopback_mask_tracks_inserts_and_removes() {
        let set = LoopbackSet::new();
        set.insert(2);
        set.insert(0);
        assert!(set.contains(2));
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert_eq!(set.mask(), 0b0101);

        set.remove(2);
        assert!(!set.contains(2));
        assert_eq!(set.mask(), 0b0001);
    }
}
