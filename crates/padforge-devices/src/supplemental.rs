//! Publication slots for auxiliary HID pollers.
//!
//! Some buttons (the Share button on newer pads, wheel rim displays'
//! encoders) only surface through HID feature reports that short-lived
//! helper threads poll at ~60 Hz. Each poller owns one slot in a fixed
//! array and publishes a 32-bit button word with relaxed stores; the
//! read stage ORs the word into the owning device's snapshot above its
//! declared button count.

use std::sync::atomic::{AtomicU32, Ordering};

use padforge_schemas::RawInputState;

/// Number of publication slots.
pub const SUPPLEMENTAL_SLOTS: usize = 8;

/// Fixed array of relaxed-atomic button words.
#[derive(Debug, Default)]
pub struct SupplementalButtons {
    slots: [AtomicU32; SUPPLEMENTAL_SLOTS],
}

impl SupplementalButtons {
    /// A bank with every slot cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a button word from a poller thread. Relaxed: the word is
    /// self-contained and torn reads are impossible on a single u32.
    pub fn publish(&self, slot: usize, word: u32) {
        if let Some(cell) = self.slots.get(slot) {
            cell.store(word, Ordering::Relaxed);
        }
    }

    /// Read a slot's current word.
    pub fn load(&self, slot: usize) -> u32 {
        self.slots
            .get(slot)
            .map(|cell| cell.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// OR a slot's bits into a snapshot starting at `base_index`
    /// (typically the device's declared button count).
    pub fn merge_into(&self, slot: usize, raw: &mut RawInputState, base_index: usize) {
        let word = self.load(slot);
        if word == 0 {
            return;
        }
        for bit in 0..32 {
            if word & (1 << bit) != 0 {
                raw.set_button(base_index + bit, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_merge() {
        let bank = SupplementalButtons::new();
        bank.publish(2, 0b101);

        let mut raw = RawInputState::neutral();
        bank.merge_into(2, &mut raw, 16);
        assert!(raw.button(16));
        assert!(!raw.button(17));
        assert!(raw.button(18));
    }

    #[test]
    fn out_of_range_slot_is_inert() {
        let bank = SupplementalButtons::new();
        bank.publish(99, 0xFFFF_FFFF);
        assert_eq!(bank.load(99), 0);
    }

    #[test]
    fn zero_word_is_a_no_op() {
        let bank = SupplementalButtons::new();
        let mut raw = RawInputState::neutral();
        bank.merge_into(0, &mut raw, 0);
        assert_eq!(raw, RawInputState::neutral());
    }
}
