//! The device-to-slot assignment list, double-buffered.
//!
//! Consumers (the GUI, the settings loader) build a complete new list
//! and publish it; the pipeline notices the bumped generation at the
//! next cycle boundary and swaps its snapshot. The map and combine
//! stages then iterate without taking any lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use padforge_mapping::MappingConfig;
use padforge_schemas::{InstanceId, SLOT_COUNT};

/// One device-to-slot assignment as the pipeline consumes it.
#[derive(Debug, Clone)]
pub struct SlotAssignment {
    /// The bound device
    pub instance_id: InstanceId,
    /// Target virtual slot, 0..=3
    pub slot: u8,
    /// The mapping configuration, shared by reference
    pub config: Arc<MappingConfig>,
    /// Whether this assignment participates
    pub enabled: bool,
    /// Tie-break order within a slot
    pub sort_order: i32,
}

impl SlotAssignment {
    /// A basic enabled assignment.
    pub fn new(instance_id: InstanceId, slot: u8, config: Arc<MappingConfig>) -> Self {
        Self {
            instance_id,
            slot,
            config,
            enabled: true,
            sort_order: 0,
        }
    }
}

/// An immutable published version of the assignment list.
#[derive(Debug, Default)]
pub struct AssignmentSet {
    /// Assignments in publication order
    pub list: Vec<SlotAssignment>,
}

impl AssignmentSet {
    /// An empty set.
    pub fn new(list: Vec<SlotAssignment>) -> Self {
        Self { list }
    }

    /// Indices of enabled assignments targeting a slot, in sort order
    /// (stable for equal sort keys).
    pub fn slot_members(&self, slot: u8) -> Vec<usize> {
        let mut members: Vec<usize> = self
            .list
            .iter()
            .enumerate()
            .filter(|(_, a)| a.enabled && a.slot == slot && usize::from(a.slot) < SLOT_COUNT)
            .map(|(i, _)| i)
            .collect();
        members.sort_by_key(|&i| self.list[i].sort_order);
        members
    }
}

/// The handle both sides hold: consumers publish, the pipeline swaps.
#[derive(Debug)]
pub struct SharedAssignments {
    current: Mutex<Arc<AssignmentSet>>,
    generation: AtomicU64,
}

impl Default for SharedAssignments {
    fn default() -> Self {
        Self {
            current: Mutex::new(Arc::new(AssignmentSet::default())),
            generation: AtomicU64::new(0),
        }
    }
}

impl SharedAssignments {
    /// A handle with an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a complete new list. Takes effect at the pipeline's next
    /// cycle boundary.
    pub fn publish(&self, set: AssignmentSet) {
        *self.current.lock() = Arc::new(set);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Current generation counter.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Snapshot the current list.
    pub fn snapshot(&self) -> Arc<AssignmentSet> {
        Arc::clone(&self.current.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(slot: u8, sort_order: i32, enabled: bool) -> SlotAssignment {
        SlotAssignment {
            instance_id: InstanceId::from_triple(1, 2, usize::from(slot)),
            slot,
            config: Arc::new(MappingConfig::default()),
            enabled,
            sort_order,
        }
    }

    #[test]
    fn slot_members_filter_and_sort() {
        let set = AssignmentSet::new(vec![
            assignment(1, 5, true),
            assignment(0, 0, true),
            assignment(1, -1, true),
            assignment(1, 3, false),
        ]);
        assert_eq!(set.slot_members(1), vec![2, 0]);
        assert_eq!(set.slot_members(0), vec![1]);
        assert!(set.slot_members(2).is_empty());
    }

    #[test]
    fn equal_sort_orders_keep_publication_order() {
        let set = AssignmentSet::new(vec![
            assignment(0, 7, true),
            assignment(0, 7, true),
            assignment(0, 7, true),
        ]);
        assert_eq!(set.slot_members(0), vec![0, 1, 2]);
    }

    #[test]
    fn publish_bumps_generation() {
        let shared = SharedAssignments::new();
        let before = shared.generation();
        shared.publish(AssignmentSet::new(vec![assignment(0, 0, true)]));
        assert!(shared.generation() > before);
        assert_eq!(shared.snapshot().list.len(), 1);
    }
}
