//! In-memory bus for headless pipeline tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use padforge_errors::BusError;
use padforge_schemas::XboxGamepad;

use crate::{BusHandle, FeedbackFn, VirtualBus};

#[derive(Default)]
struct MockTarget {
    connected: bool,
    os_slot: Option<u8>,
    /// How many more `slot_index` polls return `None` before the slot
    /// surfaces, emulating the OS's asynchronous assignment.
    slot_delay: u32,
    submissions: u64,
    last_report: XboxGamepad,
    feedback: Option<Arc<FeedbackFn>>,
}

#[derive(Default)]
struct MockBusState {
    next_handle: u64,
    next_os_slot: u8,
    slot_delay: u32,
    unavailable: bool,
    targets: HashMap<u64, MockTarget>,
}

/// A scriptable [`VirtualBus`].
///
/// Tests control whether the driver looks installed, how long OS slot
/// assignment takes, and can inject game rumble; the pipeline side sees
/// exactly the contract a real bus wrapper provides.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl std::fmt::Debug for MockBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockBus")
            .field("targets", &state.targets.len())
            .field("unavailable", &state.unavailable)
            .finish()
    }
}

impl MockBus {
    /// A bus with the driver "installed" and instant slot assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `create` fail as if the driver were missing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Delay OS slot assignment by `polls` calls to `slot_index`.
    pub fn set_slot_delay(&self, polls: u32) {
        self.state.lock().slot_delay = polls;
    }

    /// Inject game rumble for a controller, as the driver thread would.
    pub fn inject_feedback(&self, handle: BusHandle, large: u8, small: u8) {
        let callback = {
            let state = self.state.lock();
            state
                .targets
                .get(&handle.0)
                .and_then(|t| t.feedback.clone())
        };
        // Called outside the lock: a real driver fires on its own thread
        // with no bus state held.
        if let Some(callback) = callback {
            callback(large, small);
        }
    }

    /// Number of reports submitted to a controller so far.
    pub fn submission_count(&self, handle: BusHandle) -> u64 {
        self.state
            .lock()
            .targets
            .get(&handle.0)
            .map(|t| t.submissions)
            .unwrap_or(0)
    }

    /// The most recent report submitted to a controller.
    pub fn last_report(&self, handle: BusHandle) -> Option<XboxGamepad> {
        self.state
            .lock()
            .targets
            .get(&handle.0)
            .filter(|t| t.submissions > 0)
            .map(|t| t.last_report)
    }

    /// Handles of currently connected controllers.
    pub fn connected_handles(&self) -> Vec<BusHandle> {
        let state = self.state.lock();
        let mut handles: Vec<BusHandle> = state
            .targets
            .iter()
            .filter(|(_, t)| t.connected)
            .map(|(&h, _)| BusHandle(h))
            .collect();
        handles.sort_by_key(|h| h.0);
        handles
    }
}

impl VirtualBus for MockBus {
    fn create(&mut self) -> Result<BusHandle, BusError> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(BusError::Unavailable("mock driver not installed".into()));
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        let delay = state.slot_delay;
        state.targets.insert(
            handle,
            MockTarget {
                slot_delay: delay,
                ..MockTarget::default()
            },
        );
        Ok(BusHandle(handle))
    }

    fn connect(&mut self, handle: BusHandle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        let slot = state.next_os_slot;
        state.next_os_slot = (state.next_os_slot + 1) % 4;
        let target = state
            .targets
            .get_mut(&handle.0)
            .ok_or(BusError::UnknownHandle(handle.0))?;
        target.connected = true;
        target.os_slot = Some(slot);
        Ok(())
    }

    fn disconnect(&mut self, handle: BusHandle) -> Result<(), BusError> {
        let mut state = self.state.lock();
        state
            .targets
            .remove(&handle.0)
            .map(|_| ())
            .ok_or(BusError::UnknownHandle(handle.0))
    }

    fn submit(&mut self, handle: BusHandle, report: &XboxGamepad) -> Result<(), BusError> {
        let mut state = self.state.lock();
        let target = state
            .targets
            .get_mut(&handle.0)
            .ok_or(BusError::UnknownHandle(handle.0))?;
        if !target.connected {
            return Err(BusError::SubmitFailed {
                slot: target.os_slot.unwrap_or(0),
                reason: "not connected".into(),
            });
        }
        target.submissions += 1;
        target.last_report = *report;
        Ok(())
    }

    fn slot_index(&self, handle: BusHandle) -> Option<u8> {
        let mut state = self.state.lock();
        let target = state.targets.get_mut(&handle.0)?;
        if !target.connected {
            return None;
        }
        if target.slot_delay > 0 {
            target.slot_delay -= 1;
            return None;
        }
        target.os_slot
    }

    fn set_feedback_handler(
        &mut self,
        handle: BusHandle,
        handler: FeedbackFn,
    ) -> Result<(), BusError> {
        let mut state = self.state.lock();
        let target = state
            .targets
            .get_mut(&handle.0)
            .ok_or(BusError::UnknownHandle(handle.0))?;
        target.feedback = Some(Arc::new(handler));
        Ok(())
    }
}
