//! The engine's event streams.
//!
//! Four streams leave the core: `devices-changed`, `frequency-updated`,
//! `error-occurred`, and per-device `state-changed`. Events are emitted
//! from the pipeline thread and from bus callback threads; subscribers
//! get their own bounded channel and must marshal to their own thread.
//! A subscriber that stops draining loses events rather than stalling a
//! cycle.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use padforge_errors::Stage;
use padforge_schemas::InstanceId;

/// Capacity of each subscriber's channel.
const SUBSCRIBER_BUFFER: usize = 1_024;

/// One reported pipeline error.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// Human-readable message
    pub message: String,
    /// Which stage reported it
    pub stage: Stage,
    /// The device involved, when the error is per-device
    pub device: Option<InstanceId>,
}

/// Everything the core publishes.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A device transitioned online/offline or was created
    DevicesChanged,
    /// Measured pipeline frequency in Hz
    FrequencyUpdated(f64),
    /// A caught error, per the no-silent-swallowing policy
    ErrorOccurred(ErrorEvent),
    /// A device's raw snapshot changed (recorder support)
    StateChanged(InstanceId),
}

/// Fan-out of [`EngineEvent`]s to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<EngineEvent>>>,
}

impl EventBus {
    /// A bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publish to every live subscriber without blocking. Full channels
    /// drop the event; disconnected subscribers are pruned.
    pub fn publish(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Shorthand for publishing an [`EngineEvent::ErrorOccurred`].
    pub fn error(&self, stage: Stage, device: Option<InstanceId>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stage = %stage, ?device, "{message}");
        self.publish(EngineEvent::ErrorOccurred(ErrorEvent {
            message,
            stage,
            device,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.publish(EngineEvent::DevicesChanged);
        assert!(matches!(
            rx.try_recv(),
            Ok(EngineEvent::DevicesChanged)
        ));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);
        bus.publish(EngineEvent::DevicesChanged);
        assert!(bus.subscribers.lock().is_empty());
    }

    #[test]
    fn slow_subscriber_never_blocks_publish() {
        let bus = EventBus::new();
        let _rx = bus.subscribe();
        // Overfill: publish must stay non-blocking and keep the
        // subscriber for when it starts draining again.
        for _ in 0..(SUBSCRIBER_BUFFER + 10) {
            bus.publish(EngineEvent::DevicesChanged);
        }
        assert_eq!(bus.subscribers.lock().len(), 1);
    }

    #[test]
    fn error_shorthand_carries_stage_and_device() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        bus.error(Stage::Read, Some(InstanceId::xinput(1)), "sample failed");
        match rx.try_recv() {
            Ok(EngineEvent::ErrorOccurred(e)) => {
                assert_eq!(e.stage, Stage::Read);
                assert_eq!(e.device, Some(InstanceId::xinput(1)));
                assert_eq!(e.message, "sample failed");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
