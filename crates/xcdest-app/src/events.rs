//! Destination events and their listener registry
//!
//! Each manager owns one [`EventHub`]. Listeners registered with
//! [`EventHub::on`] are called synchronously, in registration order, for the
//! event kind they asked for. Every event is also sent on a broadcast channel
//! for consumers that prefer [`EventHub::subscribe`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use xcdest_core::prelude::*;
use xcdest_core::SelectedDestination;

/// Capacity of the broadcast channel behind [`EventHub::subscribe`]
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Observable change on a destination manager
#[derive(Debug, Clone, PartialEq)]
pub enum DestinationEvent {
    /// The simulator provider's list changed
    SimulatorsUpdated,

    /// The device provider's list changed
    DevicesUpdated,

    /// The workspace selection was set (`Some`) or cleared (`None`)
    XcodeDestinationUpdated(Option<SelectedDestination>),
}

/// Discriminant of [`DestinationEvent`], used to register listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationEventKind {
    SimulatorsUpdated,
    DevicesUpdated,
    XcodeDestinationUpdated,
}

impl DestinationEvent {
    pub fn kind(&self) -> DestinationEventKind {
        match self {
            DestinationEvent::SimulatorsUpdated => DestinationEventKind::SimulatorsUpdated,
            DestinationEvent::DevicesUpdated => DestinationEventKind::DevicesUpdated,
            DestinationEvent::XcodeDestinationUpdated(_) => {
                DestinationEventKind::XcodeDestinationUpdated
            }
        }
    }

    /// Short name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            DestinationEvent::SimulatorsUpdated => "simulatorsUpdated",
            DestinationEvent::DevicesUpdated => "devicesUpdated",
            DestinationEvent::XcodeDestinationUpdated(_) => "xcodeDestinationUpdated",
        }
    }
}

type Listener = Arc<dyn Fn(&DestinationEvent) + Send + Sync>;

/// Per-manager listener registry and broadcast fan-out
pub struct EventHub {
    listeners: Mutex<Vec<(DestinationEventKind, Listener)>>,
    tx: broadcast::Sender<DestinationEvent>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventHub")
            .field("listeners", &count)
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            listeners: Mutex::new(Vec::new()),
            tx,
        }
    }

    /// Register `listener` for events of `kind`
    ///
    /// The same closure may be registered more than once; it is then called
    /// once per registration.
    pub fn on<F>(&self, kind: DestinationEventKind, listener: F)
    where
        F: Fn(&DestinationEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, Arc::new(listener)));
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DestinationEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self, kind: DestinationEventKind) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Deliver `event` to matching listeners, then to subscribers
    pub fn emit(&self, event: DestinationEvent) {
        let kind = event.kind();

        // Snapshot so listeners may register further listeners
        let matching: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| listener.clone())
            .collect();

        trace!(
            "Emitting {} to {} listeners",
            event.event_type(),
            matching.len()
        );

        for listener in matching {
            listener(&event);
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
