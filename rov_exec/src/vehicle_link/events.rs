//! # Link events
//!
//! State changes of the [`super::VehicleLink`] are published as [`LinkEvent`]s. Consumers register
//! handlers for the kinds of event they care about on the [`EventBus`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use comms_if::eqpt::cam::CamStateMap;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Handler invoked with each published event of the kind it subscribed to.
pub type EventHandler = Box<dyn FnMut(&LinkEvent) + Send>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<LinkEventKind, Vec<EventHandler>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// First heartbeat received after being disconnected
    Connected,

    /// No heartbeat received within the timeout
    Disconnected,

    Armed,

    Disarmed,

    /// The vehicle reported a different mode. `name` is `None` if the id isn't in the mode table.
    ModeChanged { mode_id: u32, name: Option<String> },

    /// Snapshot of every camera's state after a change
    CamerasSet(CamStateMap),

    /// Altitude reported by the vehicle, in meters
    Depth(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkEventKind {
    Connected,
    Disconnected,
    Armed,
    Disarmed,
    ModeChanged,
    CamerasSet,
    Depth,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LinkEvent {
    pub fn kind(&self) -> LinkEventKind {
        match self {
            LinkEvent::Connected => LinkEventKind::Connected,
            LinkEvent::Disconnected => LinkEventKind::Disconnected,
            LinkEvent::Armed => LinkEventKind::Armed,
            LinkEvent::Disarmed => LinkEventKind::Disarmed,
            LinkEvent::ModeChanged { .. } => LinkEventKind::ModeChanged,
            LinkEvent::CamerasSet(_) => LinkEventKind::CamerasSet,
            LinkEvent::Depth(_) => LinkEventKind::Depth,
        }
    }
}

impl EventBus {
    pub fn subscribe(&mut self, kind: LinkEventKind, handler: EventHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Call every handler subscribed to this event's kind, in subscription order.
    pub fn publish(&mut self, event: &LinkEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_publish_by_kind() {
        let mut bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        bus.subscribe(
            LinkEventKind::Depth,
            Box::new(move |e: &LinkEvent| s.lock().unwrap().push(e.clone())),
        );

        bus.publish(&LinkEvent::Connected);
        bus.publish(&LinkEvent::Depth(-1.5));

        assert_eq!(*seen.lock().unwrap(), vec![LinkEvent::Depth(-1.5)]);
    }
}
