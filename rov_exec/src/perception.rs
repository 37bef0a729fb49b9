//! # Perception feed
//!
//! The perception routine runs outside the control loop and pushes one [`TargetObservation`] per
//! processed frame. Tasks only ever want the newest one, so [`ObservationFeed::latest`] drops any
//! older observations that queued up between ticks.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::mpsc::{self, Receiver, Sender};

use comms_if::eqpt::per::TargetObservation;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ObservationFeed {
    sender: Sender<TargetObservation>,
    receiver: Receiver<TargetObservation>,
}

/// Handle used by a perception routine to publish observations, may be moved to another thread.
#[derive(Clone)]
pub struct ObservationSender(Sender<TargetObservation>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObservationFeed {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> ObservationSender {
        ObservationSender(self.sender.clone())
    }

    /// Take the most recent observation pushed since the last call, if any.
    pub fn latest(&self) -> Option<TargetObservation> {
        self.receiver.try_iter().last()
    }
}

impl Default for ObservationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationSender {
    pub fn send(&self, obs: TargetObservation) {
        // The feed owns a sender, so the channel can't be disconnected while it exists
        self.0.send(obs).ok();
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_latest_only() {
        let feed = ObservationFeed::new();
        assert_eq!(feed.latest(), None);

        let tx = feed.sender();
        let frame = (640.0, 480.0);
        tx.send(TargetObservation::no_target(frame));
        tx.send(TargetObservation::from_bounding_box(0.0, 0.0, 10.0, 10.0, frame));

        let latest = feed.latest().unwrap();
        assert_eq!(latest.size, (10.0, 10.0));
        assert_eq!(feed.latest(), None);
    }

    #[test]
    fn test_send_from_thread() {
        let feed = ObservationFeed::new();
        let tx = feed.sender();

        std::thread::spawn(move || tx.send(TargetObservation::no_target((1.0, 1.0))))
            .join()
            .unwrap();

        assert!(feed.latest().is_some());
    }
}
