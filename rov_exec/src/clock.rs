//! # Clock
//!
//! Every timeout in the executable (heartbeat silence, task duration bounds) is evaluated against
//! a [`Clock`] handed in at construction, so that the link and tasks can be driven by a manual
//! clock in tests and by the session clock in the executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use util::session::{self, Session};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A monotonic source of time.
pub trait Clock: Send + Sync {
    /// Seconds elapsed since an arbitrary fixed epoch.
    fn now_s(&self) -> f64;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Clock measuring seconds since the start of the session.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    _priv: (),
}

/// Clock which only moves when told to.
///
/// Clones share the same time, so a test can keep a handle while the component under test owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time_s: Arc<Mutex<f64>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SessionClock {
    /// Create a new session clock.
    ///
    /// Requiring the session guarantees the session epoch has been set.
    pub fn new(_session: &Session) -> Self {
        Self { _priv: () }
    }
}

impl Clock for SessionClock {
    fn now_s(&self) -> f64 {
        session::get_elapsed_seconds()
    }
}

impl ManualClock {
    pub fn new(time_s: f64) -> Self {
        Self {
            time_s: Arc::new(Mutex::new(time_s)),
        }
    }

    pub fn set(&self, time_s: f64) {
        if let Ok(mut t) = self.time_s.lock() {
            *t = time_s;
        }
    }

    pub fn advance(&self, dt_s: f64) {
        if let Ok(mut t) = self.time_s.lock() {
            *t += dt_s;
        }
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        match self.time_s.lock() {
            Ok(t) => *t,
            Err(e) => *e.into_inner(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1.0);
        let handle = clock.clone();

        handle.advance(0.5);
        assert_eq!(clock.now_s(), 1.5);

        handle.set(10.0);
        assert_eq!(clock.now_s(), 10.0);
    }
}
