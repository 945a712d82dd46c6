//! Keyed in-flight call de-duplication.
//!
//! Concurrent callers for the same key share a single execution of the
//! supplied closure and all observe its outcome. Independent keys proceed
//! in parallel.

use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

struct Flight<T> {
    outcome: Mutex<Option<T>>,
    done: Condvar,
}

/// Promise-sharing table keyed by string.
pub(crate) struct SingleFlight<T: Clone> {
    flights: Mutex<AHashMap<String, Arc<Flight<T>>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub(crate) fn new() -> Self {
        Self {
            flights: Mutex::new(AHashMap::new()),
        }
    }

    /// Run `work` for `key`, or wait for the execution already in flight
    /// under that key and clone its outcome.
    pub(crate) fn run<F>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> T,
    {
        let (flight, leader) = {
            let mut flights = self.flights.lock();
            match flights.get(key) {
                Some(flight) => (Arc::clone(flight), false),
                None => {
                    let flight = Arc::new(Flight {
                        outcome: Mutex::new(None),
                        done: Condvar::new(),
                    });
                    flights.insert(key.to_string(), Arc::clone(&flight));
                    (flight, true)
                }
            }
        };

        if leader {
            let outcome = work();
            *flight.outcome.lock() = Some(outcome.clone());
            flight.done.notify_all();
            self.flights.lock().remove(key);
            outcome
        } else {
            let mut outcome = flight.outcome.lock();
            loop {
                if let Some(value) = outcome.as_ref() {
                    return value.clone();
                }
                flight.done.wait(&mut outcome);
            }
        }
    }
}
