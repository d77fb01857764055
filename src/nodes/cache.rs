//! Per-node cook cache
//!
//! Each node owns a [`CookCell`] holding its last successful result tagged
//! with the generation it was produced at. A cached result is only valid
//! while the node's generation still matches. The cell also serializes
//! cooks: at most one cook per node and generation is in flight, and any
//! other request for that generation blocks on the cell's condition
//! variable until that cook finishes.
//!
//! A request for a different generation never waits. Two snapshots taken
//! around a graph edit can order the same nodes differently, so blocking
//! across generations could deadlock. Such a request cooks on a private
//! ticket instead.

use crate::error::{EvaluationError, SopError};
use crate::geometry::Geometry;
use crate::nodes::execution_engine::NodeState;
use crate::nodes::NodeId;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CookSlot {
    cached: Option<(u64, Arc<Geometry>)>,
    /// Ticket and generation of the exclusive cook currently running
    in_flight: Option<(u64, u64)>,
    next_ticket: u64,
    /// Ticket and error of the most recent failed cook
    failure: Option<(u64, SopError)>,
    cook_count: u64,
}

/// Outcome of asking a cell for permission to cook
pub(crate) enum CookStart {
    /// A valid result already exists
    Cached(Arc<Geometry>),
    /// The in-flight cook we waited on failed with this error
    Failed(SopError),
    /// The caller now owns the cook and must finish the ticket
    Begin { ticket: CookTicket, replaced_stale: bool },
}

/// Cache slot and in-flight marker for one node
#[derive(Default)]
pub struct CookCell {
    slot: Mutex<CookSlot>,
    done: Condvar,
}

impl CookCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, generation: u64) -> NodeState {
        let slot = self.slot.lock();
        if slot.in_flight.is_some() {
            NodeState::Cooking
        } else if matches!(slot.cached, Some((g, _)) if g == generation) {
            NodeState::Clean
        } else {
            NodeState::Dirty
        }
    }

    pub fn cached(&self, generation: u64) -> Option<Arc<Geometry>> {
        let slot = self.slot.lock();
        match &slot.cached {
            Some((g, geo)) if *g == generation => Some(geo.clone()),
            _ => None,
        }
    }

    pub fn cook_count(&self) -> u64 {
        self.slot.lock().cook_count
    }

    pub fn last_error(&self) -> Option<SopError> {
        self.slot.lock().failure.as_ref().map(|(_, err)| err.clone())
    }

    /// Drop the cached result, leaving the node dirty
    pub fn invalidate(&self) -> bool {
        self.slot.lock().cached.take().is_some()
    }

    /// Return the cached result for `generation`, or wait for an in-flight
    /// cook, or hand the caller a ticket to cook it themselves.
    pub(crate) fn begin(self: &Arc<Self>, node: NodeId, generation: u64) -> CookStart {
        let mut slot = self.slot.lock();
        loop {
            if let Some((g, geo)) = &slot.cached {
                if *g == generation {
                    return CookStart::Cached(geo.clone());
                }
            }

            match slot.in_flight {
                Some((_, running)) if running != generation => {
                    let ticket = slot.next_ticket;
                    slot.next_ticket += 1;
                    let replaced_stale = slot.cached.is_some();
                    return CookStart::Begin {
                        ticket: CookTicket {
                            cell: self.clone(),
                            node,
                            ticket,
                            generation,
                            exclusive: false,
                            finished: false,
                        },
                        replaced_stale,
                    };
                }
                Some((waited_on, _)) => {
                    self.done.wait(&mut slot);
                    if let Some((ticket, err)) = &slot.failure {
                        if *ticket == waited_on {
                            return CookStart::Failed(err.clone());
                        }
                    }
                }
                None => {
                    let ticket = slot.next_ticket;
                    slot.next_ticket += 1;
                    slot.in_flight = Some((ticket, generation));
                    let replaced_stale = slot.cached.is_some();
                    return CookStart::Begin {
                        ticket: CookTicket {
                            cell: self.clone(),
                            node,
                            ticket,
                            generation,
                            exclusive: true,
                            finished: false,
                        },
                        replaced_stale,
                    };
                }
            }
        }
    }
}

/// Right to cook a node at one generation, released on finish or drop
pub(crate) struct CookTicket {
    cell: Arc<CookCell>,
    node: NodeId,
    ticket: u64,
    generation: u64,
    /// Exclusive tickets own the cell's in-flight marker; private ones
    /// cook alongside a cook of another generation
    exclusive: bool,
    finished: bool,
}

impl CookTicket {
    /// Store a successful result and wake waiters
    pub fn succeed(mut self, geometry: Arc<Geometry>) {
        {
            let mut slot = self.cell.slot.lock();
            // A newer cook may already have stored a fresher result
            let newer_cached = matches!(slot.cached, Some((g, _)) if g > self.generation);
            if !newer_cached {
                slot.cached = Some((self.generation, geometry));
            }
            slot.cook_count += 1;
            slot.failure = None;
            if self.exclusive {
                slot.in_flight = None;
            }
        }
        self.finished = true;
        self.cell.done.notify_all();
    }

    /// Discard the previous result, record the error and wake waiters
    pub fn fail(mut self, error: SopError) {
        self.record_failure(error);
        self.finished = true;
    }

    fn record_failure(&self, error: SopError) {
        {
            let mut slot = self.cell.slot.lock();
            if matches!(slot.cached, Some((g, _)) if g <= self.generation) {
                slot.cached = None;
            }
            slot.failure = Some((self.ticket, error));
            if self.exclusive {
                slot.in_flight = None;
            }
        }
        self.cell.done.notify_all();
    }
}

impl Drop for CookTicket {
    fn drop(&mut self) {
        if !self.finished {
            self.record_failure(SopError::evaluation(
                self.node,
                EvaluationError::OperationFailed("cook was abandoned".into()),
            ));
        }
    }
}

/// Statistics about cache performance and usage
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStatistics {
    /// Requests answered from a valid cache
    pub cache_hits: usize,
    /// Requests that had to cook
    pub cache_misses: usize,
    /// Stale or failed results thrown away
    pub cache_invalidations: usize,
    /// Successful operator invocations
    pub cooks: usize,
    pub failed_cooks: usize,
    /// Time spent inside operators
    pub total_cook_time: Duration,
}

impl CacheStatistics {
    /// Calculate cache hit ratio
    pub fn hit_ratio(&self) -> f32 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f32 / total as f32
        }
    }

    pub fn average_cook_time(&self) -> Duration {
        if self.cooks == 0 {
            Duration::ZERO
        } else {
            self.total_cook_time / self.cooks as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn begin(cell: &Arc<CookCell>, generation: u64) -> CookTicket {
        match cell.begin(0, generation) {
            CookStart::Begin { ticket, .. } => ticket,
            _ => panic!("expected to own the cook"),
        }
    }

    #[test]
    fn test_cached_only_for_matching_generation() {
        let cell = Arc::new(CookCell::new());
        assert_eq!(cell.state(1), NodeState::Dirty);
        begin(&cell, 1).succeed(Arc::new(Geometry::new()));
        assert_eq!(cell.state(1), NodeState::Clean);
        assert_eq!(cell.state(2), NodeState::Dirty);
        assert!(matches!(cell.begin(0, 1), CookStart::Cached(_)));
        assert_eq!(cell.cook_count(), 1);
    }

    #[test]
    fn test_failure_discards_previous_result() {
        let cell = Arc::new(CookCell::new());
        begin(&cell, 1).succeed(Arc::new(Geometry::new()));
        begin(&cell, 2).fail(SopError::evaluation(
            3,
            EvaluationError::OperationFailed("x".into()),
        ));
        assert!(cell.cached(1).is_none());
        assert!(cell.last_error().is_some());
    }

    #[test]
    fn test_older_result_does_not_replace_newer() {
        let cell = Arc::new(CookCell::new());
        begin(&cell, 5).succeed(Arc::new(Geometry::new()));
        let stale = CookTicket {
            cell: cell.clone(),
            node: 0,
            ticket: 99,
            generation: 4,
            exclusive: false,
            finished: false,
        };
        stale.succeed(Arc::new(Geometry::new()));
        assert!(cell.cached(5).is_some());
    }

    #[test]
    fn test_waiter_receives_in_flight_result() {
        let cell = Arc::new(CookCell::new());
        let ticket = begin(&cell, 1);
        assert_eq!(cell.state(1), NodeState::Cooking);

        let waiter = {
            let cell = cell.clone();
            thread::spawn(move || matches!(cell.begin(0, 1), CookStart::Cached(_)))
        };
        thread::sleep(std::time::Duration::from_millis(20));
        ticket.succeed(Arc::new(Geometry::new()));
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_other_generation_does_not_wait_on_in_flight_cook() {
        let cell = Arc::new(CookCell::new());
        let running = begin(&cell, 1);

        // Would block forever if it waited on generation 1
        let private = begin(&cell, 2);
        assert_eq!(cell.state(2), NodeState::Cooking);
        private.succeed(Arc::new(Geometry::new()));
        assert!(cell.cached(2).is_some());
        // The exclusive cook still owns the in-flight marker
        assert_eq!(cell.state(2), NodeState::Cooking);

        running.succeed(Arc::new(Geometry::new()));
        assert_eq!(cell.state(2), NodeState::Clean);
        assert_eq!(cell.cook_count(), 2);
    }

    #[test]
    fn test_stale_failure_keeps_newer_result() {
        let cell = Arc::new(CookCell::new());
        let old = begin(&cell, 1);
        begin(&cell, 2).succeed(Arc::new(Geometry::new()));
        old.fail(SopError::evaluation(0, EvaluationError::OperationFailed("x".into())));
        assert!(cell.cached(2).is_some());
        assert_eq!(cell.state(2), NodeState::Clean);
    }

    #[test]
    fn test_dropped_ticket_releases_waiters() {
        let cell = Arc::new(CookCell::new());
        drop(begin(&cell, 1));
        assert_eq!(cell.state(1), NodeState::Dirty);
        assert!(cell.last_error().is_some());
    }
}
