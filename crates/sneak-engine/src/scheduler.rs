//! Deferred one-shot events keyed by simulated time.
//!
//! The [`Scheduler`] stores plain data actions; what an action *does* is
//! decided by the dispatcher passed to [`Scheduler::tick`]. Events fire in
//! `(fire_at_ms, insertion order)` order, exactly once, and are removed from
//! the queue before their action runs, so a dispatcher may freely schedule
//! more events. Those fire in the same pass only if already due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// An action waiting for its fire time.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent<A> {
    /// Simulated time, in milliseconds, at or after which the event fires.
    pub fire_at_ms: f64,
    pub action: A,
}

#[derive(Debug)]
struct Entry<A> {
    seq: u64,
    event: ScheduledEvent<A>,
}

// Min-heap order on (fire time, sequence number).
impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .fire_at_ms
            .total_cmp(&self.event.fire_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for Entry<A> {}

/// Time-ordered queue of one-shot actions.
#[derive(Debug)]
pub struct Scheduler<A> {
    queue: BinaryHeap<Entry<A>>,
    next_seq: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<A> Scheduler<A> {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once simulated time reaches `fire_at_ms`.
    pub fn schedule(&mut self, fire_at_ms: f64, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            seq,
            event: ScheduledEvent { fire_at_ms, action },
        });
    }

    /// Fire every event due at `now_ms`, returning how many fired.
    ///
    /// `dispatch` receives each event by value along with the scheduler, so
    /// it can queue follow-up events.
    pub fn tick<F>(&mut self, now_ms: f64, mut dispatch: F) -> usize
    where
        F: FnMut(ScheduledEvent<A>, &mut Scheduler<A>),
    {
        let mut fired = 0;
        while let Some(event) = self.pop_due(now_ms) {
            fired += 1;
            dispatch(event, self);
        }
        if fired > 0 {
            tracing::debug!(now_ms, fired, remaining = self.queue.len(), "scheduler tick");
        }
        fired
    }

    fn pop_due(&mut self, now_ms: f64) -> Option<ScheduledEvent<A>> {
        if self.queue.peek()?.event.fire_at_ms <= now_ms {
            self.queue.pop().map(|entry| entry.event)
        } else {
            None
        }
    }

    /// Drop every pending event without firing it.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Pending events in firing order.
    pub fn pending(&self) -> Vec<&ScheduledEvent<A>> {
        let mut entries: Vec<&Entry<A>> = self.queue.iter().collect();
        // Heap order is reversed, so sort descending to get firing order.
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| &e.event).collect()
    }

    /// Number of events still waiting to fire.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting to fire.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fire time of the earliest pending event.
    pub fn next_fire_time(&self) -> Option<f64> {
        self.queue.peek().map(|e| e.event.fire_at_ms)
    }
}
