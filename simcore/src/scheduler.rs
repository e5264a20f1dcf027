use std::any::{Any, TypeId};
use std::cell::Cell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::{Clock, ComponentId, Error, Result};

/// Entry type stored in the scheduler, including the event value, component ID, and the time when
/// it is supposed to occur.
///
/// Entries are ordered by time and then by the order in which they were scheduled, reversed so
/// that the earliest entry sits on top of a max-heap.
#[derive(Debug)]
pub struct EventEntry {
    key: Reverse<(OrderedFloat<f64>, u64)>,
    component: usize,
    inner: Box<dyn Any>,
    event_type: TypeId,
}

impl EventEntry {
    /// Tries to downcast the event entry to one holding an event of type `E`.
    /// If fails, returns `None`.
    #[must_use]
    pub fn downcast<E: fmt::Debug + 'static>(&self) -> Option<EventEntryTyped<'_, E>> {
        if self.event_type == TypeId::of::<E>() {
            self.inner
                .downcast_ref::<E>()
                .map(|event| EventEntryTyped {
                    time: self.time(),
                    component_id: ComponentId::new(self.component),
                    event,
                })
        } else {
            None
        }
    }

    /// The time at which this event fires.
    #[must_use]
    pub fn time(&self) -> f64 {
        ((self.key.0).0).0
    }

    /// Index of the component this event is addressed to.
    #[must_use]
    pub fn component_idx(&self) -> usize {
        self.component
    }
}

impl PartialEq for EventEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EventEntry {}

impl PartialOrd for EventEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Typed view of an [`EventEntry`].
#[derive(Debug)]
pub struct EventEntryTyped<'e, E: fmt::Debug> {
    /// Time of the event.
    pub time: f64,
    /// Addressee.
    pub component_id: ComponentId<E>,
    /// Borrowed event value.
    pub event: &'e E,
}

/// This struct has only immutable access to the simulation clock exposed.
#[derive(Debug, Clone)]
pub struct ClockRef {
    clock: Clock,
}

impl From<Clock> for ClockRef {
    fn from(clock: Clock) -> Self {
        Self { clock }
    }
}

impl ClockRef {
    /// Return the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock.get()
    }
}

/// Scheduler is used to keep the current time and information about the upcoming events.
pub struct Scheduler {
    events: BinaryHeap<EventEntry>,
    clock: Clock,
    next_sequence: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            events: BinaryHeap::new(),
            clock: Rc::new(Cell::new(0.0)),
            next_sequence: 0,
        }
    }
}

impl Scheduler {
    /// Schedules `event` to be executed for `component` at `self.time() + delay`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NegativeDelay`] if `delay` is negative, NaN, or infinite.
    pub fn schedule<E: 'static>(
        &mut self,
        delay: f64,
        component: ComponentId<E>,
        event: E,
    ) -> Result<()> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(Error::NegativeDelay(delay));
        }
        let time = self.time() + delay;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(EventEntry {
            key: Reverse((OrderedFloat(time), sequence)),
            component: component.id(),
            inner: Box::new(event),
            event_type: TypeId::of::<E>(),
        });
        Ok(())
    }

    /// Schedules `event` to be executed for `component` at `self.time()`.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature mirrors [`Scheduler::schedule`].
    pub fn schedule_immediately<E: 'static>(
        &mut self,
        component: ComponentId<E>,
        event: E,
    ) -> Result<()> {
        self.schedule(0.0, component, event)
    }

    /// Returns the current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock.get()
    }

    /// Returns a structure with immutable access to the simulation time.
    #[must_use]
    pub fn clock(&self) -> ClockRef {
        ClockRef {
            clock: Rc::clone(&self.clock),
        }
    }

    /// Number of events waiting to be dispatched.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Returns the time of the next scheduled event without removing it.
    #[must_use]
    pub fn peek_time(&self) -> Option<f64> {
        self.events.peek().map(EventEntry::time)
    }

    /// Moves the clock forward to `time` without dispatching anything.
    /// Does nothing if `time` is not later than the current time.
    pub fn advance_to(&mut self, time: f64) {
        if time > self.time() {
            self.clock.replace(time);
        }
    }

    /// Removes and returns the next scheduled event or `None` if none are left.
    pub fn pop(&mut self) -> Option<EventEntry> {
        self.events.pop().map(|e| {
            self.clock.replace(e.time());
            e
        })
    }
}
