#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

//! This is a general purpose discrete-event simulation engine that provides the mechanisms such
//! as: scheduler, processes, state, single-capacity resources, etc.
//!
//! Time is logical and measured in hours as `f64`. Nothing here ever blocks the host thread:
//! a process "waits" by registering a future event and returning control to the scheduler.

use std::cell::Cell;
use std::rc::Rc;

/// Simulation clock.
pub type Clock = Rc<Cell<f64>>;

pub use component::{Component, ComponentId, Components};
pub use process::{Process, ProcessState};
pub use resource::{RequestId, Resource};
pub use scheduler::{ClockRef, EventEntry, EventEntryTyped, Scheduler};
pub use state::{Key, ResourceId, State};

mod component;
mod process;
mod resource;
mod scheduler;
mod state;

/// Error type encompassing all engine errors.
///
/// Every variant signals a defect in the model or in its input, never a transient condition,
/// so none of them is meant to be retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An event was scheduled in the past or at a non-finite delay.
    #[error("Cannot schedule an event with delay {0} (must be finite and non-negative).")]
    NegativeDelay(f64),
    /// A process tried to wait for a zero, negative, or non-finite duration.
    #[error("Process cannot wait for {0} hours (must be finite and positive).")]
    NonPositiveDuration(f64),
    /// The run horizon is not a positive finite time.
    #[error("Invalid simulation horizon: {0}")]
    InvalidHorizon(f64),
    /// A resource was released by a request that does not currently hold it.
    #[error("Request {request} released a resource held by {holder:?}")]
    ReleaseWithoutHold {
        /// The request that attempted the release.
        request: RequestId,
        /// The actual holder at the time of the release.
        holder: Option<RequestId>,
    },
    /// A process was driven through a transition its current state does not allow.
    #[error("Process in state {state:?} cannot {action}")]
    InvalidTransition {
        /// State of the process at the time of the transition.
        state: ProcessState,
        /// Attempted transition.
        action: &'static str,
    },
    /// An event was addressed to a component that does not exist or does not accept it.
    #[error("No component {0} accepting this event type")]
    UnknownComponent(usize),
    /// A value expected in the state was not found.
    #[error("Missing value in state: {0}")]
    MissingValue(&'static str),
    /// A component ran out of its pre-generated input before the horizon was reached.
    #[error("Input exhausted at index {index} (time {time})")]
    InputExhausted {
        /// Index of the first missing input element.
        index: usize,
        /// Simulation time at which the input was needed.
        time: f64,
    },
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// The main simulation object: components, their shared state, and the scheduler.
#[derive(Default)]
pub struct Simulation {
    /// Current state of the simulation meant to be mutated by the components.
    pub state: State,
    /// Schedules events and maintains the clock.
    pub scheduler: Scheduler,
    components: Components,
}

impl Simulation {
    /// Adds a new component.
    #[must_use]
    pub fn add_component<E, C>(&mut self, component: C) -> ComponentId<E>
    where
        E: std::fmt::Debug + 'static,
        C: Component<Event = E> + 'static,
    {
        self.components.add_component(component)
    }

    /// Adds a new single-capacity resource whose grants resume processes with events of type `E`.
    #[must_use]
    pub fn add_resource<E: 'static>(&mut self) -> ResourceId<E> {
        self.state.add_resource()
    }

    /// Schedules `event` to be executed for `component` at `self.scheduler.time() + delay`.
    ///
    /// # Errors
    ///
    /// See [`Scheduler::schedule`].
    pub fn schedule<E: 'static>(
        &mut self,
        delay: f64,
        component: ComponentId<E>,
        event: E,
    ) -> Result<()> {
        self.scheduler.schedule(delay, component, event)
    }

    /// Dispatches the next event. Returns `false` if there were no events left.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the component processing the event.
    pub fn step(&mut self) -> Result<bool> {
        if let Some(entry) = self.scheduler.pop() {
            log::trace!("[{:.4}] dispatching {:?}", self.scheduler.time(), entry);
            self.components
                .process_event_entry(entry, &mut self.scheduler, &mut self.state)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Runs until no events are left or the next event would occur after `horizon`.
    /// In the latter case, the clock is set to `horizon` and that event stays undispatched.
    /// Returns the time at which the run stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHorizon`] if `horizon` is not positive and finite, or the first
    /// error raised by a component, at which point the run is aborted.
    pub fn run_until(&mut self, horizon: f64) -> Result<f64> {
        if !(horizon.is_finite() && horizon > 0.0) {
            return Err(Error::InvalidHorizon(horizon));
        }
        loop {
            match self.scheduler.peek_time() {
                None => break,
                Some(time) if time > horizon => {
                    self.scheduler.advance_to(horizon);
                    break;
                }
                Some(_) => {
                    self.step()?;
                }
            }
        }
        log::debug!("Run stopped at {}", self.scheduler.time());
        Ok(self.scheduler.time())
    }
}
