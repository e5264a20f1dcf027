use std::collections::VecDeque;
use std::fmt;

use crate::{ComponentId, Error, Result, Scheduler};

/// Identifies a single request for a resource, unique within that resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(usize);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Waiter<E> {
    request: RequestId,
    component: ComponentId<E>,
    event: E,
}

/// A mutual-exclusion token with a capacity of one.
///
/// Requests are granted strictly in the order they were made. A granted request resumes its
/// process through a zero-delay event carrying the continuation passed to [`Resource::request`],
/// so a grant is always observed on a later dispatch, never inside the requesting call.
pub struct Resource<E> {
    holder: Option<RequestId>,
    waiting: VecDeque<Waiter<E>>,
    next_request: usize,
    grants: usize,
    max_waiting: usize,
}

impl<E> Default for Resource<E> {
    fn default() -> Self {
        Self {
            holder: None,
            waiting: VecDeque::new(),
            next_request: 0,
            grants: 0,
            max_waiting: 0,
        }
    }
}

impl<E: 'static> Resource<E> {
    /// Requests the resource for `component`, which will be sent `event` once it is granted.
    ///
    /// If the resource is free, it is granted right away; otherwise the request waits in line.
    ///
    /// # Errors
    ///
    /// Propagates scheduling errors.
    pub fn request(
        &mut self,
        component: ComponentId<E>,
        event: E,
        scheduler: &mut Scheduler,
    ) -> Result<RequestId> {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        let waiter = Waiter {
            request,
            component,
            event,
        };
        if self.holder.is_none() {
            self.grant(waiter, scheduler)?;
        } else {
            log::trace!("Request {} waits behind {} others", request, self.waiting.len());
            self.waiting.push_back(waiter);
            self.max_waiting = self.max_waiting.max(self.waiting.len());
        }
        Ok(request)
    }

    /// Releases the resource held by `request` and grants it to the next waiting request, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReleaseWithoutHold`] if `request` is not the current holder.
    pub fn release(&mut self, request: RequestId, scheduler: &mut Scheduler) -> Result<()> {
        if self.holder != Some(request) {
            return Err(Error::ReleaseWithoutHold {
                request,
                holder: self.holder,
            });
        }
        self.holder = None;
        if let Some(next) = self.waiting.pop_front() {
            self.grant(next, scheduler)?;
        }
        Ok(())
    }

    fn grant(&mut self, waiter: Waiter<E>, scheduler: &mut Scheduler) -> Result<()> {
        log::trace!("Granting request {}", waiter.request);
        self.holder = Some(waiter.request);
        self.grants += 1;
        scheduler.schedule_immediately(waiter.component, waiter.event)
    }
}

impl<E> Resource<E> {
    /// The request currently holding the resource.
    #[must_use]
    pub fn holder(&self) -> Option<RequestId> {
        self.holder
    }

    /// Whether the resource is currently held.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.holder.is_some()
    }

    /// Number of requests waiting in line.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// The longest the line has ever been.
    #[must_use]
    pub fn max_queue_len(&self) -> usize {
        self.max_waiting
    }

    /// Total number of grants so far.
    #[must_use]
    pub fn grants(&self) -> usize {
        self.grants
    }
}
