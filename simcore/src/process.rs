use crate::{ComponentId, Error, RequestId, ResourceId, Result, Scheduler, State};

/// Lifecycle state of a [`Process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Currently running (or about to run) its next step.
    Ready,
    /// Waiting for a time-out event.
    SuspendedOnTimeout,
    /// Waiting in line for a resource.
    SuspendedOnResource,
    /// Finished; it will never be resumed again.
    Terminated,
}

/// A resumable unit of simulated activity.
///
/// The process itself holds no code. The component that owns it executes a step each time an
/// event for this process is dispatched, and uses the process to suspend until either a duration
/// has passed or a resource has been granted. Local state of the activity lives next to the
/// process in whatever structure the component keeps, so nothing is captured implicitly.
///
/// ```
/// # use simcore::{Process, ProcessState};
/// let mut process = Process::default();
/// assert_eq!(process.state(), ProcessState::Ready);
/// process.terminate();
/// assert!(process.resume().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    state: ProcessState,
    steps: usize,
}

impl Default for Process {
    fn default() -> Self {
        Self {
            state: ProcessState::Ready,
            steps: 0,
        }
    }
}

impl Process {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Number of times this process has been resumed.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn ensure_ready(&self, action: &'static str) -> Result<()> {
        if self.state == ProcessState::Ready {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    /// Suspends the process for `duration`, after which `component` receives `resume`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonPositiveDuration`] if `duration` is not strictly positive and finite:
    /// waiting for nothing would let a process spin forever at a single instant.
    /// Returns [`Error::InvalidTransition`] if the process is not ready.
    pub fn timeout<E: 'static>(
        &mut self,
        duration: f64,
        component: ComponentId<E>,
        resume: E,
        scheduler: &mut Scheduler,
    ) -> Result<()> {
        self.ensure_ready("time out")?;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(Error::NonPositiveDuration(duration));
        }
        scheduler.schedule(duration, component, resume)?;
        self.state = ProcessState::SuspendedOnTimeout;
        Ok(())
    }

    /// Suspends the process until `resource` is granted, at which point `component` receives
    /// `resume`. Returns the request that must later be passed to the release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] if the process is not ready.
    pub fn acquire<E: 'static>(
        &mut self,
        resource: ResourceId<E>,
        component: ComponentId<E>,
        resume: E,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<RequestId> {
        self.ensure_ready("acquire a resource")?;
        let request = state
            .resource_mut(resource)
            .request(component, resume, scheduler)?;
        self.state = ProcessState::SuspendedOnResource;
        Ok(request)
    }

    /// Marks a suspended process as ready again. Called by the owning component when the event
    /// it was waiting for is dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the process is suspended.
    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            ProcessState::SuspendedOnTimeout | ProcessState::SuspendedOnResource => {
                self.state = ProcessState::Ready;
                self.steps += 1;
                Ok(())
            }
            state => Err(Error::InvalidTransition {
                state,
                action: "resume",
            }),
        }
    }

    /// Terminates the process.
    pub fn terminate(&mut self) {
        self.state = ProcessState::Terminated;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Wake;

    #[test]
    fn test_timeout_and_resume() {
        let mut scheduler = Scheduler::default();
        let mut process = Process::default();
        let component = ComponentId::<Wake>::new(0);
        process.timeout(2.5, component, Wake, &mut scheduler).unwrap();
        assert_eq!(process.state(), ProcessState::SuspendedOnTimeout);
        assert_eq!(scheduler.peek_time(), Some(2.5));
        assert!(matches!(
            process.timeout(1.0, component, Wake, &mut scheduler),
            Err(Error::InvalidTransition { .. })
        ));
        process.resume().unwrap();
        assert_eq!(process.state(), ProcessState::Ready);
        assert_eq!(process.steps(), 1);
    }

    #[test]
    fn test_non_positive_durations_are_fatal() {
        let mut scheduler = Scheduler::default();
        let mut process = Process::default();
        let component = ComponentId::<Wake>::new(0);
        for duration in &[0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                process.timeout(*duration, component, Wake, &mut scheduler),
                Err(Error::NonPositiveDuration(_))
            ));
        }
        assert_eq!(process.state(), ProcessState::Ready);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_acquire() {
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        let resource = state.add_resource::<Wake>();
        let component = ComponentId::<Wake>::new(0);

        let mut first = Process::default();
        let mut second = Process::default();
        let first_request = first
            .acquire(resource, component, Wake, &mut scheduler, &mut state)
            .unwrap();
        let second_request = second
            .acquire(resource, component, Wake, &mut scheduler, &mut state)
            .unwrap();
        assert_eq!(first.state(), ProcessState::SuspendedOnResource);
        assert_eq!(second.state(), ProcessState::SuspendedOnResource);
        assert_eq!(state.resource(resource).holder(), Some(first_request));
        assert_eq!(state.resource(resource).queue_len(), 1);

        state
            .resource_mut(resource)
            .release(first_request, &mut scheduler)
            .unwrap();
        assert_eq!(state.resource(resource).holder(), Some(second_request));
    }

    #[test]
    fn test_resume_requires_suspension() {
        let mut process = Process::default();
        assert!(matches!(
            process.resume(),
            Err(Error::InvalidTransition {
                state: ProcessState::Ready,
                ..
            })
        ));
        process.terminate();
        assert!(matches!(
            process.resume(),
            Err(Error::InvalidTransition {
                state: ProcessState::Terminated,
                ..
            })
        ));
    }
}
