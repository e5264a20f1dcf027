use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::{Error, EventEntry, Result, Scheduler, State};

/// Identifies a simulation component.
///
/// The ID is typed by the event the component accepts, so events of a wrong type cannot be
/// scheduled for it.
pub struct ComponentId<E> {
    id: usize,
    _marker: PhantomData<E>,
}

impl<E> ComponentId<E> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub(crate) fn id(self) -> usize {
        self.id
    }
}

impl<E> Clone for ComponentId<E> {
    fn clone(&self) -> Self {
        Self::new(self.id)
    }
}
impl<E> Copy for ComponentId<E> {}

impl<E> PartialEq for ComponentId<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<E> Eq for ComponentId<E> {}

impl<E> Hash for ComponentId<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E> fmt::Debug for ComponentId<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.id)
    }
}

/// A component reacts to events addressed to it.
///
/// Processing an event is the only moment a component runs: it may mutate the shared state,
/// schedule further events (for itself or others), and then returns control to the scheduler.
pub trait Component {
    /// Type of events this component accepts.
    type Event;

    /// Processes a single `event` at the current scheduler time.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole simulation run.
    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<()>;
}

trait ProcessEventEntry {
    fn process_event_entry(
        &mut self,
        entry: &EventEntry,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<()>;
}

impl<E, C> ProcessEventEntry for C
where
    E: fmt::Debug + 'static,
    C: Component<Event = E>,
{
    fn process_event_entry(
        &mut self,
        entry: &EventEntry,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<()> {
        let typed = entry
            .downcast::<E>()
            .ok_or_else(|| Error::UnknownComponent(entry.component_idx()))?;
        self.process_event(typed.component_id, typed.event, scheduler, state)
    }
}

/// Container holding type-erased components.
#[derive(Default)]
pub struct Components {
    components: Vec<Box<dyn ProcessEventEntry>>,
}

impl Components {
    /// Registers a new component and returns its ID.
    #[must_use]
    pub fn add_component<E, C>(&mut self, component: C) -> ComponentId<E>
    where
        E: fmt::Debug + 'static,
        C: Component<Event = E> + 'static,
    {
        let id = self.components.len();
        self.components.push(Box::new(component));
        ComponentId::new(id)
    }

    /// Hands the event over to the component it is addressed to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComponent`] if no such component exists, otherwise whatever the
    /// component returns.
    pub fn process_event_entry(
        &mut self,
        entry: EventEntry,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<()> {
        self.components
            .get_mut(entry.component_idx())
            .ok_or_else(|| Error::UnknownComponent(entry.component_idx()))?
            .process_event_entry(&entry, scheduler, state)
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether no components have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct Ping;

    #[derive(Default)]
    struct Counter {
        count: usize,
    }

    impl Component for Counter {
        type Event = Ping;

        fn process_event(
            &mut self,
            _: ComponentId<Ping>,
            _: &Ping,
            _: &mut Scheduler,
            _: &mut State,
        ) -> Result<()> {
            self.count += 1;
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_to_component() {
        let mut components = Components::default();
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        let id = components.add_component(Counter::default());
        assert_eq!(components.len(), 1);
        scheduler.schedule(1.0, id, Ping).unwrap();
        let entry = scheduler.pop().unwrap();
        assert!(components
            .process_event_entry(entry, &mut scheduler, &mut state)
            .is_ok());
    }

    #[test]
    fn test_wrong_event_type() {
        let mut components = Components::default();
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        let _ = components.add_component(Counter::default());
        scheduler
            .schedule(1.0, ComponentId::<String>::new(0), String::from("ping"))
            .unwrap();
        let entry = scheduler.pop().unwrap();
        assert!(matches!(
            components.process_event_entry(entry, &mut scheduler, &mut state),
            Err(Error::UnknownComponent(0))
        ));
    }

    #[test]
    fn test_unknown_component() {
        let mut components = Components::default();
        let mut scheduler = Scheduler::default();
        let mut state = State::default();
        scheduler
            .schedule(0.0, ComponentId::<Ping>::new(3), Ping)
            .unwrap();
        let entry = scheduler.pop().unwrap();
        assert!(matches!(
            components.process_event_entry(entry, &mut scheduler, &mut state),
            Err(Error::UnknownComponent(3))
        ));
    }
}
