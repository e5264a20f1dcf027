use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use rand::RngCore;

use crate::Resource;

/// A type-safe key used to fetch values from the value store.
///
/// # Construction
///
/// A key can be constructed only by calling [`State::insert`]. The state assigns a new numerical
/// ID to the inserted value.
/// Additionally, the key holds a unique hash for the state object.
/// This prevents from using the key with a different instance of [`State`] object.
/// Such operation will panic:
///
/// ```should_panic
/// # use simcore::{Key, State};
/// let mut state_1 = State::default();
/// let mut state_2 = State::default();
/// let id = state_1.insert(1);
/// let _ = state_2.remove(id);
/// ```
///
/// # Type Safety
///
/// These keys are type-safe in a sense that a key used to insert a value of type `T` cannot be
/// used to access a value of another type `U`. An attempt to do so will result in a compile error.
/// It is achieved by having the key generic over `T`. However, `T` is just a marker, and no
/// values of type `T` are stored internally.
///
/// ```compile_fail
/// # use simcore::{Key, State};
/// let mut state = State::default();
/// let id = state.insert(String::from("1"));
/// let _: Option<i32> = state.remove(id);  // Error!
/// ```
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Key<V> {
    id: usize,
    state_hash: u64,
    _marker: PhantomData<V>,
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state_hash: self.state_hash,
            _marker: PhantomData,
        }
    }
}
impl<T> Copy for Key<T> {}

/// A type-safe identifier of a resource.
///
/// This is an analogue of [`Key<T>`](struct.Key.html) used specifically for resources.
/// `E` is the type of events used to resume processes when they are granted the resource.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceId<E> {
    id: usize,
    state_hash: u64,
    _marker: PhantomData<E>,
}
impl<T> Clone for ResourceId<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state_hash: self.state_hash,
            _marker: PhantomData,
        }
    }
}
impl<T> Copy for ResourceId<T> {}

/// State of a simulation holding all resources and arbitrary values in a value store.
pub struct State {
    store: HashMap<TypeId, HashMap<usize, Box<dyn Any>>>,
    resources: HashMap<TypeId, HashMap<usize, Box<dyn Any>>>,
    next_id: usize,
    pub(crate) state_hash: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            store: HashMap::new(),
            resources: HashMap::new(),
            next_id: 0,
            state_hash: rand::thread_rng().next_u64(),
        }
    }
}

impl State {
    fn assert_hash<V: 'static>(&self, key: &Key<V>) {
        assert_eq!(
            key.state_hash, self.state_hash,
            "State hash of the key does not match the hash of the state"
        );
    }

    /// Inserts an arbitrary value to the value store. Learn more in the documentation for [`Key`].
    #[must_use = "Discarding key results in leaking inserted value"]
    pub fn insert<V: 'static>(&mut self, value: V) -> Key<V> {
        let id = self.next_id;
        self.next_id += 1;
        self.store
            .entry(TypeId::of::<V>())
            .or_default()
            .insert(id, Box::new(value));
        Key {
            id,
            state_hash: self.state_hash,
            _marker: PhantomData,
        }
    }

    /// Removes a value of type `V` from the value store. Learn more in the documentation for [`Key`].
    pub fn remove<V: 'static>(&mut self, key: Key<V>) -> Option<V> {
        self.assert_hash(&key);
        self.store
            .get_mut(&TypeId::of::<V>())
            .and_then(|m| m.remove(&key.id))
            .and_then(|v| v.downcast::<V>().ok())
            .map(|v| *v)
    }

    /// Gets a immutable reference to a value of a type `V` from the value store.
    /// Learn more in the documentation for [`Key`].
    #[must_use]
    pub fn get<V: 'static>(&self, key: Key<V>) -> Option<&V> {
        self.assert_hash(&key);
        self.store
            .get(&TypeId::of::<V>())
            .and_then(|m| m.get(&key.id))
            .and_then(|v| v.downcast_ref::<V>())
    }

    /// Gets a mutable reference to a value of a type `V` from the value store.
    /// Learn more in the documentation for [`Key`].
    #[must_use]
    pub fn get_mut<V: 'static>(&mut self, key: Key<V>) -> Option<&mut V> {
        self.assert_hash(&key);
        self.store
            .get_mut(&TypeId::of::<V>())
            .and_then(|m| m.get_mut(&key.id))
            .and_then(|v| v.downcast_mut::<V>())
    }

    /// Creates a new single-capacity resource, returning its ID.
    pub fn add_resource<E: 'static>(&mut self) -> ResourceId<E> {
        let id = self.next_id;
        self.next_id += 1;
        self.resources
            .entry(TypeId::of::<E>())
            .or_default()
            .insert(id, Box::new(Resource::<E>::default()));
        ResourceId {
            id,
            state_hash: self.state_hash,
            _marker: PhantomData,
        }
    }

    /// Gets a mutable reference to the resource.
    ///
    /// # Panics
    ///
    /// Panics if the ID was issued by another state, which cannot be recovered from.
    pub fn resource_mut<E: 'static>(&mut self, resource: ResourceId<E>) -> &mut Resource<E> {
        assert_eq!(self.state_hash, resource.state_hash, "State hash mismatch.");
        self.resources
            .get_mut(&TypeId::of::<E>())
            .and_then(|m| m.get_mut(&resource.id))
            .and_then(|r| r.downcast_mut::<Resource<E>>())
            .expect("If this resource ID was issued, a corresponding resource must exist")
    }

    /// Gets an immutable reference to the resource.
    ///
    /// # Panics
    ///
    /// Panics if the ID was issued by another state.
    #[must_use]
    pub fn resource<E: 'static>(&self, resource: ResourceId<E>) -> &Resource<E> {
        assert_eq!(self.state_hash, resource.state_hash, "State hash mismatch.");
        self.resources
            .get(&TypeId::of::<E>())
            .and_then(|m| m.get(&resource.id))
            .and_then(|r| r.downcast_ref::<Resource<E>>())
            .expect("If this resource ID was issued, a corresponding resource must exist")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_add_remove_key_values() {
        let mut state = State::default();

        let id = state.insert(1);
        assert_eq!(state.get(id), Some(&1));
        assert_eq!(state.remove(id), Some(1));
        assert_eq!(state.remove(id), None);

        let id = state.insert("string_slice");
        assert_eq!(state.remove(id), Some("string_slice"));
        assert_eq!(state.remove(id), None);

        let id = state.insert(vec![String::from("S")]);
        state.get_mut(id).unwrap().push(String::from("T"));
        assert_eq!(
            state.remove(id),
            Some(vec![String::from("S"), String::from("T")])
        );
        assert_eq!(state.get(id), None);
    }

    #[test]
    #[should_panic]
    fn test_foreign_key() {
        let mut state_1 = State::default();
        let mut state_2 = State::default();
        state_2.state_hash = state_1.state_hash.wrapping_add(1);
        let id = state_1.insert(1);
        let _ = state_2.remove(id);
    }

    #[test]
    fn test_resources_are_independent() {
        let mut state = State::default();
        let first = state.add_resource::<u8>();
        let second = state.add_resource::<u8>();
        assert_ne!(first, second);
        assert!(!state.resource(first).is_busy());
        assert!(!state.resource(second).is_busy());
    }
}
