//! Helpers for writing deterministic simulation tests.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::cell::Cell;

use rand::distributions::Distribution;

/// This distribution ignores the random number generator and returns the given values in order,
/// starting over once all of them have been returned.
///
/// This is meant for testing: plugged in place of a real distribution, it makes durations
/// drawn during a simulation predictable.
///
/// ```
/// # use testing::SequenceDistribution;
/// use rand::distributions::Distribution;
/// let dist = SequenceDistribution::new(vec![1.0, 2.0]);
/// let mut rng = rand::thread_rng();
/// assert_eq!(dist.sample(&mut rng), 1.0);
/// assert_eq!(dist.sample(&mut rng), 2.0);
/// assert_eq!(dist.sample(&mut rng), 1.0);
/// ```
pub struct SequenceDistribution<T> {
    values: Vec<T>,
    next: Cell<usize>,
}

impl<T> SequenceDistribution<T> {
    /// Constructs a new distribution cycling through `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "sequence must not be empty");
        Self {
            values,
            next: Cell::new(0),
        }
    }

    /// Number of values drawn so far.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.next.get()
    }
}

impl<T: Copy> Distribution<T> for SequenceDistribution<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> T {
        let idx = self.next.get();
        self.next.replace(idx + 1);
        self.values[idx % self.values.len()]
    }
}

/// A distribution always returning the same value.
pub struct ConstantDistribution<T>(T);

impl<T> ConstantDistribution<T> {
    /// Constructs a distribution that always returns `value`.
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T: Copy> Distribution<T> for ConstantDistribution<T> {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> T {
        self.0
    }
}
