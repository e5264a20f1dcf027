use std::io::Read;
use std::rc::Rc;

use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::Serialize;
use simcore::{Component, ComponentId, Process, Scheduler, State};

use crate::{CarEvent, CarId, Error, Result};

/// Inter-arrival gaps, in hours, between consecutive cars.
///
/// The same sequence drives both repair regimes of a replication, so that they face identical
/// arrivals. All gaps are positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArrivalDelays(Vec<f64>);

impl ArrivalDelays {
    /// Wraps the given gaps after checking them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArrivalDelay`] for the first gap that is not positive and finite.
    pub fn new(delays: Vec<f64>) -> Result<Self> {
        if let Some((index, &value)) = delays
            .iter()
            .enumerate()
            .find(|(_, d)| !(d.is_finite() && **d > 0.0))
        {
            return Err(Error::InvalidArrivalDelay { index, value });
        }
        Ok(Self(delays))
    }

    /// Draws exponentially distributed gaps with the given mean until their sum passes `horizon`.
    ///
    /// The last gap always ends beyond the horizon, so a run limited to `horizon` never needs
    /// more gaps than generated here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the mean or the horizon is not positive and finite.
    pub fn generate<R: Rng>(rng: &mut R, average_arrival_time: f64, horizon: f64) -> Result<Self> {
        if !(horizon.is_finite() && horizon > 0.0) {
            return Err(Error::InvalidConfig {
                field: "simulation_time",
                value: horizon,
            });
        }
        let invalid_mean = || Error::InvalidConfig {
            field: "average_arrival_time",
            value: average_arrival_time,
        };
        if !(average_arrival_time.is_finite() && average_arrival_time > 0.0) {
            return Err(invalid_mean());
        }
        let distribution = Exp::new(1.0 / average_arrival_time).map_err(|_| invalid_mean())?;
        let mut delays = Vec::new();
        let mut time = 0.0;
        while time <= horizon {
            let delay = distribution.sample(rng);
            time += delay;
            delays.push(delay);
        }
        log::debug!("Generated {} arrival delays", delays.len());
        Self::new(delays)
    }

    /// Reads gaps from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be parsed or contains an invalid gap.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::new(serde_json::from_reader(reader)?)
    }

    /// The gaps.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of gaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no gaps at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Absolute arrival times implied by the gaps, starting from time 0.
    pub fn arrival_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().scan(0.0, |time, delay| {
            *time += delay;
            Some(*time)
        })
    }
}

/// Arrival generator events.
#[derive(Debug, Copy, Clone)]
pub enum Event {
    /// Starts waiting for the first gap.
    Start,
    /// A gap has passed: a new car arrives, and the generator waits for the next gap.
    Arrival,
}

/// Spawns a car process after every gap in the delay sequence.
///
/// It never terminates by itself; the run horizon simply stops dispatching its next arrival.
pub struct ArrivalGenerator {
    delays: Rc<[f64]>,
    next: usize,
    process: Process,
    cars: ComponentId<CarEvent>,
}

impl ArrivalGenerator {
    /// Constructs a generator sending new cars to the `cars` component.
    #[must_use]
    pub fn new(delays: &ArrivalDelays, cars: ComponentId<CarEvent>) -> Self {
        Self {
            delays: Rc::from(delays.as_slice()),
            next: 0,
            process: Process::default(),
            cars,
        }
    }

    fn wait_for_next(
        &mut self,
        self_id: ComponentId<Event>,
        scheduler: &mut Scheduler,
    ) -> simcore::Result<()> {
        let delay = *self
            .delays
            .get(self.next)
            .ok_or(simcore::Error::InputExhausted {
                index: self.next,
                time: scheduler.time(),
            })?;
        self.next += 1;
        self.process.timeout(delay, self_id, Event::Arrival, scheduler)
    }

    fn spawn_car(&mut self, scheduler: &mut Scheduler) -> simcore::Result<()> {
        let id = CarId::from(self.next - 1);
        scheduler.schedule_immediately(self.cars, CarEvent::Arrived(id))
    }
}

impl Component for ArrivalGenerator {
    type Event = Event;

    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
        _: &mut State,
    ) -> simcore::Result<()> {
        match event {
            Event::Start => self.wait_for_next(self_id, scheduler),
            Event::Arrival => {
                self.process.resume()?;
                self.spawn_car(scheduler)?;
                self.wait_for_next(self_id, scheduler)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    #[test]
    fn test_new_rejects_invalid_delays() {
        assert!(ArrivalDelays::new(vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            ArrivalDelays::new(vec![1.0, 0.0]),
            Err(Error::InvalidArrivalDelay { index: 1, .. })
        ));
        assert!(matches!(
            ArrivalDelays::new(vec![-3.0]),
            Err(Error::InvalidArrivalDelay { index: 0, .. })
        ));
        assert!(matches!(
            ArrivalDelays::new(vec![1.0, 2.0, f64::INFINITY]),
            Err(Error::InvalidArrivalDelay { index: 2, .. })
        ));
    }

    #[test]
    fn test_generated_delays_cover_horizon() {
        let mut rng = ChaChaRng::seed_from_u64(42);
        let delays = ArrivalDelays::generate(&mut rng, 8.0, 240.0).unwrap();
        let times: Vec<f64> = delays.arrival_times().collect();
        assert!(*times.last().unwrap() > 240.0);
        assert!(times[..times.len() - 1].iter().all(|&t| t <= 240.0));
    }

    #[test]
    fn test_generate_is_reproducible() {
        let first = ArrivalDelays::generate(&mut ChaChaRng::seed_from_u64(7), 8.0, 500.0).unwrap();
        let second = ArrivalDelays::generate(&mut ChaChaRng::seed_from_u64(7), 8.0, 500.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_rejects_invalid_parameters() {
        let mut rng = ChaChaRng::seed_from_u64(0);
        assert!(matches!(
            ArrivalDelays::generate(&mut rng, 0.0, 10.0),
            Err(Error::InvalidConfig { field: "average_arrival_time", .. })
        ));
        assert!(matches!(
            ArrivalDelays::generate(&mut rng, 8.0, 0.0),
            Err(Error::InvalidConfig { field: "simulation_time", .. })
        ));
    }

    #[test]
    fn test_arrival_times() {
        let delays = ArrivalDelays::new(vec![2.0, 5.0, 100.0]).unwrap();
        assert_eq!(delays.arrival_times().collect::<Vec<_>>(), vec![2.0, 7.0, 107.0]);
    }

    #[test]
    fn test_from_reader() {
        let delays = ArrivalDelays::from_reader("[1.5, 2.5]".as_bytes()).unwrap();
        assert_eq!(delays.as_slice(), &[1.5, 2.5]);
        assert!(matches!(
            ArrivalDelays::from_reader("[1.5, -2.5]".as_bytes()),
            Err(Error::InvalidArrivalDelay { index: 1, .. })
        ));
    }
}
