use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Distribution, Exp};
use simcore::{Component, ComponentId, Key, Process, RequestId, ResourceId, Scheduler, State};

use crate::{CarId, CarRecord, Error, Result};

/// Builds the exponential distribution of repair hours with the given mean.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if the mean is not positive and finite.
pub fn repair_time_distribution(average_repair_time: f64) -> Result<Exp<f64>> {
    let invalid = || Error::InvalidConfig {
        field: "average_repair_time",
        value: average_repair_time,
    };
    if !(average_repair_time.is_finite() && average_repair_time > 0.0) {
        return Err(invalid());
    }
    Exp::new(1.0 / average_repair_time).map_err(|_| invalid())
}

/// Where a car is in its visit to the workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarPhase {
    /// Just arrived, has not asked for the bay yet.
    Arrived,
    /// In line for the repair bay.
    Waiting,
    /// Holding the bay.
    Repairing,
    /// Repaired and gone; the record has been written.
    Departed,
}

/// Local state of a single car process.
#[derive(Debug)]
pub struct Car {
    id: CarId,
    arrival_time: f64,
    start_repair_time: Option<f64>,
    request: Option<RequestId>,
    phase: CarPhase,
    process: Process,
}

impl Car {
    /// A car that has just arrived.
    #[must_use]
    pub fn new(id: CarId, arrival_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            start_repair_time: None,
            request: None,
            phase: CarPhase::Arrived,
            process: Process::default(),
        }
    }

    /// The ID of the car.
    #[must_use]
    pub fn id(&self) -> CarId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CarPhase {
        self.phase
    }
}

/// Car process events.
#[derive(Debug, Copy, Clone)]
pub enum CarEvent {
    /// A new car process is spawned.
    Arrived(CarId),
    /// The repair bay has been granted to the car.
    BayGranted(CarId),
    /// The car's repair time has elapsed.
    RepairFinished(CarId),
}

/// Runs the lifecycle of every car: arrive, wait for the bay, get repaired, leave.
///
/// Repair hours are drawn from `repair_time` using `rng`. Finished cars are appended to the
/// record log stored in the state under `log`.
pub struct CarProcess<R, D> {
    rng: R,
    repair_time: D,
    bay: ResourceId<CarEvent>,
    log: Key<Vec<CarRecord>>,
    cars: HashMap<CarId, Car>,
}

impl<R, D> CarProcess<R, D>
where
    R: Rng,
    D: Distribution<f64>,
{
    /// Constructs the car process over the given repair bay and record log.
    pub fn new(rng: R, repair_time: D, bay: ResourceId<CarEvent>, log: Key<Vec<CarRecord>>) -> Self {
        Self {
            rng,
            repair_time,
            bay,
            log,
            cars: HashMap::new(),
        }
    }

    /// Cars currently in the workshop.
    pub fn cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    fn arrive(
        &mut self,
        self_id: ComponentId<CarEvent>,
        id: CarId,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> simcore::Result<()> {
        log::debug!("[{:.4}] Car {} arrived", scheduler.time(), id);
        let mut car = Car::new(id, scheduler.time());
        car.request = Some(car.process.acquire(
            self.bay,
            self_id,
            CarEvent::BayGranted(id),
            scheduler,
            state,
        )?);
        car.phase = CarPhase::Waiting;
        self.cars.insert(id, car);
        Ok(())
    }

    fn start_repair(
        &mut self,
        self_id: ComponentId<CarEvent>,
        id: CarId,
        scheduler: &mut Scheduler,
    ) -> simcore::Result<()> {
        let car = self
            .cars
            .get_mut(&id)
            .ok_or(simcore::Error::MissingValue("car"))?;
        car.process.resume()?;
        car.start_repair_time = Some(scheduler.time());
        car.phase = CarPhase::Repairing;
        let duration = self.repair_time.sample(&mut self.rng);
        log::debug!(
            "[{:.4}] Car {} enters the bay for {:.4} hours",
            scheduler.time(),
            id,
            duration
        );
        car.process
            .timeout(duration, self_id, CarEvent::RepairFinished(id), scheduler)
    }

    fn depart(car: &mut Car, time: f64, log: &mut Vec<CarRecord>) -> simcore::Result<()> {
        car.process.resume()?;
        let start_repair_time = car
            .start_repair_time
            .ok_or(simcore::Error::MissingValue("start of repair"))?;
        log.push(CarRecord::new(car.id, car.arrival_time, start_repair_time, time));
        car.phase = CarPhase::Departed;
        car.process.terminate();
        log::debug!("[{:.4}] Car {} departed", time, car.id);
        Ok(())
    }

    fn release(&self, car: &Car, scheduler: &mut Scheduler, state: &mut State) -> simcore::Result<()> {
        let request = car
            .request
            .ok_or(simcore::Error::MissingValue("bay request"))?;
        state.resource_mut(self.bay).release(request, scheduler)
    }
}

impl<R, D> Component for CarProcess<R, D>
where
    R: Rng,
    D: Distribution<f64>,
{
    type Event = CarEvent;

    fn process_event(
        &mut self,
        self_id: ComponentId<Self::Event>,
        event: &Self::Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> simcore::Result<()> {
        match *event {
            CarEvent::Arrived(id) => self.arrive(self_id, id, scheduler, state),
            CarEvent::BayGranted(id) => {
                let started = self.start_repair(self_id, id, scheduler);
                if started.is_err() {
                    if let Some(car) = self.cars.get(&id) {
                        self.release(car, scheduler, state)?;
                    }
                }
                started
            }
            CarEvent::RepairFinished(id) => {
                let mut car = self
                    .cars
                    .remove(&id)
                    .ok_or(simcore::Error::MissingValue("car"))?;
                let departed = match state.get_mut(self.log) {
                    Some(log) => Self::depart(&mut car, scheduler.time(), log),
                    None => Err(simcore::Error::MissingValue("car record log")),
                };
                self.release(&car, scheduler, state)?;
                departed
            }
        }
    }
}
