use simcore::{
    Component, ComponentId, Error, Key, Process, RequestId, ResourceId, Result, Scheduler,
    Simulation, State,
};

#[derive(Debug, Clone, Copy)]
enum Event {
    Arrive(usize),
    Granted(usize),
    Done(usize),
}

#[derive(Default)]
struct Job {
    process: Process,
    request: Option<RequestId>,
    arrived: f64,
    started: f64,
}

/// Jobs arrive at fixed times and each needs the single server for a fixed service time.
struct Server {
    service_times: Vec<f64>,
    jobs: Vec<Job>,
    resource: ResourceId<Event>,
    log: Key<Vec<(usize, f64, f64, f64)>>,
}

impl Component for Server {
    type Event = Event;

    fn process_event(
        &mut self,
        self_id: ComponentId<Event>,
        event: &Event,
        scheduler: &mut Scheduler,
        state: &mut State,
    ) -> Result<()> {
        match *event {
            Event::Arrive(id) => {
                let job = &mut self.jobs[id];
                job.arrived = scheduler.time();
                job.request = Some(job.process.acquire(
                    self.resource,
                    self_id,
                    Event::Granted(id),
                    scheduler,
                    state,
                )?);
            }
            Event::Granted(id) => {
                let job = &mut self.jobs[id];
                job.process.resume()?;
                job.started = scheduler.time();
                job.process
                    .timeout(self.service_times[id], self_id, Event::Done(id), scheduler)?;
            }
            Event::Done(id) => {
                let job = &mut self.jobs[id];
                job.process.resume()?;
                job.process.terminate();
                state
                    .get_mut(self.log)
                    .ok_or(Error::MissingValue("log"))?
                    .push((id, job.arrived, job.started, scheduler.time()));
                let request = job.request.take().ok_or(Error::MissingValue("request"))?;
                state.resource_mut(self.resource).release(request, scheduler)?;
            }
        }
        Ok(())
    }
}

fn run(arrivals: &[f64], service_times: Vec<f64>, horizon: f64) -> Vec<(usize, f64, f64, f64)> {
    let mut sim = Simulation::default();
    let resource = sim.add_resource();
    let log = sim.state.insert(Vec::new());
    let server = sim.add_component(Server {
        jobs: service_times.iter().map(|_| Job::default()).collect(),
        service_times,
        resource,
        log,
    });
    for (id, &time) in arrivals.iter().enumerate() {
        sim.schedule(time, server, Event::Arrive(id)).unwrap();
    }
    sim.run_until(horizon).unwrap();
    sim.state.remove(log).unwrap()
}

#[test]
fn test_jobs_are_served_one_at_a_time_in_arrival_order() {
    let log = run(&[1.0, 2.0, 2.5, 20.0], vec![4.0, 1.0, 2.0, 1.0], 100.0);
    assert_eq!(
        log,
        vec![
            (0, 1.0, 1.0, 5.0),
            (1, 2.0, 5.0, 6.0),
            (2, 2.5, 6.0, 8.0),
            (3, 20.0, 20.0, 21.0),
        ]
    );
    for pair in log.windows(2) {
        assert!(pair[0].3 <= pair[1].2);
    }
}

#[test]
fn test_simultaneous_arrivals_keep_schedule_order() {
    let log = run(&[3.0, 3.0, 3.0], vec![1.0, 1.0, 1.0], 100.0);
    let order: Vec<usize> = log.iter().map(|r| r.0).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(log[2].2, 5.0);
}

#[test]
fn test_horizon_leaves_unfinished_jobs_out() {
    let log = run(&[1.0, 2.0], vec![4.0, 4.0], 6.0);
    assert_eq!(log, vec![(0, 1.0, 1.0, 5.0)]);
}

#[test]
fn test_zero_service_time_aborts_the_run() {
    let mut sim = Simulation::default();
    let resource = sim.add_resource();
    let log = sim.state.insert(Vec::new());
    let server = sim.add_component(Server {
        jobs: vec![Job::default()],
        service_times: vec![0.0],
        resource,
        log,
    });
    sim.schedule(1.0, server, Event::Arrive(0)).unwrap();
    assert!(matches!(
        sim.run_until(10.0),
        Err(Error::NonPositiveDuration(_))
    ));
}
