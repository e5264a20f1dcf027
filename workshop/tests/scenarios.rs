use float_cmp::approx_eq;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use rstest::rstest;
use testing::SequenceDistribution;
use workshop::{
    run_scenario, run_simulation, simulate_pair, total_stop_hours, ArrivalDelays, CarId,
    CarRecord, WorkshopConfig,
};

fn delays() -> ArrivalDelays {
    ArrivalDelays::new(vec![2.0, 5.0, 100_000.0]).unwrap()
}

#[test]
fn test_second_car_waits_for_the_first() {
    let records = run_scenario(
        ChaChaRng::seed_from_u64(0),
        SequenceDistribution::new(vec![6.0, 1.0]),
        10.0,
        &delays(),
    )
    .unwrap();
    assert_eq!(
        records,
        vec![
            CarRecord::new(CarId::from(0), 2.0, 2.0, 8.0),
            CarRecord::new(CarId::from(1), 7.0, 8.0, 9.0),
        ]
    );
}

#[test]
fn test_repair_ending_at_horizon_is_recorded() {
    let records = run_scenario(
        ChaChaRng::seed_from_u64(0),
        SequenceDistribution::new(vec![8.0, 3.0]),
        10.0,
        &delays(),
    )
    .unwrap();
    assert_eq!(records, vec![CarRecord::new(CarId::from(0), 2.0, 2.0, 10.0)]);
}

#[rstest(seed, case(0), case(1), case(2), case(17), case(42), case(1234))]
fn test_exponential_repairs_within_short_horizon(seed: u64) {
    let records =
        run_simulation(7.0, 10.0, &delays(), ChaChaRng::seed_from_u64(seed)).unwrap();
    assert!(records.len() <= 2);
    if let Some(first) = records.first() {
        assert_eq!(first.id(), CarId::from(0));
        assert_eq!(first.arrival_time(), 2.0);
        assert_eq!(first.start_repair_time(), 2.0);
        assert!(first.end_repair_time() <= 10.0);
    }
    if let [first, second] = records.as_slice() {
        assert_eq!(second.arrival_time(), 7.0);
        assert!(second.start_repair_time() >= first.end_repair_time());
        assert!(second.start_repair_time() >= 7.0);
    }
}

#[test]
fn test_paired_scenarios_share_arrivals() {
    let config = WorkshopConfig {
        total_days: 60,
        ..WorkshopConfig::default()
    };
    let pair = simulate_pair(&config, 0).unwrap();
    let arrivals: Vec<f64> = pair.delays.arrival_times().collect();
    assert!(!pair.initial.is_empty());
    assert!(!pair.new.is_empty());
    for (initial, new) in pair.initial.iter().zip(&pair.new) {
        assert_eq!(initial.id(), new.id());
        assert_eq!(initial.arrival_time(), new.arrival_time());
        assert_eq!(initial.arrival_time(), arrivals[usize::from(initial.id())]);
    }
    assert_ne!(pair.initial, pair.new);
}

#[test]
fn test_longer_repairs_stop_cars_longer() {
    let config = WorkshopConfig {
        total_days: 30,
        ..WorkshopConfig::default()
    };
    let replications = 100;
    let (initial, new) = (0..replications)
        .map(|index| simulate_pair(&config, index).unwrap())
        .fold((0.0, 0.0), |(initial, new), pair| {
            (
                initial + total_stop_hours(&pair.initial),
                new + total_stop_hours(&pair.new),
            )
        });
    assert!(initial / replications as f64 > new / replications as f64);
}

#[test]
fn test_stop_time_is_waiting_plus_repair() {
    let config = WorkshopConfig {
        total_days: 10,
        ..WorkshopConfig::default()
    };
    let pair = simulate_pair(&config, 5).unwrap();
    for record in pair.initial.iter().chain(&pair.new) {
        let repair = record.end_repair_time() - record.start_repair_time();
        assert!(approx_eq!(
            f64,
            record.time_stopped(),
            record.waiting_time() + repair,
            epsilon = 1e-9
        ));
    }
}
