use std::fs::File;
use std::io::BufReader;

use strike::sim::{max_abs_error, run_simulation, PendulumConfig};
use strike::{read_log, replay, BellObserver, BellParams};

#[test]
fn converges_on_noise_free_swing() {
    let config = PendulumConfig::default();
    let results = run_simulation(&config, BellParams::default()).unwrap();
    assert_eq!(results.len(), 12_000);

    let settled: Vec<_> = results.iter().filter(|s| s.t > 110.0).collect();
    let err_theta: Vec<f64> = settled.iter().map(|s| s.err_theta).collect();
    let err_omega: Vec<f64> = settled.iter().map(|s| s.err_omega).collect();

    assert!(max_abs_error(&err_theta) < 0.05, "angle error {}", max_abs_error(&err_theta));
    assert!(max_abs_error(&err_omega) < 0.01, "rate error {}", max_abs_error(&err_omega));

    let mg_i = settled.last().unwrap().mg_i;
    assert!(
        (mg_i - config.torque_constant).abs() < 0.1,
        "torque constant {mg_i}"
    );
}

#[test]
fn angle_error_shrinks_over_time() {
    let config = PendulumConfig::default();
    let results = run_simulation(&config, BellParams::default()).unwrap();

    let early: Vec<f64> = results
        .iter()
        .filter(|s| s.t < 10.0)
        .map(|s| s.err_theta)
        .collect();
    let late: Vec<f64> = results
        .iter()
        .filter(|s| s.t > 110.0)
        .map(|s| s.err_theta)
        .collect();
    assert!(max_abs_error(&late) < max_abs_error(&early));
}

#[test]
fn replays_recorded_log() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sensor_log.txt");
    let samples = read_log(BufReader::new(File::open(path).unwrap())).unwrap();
    assert_eq!(samples.len(), 925);
    assert_eq!(samples[0].t, 1000.02);
    assert!(samples.windows(2).all(|w| w[0].t <= w[1].t));

    let mut observer = BellObserver::new(BellParams::default(), samples[0].t).unwrap();
    let summary = replay(&mut observer, &samples);

    assert_eq!(summary.samples, 925);
    assert_eq!(summary.resets, 1);
    assert_eq!(summary.out_of_order, 0);
    assert!(summary.bdc_crossings > 0);
    assert!(summary.torque_updates > 0);

    let state = observer.state();
    assert_eq!(state.t, 1020.0);
    assert!(state.theta.is_finite() && state.omega.is_finite());
    assert!((state.mg_i - 12.0).abs() < 0.5);
}

#[test]
fn shipped_config_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/default.toml");
    let params = BellParams::load(std::path::Path::new(path)).unwrap();
    assert_eq!(params, BellParams::default());
}
