//! Pendulum Swing Example
//!
//! Runs the bell observer over a simulated swing with gyro noise and a sensor
//! dropout, prints tracking metrics and writes the trajectory as CSV

use std::fs;

use strike::sim::{max_abs_error, rms_error, run_simulation, PendulumConfig};
use strike::BellParams;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Running bell swing simulation...\n");

    fs::create_dir_all("out")?;

    let config = PendulumConfig {
        dt: 0.01,
        duration: 180.0,
        torque_constant: 12.25,
        initial_angle: 2.5,
        noise_sigma: 0.02,
        dropout_at: Some(90.0),
        dropout_gap: 1.5,
        seed: 42,
    };
    let params = BellParams::default();

    println!("Configuration:");
    println!("  Sample period: {}", config.dt);
    println!("  Duration: {} s", config.duration);
    println!("  True Mg/I: {}", config.torque_constant);
    println!("  Release angle: {:.1} deg", config.initial_angle.to_degrees());
    println!("  Gyro noise sigma: {}", config.noise_sigma);
    if let Some(at) = config.dropout_at {
        println!("  Dropout: {:.1} s at t={:.1}", config.dropout_gap, at);
    }
    println!();

    let results = run_simulation(&config, params)?;

    // Settled window: the last 20 s before the dropout and the last 20 s of the run.
    let windows = [(70.0, 90.0), (config.duration - 20.0, config.duration)];

    println!("METRICS SUMMARY");
    println!("===============");
    for (start, end) in windows {
        let settled: Vec<_> = results
            .iter()
            .filter(|s| s.t >= start && s.t < end)
            .collect();
        let err_theta: Vec<f64> = settled.iter().map(|s| s.err_theta.to_degrees()).collect();
        let err_omega: Vec<f64> = settled.iter().map(|s| s.err_omega).collect();
        let mg_i = settled.last().map_or(f64::NAN, |s| s.mg_i);

        println!("\nt in [{start:.0}, {end:.0}):");
        println!("  Angle RMS error:  {:.3} deg", rms_error(&err_theta));
        println!("  Angle peak error: {:.3} deg", max_abs_error(&err_theta));
        println!("  Rate RMS error:   {:.4} rad/s", rms_error(&err_omega));
        println!("  Mg/I estimate:    {:.3}", mg_i);
    }

    let csv_path = "out/swing.csv";
    let mut wtr = csv::Writer::from_path(csv_path)?;
    for step in &results {
        wtr.serialize(step)?;
    }
    wtr.flush()?;

    println!("\nCSV output written to: {}", csv_path);
    println!("Done!");

    Ok(())
}
