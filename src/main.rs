//! Stellar wind CLI - Run wind emission from a JSON scenario.

use std::path::PathBuf;
use std::time::Instant;

use glam::DVec3;
use stellar_wind::{
    InitialWind, Scenario, StellarWind, WindConfig, WindParticle, WindStats,
    compute::constants::{SOLAR_MASS, YEAR},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.json> [--seed N]", args[0]);
        eprintln!();
        eprintln!("Emit stellar wind particles for the stars in a scenario.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  scenario.json  Path to scenario file");
        eprintln!("  --seed N       Override the random seed of the scenario");
        eprintln!();
        eprintln!("Example scenario is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_scenario();
        return;
    }

    let scenario_path = PathBuf::from(&args[1]);
    let seed: Option<u64> = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .map(|s| {
            s.parse().unwrap_or_else(|e| {
                eprintln!("Invalid seed '{}': {}", s, e);
                std::process::exit(1);
            })
        });

    let mut scenario = Scenario::from_json_file(&scenario_path).unwrap_or_else(|e| {
        eprintln!("Error loading scenario: {}", e);
        std::process::exit(1);
    });
    if seed.is_some() {
        scenario.wind.random_seed = seed;
    }
    let timestep = *scenario
        .wind
        .timestep
        .get_or_insert_with(WindConfig::default_timestep);

    println!("Stellar Wind");
    println!("============");
    println!("Mode: {}", scenario.wind.mode.name());
    println!("Stars: {}", scenario.stars.len());
    println!(
        "Particle mass: {:.3e} MSun",
        scenario.wind.sph_particle_mass / SOLAR_MASS
    );
    println!("Timestep: {:.1} yr", timestep / YEAR);
    println!("End time: {:.1} yr", scenario.end_time / YEAR);
    println!();

    let mut wind =
        StellarWind::new(scenario.wind.clone(), Some(Vec::<WindParticle>::new())).unwrap_or_else(
            |e| {
                eprintln!("Invalid wind configuration: {}", e);
                std::process::exit(1);
            },
        );
    wind.add_stars(scenario.new_stars());

    if let Some(n) = scenario.initial_particles {
        let initial = wind
            .create_initial_wind(InitialWind::Particles(n), false)
            .unwrap_or_else(|e| {
                eprintln!("Error creating initial wind: {}", e);
                std::process::exit(1);
            });
        println!("Initial wind: {} particles", initial.len());
        println!();
    }

    println!("Running wind...");
    let start = Instant::now();
    let chunks = 10;

    for i in 1..=chunks {
        let time = scenario.end_time * i as f64 / chunks as f64;
        wind.evolve_model(time);

        let count = wind.target_gas().map_or(0, |gas| gas.len());
        println!(
            "  t={:.1} yr: particles={}, {:.1} ms",
            wind.model_time() / YEAR,
            count,
            start.elapsed().as_secs_f32() * 1000.0
        );
    }

    let elapsed = start.elapsed();
    let gas = wind.target_gas().map(Vec::as_slice).unwrap_or_default();
    let center = scenario
        .stars
        .first()
        .map_or(DVec3::ZERO, |star| star.position);
    let stats = WindStats::from_particles(gas, center);
    let pending: f64 = wind.particles().stars().iter().map(|s| s.lost_mass).sum();

    println!();
    println!("Final wind:");
    println!("  Particles: {}", stats.count);
    println!("  Total mass: {:.6e} MSun", stats.total_mass / SOLAR_MASS);
    println!("  Pending mass: {:.6e} MSun", pending / SOLAR_MASS);
    println!(
        "  Mean speed: {:.2} km/s",
        stats.mean_speed / 1000.0
    );
    println!(
        "  Mean internal energy: {:.4e} J/kg",
        stats.mean_internal_energy
    );
    println!("  Max distance: {:.4e} m", stats.max_distance);
    println!();
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

fn print_example_scenario() {
    let scenario = Scenario::default();

    println!("Example scenario (scenario.json):");
    println!("{}", serde_json::to_string_pretty(&scenario).unwrap());
}
