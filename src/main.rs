use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use nbody_adaptive::{coordinates, integrate, read_solar_system};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Coordinates {
    /// Cartesian x/y/z.
    #[value(alias = "c")]
    Cartesian,
    /// Mathematical spherical: r, azimuthal angle, polar angle.
    #[value(alias = "s")]
    Spherical,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the system description file.
    file: PathBuf,

    /// Length of time to simulate, in seconds.
    end_time: f64,

    /// Largest acceptable error in the final position of any body, in
    /// meters. The bound is generally far above the actual error, so it
    /// can be useful to pass a huge value here and pin STEP instead.
    max_error: f64,

    /// Initial trial step size in seconds [default: min(end_time/1000, 100)].
    step: Option<f64>,

    /// Coordinate system used to print the final positions.
    #[arg(short, long, value_enum, default_value = "cartesian")]
    coords: Coordinates,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let mut system = read_solar_system(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    let step = args
        .step
        .unwrap_or_else(|| (args.end_time / 1000.0).min(100.0));

    println!("Simulating {}:", system.name);
    integrate(&mut system, args.max_error, args.end_time, step)?;
    println!("No collisions have occurred.");

    for body in &system.bodies {
        let [vx, vy, vz] = body.velocity;
        match args.coords {
            Coordinates::Cartesian => {
                let [x, y, z] = body.position;
                println!(
                    "{} is located at ({x}m, {y}m, {z}m), with velocity vector ({vx}m/s, {vy}m/s, {vz}m/s).",
                    body.name
                );
            }
            Coordinates::Spherical => {
                let [r, azimuth, polar] = coordinates::to_spherical(&body.position);
                println!(
                    "{} is {r}m from the center, at azimuthal angle {azimuth} and polar angle {polar}, with velocity vector ({vx}m/s, {vy}m/s, {vz}m/s).",
                    body.name
                );
            }
        }
    }
    Ok(())
}
