//! The simulation core: a single-step integrator that tracks a rigorous
//! upper bound on the numerical error it introduces, and an adaptive
//! stepper that shrinks the step size until the accumulated bound is
//! below the caller's tolerance.
//!
//! The per-step bound is a Taylor-remainder argument. The true error in
//! velocity each step is at most
//! `step_size * |acceleration_error| + 1/2 * step_size^2 * M`
//! and the true error in position each step is at most
//! `step_size * |velocity_error| + 1/6 * step_size^3 * M`,
//! where M is an upper bound on the magnitude of the jerk over the step.

use std::mem;

use thiserror::Error;
use tracing::info;

use crate::system::{Body, ErrorBound, SolarSystem, G};
use crate::vector::{dist, norm};

/// Terminal failures of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Two bodies came within the sum of their radii. The simulation
    /// cannot model contact, so the whole run is abandoned.
    #[error("collision detected between {0} and {1}")]
    Collision(String, String),

    /// Rescaling drove the trial step below the floor at which the
    /// simulated clock can still advance.
    #[error("tolerance {tolerance}m unattainable: trial step {step_size}s fell below {floor}s")]
    ToleranceUnattainable {
        tolerance: f64,
        step_size: f64,
        floor: f64,
    },
}

/// Outcome of one pass attempt, reported to the observer.
#[derive(Clone, Copy, Debug)]
pub struct PassReport {
    /// Trial step size the pass ran at.
    pub step_size: f64,
    /// Worst position-error bound over all bodies at the end of the pass.
    pub error: ErrorBound,
}

/// Separation between two bodies after subtracting both accumulated
/// position-error bounds: a conservative lower bound on their true
/// separation. `None` when the bounds swallow the whole separation and
/// no positive lower bound remains.
fn widened_separation(d: f64, a: &Body, b: &Body) -> Option<f64> {
    match (a.position_error.value(), b.position_error.value()) {
        (Some(ea), Some(eb)) => {
            let w = d - ea - eb;
            (w > 0.0).then_some(w)
        }
        _ => None,
    }
}

/// Upper bound M on the magnitude of the jerk of any body over the next
/// `step_size`, or `None` when no meaningful bound exists.
///
/// `t` is a lower bound on the time it would take the system to collide
/// if all of its mass were concentrated in the two closest bodies, both
/// travelling towards each other at the maximum speed of any body. A
/// step at least that long makes the bound useless.
fn jerk_bound(s: &SolarSystem, p: &Body, min_dist: f64, max_velocity: Option<f64>, step_size: f64) -> Option<f64> {
    if s.bodies.len() < 2 {
        return Some(0.0);
    }
    let v_max = max_velocity?;
    if min_dist <= 0.0 {
        return None;
    }
    let t = min_dist
        / (2.0
            * (s.system_mass.powi(2) / (p.mass * (s.system_mass - p.mass)) * v_max
                + 4.0 * G * s.system_mass / min_dist)
                .sqrt());
    if step_size >= t {
        return None;
    }
    // Distance between the two hypothetical bodies after step_size, and
    // the rate at which it would then be falling (energy argument).
    let new_min_dist = (1.0 - step_size / t) * min_dist;
    let falling_speed =
        (2.0 * G * (1.0 / new_min_dist - 1.0 / min_dist) / p.mass + (2.0 * v_max).powi(2)).sqrt();
    Some(s.system_mass * G * falling_speed / new_min_dist.powi(3))
}

/// Advances one body by `step_size`, returning its next-generation state
/// with updated error bounds. The snapshot `s` is never mutated; every
/// body's update reads every other body's current position and mass.
///
/// The returned bounds are cumulative: assuming the jerk bound is valid,
/// they are rigorous upper bounds on the deviation from the exact
/// continuous solution, given the bounds already present in the input.
pub fn advance(s: &SolarSystem, index: usize, step_size: f64) -> Result<Body, SimError> {
    let bodies = &s.bodies;
    let mut p = bodies[index].clone();

    let mut min_dist = f64::INFINITY;
    let mut max_velocity = Some(0.0_f64);
    for (i, other) in bodies.iter().enumerate() {
        if i != index {
            let d = dist(&p.position, &other.position);
            if d <= p.radius + other.radius {
                return Err(SimError::Collision(p.name.clone(), other.name.clone()));
            }
            // Lower bound on separation, accounting for accumulated error.
            min_dist = min_dist.min(widened_separation(d, &p, other).unwrap_or(f64::NEG_INFINITY));
        }
        // Upper bound on the speed of any body in the system.
        max_velocity = match (max_velocity, other.velocity_error.value()) {
            (Some(mv), Some(e)) => Some(mv.max(norm(&other.velocity) + e)),
            _ => None,
        };
    }

    let jerk = jerk_bound(s, &p, min_dist, max_velocity, step_size);

    // New velocity from direct pairwise Newtonian attraction.
    let mut new_velocity = p.velocity;
    for (j, other) in bodies.iter().enumerate() {
        if j == index {
            continue;
        }
        let d = dist(&p.position, &other.position);
        let multiplier = step_size * other.mass * G / d.powi(3);
        match widened_separation(d, &p, other) {
            Some(w) => {
                // Acceleration error contributed by the uncertainty in
                // where body j actually is.
                p.velocity_error += step_size * other.mass * G * (1.0 / w.powi(2) - 1.0 / d.powi(2));
            }
            None => p.position_error = ErrorBound::Unbounded,
        }
        for k in 0..3 {
            new_velocity[k] += (other.position[k] - p.position[k]) * multiplier;
        }
    }

    for k in 0..3 {
        p.position[k] += step_size * (p.velocity[k] + new_velocity[k]) / 2.0; // trapezoidal rule
        p.velocity[k] = new_velocity[k];
    }

    match jerk {
        Some(m) => {
            p.velocity_error += step_size.powi(2) * m / 2.0;
            p.position_error = match p.velocity_error.value() {
                Some(ve) => p.position_error + (step_size * ve + step_size.powi(3) * m / 6.0),
                None => ErrorBound::Unbounded,
            };
        }
        // No jerk bound means neither field can be trusted this pass.
        None => {
            p.position_error = ErrorBound::Unbounded;
            p.velocity_error = ErrorBound::Unbounded;
        }
    }

    Ok(p)
}

/// Integrates the system from t=0 to `end_time`, retrying whole passes at
/// smaller step sizes until the worst position-error bound is below
/// `tolerance`. On success the system holds the accepted final generation.
pub fn integrate(
    s: &mut SolarSystem,
    tolerance: f64,
    end_time: f64,
    initial_step: f64,
) -> Result<(), SimError> {
    integrate_with(s, tolerance, end_time, initial_step, |_| {})
}

/// [`integrate`] with an observer invoked once per pass attempt.
pub fn integrate_with<F>(
    s: &mut SolarSystem,
    tolerance: f64,
    end_time: f64,
    initial_step: f64,
    mut observer: F,
) -> Result<(), SimError>
where
    F: FnMut(&PassReport),
{
    let rollback = s.bodies.clone();
    let mut scratch = s.bodies.clone();
    let mut step_size = initial_step;
    // Below this the simulated clock can no longer reliably advance.
    let floor = end_time * f64::EPSILON;

    loop {
        let mut time = 0.0;
        while time < end_time {
            let h = step_size.min(end_time - time); // land exactly on end_time
            for i in 0..s.bodies.len() {
                scratch[i] = advance(s, i, h)?;
            }
            mem::swap(&mut s.bodies, &mut scratch);
            time += step_size;
        }

        let error = s.max_position_error();
        info!(step = step_size, %error, "pass complete");
        observer(&PassReport { step_size, error });

        match error.value() {
            Some(e) if e < tolerance => return Ok(()),
            // Error grows approximately linearly with step size for a
            // single Newton step, so aim just under tolerance.
            Some(e) => step_size *= 0.95 * tolerance / e,
            // Degenerate bound, recover coarsely.
            None => step_size /= 10.0,
        }
        if step_size < floor {
            return Err(SimError::ToleranceUnattainable {
                tolerance,
                step_size,
                floor,
            });
        }
        s.bodies.clone_from(&rollback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body(name: &str, mass: f64, radius: f64, position: [f64; 3], velocity: [f64; 3]) -> Body {
        Body::new(name.to_string(), mass, radius, position, velocity)
    }

    fn random_system(n: usize) -> SolarSystem {
        let bodies = (0..n)
            .map(|i| {
                let position = [
                    i as f64 * 10.0 + fastrand::f64(),
                    fastrand::f64() * 5.0,
                    fastrand::f64() * 5.0,
                ];
                let velocity = [
                    fastrand::f64() - 0.5,
                    fastrand::f64() - 0.5,
                    fastrand::f64() - 0.5,
                ];
                body(&format!("b{i}"), 1e9 + fastrand::f64() * 1e10, 1e-3, position, velocity)
            })
            .collect();
        SolarSystem::new("random".to_string(), bodies)
    }

    #[test]
    fn collision_signaled_iff_separation_within_radii() {
        let touching = SolarSystem::new(
            "touching".to_string(),
            vec![
                body("a", 1e10, 0.5, [0.0, 0.0, 0.0], [0.0; 3]),
                body("b", 1e10, 0.5, [1.0, 0.0, 0.0], [0.0; 3]),
            ],
        );
        match advance(&touching, 0, 1e-3) {
            Err(SimError::Collision(a, b)) => {
                assert_eq!(a, "a");
                assert_eq!(b, "b");
            }
            other => panic!("expected collision, got {other:?}"),
        }

        let separated = SolarSystem::new(
            "separated".to_string(),
            vec![
                body("a", 1e10, 0.49, [0.0, 0.0, 0.0], [0.0; 3]),
                body("b", 1e10, 0.49, [1.0, 0.0, 0.0], [0.0; 3]),
            ],
        );
        assert!(advance(&separated, 0, 1e-3).is_ok());
    }

    #[test]
    fn error_bounds_never_decrease() {
        fastrand::seed(7);
        for _ in 0..20 {
            let mut s = random_system(2 + fastrand::usize(..4));
            for h in [1e-4, 1e-2, 1.0] {
                let mut next = Vec::with_capacity(s.bodies.len());
                for i in 0..s.bodies.len() {
                    let before = &s.bodies[i];
                    let after = advance(&s, i, h).unwrap();
                    assert!(
                        after.position_error >= before.position_error,
                        "position_error shrank at h={h}"
                    );
                    assert!(
                        after.velocity_error >= before.velocity_error,
                        "velocity_error shrank at h={h}"
                    );
                    next.push(after);
                }
                s.bodies = next;
            }
        }
    }

    #[test]
    fn unbounded_position_error_saturates() {
        let mut s = random_system(3);
        s.bodies[0].position_error = ErrorBound::Unbounded;
        let after = advance(&s, 0, 1e-3).unwrap();
        assert!(after.position_error.is_unbounded());
        // The degenerate pair also poisons the partner's bound.
        let partner = advance(&s, 1, 1e-3).unwrap();
        assert!(partner.position_error.is_unbounded());
    }

    #[test]
    fn velocity_update_matches_pairwise_attraction() {
        let m = 1e12;
        let s = SolarSystem::new(
            "pair".to_string(),
            vec![
                body("heavy", m, 1e-3, [0.0, 0.0, 0.0], [0.0; 3]),
                body("light", 1e3, 1e-3, [10.0, 0.0, 0.0], [0.0; 3]),
            ],
        );
        let h = 1e-6; // small enough that the jerk bound is meaningful
        let after = advance(&s, 1, h).unwrap();
        // dv = h * G * m / d^2, pointed at the heavy body.
        let expected_dv = h * G * m / 100.0;
        assert_relative_eq!(after.velocity[0], -expected_dv, max_relative = 1e-12);
        assert_relative_eq!(after.velocity[1], 0.0);
        // Trapezoidal position update: half the new velocity over the step.
        assert_relative_eq!(after.position[0], 10.0 - h * expected_dv / 2.0, max_relative = 1e-12);
        assert!(after.position_error > ErrorBound::ZERO);
    }

    #[test]
    fn oversized_step_degenerates_both_bounds() {
        let s = random_system(2);
        // A step far beyond the collision-time bound t.
        let after = advance(&s, 0, 1e30).unwrap();
        assert!(after.position_error.is_unbounded());
        assert!(after.velocity_error.is_unbounded());
    }
}
