//! Body and system state, plus the saturating error-bound type.

use std::fmt;
use std::ops::{Add, AddAssign};

/// Gravitational constant, m^3 kg^-1 s^-2.
pub const G: f64 = 6.67e-11;

/// Upper bound on accumulated numerical error in a position or velocity.
///
/// `Unbounded` replaces the `DBL_MAX / 2` sentinel of older n-body codes:
/// it marks that no useful bound could be computed for this pass, and every
/// arithmetic operation on it saturates. `Bounded` values sort below
/// `Unbounded`, so max-folds over a generation pick the sentinel whenever
/// any body has degenerated.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum ErrorBound {
    Bounded(f64),
    Unbounded,
}

impl ErrorBound {
    pub const ZERO: ErrorBound = ErrorBound::Bounded(0.0);

    pub fn is_unbounded(self) -> bool {
        matches!(self, ErrorBound::Unbounded)
    }

    /// The bound as a number, if one exists.
    pub fn value(self) -> Option<f64> {
        match self {
            ErrorBound::Bounded(e) => Some(e),
            ErrorBound::Unbounded => None,
        }
    }

    /// The larger of two bounds; `Unbounded` dominates.
    pub fn max(self, other: ErrorBound) -> ErrorBound {
        if other > self {
            other
        } else {
            self
        }
    }
}

impl Add<f64> for ErrorBound {
    type Output = ErrorBound;

    /// Saturating addition of a non-negative error contribution. A sum that
    /// overflows to a non-finite value degenerates to `Unbounded`.
    fn add(self, amount: f64) -> ErrorBound {
        match self {
            ErrorBound::Bounded(e) => {
                let sum = e + amount;
                if sum.is_finite() {
                    ErrorBound::Bounded(sum)
                } else {
                    ErrorBound::Unbounded
                }
            }
            ErrorBound::Unbounded => ErrorBound::Unbounded,
        }
    }
}

impl AddAssign<f64> for ErrorBound {
    fn add_assign(&mut self, amount: f64) {
        *self = *self + amount;
    }
}

impl fmt::Display for ErrorBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBound::Bounded(e) => write!(f, "{e}"),
            ErrorBound::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// One massive body. Positions are meters, velocities m/s, masses kg.
#[derive(Clone, Debug)]
pub struct Body {
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub position_error: ErrorBound,
    pub velocity_error: ErrorBound,
}

impl Body {
    /// A freshly loaded body carries zero accumulated error.
    pub fn new(name: String, mass: f64, radius: f64, position: [f64; 3], velocity: [f64; 3]) -> Body {
        Body {
            name,
            mass,
            radius,
            position,
            velocity,
            position_error: ErrorBound::ZERO,
            velocity_error: ErrorBound::ZERO,
        }
    }
}

/// The full system snapshot: an ordered, fixed-count set of bodies.
#[derive(Clone, Debug)]
pub struct SolarSystem {
    pub name: String,
    pub bodies: Vec<Body>,
    /// Sum of body masses, fixed at construction. Bodies never gain or
    /// lose mass, so this is never recomputed.
    pub system_mass: f64,
}

impl SolarSystem {
    pub fn new(name: String, bodies: Vec<Body>) -> SolarSystem {
        let system_mass = bodies.iter().map(|b| b.mass).sum();
        SolarSystem {
            name,
            bodies,
            system_mass,
        }
    }

    /// Largest position-error bound over all bodies.
    pub fn max_position_error(&self) -> ErrorBound {
        self.bodies
            .iter()
            .map(|b| b.position_error)
            .fold(ErrorBound::ZERO, ErrorBound::max)
    }
}
