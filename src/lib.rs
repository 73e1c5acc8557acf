//! Numerical solver for the gravitational n-body problem that tracks a
//! rigorous upper bound on its own error and adaptively shrinks the step
//! size until the bound is below a caller-supplied tolerance.
//!
//! The core lives in [`integrator`]: [`advance`] moves one body a single
//! step while propagating worst-case error bounds, and [`integrate`]
//! drives whole-system passes, rolling back and retrying with a smaller
//! step whenever the accumulated bound exceeds tolerance. Input parsing,
//! coordinate conversion and output formatting are side concerns in
//! [`loader`], [`coordinates`] and the binary.

pub mod coordinates;
pub mod integrator;
pub mod loader;
pub mod system;
pub mod vector;

pub use integrator::{advance, integrate, integrate_with, PassReport, SimError};
pub use loader::{parse_solar_system, read_solar_system, LoadError};
pub use system::{Body, ErrorBound, SolarSystem, G};
