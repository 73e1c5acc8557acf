//! Conversion between Cartesian and (mathematical) spherical coordinates.
//!
//! Spherical triples are `[r, azimuth, polar]`: azimuth measured in the
//! x-y plane from +x, polar angle measured from +z.

use crate::vector::norm;

/// Converts spherical coordinates to Cartesian coordinates.
pub fn to_cartesian(spherical: &[f64; 3]) -> [f64; 3] {
    let [r, azimuth, polar] = *spherical;
    [
        r * polar.sin() * azimuth.cos(),
        r * polar.sin() * azimuth.sin(),
        r * polar.cos(),
    ]
}

/// Converts Cartesian coordinates to spherical coordinates.
pub fn to_spherical(cartesian: &[f64; 3]) -> [f64; 3] {
    let [x, y, z] = *cartesian;
    [norm(cartesian), y.atan2(x), x.hypot(y).atan2(z)]
}
