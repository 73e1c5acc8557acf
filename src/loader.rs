//! Reads a solar system description from an ASCII text file.
//!
//! Format, one record per line, whitespace-separated:
//!
//! ```text
//! system_name number_of_bodies [coordinate_system]
//! name mass radius x y z vx vy vz
//! ...
//! ```
//!
//! `coordinate_system` is `c` (Cartesian, the default) or `s` for
//! mathematical spherical, in which case each position is `r azimuth
//! polar` and is converted to Cartesian at load. Velocities are always
//! Cartesian. Units are kg, m, s.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::coordinates::to_cartesian;
use crate::system::{Body, SolarSystem};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing header line")]
    MissingHeader,
    #[error("header: body count {0:?} is not a number")]
    BadBodyCount(String),
    #[error("header: unknown coordinate system {0:?} (expected \"c\" or \"s\")")]
    BadCoordinateSystem(String),
    #[error("line {line}: expected 9 fields (name mass radius position velocity), found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: {token:?} is not a number")]
    BadNumber { line: usize, token: String },
    #[error("line {line}: body {name:?} must have positive mass")]
    BadMass { line: usize, name: String },
    #[error("header promised {expected} bodies, file contains {found}")]
    BodyCount { expected: usize, found: usize },
}

enum CoordinateSystem {
    Cartesian,
    Spherical,
}

/// Reads and parses the system description at `path`.
pub fn read_solar_system(path: &Path) -> Result<SolarSystem, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_solar_system(&text)
}

/// Parses a system description from text. Blank lines are ignored.
pub fn parse_solar_system(text: &str) -> Result<SolarSystem, LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(LoadError::MissingHeader)?;
    let mut fields = header.split_whitespace();
    let name = fields.next().ok_or(LoadError::MissingHeader)?.to_string();
    let count_token = fields.next().ok_or(LoadError::MissingHeader)?;
    let expected: usize = count_token
        .parse()
        .map_err(|_| LoadError::BadBodyCount(count_token.to_string()))?;
    let coordinates = match fields.next() {
        None | Some("c") => CoordinateSystem::Cartesian,
        Some("s") => CoordinateSystem::Spherical,
        Some(other) => return Err(LoadError::BadCoordinateSystem(other.to_string())),
    };

    let mut bodies = Vec::with_capacity(expected);
    for (line, record) in lines {
        let fields: Vec<&str> = record.split_whitespace().collect();
        if fields.len() != 9 {
            return Err(LoadError::FieldCount {
                line,
                found: fields.len(),
            });
        }
        let mut numbers = [0.0_f64; 8];
        for (slot, token) in numbers.iter_mut().zip(&fields[1..]) {
            *slot = token.parse().map_err(|_| LoadError::BadNumber {
                line,
                token: (*token).to_string(),
            })?;
        }
        let [mass, radius, px, py, pz, vx, vy, vz] = numbers;
        if mass <= 0.0 {
            return Err(LoadError::BadMass {
                line,
                name: fields[0].to_string(),
            });
        }
        let position = match coordinates {
            CoordinateSystem::Cartesian => [px, py, pz],
            CoordinateSystem::Spherical => to_cartesian(&[px, py, pz]),
        };
        bodies.push(Body::new(
            fields[0].to_string(),
            mass,
            radius,
            position,
            [vx, vy, vz],
        ));
    }

    if bodies.len() != expected {
        return Err(LoadError::BodyCount {
            expected,
            found: bodies.len(),
        });
    }
    Ok(SolarSystem::new(name, bodies))
}
