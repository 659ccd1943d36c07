//! # Coordinate translator
//!
//! The external field-model engine identifies a coordinate frame/representation pair by a
//! single integer code (`sysaxes`). This module owns that closed mapping and the explicit
//! Cartesian ↔ spherical helpers needed when a caller supplies a representation the engine
//! does not accept for a given frame.
//!
//! The mapping is a pure lookup table so that supporting a new frame is a one-line edit.
//! No conversion logic lives in the table itself.
//!
//! Spherical triplets are `[r, latitude_deg, longitude_deg]` (latitude, not colatitude).

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use nalgebra::Vector3;
use once_cell::sync::Lazy;

use crate::constants::{Degree, Re};
use crate::magshell_errors::MagshellError;

/// Coordinate frames known to this layer.
///
/// Not every frame is accepted by the engine in both representations; see [`sys_axes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordFrame {
    /// Geodetic (altitude, latitude, longitude)
    Gdz,
    /// Geographic (Earth-fixed)
    Geo,
    /// Geocentric solar magnetospheric
    Gsm,
    /// Geocentric solar ecliptic
    Gse,
    /// Solar magnetic
    Sm,
    /// Geocentric equatorial inertial
    Gei,
    /// Geomagnetic dipole
    Mag,
    /// Geographic in spherical components
    Sph,
    /// Radius / latitude / longitude
    Rll,
}

/// Component representation of a position triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordRep {
    Cartesian,
    Spherical,
}

impl CoordRep {
    /// The other representation of the same frame.
    pub fn opposite(self) -> Self {
        match self {
            CoordRep::Cartesian => CoordRep::Spherical,
            CoordRep::Spherical => CoordRep::Cartesian,
        }
    }
}

impl fmt::Display for CoordFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordFrame::Gdz => "GDZ",
            CoordFrame::Geo => "GEO",
            CoordFrame::Gsm => "GSM",
            CoordFrame::Gse => "GSE",
            CoordFrame::Sm => "SM",
            CoordFrame::Gei => "GEI",
            CoordFrame::Mag => "MAG",
            CoordFrame::Sph => "SPH",
            CoordFrame::Rll => "RLL",
        };
        write!(f, "{name}")
    }
}

impl FromStr for CoordFrame {
    type Err = MagshellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GDZ" => Ok(CoordFrame::Gdz),
            "GEO" => Ok(CoordFrame::Geo),
            "GSM" => Ok(CoordFrame::Gsm),
            "GSE" => Ok(CoordFrame::Gse),
            "SM" => Ok(CoordFrame::Sm),
            "GEI" => Ok(CoordFrame::Gei),
            "MAG" => Ok(CoordFrame::Mag),
            "SPH" => Ok(CoordFrame::Sph),
            "RLL" => Ok(CoordFrame::Rll),
            _ => Err(MagshellError::InvalidFrameName(s.to_string())),
        }
    }
}

impl fmt::Display for CoordRep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordRep::Cartesian => write!(f, "car"),
            CoordRep::Spherical => write!(f, "sph"),
        }
    }
}

impl FromStr for CoordRep {
    type Err = MagshellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "car" => Ok(CoordRep::Cartesian),
            "sph" => Ok(CoordRep::Spherical),
            _ => Err(MagshellError::InvalidRepName(s.to_string())),
        }
    }
}

/// `sysaxes` code of GEO/Cartesian, the frame in which the engine reports traced positions.
pub const GEO_CAR_CODE: i32 = 1;

/// The closed (frame, representation) → `sysaxes` table of the engine.
const SYSAXES_TABLE: &[(CoordFrame, CoordRep, i32)] = &[
    (CoordFrame::Gdz, CoordRep::Spherical, 0),
    (CoordFrame::Geo, CoordRep::Cartesian, 1),
    (CoordFrame::Gsm, CoordRep::Cartesian, 2),
    (CoordFrame::Gse, CoordRep::Cartesian, 3),
    (CoordFrame::Sm, CoordRep::Cartesian, 4),
    (CoordFrame::Gei, CoordRep::Cartesian, 5),
    (CoordFrame::Mag, CoordRep::Cartesian, 6),
    (CoordFrame::Sph, CoordRep::Spherical, 7),
    (CoordFrame::Rll, CoordRep::Spherical, 8),
];

/// Look up the engine `sysaxes` code for a (frame, representation) pair.
///
/// Arguments
/// ---------
/// * `frame`: the coordinate frame of the position data
/// * `rep`: the component representation
///
/// Return
/// ------
/// * `Some(code)` if the engine accepts the pair directly, `None` otherwise
///   (the caller must then convert the representation or reject the input)
pub fn sys_axes(frame: CoordFrame, rep: CoordRep) -> Option<i32> {
    SYSAXES_TABLE
        .iter()
        .find(|(f, r, _)| *f == frame && *r == rep)
        .map(|(_, _, code)| *code)
}

/// Inverse lookup: recover the (frame, representation) pair of a `sysaxes` code.
///
/// Return
/// ------
/// * The pair, or [`MagshellError::UnknownSystemCode`] if the code is not in the table.
pub fn frame_of(code: i32) -> Result<(CoordFrame, CoordRep), MagshellError> {
    SYSAXES_TABLE
        .iter()
        .find(|(_, _, c)| *c == code)
        .map(|(f, r, _)| (*f, *r))
        .ok_or(MagshellError::UnknownSystemCode(code))
}

/// Convert a Cartesian triplet to spherical `[r, lat_deg, lon_deg]`.
pub fn to_spherical(car: &Vector3<f64>) -> Vector3<f64> {
    let r: Re = car.norm();
    let lat: Degree = (car.z / r).asin().to_degrees();
    let lon: Degree = car.y.atan2(car.x).to_degrees();
    Vector3::new(r, lat, lon)
}

/// Convert a spherical `[r, lat_deg, lon_deg]` triplet to Cartesian.
pub fn to_cartesian(sph: &Vector3<f64>) -> Vector3<f64> {
    let (r, lat, lon) = (sph.x, sph.y.to_radians(), sph.z.to_radians());
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

// Process-wide registry so each legacy shim warns at most once.
static WARNED_SHIMS: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn warn_once(name: &'static str, replacement: &str) {
    let mut warned = WARNED_SHIMS.lock().expect("shim registry poisoned");
    if warned.insert(name) {
        log::warn!("{name} is deprecated; use {replacement} instead");
    }
}

/// Legacy alias of [`to_spherical`].
///
/// Emits a one-time-per-process deprecation notice on the warning channel; numerics are
/// identical to the canonical helper.
#[deprecated(note = "use to_spherical")]
pub fn car2sph(car: &Vector3<f64>) -> Vector3<f64> {
    warn_once("car2sph", "to_spherical");
    to_spherical(car)
}

/// Legacy alias of [`to_cartesian`].
///
/// Emits a one-time-per-process deprecation notice on the warning channel; numerics are
/// identical to the canonical helper.
#[deprecated(note = "use to_cartesian")]
pub fn sph2car(sph: &Vector3<f64>) -> Vector3<f64> {
    warn_once("sph2car", "to_cartesian");
    to_cartesian(sph)
}
