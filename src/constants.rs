//! # Constants and type definitions for magshell
//!
//! This module centralizes the **engine capacities**, **fill values**, and **common type
//! definitions** used throughout the `magshell` library.
//!
//! ## Overview
//!
//! - Hard capacities of the external field-model engine call protocol
//! - The engine's bad-data fill value
//! - Core type aliases used across the crate
//!
//! The external engine accepts fixed-shape argument buffers only. Every capacity below is
//! part of its call ABI and must never be changed independently of the engine build.

use smallvec::SmallVec;

// -------------------------------------------------------------------------------------------------
// Engine call-protocol capacities
// -------------------------------------------------------------------------------------------------

/// Maximum number of observations a single engine call accepts.
pub const NTIME_MAX: usize = 100_000;

/// Maximum number of pitch angles a single engine call accepts.
pub const NALP_MAX: usize = 25;

/// Number of driver rows in the `magin` buffer. Only the first
/// [`DRIVER_COLUMN_COUNT`] rows carry named columns; the remainder stays zero.
pub const NENE_MAX: usize = 25;

/// Named driver columns actually consumed by the supported external models.
pub const DRIVER_COLUMN_COUNT: usize = 16;

/// Fill value the engine writes for quantities it could not compute.
pub const BADVAL: f64 = -1e31;

/// Default engine option vector (first flag set, all internal switches off).
pub const DEFAULT_OPTIONS: [i32; 5] = [1, 0, 0, 0, 0];

/// Default stop altitude for field-line footpoint tracing, in kilometers.
pub const DEFAULT_FOOTPOINT_ALT_KM: f64 = 100.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in Earth radii
pub type Re = f64;
/// Magnetic field strength in nanotesla
pub type NanoTesla = f64;
/// Particle energy in MeV
pub type Mev = f64;
/// Seconds elapsed since the start of the UTC day
pub type SecondsOfDay = f64;

/// A small, inline-optimized container for a pitch-angle set (engine limit is 25).
pub type PitchAngles = SmallVec<[Degree; NALP_MAX]>;
