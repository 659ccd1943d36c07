//! # Field-model engine interface
//!
//! The numerical engine that traces field lines and computes adiabatic invariants is an
//! external collaborator. This module specifies only its call surface: every entry point
//! consumes the padded [`CallBuffers`](crate::prep::CallBuffers) built by the buffer
//! builder and produces raw output buffers padded the same way.
//!
//! Raw outputs are indexed by padded buffer position; only the first `ntime` (or
//! `ntime × nalpha`) entries are meaningful. Trimming and frame restoration are the
//! result assembler's job, never the engine's.
//!
//! Pitch-angle-dependent buffers are row-major per observation: entry
//! `(obs, pa)` lives at `obs * NALP_MAX + pa` (see [`pad2`]).

use nalgebra::Vector3;

use crate::constants::{Mev, NALP_MAX};
use crate::magshell_errors::MagshellError;
use crate::prep::CallBuffers;

/// Flat index of the `(obs, pa)` entry in a padded `(NTIME_MAX × NALP_MAX)` buffer.
#[inline]
pub fn pad2(obs: usize, pa: usize) -> usize {
    obs * NALP_MAX + pa
}

/// Local field magnitude and vector per observation.
#[derive(Debug, Clone)]
pub struct RawFieldOutput {
    /// `|B|` at each observation, padded to `NTIME_MAX`.
    pub blocal: Vec<f64>,
    /// Field vector in GEO Cartesian at each observation, padded to `NTIME_MAX`.
    pub bvec: Vec<[f64; 3]>,
}

/// Minimum-B equator crossing per observation.
#[derive(Debug, Clone)]
pub struct RawEquatorOutput {
    /// `|B|` at the field-line minimum, padded to `NTIME_MAX`.
    pub bmin: Vec<f64>,
    /// Minimum-B location in GEO Cartesian, padded to `NTIME_MAX`.
    pub pos_geo: Vec<[f64; 3]>,
}

/// Mirror-point field per observation and pitch angle.
#[derive(Debug, Clone)]
pub struct RawMirrorOutput {
    /// `|B|` at each observation, padded to `NTIME_MAX`.
    pub blocal: Vec<f64>,
    /// Mirror field, `(NTIME_MAX × NALP_MAX)` row-major (see [`pad2`]).
    pub bmirr: Vec<f64>,
}

/// Shell parameters per observation (and pitch angle where applicable).
#[derive(Debug, Clone)]
pub struct RawLstarOutput {
    /// McIlwain L, `(NTIME_MAX × NALP_MAX)`.
    pub lm: Vec<f64>,
    /// Roederer L*, `(NTIME_MAX × NALP_MAX)`.
    pub lstar: Vec<f64>,
    /// Mirror field, `(NTIME_MAX × NALP_MAX)`.
    pub bmirr: Vec<f64>,
    /// Second-invariant proxy K (a.k.a. Xj), `(NTIME_MAX × NALP_MAX)`.
    pub xj: Vec<f64>,
    /// `|B|` at the observation, padded to `NTIME_MAX`.
    pub blocal: Vec<f64>,
    /// `|B|` at the field-line minimum, padded to `NTIME_MAX`.
    pub bmin: Vec<f64>,
    /// Magnetic local time in hours, padded to `NTIME_MAX`.
    pub mlt: Vec<f64>,
}

/// Field-line footpoint at the stop altitude, per observation.
#[derive(Debug, Clone)]
pub struct RawFootOutput {
    /// Footpoint location in GDZ spherical `[alt_km, lat_deg, lon_deg]`.
    pub xfoot: Vec<[f64; 3]>,
    /// Field vector at the footpoint, GEO Cartesian.
    pub bfoot: Vec<[f64; 3]>,
    /// Field magnitude at the footpoint.
    pub bfootmag: Vec<f64>,
}

/// Trapped-particle species for the flux climatology lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Particle {
    Electron,
    Proton,
}

/// Flux kind returned by the climatology lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluxKind {
    Differential,
    Integral,
}

/// Solar-cycle phase of the trapped-flux climatology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarActivity {
    Min,
    Max,
}

/// The opaque evaluation engine.
///
/// Implementations wrap the external numerical routine set; this crate ships none. All
/// entry points are synchronous; `Send + Sync` is required so the batch dispatcher can
/// evaluate disjoint chunks on a worker pool. Implementations must read only the first
/// `ntime`/`nalpha` entries of each input buffer.
pub trait FieldModelEngine: Send + Sync {
    /// Local field magnitude and vector at each observation.
    fn get_field(&self, buf: &CallBuffers) -> Result<RawFieldOutput, MagshellError>;

    /// Trace to the minimum-B crossing of each observation's field line.
    fn find_magequator(&self, buf: &CallBuffers) -> Result<RawEquatorOutput, MagshellError>;

    /// Mirror field for each observation and requested pitch angle.
    fn find_mirror_point(&self, buf: &CallBuffers) -> Result<RawMirrorOutput, MagshellError>;

    /// Shell parameters via the default stepwise routine.
    fn make_lstar(&self, buf: &CallBuffers) -> Result<RawLstarOutput, MagshellError>;

    /// Shell parameters via the alternative combined L and L* routine.
    ///
    /// Must agree with [`make_lstar`](Self::make_lstar) to regression tolerance on the
    /// same input, not bit-exactly. The default forwards to the stepwise routine.
    fn landi2lstar(&self, buf: &CallBuffers) -> Result<RawLstarOutput, MagshellError> {
        self.make_lstar(buf)
    }

    /// Trace each observation's field line to `stop_alt_km` in the hemisphere selected
    /// by `hemi_flag` (+1 north, -1 south, 0 same as the starting point).
    fn find_foot_point(
        &self,
        buf: &CallBuffers,
        stop_alt_km: f64,
        hemi_flag: i32,
    ) -> Result<RawFootOutput, MagshellError>;

    /// Single-point frame transform between two `sysaxes` codes at a given instant.
    ///
    /// Used by the result assembler to restore position-valued outputs to the caller's
    /// frame.
    fn coord_trans(
        &self,
        from_code: i32,
        to_code: i32,
        year: i32,
        doy: i32,
        ut_sec: f64,
        pos: Vector3<f64>,
    ) -> Result<Vector3<f64>, MagshellError>;

    /// Trapped-particle flux climatology at the prepared positions, padded to
    /// `NTIME_MAX`.
    fn trapped_flux(
        &self,
        energy: Mev,
        buf: &CallBuffers,
        particle: Particle,
        kind: FluxKind,
        activity: SolarActivity,
    ) -> Result<Vec<f64>, MagshellError>;
}
