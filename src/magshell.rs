//! # Magshell: engine façade and public queries
//!
//! This module defines the [`Magshell`] struct, the central façade that wires together:
//!
//! 1. **The external field-model engine** ([`FieldModelEngine`](crate::engine::FieldModelEngine)) —
//!    the opaque numerical routine set evaluated through padded call buffers.
//! 2. **The batch dispatcher** ([`DispatchConfig`](crate::dispatch::DispatchConfig)) —
//!    serial-vs-parallel decision and ordered chunk reassembly for large batches.
//! 3. **Buffer building and result assembly** — the marshaling layer between caller
//!    objects (epochs, frame-tagged positions, driver tables) and the engine ABI.
//!
//! Every query follows the same pipeline: validate inputs → build buffers →
//! engine call(s) → assemble → typed bundle. There is no retry anywhere in this layer;
//! retries, if wanted, belong to the caller.
//!
//! ## Typical usage
//!
//! ```rust,ignore
//! use magshell::magshell::{Magshell, QueryOptions};
//! use magshell::coords::Locations;
//! use magshell::time::TimeArray;
//!
//! let shell = Magshell::new(engine);
//! let ticks = TimeArray::from_iso(&["2001-02-02T12:00:00", "2001-02-02T12:10:00"])?;
//! let loci = Locations::from_triplets(&[[3.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
//!     "GEO".parse()?, "car".parse()?);
//! let res = shell.get_lstar(&ticks, &loci, &[90.0], &QueryOptions::default())?;
//! ```

use std::cell::RefCell;

use roots::{find_root_brent, SimpleConvergency};
use smallvec::smallvec;

use crate::assemble::{
    assemble_equator, assemble_field, assemble_footpoint, assemble_mirror, AlphaResult,
    BFieldResult, EquatorResult, FootpointResult, LstarResult, MirrorResult,
};
use crate::constants::{Degree, Mev, PitchAngles, DEFAULT_OPTIONS};
use crate::coords::Locations;
use crate::dispatch::{dispatch_lstar, DispatchConfig};
use crate::engine::{FieldModelEngine, FluxKind, Particle, SolarActivity};
use crate::extmodel::ExtModel;
use crate::magshell_errors::MagshellError;
use crate::omni::DriverTable;
use crate::prep::{prep_buffers, resolve_positions};
use crate::sysaxes::{sys_axes, to_cartesian, to_spherical, CoordFrame, CoordRep};
use crate::time::{decompose, TimeArray};

/// Keyword configuration shared by all queries.
///
/// `Default` gives the no-magnetosphere baseline selector, the standard option vector
/// `[1, 0, 0, 0, 0]`, no driver table, and the default stepwise L* routine.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions<'a> {
    /// External-model selector.
    pub ext_mag: ExtModel,
    /// The engine's 5-flag internal option vector; `None` means the standard vector.
    pub options: Option<[i32; 5]>,
    /// Driver table, or `None` to zero-fill driver rows.
    pub omnivals: Option<&'a DriverTable>,
    /// Select the alternative combined L and I → L* engine routine.
    pub landi2lstar: bool,
}

impl QueryOptions<'_> {
    fn engine_options(&self) -> [i32; 5] {
        self.options.unwrap_or(DEFAULT_OPTIONS)
    }
}

/// Façade over an external field-model engine.
#[derive(Debug, Clone)]
pub struct Magshell<E> {
    engine: E,
    dispatch: DispatchConfig,
}

impl<E: FieldModelEngine> Magshell<E> {
    /// Wrap an engine with the default (core-count) dispatch configuration.
    pub fn new(engine: E) -> Self {
        Magshell {
            engine,
            dispatch: DispatchConfig::default(),
        }
    }

    /// Wrap an engine with an explicit dispatch configuration.
    pub fn with_dispatch(engine: E, dispatch: DispatchConfig) -> Self {
        Magshell { engine, dispatch }
    }

    pub fn dispatch_config(&self) -> &DispatchConfig {
        &self.dispatch
    }

    /// Change the worker count; takes effect on subsequent calls.
    pub fn set_ncpus(&mut self, ncpus: usize) {
        self.dispatch = DispatchConfig::new(ncpus);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Local field magnitude and vector at each observation.
    pub fn get_bfield(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        opts: &QueryOptions,
    ) -> Result<BFieldResult, MagshellError> {
        let buf = prep_buffers(
            ticks,
            loci,
            &[],
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self.engine.get_field(&buf)?;
        Ok(assemble_field(&raw, buf.ntime))
    }

    /// Mirror field for each observation and requested pitch angle.
    pub fn find_bmirror(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        pitch_angles: &[Degree],
        opts: &QueryOptions,
    ) -> Result<MirrorResult, MagshellError> {
        let buf = prep_buffers(
            ticks,
            loci,
            pitch_angles,
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self.engine.find_mirror_point(&buf)?;
        Ok(assemble_mirror(&raw, buf.ntime, buf.nalpha))
    }

    /// Minimum-B equator crossing per observation, location restored to the caller's
    /// frame.
    pub fn find_magequator(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        opts: &QueryOptions,
    ) -> Result<EquatorResult, MagshellError> {
        let buf = prep_buffers(
            ticks,
            loci,
            &[],
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self.engine.find_magequator(&buf)?;
        assemble_equator(&self.engine, &raw, &buf, loci.frame(), loci.rep())
    }

    /// Shell parameters (Lm, L*, K, mirror/minimum fields, MLT).
    ///
    /// Routed through the batch dispatcher: batches larger than double the configured
    /// worker count are evaluated in parallel chunks and reassembled in observation
    /// order. `opts.landi2lstar` selects the alternative combined engine routine.
    pub fn get_lstar(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        pitch_angles: &[Degree],
        opts: &QueryOptions,
    ) -> Result<LstarResult, MagshellError> {
        dispatch_lstar(
            &self.dispatch,
            &self.engine,
            ticks,
            loci,
            pitch_angles,
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
            opts.landi2lstar,
        )
    }

    /// Field-line footpoint at `stop_alt_km` in the hemisphere selected by `hemi_flag`
    /// (+1 north, -1 south, 0 same as the starting point). Locations are always GDZ
    /// spherical.
    pub fn find_footpoint(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        stop_alt_km: f64,
        hemi_flag: i32,
        opts: &QueryOptions,
    ) -> Result<FootpointResult, MagshellError> {
        let buf = prep_buffers(
            ticks,
            loci,
            &[],
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self.engine.find_foot_point(&buf, stop_alt_km, hemi_flag)?;
        Ok(assemble_footpoint(&raw, buf.ntime))
    }

    /// Equatorial pitch angle whose second invariant matches `k_target`, per
    /// observation.
    ///
    /// Solves `K(alpha) = k_target` by Brent iteration over `alpha ∈ [1°, 90°]`,
    /// evaluating K through the shell-parameter pipeline one observation at a time.
    /// K decreases monotonically toward 90°, so the bracket is always valid when the
    /// requested K is attainable on that field line.
    pub fn alpha_of_k(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        k_target: f64,
        opts: &QueryOptions,
    ) -> Result<AlphaResult, MagshellError> {
        if ticks.len() != loci.len() {
            return Err(MagshellError::LengthMismatch {
                times: ticks.len(),
                positions: loci.len(),
            });
        }

        let mut result = Vec::with_capacity(ticks.len());
        for i in 0..ticks.len() {
            let one_tick = ticks.slice(i..i + 1);
            let one_locus = loci.slice(i..i + 1);
            result.push(self.solve_alpha(&one_tick, &one_locus, k_target, opts)?);
        }
        Ok(result)
    }

    fn solve_alpha(
        &self,
        tick: &TimeArray,
        locus: &Locations,
        k_target: f64,
        opts: &QueryOptions,
    ) -> Result<Degree, MagshellError> {
        // The root-finder closure cannot return Result; stash the first engine fault
        // and surface it after the solve.
        let fault: RefCell<Option<MagshellError>> = RefCell::new(None);
        let root = {
            let k_of_alpha = |alpha: f64| -> f64 {
                match self.k_at(tick, locus, alpha, opts) {
                    Ok(k) => k - k_target,
                    Err(e) => {
                        fault.borrow_mut().get_or_insert(e);
                        f64::NAN
                    }
                }
            };
            let mut convergency = SimpleConvergency {
                eps: 1e-5f64,
                max_iter: 80,
            };
            find_root_brent(1.0f64, 90.0f64, &k_of_alpha, &mut convergency)
        };

        if let Some(e) = fault.into_inner() {
            return Err(e);
        }
        Ok(root?)
    }

    fn k_at(
        &self,
        tick: &TimeArray,
        locus: &Locations,
        alpha: Degree,
        opts: &QueryOptions,
    ) -> Result<f64, MagshellError> {
        let probe: PitchAngles = smallvec![alpha];
        let buf = prep_buffers(
            tick,
            locus,
            &probe,
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self.engine.make_lstar(&buf)?;
        Ok(raw.xj[0])
    }

    /// Transform each position into another coordinate system at its observation epoch.
    ///
    /// Arguments
    /// ---------
    /// * `ticks`: observation epochs, length N
    /// * `loci`: positions to transform, length N, frame-tagged
    /// * `to_frame` / `to_rep`: the target system
    ///
    /// Return
    /// ------
    /// * The transformed positions tagged with the target system. Representation-only
    ///   changes are computed locally; frame changes go through the engine transform.
    pub fn coord_trans(
        &self,
        ticks: &TimeArray,
        loci: &Locations,
        to_frame: CoordFrame,
        to_rep: CoordRep,
    ) -> Result<Locations, MagshellError> {
        if ticks.len() != loci.len() {
            return Err(MagshellError::LengthMismatch {
                times: ticks.len(),
                positions: loci.len(),
            });
        }

        let (from_code, positions) = resolve_positions(loci)?;
        let (to_code, rep_swap) = match sys_axes(to_frame, to_rep) {
            Some(code) => (code, None),
            None => {
                let other = to_rep.opposite();
                let code =
                    sys_axes(to_frame, other).ok_or(MagshellError::UnsupportedCoordSystem {
                        frame: to_frame,
                        rep: to_rep,
                    })?;
                (code, Some(to_rep))
            }
        };

        let mut data = Vec::with_capacity(loci.len());
        for (epoch, pos) in ticks.epochs().iter().zip(&positions) {
            let mut out = if from_code == to_code {
                *pos
            } else {
                let parts = decompose(*epoch);
                self.engine.coord_trans(
                    from_code,
                    to_code,
                    parts.year,
                    i32::from(parts.doy),
                    parts.ut,
                    *pos,
                )?
            };
            if let Some(wanted) = rep_swap {
                out = match wanted {
                    CoordRep::Spherical => to_spherical(&out),
                    CoordRep::Cartesian => to_cartesian(&out),
                };
            }
            data.push(out);
        }
        Ok(Locations::new(data, to_frame, to_rep))
    }

    /// Trapped-particle flux climatology at each observation.
    pub fn get_trapped_flux(
        &self,
        energy: Mev,
        ticks: &TimeArray,
        loci: &Locations,
        particle: Particle,
        kind: FluxKind,
        activity: SolarActivity,
        opts: &QueryOptions,
    ) -> Result<Vec<f64>, MagshellError> {
        let buf = prep_buffers(
            ticks,
            loci,
            &[],
            opts.ext_mag,
            opts.engine_options(),
            opts.omnivals,
        )?;
        let raw = self
            .engine
            .trapped_flux(energy, &buf, particle, kind, activity)?;
        Ok(raw[..buf.ntime].to_vec())
    }
}
