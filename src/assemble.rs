//! # Result assembler
//!
//! Converts raw engine outputs (padded buffers indexed by buffer position) into named
//! physical quantities trimmed to the true observation count, and re-wraps every
//! position-valued output through the coordinate translator — callers never see bare
//! numeric triplets for a position, and never see the padding.

use nalgebra::{DMatrix, Vector3};

use crate::constants::{Degree, NanoTesla};
use crate::coords::Locations;
use crate::engine::{
    pad2, FieldModelEngine, RawEquatorOutput, RawFieldOutput, RawFootOutput, RawLstarOutput,
    RawMirrorOutput,
};
use crate::magshell_errors::MagshellError;
use crate::prep::CallBuffers;
use crate::sysaxes::{sys_axes, to_cartesian, to_spherical, CoordFrame, CoordRep, GEO_CAR_CODE};

/// Local field at each observation.
#[derive(Debug, Clone)]
pub struct BFieldResult {
    pub blocal: Vec<NanoTesla>,
    pub bvec: Vec<Vector3<f64>>,
}

/// Mirror field per observation × pitch angle.
#[derive(Debug, Clone)]
pub struct MirrorResult {
    pub blocal: Vec<NanoTesla>,
    /// Shape `(N, P)`.
    pub bmirr: DMatrix<f64>,
}

/// Minimum-B equator crossing per observation.
#[derive(Debug, Clone)]
pub struct EquatorResult {
    pub bmin: Vec<NanoTesla>,
    /// Minimum-B locations, tagged with the caller's frame.
    pub loci: Locations,
}

/// Shell parameters per observation (× pitch angle where shaped `(N, P)`).
#[derive(Debug, Clone)]
pub struct LstarResult {
    pub lm: DMatrix<f64>,
    pub lstar: DMatrix<f64>,
    pub bmirr: DMatrix<f64>,
    pub xj: DMatrix<f64>,
    pub blocal: Vec<NanoTesla>,
    pub bmin: Vec<NanoTesla>,
    /// Magnetic local time in hours.
    pub mlt: Vec<f64>,
}

/// Field-line footpoint per observation.
#[derive(Debug, Clone)]
pub struct FootpointResult {
    /// Field magnitude at the footpoint.
    pub bfoot: Vec<NanoTesla>,
    /// Field vector at the footpoint, GEO Cartesian.
    pub bfootvec: Vec<Vector3<f64>>,
    /// Footpoint locations, always GDZ spherical `[alt_km, lat_deg, lon_deg]`.
    pub loci: Locations,
}

pub(crate) fn assemble_field(raw: &RawFieldOutput, n: usize) -> BFieldResult {
    BFieldResult {
        blocal: raw.blocal[..n].to_vec(),
        bvec: raw.bvec[..n].iter().map(|t| Vector3::from(*t)).collect(),
    }
}

pub(crate) fn assemble_mirror(raw: &RawMirrorOutput, n: usize, p: usize) -> MirrorResult {
    MirrorResult {
        blocal: raw.blocal[..n].to_vec(),
        bmirr: trim_grid(&raw.bmirr, n, p),
    }
}

pub(crate) fn assemble_lstar(raw: &RawLstarOutput, n: usize, p: usize) -> LstarResult {
    LstarResult {
        lm: trim_grid(&raw.lm, n, p),
        lstar: trim_grid(&raw.lstar, n, p),
        bmirr: trim_grid(&raw.bmirr, n, p),
        xj: trim_grid(&raw.xj, n, p),
        blocal: raw.blocal[..n].to_vec(),
        bmin: raw.bmin[..n].to_vec(),
        mlt: raw.mlt[..n].to_vec(),
    }
}

/// Restore the minimum-B locations to the caller's frame and trim.
///
/// The engine reports traced positions in GEO Cartesian; the caller's frame may need a
/// frame transform (through the engine) and/or a representation swap (local).
pub(crate) fn assemble_equator<E: FieldModelEngine + ?Sized>(
    engine: &E,
    raw: &RawEquatorOutput,
    buf: &CallBuffers,
    frame: CoordFrame,
    rep: CoordRep,
) -> Result<EquatorResult, MagshellError> {
    let n = buf.ntime;
    let (target_code, rep_swap) = match sys_axes(frame, rep) {
        Some(code) => (code, None),
        None => {
            let other = rep.opposite();
            let code = sys_axes(frame, other).ok_or(MagshellError::UnsupportedCoordSystem {
                frame,
                rep,
            })?;
            (code, Some(rep))
        }
    };

    let mut data = Vec::with_capacity(n);
    for i in 0..n {
        let geo = Vector3::from(raw.pos_geo[i]);
        let mut pos = if target_code == GEO_CAR_CODE {
            geo
        } else {
            engine.coord_trans(
                GEO_CAR_CODE,
                target_code,
                buf.iyearsat[i] as i32,
                buf.idoysat[i] as i32,
                buf.utsat[i],
                geo,
            )?
        };
        if let Some(wanted) = rep_swap {
            pos = match wanted {
                CoordRep::Spherical => to_spherical(&pos),
                CoordRep::Cartesian => to_cartesian(&pos),
            };
        }
        data.push(pos);
    }

    Ok(EquatorResult {
        bmin: raw.bmin[..n].to_vec(),
        loci: Locations::new(data, frame, rep),
    })
}

pub(crate) fn assemble_footpoint(raw: &RawFootOutput, n: usize) -> FootpointResult {
    FootpointResult {
        bfoot: raw.bfootmag[..n].to_vec(),
        bfootvec: raw.bfoot[..n].iter().map(|t| Vector3::from(*t)).collect(),
        loci: Locations::new(
            raw.xfoot[..n].iter().map(|t| Vector3::from(*t)).collect(),
            CoordFrame::Gdz,
            CoordRep::Spherical,
        ),
    }
}

/// Concatenate per-chunk shell-parameter bundles in ascending chunk order.
pub(crate) fn concat_lstar(parts: Vec<LstarResult>) -> LstarResult {
    let p = parts.first().map_or(0, |part| part.lm.ncols());
    let n: usize = parts.iter().map(|part| part.lm.nrows()).sum();

    let mut out = LstarResult {
        lm: DMatrix::zeros(n, p),
        lstar: DMatrix::zeros(n, p),
        bmirr: DMatrix::zeros(n, p),
        xj: DMatrix::zeros(n, p),
        blocal: Vec::with_capacity(n),
        bmin: Vec::with_capacity(n),
        mlt: Vec::with_capacity(n),
    };

    let mut row = 0;
    for part in parts {
        let rows = part.lm.nrows();
        out.lm.rows_mut(row, rows).copy_from(&part.lm);
        out.lstar.rows_mut(row, rows).copy_from(&part.lstar);
        out.bmirr.rows_mut(row, rows).copy_from(&part.bmirr);
        out.xj.rows_mut(row, rows).copy_from(&part.xj);
        out.blocal.extend_from_slice(&part.blocal);
        out.bmin.extend_from_slice(&part.bmin);
        out.mlt.extend_from_slice(&part.mlt);
        row += rows;
    }
    out
}

/// Trim a padded `(NTIME_MAX × NALP_MAX)` buffer to its logical `(n, p)` shape.
fn trim_grid(padded: &[f64], n: usize, p: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, p, |i, j| padded[pad2(i, j)])
}

/// Pitch angles recovered by the K root solve, one entry per observation (degrees).
pub type AlphaResult = Vec<Degree>;
