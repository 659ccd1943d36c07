//! # Buffer builder
//!
//! The external engine has a fixed call signature: every argument buffer is padded to the
//! maximum supported observation count ([`NTIME_MAX`]) and pitch-angle count
//! ([`NALP_MAX`]), with only the first `ntime` (or `ntime × nalpha`) entries meaningful.
//! This module builds those buffers from an observation set, a pitch-angle set, an
//! external-model selector and an optional driver table.
//!
//! Buffers are created per call and discarded after the engine call and result
//! extraction; they are never persisted or shared across calls.
//!
//! ## Invariants
//!
//! - Pitch-angle count is validated **before** any buffer allocation.
//! - A Cartesian position set and its spherical equivalent on the same frame resolve to
//!   the identical `sysaxes` code and numerically consistent `xin1..xin3` columns.
//! - When no driver table is supplied, every driver row is zero-filled; for selectors
//!   that consume no drivers this is numerically identical to a supplied table.
//! - When a table is supplied but lacks a row (or a column) required by a
//!   driver-consuming selector, the build fails with
//!   [`MagshellError::MissingDriverData`] rather than silently changing the physics.

use itertools::izip;
use nalgebra::Vector3;

use crate::constants::{Degree, BADVAL, NALP_MAX, NENE_MAX, NTIME_MAX};
use crate::coords::Locations;
use crate::extmodel::{ExtModel, DRIVER_COLUMNS};
use crate::magshell_errors::MagshellError;
use crate::omni::DriverTable;
use crate::sysaxes::{sys_axes, to_cartesian, to_spherical, CoordRep};
use crate::time::TimeArray;

/// The engine's exact call signature, padded to capacity.
///
/// Field names match the engine argument names one for one. `ntime` and `nalpha` are the
/// logical lengths; everything past them is zero-padding and must never be interpreted
/// by callers.
#[derive(Debug, Clone)]
pub struct CallBuffers {
    pub badval: f64,
    pub degalpha: [f64; NALP_MAX],
    pub idoysat: Vec<f64>,
    pub ntime_max: usize,
    pub nalp_max: usize,
    /// Driver rows, row-major `[NENE_MAX × NTIME_MAX]`.
    pub magin: Vec<f64>,
    pub sysaxes: i32,
    pub kext: i32,
    pub iyearsat: Vec<f64>,
    pub xin3: Vec<f64>,
    pub xin2: Vec<f64>,
    pub xin1: Vec<f64>,
    pub utsat: Vec<f64>,
    pub options: [i32; 5],
    /// True observation count (logical length of the time/position columns).
    pub ntime: usize,
    /// True pitch-angle count (logical length of `degalpha`).
    pub nalpha: usize,
}

impl CallBuffers {
    pub fn magin_at(&self, row: usize, obs: usize) -> f64 {
        self.magin[row * NTIME_MAX + obs]
    }

    fn set_magin(&mut self, row: usize, obs: usize, value: f64) {
        self.magin[row * NTIME_MAX + obs] = value;
    }

    /// Position of observation `obs` as a triplet in the engine's input system.
    pub fn xin(&self, obs: usize) -> Vector3<f64> {
        Vector3::new(self.xin1[obs], self.xin2[obs], self.xin3[obs])
    }
}

/// Build the padded engine call buffers for one observation set.
///
/// Arguments
/// ---------
/// * `ticks`: observation epochs, length N
/// * `loci`: observation positions, length N, frame-tagged
/// * `pitch_angles`: requested pitch angles in degrees, length P (may be empty)
/// * `ext_mag`: external-model selector (fixes `kext` and the required driver columns)
/// * `options`: the engine's 5-flag internal option vector
/// * `omnivals`: driver table, or `None` to zero-fill every driver row
///
/// Return
/// ------
/// * The padded [`CallBuffers`], or a fail-fast validation error. No buffer is
///   allocated when validation fails.
pub fn prep_buffers(
    ticks: &TimeArray,
    loci: &Locations,
    pitch_angles: &[Degree],
    ext_mag: ExtModel,
    options: [i32; 5],
    omnivals: Option<&DriverTable>,
) -> Result<CallBuffers, MagshellError> {
    if pitch_angles.len() > NALP_MAX {
        return Err(MagshellError::TooManyPitchAngles {
            requested: pitch_angles.len(),
        });
    }
    if ticks.len() != loci.len() {
        return Err(MagshellError::LengthMismatch {
            times: ticks.len(),
            positions: loci.len(),
        });
    }

    let (sysaxes, coords) = resolve_positions(loci)?;

    log::debug!(
        "prep: n={} p={} kext={} sysaxes={sysaxes}",
        ticks.len(),
        pitch_angles.len(),
        ext_mag.kext()
    );

    let mut buf = CallBuffers {
        badval: BADVAL,
        degalpha: [0.0; NALP_MAX],
        idoysat: vec![0.0; NTIME_MAX],
        ntime_max: NTIME_MAX,
        nalp_max: NALP_MAX,
        magin: vec![0.0; NENE_MAX * NTIME_MAX],
        sysaxes,
        kext: ext_mag.kext(),
        iyearsat: vec![0.0; NTIME_MAX],
        xin3: vec![0.0; NTIME_MAX],
        xin2: vec![0.0; NTIME_MAX],
        xin1: vec![0.0; NTIME_MAX],
        utsat: vec![0.0; NTIME_MAX],
        options,
        ntime: ticks.len(),
        nalpha: pitch_angles.len(),
    };

    for (slot, alpha) in buf.degalpha.iter_mut().zip(pitch_angles) {
        *slot = *alpha;
    }

    for (i, epoch) in ticks.epochs().iter().enumerate() {
        let parts = crate::time::decompose(*epoch);
        buf.iyearsat[i] = f64::from(parts.year);
        buf.idoysat[i] = f64::from(parts.doy);
        buf.utsat[i] = parts.ut;
    }

    for (i, pos) in coords.iter().enumerate() {
        buf.xin1[i] = pos.x;
        buf.xin2[i] = pos.y;
        buf.xin3[i] = pos.z;
    }

    fill_drivers(&mut buf, ticks, ext_mag, omnivals)?;

    Ok(buf)
}

/// Resolve the engine system code for a position set, converting the representation when
/// the engine only accepts the opposite one for that frame.
pub(crate) fn resolve_positions(
    loci: &Locations,
) -> Result<(i32, Vec<Vector3<f64>>), MagshellError> {
    if let Some(code) = sys_axes(loci.frame(), loci.rep()) {
        return Ok((code, loci.data().to_vec()));
    }

    let other = loci.rep().opposite();
    let Some(code) = sys_axes(loci.frame(), other) else {
        return Err(MagshellError::UnsupportedCoordSystem {
            frame: loci.frame(),
            rep: loci.rep(),
        });
    };

    let converted = loci
        .data()
        .iter()
        .map(|p| match other {
            CoordRep::Cartesian => to_cartesian(p),
            CoordRep::Spherical => to_spherical(p),
        })
        .collect();
    Ok((code, converted))
}

/// Write the driver rows of `magin` per the fill policy.
fn fill_drivers(
    buf: &mut CallBuffers,
    ticks: &TimeArray,
    ext_mag: ExtModel,
    omnivals: Option<&DriverTable>,
) -> Result<(), MagshellError> {
    let Some(table) = omnivals else {
        // No table at all: every driver row stays zero. The engine still receives a
        // well-formed buffer; selectors that consume no drivers see identical physics.
        return Ok(());
    };

    let required = ext_mag.driver_columns();
    for (row, column) in izip!(0..DRIVER_COLUMNS.len(), DRIVER_COLUMNS) {
        for (i, epoch) in ticks.epochs().iter().enumerate() {
            match table.value_at(column, *epoch) {
                Some(value) => buf.set_magin(row, i, value),
                None if required.contains(&column) => {
                    return Err(MagshellError::MissingDriverData {
                        column,
                        epoch: *epoch,
                        model: ext_mag,
                    });
                }
                // Inert column for this selector: zero-fill silently.
                None => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod prep_test {
    use super::*;
    use crate::sysaxes::CoordFrame;
    use approx::assert_relative_eq;

    fn two_ticks() -> TimeArray {
        TimeArray::from_iso(&["2001-02-02T12:00:00", "2001-02-02T12:10:00"]).unwrap()
    }

    fn geo_loci() -> Locations {
        Locations::from_triplets(
            &[[3.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            CoordFrame::Geo,
            CoordRep::Cartesian,
        )
    }

    #[test]
    fn test_too_many_pitch_angles_checked_first() {
        let angles: Vec<f64> = (0..35).map(|i| 5.0 + f64::from(i) * 5.0).collect();
        let err = prep_buffers(
            &two_ticks(),
            &geo_loci(),
            &angles,
            ExtModel::OpQuiet,
            crate::constants::DEFAULT_OPTIONS,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many pitch angles requested; 25 is maximum."
        );
    }

    #[test]
    fn test_length_mismatch() {
        let loci = Locations::from_triplets(
            &[[3.0, 0.0, 0.0]],
            CoordFrame::Geo,
            CoordRep::Cartesian,
        );
        let err = prep_buffers(
            &two_ticks(),
            &loci,
            &[],
            ExtModel::None,
            crate::constants::DEFAULT_OPTIONS,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MagshellError::LengthMismatch {
                times: 2,
                positions: 1
            }
        );
    }

    #[test]
    fn test_time_and_position_columns() {
        let buf = prep_buffers(
            &two_ticks(),
            &geo_loci(),
            &[],
            ExtModel::None,
            crate::constants::DEFAULT_OPTIONS,
            None,
        )
        .unwrap();
        assert_eq!(buf.sysaxes, 1);
        assert_eq!(buf.kext, 0);
        assert_eq!(buf.ntime, 2);
        assert_eq!(buf.nalpha, 0);
        assert_eq!(&buf.iyearsat[..3], &[2001.0, 2001.0, 0.0]);
        assert_eq!(&buf.idoysat[..3], &[33.0, 33.0, 0.0]);
        assert_eq!(&buf.utsat[..3], &[43200.0, 43800.0, 0.0]);
        assert_eq!(&buf.xin1[..3], &[3.0, 2.0, 0.0]);
        assert_eq!(&buf.xin2[..2], &[0.0, 0.0]);
        assert_eq!(buf.badval, BADVAL);
        assert_eq!(buf.ntime_max, NTIME_MAX);
        assert_eq!(buf.nalp_max, NALP_MAX);
        assert_eq!(buf.options, [1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_car_sph_same_frame_equivalence() {
        let car = Locations::from_triplets(
            &[[3.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            CoordFrame::Gsm,
            CoordRep::Cartesian,
        );
        let sph_data: Vec<[f64; 3]> = car
            .data()
            .iter()
            .map(|p| {
                let s = to_spherical(p);
                [s.x, s.y, s.z]
            })
            .collect();
        let sph = Locations::from_triplets(&sph_data, CoordFrame::Gsm, CoordRep::Spherical);

        let opts = [1, 0, 0, 0, 1];
        let out1 = prep_buffers(&two_ticks(), &car, &[], ExtModel::None, opts, None).unwrap();
        let out2 = prep_buffers(&two_ticks(), &sph, &[], ExtModel::None, opts, None).unwrap();

        assert_eq!(out1.sysaxes, out2.sysaxes);
        for i in 0..2 {
            assert_relative_eq!(out1.xin1[i], out2.xin1[i], epsilon = 1e-5);
            assert_relative_eq!(out1.xin2[i], out2.xin2[i], epsilon = 1e-5);
            assert_relative_eq!(out1.xin3[i], out2.xin3[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn test_representation_fallback() {
        // GDZ/car has no engine code; the builder falls back to GDZ/sph and converts.
        let loci = Locations::from_triplets(
            &[[3.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            CoordFrame::Gdz,
            CoordRep::Cartesian,
        );
        let buf = prep_buffers(
            &two_ticks(),
            &loci,
            &[],
            ExtModel::None,
            crate::constants::DEFAULT_OPTIONS,
            None,
        )
        .unwrap();
        assert_eq!(buf.sysaxes, 0);
    }

    #[test]
    fn test_pitch_angles_padded() {
        let buf = prep_buffers(
            &two_ticks(),
            &geo_loci(),
            &[40.0, 90.0],
            ExtModel::OpQuiet,
            crate::constants::DEFAULT_OPTIONS,
            None,
        )
        .unwrap();
        assert_eq!(buf.nalpha, 2);
        assert_eq!(buf.degalpha[0], 40.0);
        assert_eq!(buf.degalpha[1], 90.0);
        assert!(buf.degalpha[2..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_missing_driver_row_fails_for_consuming_model() {
        let ticks = two_ticks();
        // Table covers only the first timestamp.
        let table = DriverTable::new(vec![ticks.epoch(0)])
            .with_column("Kp", vec![3.0])
            .unwrap();
        let err = prep_buffers(
            &ticks,
            &geo_loci(),
            &[],
            ExtModel::T89,
            crate::constants::DEFAULT_OPTIONS,
            Some(&table),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MagshellError::MissingDriverData { column: "Kp", .. }
        ));
    }

    #[test]
    fn test_missing_driver_row_tolerated_for_inert_model() {
        let ticks = two_ticks();
        let table = DriverTable::new(vec![ticks.epoch(0)])
            .with_column("Kp", vec![3.0])
            .unwrap();
        let buf = prep_buffers(
            &ticks,
            &geo_loci(),
            &[],
            ExtModel::OpQuiet,
            crate::constants::DEFAULT_OPTIONS,
            Some(&table),
        )
        .unwrap();
        assert_eq!(buf.magin_at(0, 0), 3.0);
        assert_eq!(buf.magin_at(0, 1), 0.0);
    }
}
