//! Shared fixtures: a deterministic centered-dipole engine and driver tables.
//!
//! The dipole engine stands in for the external numerical routine set. It honors the
//! call protocol (padded buffers, logical lengths, sysaxes resolution) but evaluates a
//! plain centered dipole, treating every frame as co-aligned, so marshaling behavior
//! can be asserted without the real engine.

#![allow(dead_code)]

use nalgebra::Vector3;

use magshell::constants::{NALP_MAX, NTIME_MAX};
use magshell::engine::{
    pad2, FieldModelEngine, FluxKind, Particle, RawEquatorOutput, RawFieldOutput, RawFootOutput,
    RawLstarOutput, RawMirrorOutput, SolarActivity,
};
use magshell::magshell_errors::MagshellError;
use magshell::omni::DriverTable;
use magshell::prep::CallBuffers;
use magshell::sysaxes::{frame_of, to_cartesian, CoordRep};
use magshell::time::TimeArray;

/// Equatorial surface field of the test dipole, nT.
pub const B0: f64 = 31_000.0;

pub struct DipoleEngine;

struct Shell {
    lat: f64,
    lon_deg: f64,
    l: f64,
    blocal: f64,
}

fn shell_of(buf: &CallBuffers, i: usize) -> Shell {
    let raw = buf.xin(i);
    let (_, rep) = frame_of(buf.sysaxes).expect("engine received unknown sysaxes");
    let car = match rep {
        CoordRep::Cartesian => raw,
        CoordRep::Spherical => to_cartesian(&raw),
    };
    let r = car.norm();
    let lat = (car.z / r).asin();
    let lon_deg = car.y.atan2(car.x).to_degrees();
    Shell {
        lat,
        lon_deg,
        l: r / lat.cos().powi(2),
        blocal: B0 / r.powi(3) * (1.0 + 3.0 * lat.sin().powi(2)).sqrt(),
    }
}

fn mlt_of(lon_deg: f64) -> f64 {
    (lon_deg / 15.0 + 12.0).rem_euclid(24.0)
}

impl FieldModelEngine for DipoleEngine {
    fn get_field(&self, buf: &CallBuffers) -> Result<RawFieldOutput, MagshellError> {
        let mut blocal = vec![0.0; NTIME_MAX];
        let mut bvec = vec![[0.0; 3]; NTIME_MAX];
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            blocal[i] = s.blocal;
            // Orientation is arbitrary for the tests; keep the magnitude honest.
            bvec[i] = [0.0, 0.0, -s.blocal * s.lat.cos()];
        }
        Ok(RawFieldOutput { blocal, bvec })
    }

    fn find_magequator(&self, buf: &CallBuffers) -> Result<RawEquatorOutput, MagshellError> {
        let mut bmin = vec![0.0; NTIME_MAX];
        let mut pos_geo = vec![[0.0; 3]; NTIME_MAX];
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            bmin[i] = B0 / s.l.powi(3);
            let lon = s.lon_deg.to_radians();
            pos_geo[i] = [s.l * lon.cos(), s.l * lon.sin(), 0.0];
        }
        Ok(RawEquatorOutput { bmin, pos_geo })
    }

    fn find_mirror_point(&self, buf: &CallBuffers) -> Result<RawMirrorOutput, MagshellError> {
        let mut blocal = vec![0.0; NTIME_MAX];
        let mut bmirr = vec![0.0; NTIME_MAX * NALP_MAX];
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            blocal[i] = s.blocal;
            for j in 0..buf.nalpha {
                let sin_a = buf.degalpha[j].to_radians().sin();
                bmirr[pad2(i, j)] = s.blocal / (sin_a * sin_a);
            }
        }
        Ok(RawMirrorOutput { blocal, bmirr })
    }

    fn make_lstar(&self, buf: &CallBuffers) -> Result<RawLstarOutput, MagshellError> {
        let mut out = RawLstarOutput {
            lm: vec![0.0; NTIME_MAX * NALP_MAX],
            lstar: vec![0.0; NTIME_MAX * NALP_MAX],
            bmirr: vec![0.0; NTIME_MAX * NALP_MAX],
            xj: vec![0.0; NTIME_MAX * NALP_MAX],
            blocal: vec![0.0; NTIME_MAX],
            bmin: vec![0.0; NTIME_MAX],
            mlt: vec![0.0; NTIME_MAX],
        };
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            out.blocal[i] = s.blocal;
            out.bmin[i] = B0 / s.l.powi(3);
            out.mlt[i] = mlt_of(s.lon_deg);
            for j in 0..buf.nalpha {
                let sin_a = buf.degalpha[j].to_radians().sin();
                out.lm[pad2(i, j)] = s.l;
                out.lstar[pad2(i, j)] = 0.9 * s.l;
                out.bmirr[pad2(i, j)] = s.blocal / (sin_a * sin_a);
                out.xj[pad2(i, j)] = s.l * (1.0 / sin_a - 1.0);
            }
        }
        Ok(out)
    }

    fn landi2lstar(&self, buf: &CallBuffers) -> Result<RawLstarOutput, MagshellError> {
        // The combined routine agrees with the stepwise one to regression tolerance.
        let mut out = self.make_lstar(buf)?;
        for v in &mut out.lstar {
            *v += 1e-7;
        }
        Ok(out)
    }

    fn find_foot_point(
        &self,
        buf: &CallBuffers,
        stop_alt_km: f64,
        hemi_flag: i32,
    ) -> Result<RawFootOutput, MagshellError> {
        let mut xfoot = vec![[0.0; 3]; NTIME_MAX];
        let mut bfoot = vec![[0.0; 3]; NTIME_MAX];
        let mut bfootmag = vec![0.0; NTIME_MAX];
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            // Dipole footprint latitude at r = 1.
            let foot_lat = (1.0 / s.l).sqrt().acos();
            let sign = match hemi_flag {
                1 => 1.0,
                -1 => -1.0,
                _ => s.lat.signum(),
            };
            let lat_deg = sign * foot_lat.to_degrees();
            xfoot[i] = [stop_alt_km, lat_deg, s.lon_deg];
            let mag = B0 * (1.0 + 3.0 * foot_lat.sin().powi(2)).sqrt();
            bfoot[i] = [0.0, 0.0, -sign * mag];
            bfootmag[i] = mag;
        }
        Ok(RawFootOutput {
            xfoot,
            bfoot,
            bfootmag,
        })
    }

    fn coord_trans(
        &self,
        _from_code: i32,
        _to_code: i32,
        _year: i32,
        _doy: i32,
        _ut_sec: f64,
        pos: Vector3<f64>,
    ) -> Result<Vector3<f64>, MagshellError> {
        // The test dipole treats all frames as co-aligned.
        Ok(pos)
    }

    fn trapped_flux(
        &self,
        energy: f64,
        buf: &CallBuffers,
        particle: Particle,
        kind: FluxKind,
        activity: SolarActivity,
    ) -> Result<Vec<f64>, MagshellError> {
        let species = match particle {
            Particle::Electron => 1.0,
            Particle::Proton => 0.5,
        };
        let width = match kind {
            FluxKind::Differential => 1.0,
            FluxKind::Integral => 2.0,
        };
        let cycle = match activity {
            SolarActivity::Min => 1.0,
            SolarActivity::Max => 1.5,
        };
        let mut flux = vec![0.0; NTIME_MAX];
        for i in 0..buf.ntime {
            let s = shell_of(buf, i);
            flux[i] = species * width * cycle * 1e4 / (energy * s.l * s.l);
        }
        Ok(flux)
    }
}

/// Dipole engine that faults on any observation beyond `max_radius`, to exercise the
/// whole-call failure contract of the dispatcher.
pub struct FaultyEngine {
    pub inner: DipoleEngine,
    pub max_radius: f64,
}

impl FaultyEngine {
    fn check(&self, buf: &CallBuffers) -> Result<(), MagshellError> {
        for i in 0..buf.ntime {
            if buf.xin(i).norm() > self.max_radius {
                return Err(MagshellError::EngineFault(
                    "field line trace left the model domain".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl FieldModelEngine for FaultyEngine {
    fn get_field(&self, buf: &CallBuffers) -> Result<RawFieldOutput, MagshellError> {
        self.check(buf)?;
        self.inner.get_field(buf)
    }

    fn find_magequator(&self, buf: &CallBuffers) -> Result<RawEquatorOutput, MagshellError> {
        self.check(buf)?;
        self.inner.find_magequator(buf)
    }

    fn find_mirror_point(&self, buf: &CallBuffers) -> Result<RawMirrorOutput, MagshellError> {
        self.check(buf)?;
        self.inner.find_mirror_point(buf)
    }

    fn make_lstar(&self, buf: &CallBuffers) -> Result<RawLstarOutput, MagshellError> {
        self.check(buf)?;
        self.inner.make_lstar(buf)
    }

    fn find_foot_point(
        &self,
        buf: &CallBuffers,
        stop_alt_km: f64,
        hemi_flag: i32,
    ) -> Result<RawFootOutput, MagshellError> {
        self.check(buf)?;
        self.inner.find_foot_point(buf, stop_alt_km, hemi_flag)
    }

    fn coord_trans(
        &self,
        from_code: i32,
        to_code: i32,
        year: i32,
        doy: i32,
        ut_sec: f64,
        pos: Vector3<f64>,
    ) -> Result<Vector3<f64>, MagshellError> {
        self.inner
            .coord_trans(from_code, to_code, year, doy, ut_sec, pos)
    }

    fn trapped_flux(
        &self,
        energy: f64,
        buf: &CallBuffers,
        particle: Particle,
        kind: FluxKind,
        activity: SolarActivity,
    ) -> Result<Vec<f64>, MagshellError> {
        self.check(buf)?;
        self.inner.trapped_flux(energy, buf, particle, kind, activity)
    }
}

/// Driver table covering `ticks` with all 16 named columns, values varying per row so
/// row/column placement mistakes are visible.
pub fn full_driver_table(ticks: &TimeArray) -> DriverTable {
    let n = ticks.len();
    let ramp = |base: f64, step: f64| -> Vec<f64> {
        (0..n).map(|i| base + step * i as f64).collect()
    };
    let mut table = DriverTable::new(ticks.epochs().to_vec());
    for (name, base, step) in [
        ("Kp", 3.0, 0.0),
        ("Dst", -9.0, 0.0),
        ("dens", 3.2, -0.05),
        ("velo", 396.0, 0.0),
        ("Pdyn", 1.07, -0.015),
        ("ByIMF", 0.2, -0.25),
        ("BzIMF", -0.1, 0.2333333),
        ("G1", 0.01, 0.0),
        ("G2", 0.03, -0.005),
        ("G3", 0.01, -0.0016667),
        ("W1", 0.026, -0.0013333),
        ("W2", 0.017, -0.0013333),
        ("W3", 0.316, -0.0016667),
        ("W4", 0.006, -0.0005),
        ("W5", 0.017, -0.002),
        ("W6", 0.022, -0.0021667),
    ] {
        table = table
            .with_column(name, ramp(base, step))
            .expect("column length matches ticks");
    }
    table
}
