use hifitime::Epoch;
use thiserror::Error;

use crate::extmodel::ExtModel;
use crate::sysaxes::{CoordFrame, CoordRep};

#[derive(Error, Debug)]
pub enum MagshellError {
    #[error("Too many pitch angles requested; 25 is maximum.")]
    TooManyPitchAngles { requested: usize },

    #[error("time and position arrays differ in length: {times} times, {positions} positions")]
    LengthMismatch { times: usize, positions: usize },

    #[error("coordinate system {frame}/{rep} is not supported by the field-model engine")]
    UnsupportedCoordSystem { frame: CoordFrame, rep: CoordRep },

    #[error("Unknown system code: {0}")]
    UnknownSystemCode(i32),

    #[error("Unknown coordinate frame name: {0}")]
    InvalidFrameName(String),

    #[error("Unknown coordinate representation: {0}")]
    InvalidRepName(String),

    #[error("Unknown external field model: {0}")]
    InvalidExtModel(String),

    #[error("driver table is missing column '{column}' at {epoch}, required by {model}")]
    MissingDriverData {
        column: &'static str,
        epoch: Epoch,
        model: ExtModel,
    },

    #[error("driver column '{column}' has {got} rows, table has {expected} timestamps")]
    DriverColumnMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("Invalid time string: {0}")]
    InvalidTime(String),

    #[error("field-model engine fault: {0}")]
    EngineFault(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("pitch-angle root solve failed: {0}")]
    RootFinding(#[from] roots::SearchError),
}

impl PartialEq for MagshellError {
    fn eq(&self, other: &Self) -> bool {
        use MagshellError::*;
        match (self, other) {
            (
                TooManyPitchAngles { requested: a },
                TooManyPitchAngles { requested: b },
            ) => a == b,
            (
                LengthMismatch {
                    times: t1,
                    positions: p1,
                },
                LengthMismatch {
                    times: t2,
                    positions: p2,
                },
            ) => t1 == t2 && p1 == p2,
            (
                UnsupportedCoordSystem {
                    frame: f1,
                    rep: r1,
                },
                UnsupportedCoordSystem {
                    frame: f2,
                    rep: r2,
                },
            ) => f1 == f2 && r1 == r2,
            (UnknownSystemCode(a), UnknownSystemCode(b)) => a == b,
            (InvalidFrameName(a), InvalidFrameName(b)) => a == b,
            (InvalidRepName(a), InvalidRepName(b)) => a == b,
            (InvalidExtModel(a), InvalidExtModel(b)) => a == b,
            (
                MissingDriverData {
                    column: c1,
                    epoch: e1,
                    model: m1,
                },
                MissingDriverData {
                    column: c2,
                    epoch: e2,
                    model: m2,
                },
            ) => c1 == c2 && e1 == e2 && m1 == m2,
            (
                DriverColumnMismatch {
                    column: c1,
                    expected: e1,
                    got: g1,
                },
                DriverColumnMismatch {
                    column: c2,
                    expected: e2,
                    got: g2,
                },
            ) => c1 == c2 && e1 == e2 && g1 == g2,
            (InvalidTime(a), InvalidTime(b)) => a == b,
            (EngineFault(a), EngineFault(b)) => a == b,

            // Not comparable beyond the variant itself
            (WorkerPool(_), WorkerPool(_)) => true,
            (RootFinding(a), RootFinding(b)) => a == b,

            _ => false,
        }
    }
}
